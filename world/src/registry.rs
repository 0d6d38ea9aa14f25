//! Live entity collections. Presence in a map is the liveness flag: removed
//! entities are gone, and every lookup by identifier may come back empty.

use std::{collections::BTreeMap, time::Duration};

use space_defense_core::{
    AxeId, CellCoord, EnemyId, EnemySnapshot, Health, ItemId, ItemKind, ItemSite, ItemSnapshot,
    ProjectileId, TokenId, WorldPoint,
};

use crate::scheduler::TimerHandle;

#[derive(Clone, Debug)]
pub(crate) struct Item {
    pub(crate) kind: ItemKind,
    pub(crate) site: ItemSite,
    pub(crate) position: WorldPoint,
    pub(crate) health: Health,
    pub(crate) draggable: bool,
    pub(crate) last_shot: Option<Duration>,
    pub(crate) timer: Option<TimerHandle>,
}

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) cell: CellCoord,
    pub(crate) position: WorldPoint,
    pub(crate) health: Health,
    pub(crate) motion: Option<Motion>,
}

/// In-flight move animation; the enemy is locked while present.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Motion {
    pub(crate) from: WorldPoint,
    pub(crate) to: WorldPoint,
    pub(crate) started: Duration,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Projectile {
    pub(crate) item: ItemId,
    pub(crate) position: WorldPoint,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Axe {
    pub(crate) cell: CellCoord,
    pub(crate) last_strike: Option<Duration>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Token {
    pub(crate) item: ItemId,
    pub(crate) position: WorldPoint,
}

#[derive(Debug, Default)]
pub(crate) struct Registry {
    pub(crate) items: BTreeMap<ItemId, Item>,
    pub(crate) enemies: BTreeMap<EnemyId, Enemy>,
    pub(crate) projectiles: BTreeMap<ProjectileId, Projectile>,
    pub(crate) axes: BTreeMap<AxeId, Axe>,
    axe_cells: BTreeMap<CellCoord, AxeId>,
    pub(crate) tokens: BTreeMap<TokenId, Token>,
    next_item: u32,
    next_enemy: u32,
    next_projectile: u32,
    next_axe: u32,
    next_token: u32,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_item(
        &mut self,
        kind: ItemKind,
        site: ItemSite,
        position: WorldPoint,
        health: Health,
    ) -> ItemId {
        let id = ItemId::new(self.next_item);
        self.next_item = self.next_item.saturating_add(1);
        let _ = self.items.insert(
            id,
            Item {
                kind,
                site,
                position,
                health,
                draggable: true,
                last_shot: None,
                timer: None,
            },
        );
        id
    }

    pub(crate) fn insert_enemy(
        &mut self,
        cell: CellCoord,
        position: WorldPoint,
        health: Health,
    ) -> EnemyId {
        let id = EnemyId::new(self.next_enemy);
        self.next_enemy = self.next_enemy.saturating_add(1);
        let _ = self.enemies.insert(
            id,
            Enemy {
                cell,
                position,
                health,
                motion: None,
            },
        );
        id
    }

    /// Identifier the next inserted enemy will receive.
    pub(crate) fn peek_enemy_id(&self) -> EnemyId {
        EnemyId::new(self.next_enemy)
    }

    pub(crate) fn insert_projectile(&mut self, item: ItemId, position: WorldPoint) -> ProjectileId {
        let id = ProjectileId::new(self.next_projectile);
        self.next_projectile = self.next_projectile.saturating_add(1);
        let _ = self.projectiles.insert(id, Projectile { item, position });
        id
    }

    /// At most one axe per cell; returns `None` when the cell already has one.
    pub(crate) fn insert_axe(&mut self, cell: CellCoord) -> Option<AxeId> {
        if self.axe_cells.contains_key(&cell) {
            return None;
        }
        let id = AxeId::new(self.next_axe);
        self.next_axe = self.next_axe.saturating_add(1);
        let _ = self.axes.insert(
            id,
            Axe {
                cell,
                last_strike: None,
            },
        );
        let _ = self.axe_cells.insert(cell, id);
        Some(id)
    }

    pub(crate) fn remove_axe_at(&mut self, cell: CellCoord) -> Option<AxeId> {
        let id = self.axe_cells.remove(&cell)?;
        let _ = self.axes.remove(&id);
        Some(id)
    }

    pub(crate) fn insert_token(&mut self, item: ItemId, position: WorldPoint) -> TokenId {
        let id = TokenId::new(self.next_token);
        self.next_token = self.next_token.saturating_add(1);
        let _ = self.tokens.insert(id, Token { item, position });
        id
    }

    pub(crate) fn enemies_at(&self, cell: CellCoord) -> Vec<EnemyId> {
        self.enemies
            .iter()
            .filter(|(_, enemy)| enemy.cell == cell)
            .map(|(id, _)| *id)
            .collect()
    }

    pub(crate) fn item_snapshots(&self) -> Vec<ItemSnapshot> {
        self.items
            .iter()
            .map(|(id, item)| ItemSnapshot {
                id: *id,
                kind: item.kind,
                site: item.site,
                position: item.position,
                health: item.health,
                draggable: item.draggable,
                last_shot: item.last_shot,
            })
            .collect()
    }

    pub(crate) fn enemy_snapshots(&self) -> Vec<EnemySnapshot> {
        self.enemies
            .iter()
            .map(|(id, enemy)| EnemySnapshot {
                id: *id,
                cell: enemy.cell,
                position: enemy.position,
                health: enemy.health,
                moving: enemy.motion.is_some(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_are_unique_per_cell() {
        let mut registry = Registry::new();
        let cell = CellCoord::new(2, 4);
        let first = registry.insert_axe(cell);
        assert!(first.is_some());
        assert_eq!(registry.insert_axe(cell), None);

        assert_eq!(registry.remove_axe_at(cell), first);
        assert!(registry.axes.is_empty());
        assert!(registry.insert_axe(cell).is_some());
    }

    #[test]
    fn identifiers_are_never_reused() {
        let mut registry = Registry::new();
        let first = registry.insert_item(
            ItemKind::Blocker,
            ItemSite::Placed(CellCoord::new(0, 0)),
            WorldPoint::default(),
            Health::new(10),
        );
        let _ = registry.items.remove(&first);
        let second = registry.insert_item(
            ItemKind::Blocker,
            ItemSite::Placed(CellCoord::new(0, 0)),
            WorldPoint::default(),
            Health::new(10),
        );
        assert_ne!(first, second);
    }
}
