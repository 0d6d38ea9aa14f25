#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands for shooters facing
//! enemies in their row.

use std::time::Duration;

use space_defense_core::{shot_ready, Command, EnemyView, ItemKind, ItemView};

/// Tower combat system that queues firing commands for ready shooters.
#[derive(Debug, Default)]
pub struct TowerCombat {
    occupied_rows: Vec<u32>,
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for placed shooters whose row
    /// holds at least one enemy and whose cooldown has elapsed.
    ///
    /// Rows are decided from enemy logical cells, never from the grid, since
    /// enemies may share cells.
    pub fn handle(
        &mut self,
        now: Duration,
        cooldown: Duration,
        items: &ItemView,
        enemies: &EnemyView,
        out: &mut Vec<Command>,
    ) {
        if enemies.is_empty() {
            return;
        }

        self.occupied_rows.clear();
        self.occupied_rows
            .extend(enemies.iter().map(|enemy| enemy.cell.row()));
        self.occupied_rows.sort_unstable();
        self.occupied_rows.dedup();

        self.scratch.clear();
        for item in items.iter() {
            if item.kind != ItemKind::Shooter {
                continue;
            }
            let Some(cell) = item.site.placed_cell() else {
                continue;
            };
            if self.occupied_rows.binary_search(&cell.row()).is_err() {
                continue;
            }
            if shot_ready(item.last_shot, now, cooldown) {
                self.scratch.push(Command::FireProjectile { item: item.id });
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use space_defense_core::{
        CellCoord, EnemyId, EnemySnapshot, Health, ItemId, ItemSite, ItemSnapshot, WorldPoint,
    };

    const COOLDOWN: Duration = Duration::from_millis(1000);

    #[test]
    fn silent_without_enemies() {
        let mut system = TowerCombat::new();
        let items = ItemView::from_snapshots(vec![shooter(1, CellCoord::new(0, 0), None)]);
        let mut out = Vec::new();

        system.handle(
            Duration::from_secs(5),
            COOLDOWN,
            &items,
            &EnemyView::default(),
            &mut out,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn only_shooters_in_enemy_rows_fire() {
        let mut system = TowerCombat::new();
        let items = ItemView::from_snapshots(vec![
            shooter(4, CellCoord::new(2, 1), None),
            shooter(1, CellCoord::new(2, 0), None),
            shooter(2, CellCoord::new(3, 0), None),
        ]);
        let enemies = EnemyView::from_snapshots(vec![enemy(0, CellCoord::new(2, 8))]);
        let mut out = Vec::new();

        system.handle(Duration::from_secs(5), COOLDOWN, &items, &enemies, &mut out);

        assert_eq!(
            out,
            vec![
                Command::FireProjectile {
                    item: ItemId::new(1)
                },
                Command::FireProjectile {
                    item: ItemId::new(4)
                },
            ]
        );
    }

    #[test]
    fn cooldown_must_be_strictly_exceeded() {
        let mut system = TowerCombat::new();
        let now = Duration::from_millis(10_000);
        let enemies = EnemyView::from_snapshots(vec![enemy(0, CellCoord::new(0, 6))]);
        let mut out = Vec::new();

        for (elapsed, expected) in [(500, false), (1000, false), (1001, true)] {
            out.clear();
            let items = ItemView::from_snapshots(vec![shooter(
                0,
                CellCoord::new(0, 0),
                Some(now - Duration::from_millis(elapsed)),
            )]);
            system.handle(now, COOLDOWN, &items, &enemies, &mut out);
            assert_eq!(!out.is_empty(), expected, "elapsed {elapsed}ms");
        }
    }

    #[test]
    fn staged_shooters_hold_fire() {
        let mut system = TowerCombat::new();
        let mut staged = shooter(0, CellCoord::new(1, 4), None);
        staged.site = ItemSite::Staged(CellCoord::new(1, 4));
        let items = ItemView::from_snapshots(vec![staged]);
        let enemies = EnemyView::from_snapshots(vec![enemy(3, CellCoord::new(1, 6))]);
        let mut out = Vec::new();

        system.handle(Duration::ZERO, COOLDOWN, &items, &enemies, &mut out);

        assert!(out.is_empty());
    }

    fn shooter(id: u32, cell: CellCoord, last_shot: Option<Duration>) -> ItemSnapshot {
        ItemSnapshot {
            id: ItemId::new(id),
            kind: ItemKind::Shooter,
            site: ItemSite::Placed(cell),
            position: WorldPoint::default(),
            health: Health::new(10),
            draggable: false,
            last_shot,
        }
    }

    fn enemy(id: u32, cell: CellCoord) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            cell,
            position: WorldPoint::default(),
            health: Health::new(9),
            moving: false,
        }
    }
}
