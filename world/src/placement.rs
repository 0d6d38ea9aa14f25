//! Drop validation and commit for dragged items.

use space_defense_core::{
    CellCoord, DragSource, Event, Health, ItemId, ItemKind, ItemSite, Occupant, PlacementError,
    WorldPoint,
};
use tracing::{debug, info};

use crate::{scheduler::TimerAction, World};

impl World {
    /// Commits a drop or bounces the dragged entity back to where it came from.
    ///
    /// Rejection leaves every piece of state untouched.
    pub(crate) fn drop_item(
        &mut self,
        source: DragSource,
        position: WorldPoint,
        out_events: &mut Vec<Event>,
    ) {
        let origin = match source {
            DragSource::Toolbar(kind) => match self.config.toolbar_slot(kind) {
                Some(slot) => slot.anchor(),
                None => {
                    reject(source, PlacementError::UnknownTemplate, position, out_events);
                    return;
                }
            },
            DragSource::Item(id) => match self.registry.items.get(&id) {
                None => return,
                Some(item) if !item.draggable => {
                    reject(source, PlacementError::NotDraggable, item.position, out_events);
                    return;
                }
                Some(item) => item.position,
            },
        };

        let cell = match self.validate_drop(position) {
            Ok(cell) => cell,
            Err(reason) => {
                reject(source, reason, origin, out_events);
                return;
            }
        };

        let center = self.grid.cell_center(cell);
        let (id, kind, from_toolbar) = match source {
            DragSource::Toolbar(kind) => {
                let health = Health::new(self.config.tuning.item_health);
                let id = self
                    .registry
                    .insert_item(kind, ItemSite::Placed(cell), center, health);
                (id, kind, true)
            }
            DragSource::Item(id) => {
                let Some(item) = self.registry.items.get_mut(&id) else {
                    return;
                };
                let previous = item.site;
                item.site = ItemSite::Placed(cell);
                item.position = center;
                let kind = item.kind;
                if let ItemSite::Placed(old) = previous {
                    self.grid.release(old, Occupant::Item(id));
                }
                (id, kind, false)
            }
        };

        let _ = self.grid.occupy(cell, Occupant::Item(id));
        self.arm_item(id, kind, cell);
        info!(
            item = id.get(),
            ?kind,
            row = cell.row(),
            column = cell.column(),
            from_toolbar,
            "item placed"
        );
        out_events.push(Event::ItemPlaced {
            item: id,
            kind,
            cell,
            from_toolbar,
        });
    }

    fn validate_drop(&self, position: WorldPoint) -> Result<CellCoord, PlacementError> {
        let cell = self
            .grid
            .cell_at(position)
            .ok_or(PlacementError::OutOfBounds)?;
        if !self.grid.is_buildable(cell) {
            return Err(PlacementError::NotBuildable);
        }
        if self.grid.occupant(cell).is_some() {
            return Err(PlacementError::Occupied);
        }
        Ok(cell)
    }

    /// Kind-specific behaviour after a successful drop.
    fn arm_item(&mut self, id: ItemId, kind: ItemKind, cell: CellCoord) {
        let Some(item) = self.registry.items.get_mut(&id) else {
            return;
        };
        if let Some(previous) = item.timer.take() {
            let _ = self.scheduler.cancel(previous);
        }
        item.draggable = kind.stays_draggable();

        let timing = &self.config.timing;
        item.timer = match kind {
            ItemKind::Explosive => Some(
                self.scheduler
                    .schedule(timing.detonation_delay(), TimerAction::Detonate(id)),
            ),
            ItemKind::Producer => Some(self.scheduler.schedule_repeating(
                timing.production_interval(),
                TimerAction::Produce { item: id, cell },
            )),
            ItemKind::Shooter | ItemKind::Blocker => None,
        };
    }
}

fn reject(
    source: DragSource,
    reason: PlacementError,
    return_to: WorldPoint,
    out_events: &mut Vec<Event>,
) {
    debug!(?source, ?reason, "drop rejected");
    out_events.push(Event::PlacementRejected {
        source,
        reason,
        return_to,
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use space_defense_core::{Command, LevelConfig, SlotContent};

    use crate::{apply, query};

    use super::*;

    fn main_world() -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureLevel {
                config: LevelConfig::main(),
            },
            &mut events,
        );
        world
    }

    fn drop_at(world: &mut World, source: DragSource, cell: CellCoord) -> Vec<Event> {
        let position = query::grid(world).cell_center(cell);
        let mut events = Vec::new();
        apply(world, Command::DropItem { source, position }, &mut events);
        events
    }

    #[test]
    fn toolbar_drop_creates_item_and_keeps_template() {
        let mut world = main_world();
        let first = drop_at(
            &mut world,
            DragSource::Toolbar(ItemKind::Shooter),
            CellCoord::new(0, 0),
        );
        let second = drop_at(
            &mut world,
            DragSource::Toolbar(ItemKind::Shooter),
            CellCoord::new(1, 0),
        );

        assert!(matches!(
            first.as_slice(),
            [Event::ItemPlaced {
                from_toolbar: true,
                ..
            }]
        ));
        assert!(matches!(second.as_slice(), [Event::ItemPlaced { .. }]));
        assert_eq!(query::item_view(&world).iter().count(), 2);
    }

    #[test]
    fn drop_on_path_column_is_rejected() {
        let mut world = main_world();
        let events = drop_at(
            &mut world,
            DragSource::Toolbar(ItemKind::Producer),
            CellCoord::new(2, 8),
        );
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                source: DragSource::Toolbar(ItemKind::Producer),
                reason: PlacementError::NotBuildable,
                return_to: WorldPoint::new(250.0, 710.0),
            }]
        );
    }

    #[test]
    fn drop_outside_grid_is_rejected() {
        let mut world = main_world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::DropItem {
                source: DragSource::Toolbar(ItemKind::Shooter),
                position: WorldPoint::new(20.0, 20.0),
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::PlacementRejected {
                reason: PlacementError::OutOfBounds,
                ..
            }]
        ));
    }

    #[test]
    fn placed_shooter_stops_accepting_drags() {
        let mut world = main_world();
        let _ = drop_at(
            &mut world,
            DragSource::Toolbar(ItemKind::Shooter),
            CellCoord::new(0, 0),
        );
        let shooter = ItemId::new(0);
        let events = drop_at(&mut world, DragSource::Item(shooter), CellCoord::new(0, 1));

        assert!(matches!(
            events.as_slice(),
            [Event::PlacementRejected {
                reason: PlacementError::NotDraggable,
                ..
            }]
        ));
        assert_eq!(
            query::grid(&world).occupant(CellCoord::new(0, 0)),
            Some(Occupant::Item(shooter))
        );
    }

    #[test]
    fn moving_explosive_frees_old_cell_and_rearms_fuse() {
        let mut world = main_world();
        let _ = drop_at(
            &mut world,
            DragSource::Toolbar(ItemKind::Explosive),
            CellCoord::new(0, 0),
        );
        let explosive = ItemId::new(0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(150),
            },
            &mut events,
        );
        let _ = drop_at(&mut world, DragSource::Item(explosive), CellCoord::new(4, 6));
        assert!(query::grid(&world).can_place(CellCoord::new(0, 0)));

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::ExplosionTriggered { .. })));

        events.clear();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(100),
            },
            &mut events,
        );
        assert!(events.contains(&Event::ExplosionTriggered {
            cell: CellCoord::new(4, 6),
            position: query::grid(&world).cell_center(CellCoord::new(4, 6)),
        }));
    }

    #[test]
    fn staged_item_leaves_nothing_behind_when_placed() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureLevel {
                config: LevelConfig::mini(),
            },
            &mut events,
        );
        let plate = CellCoord::new(3, 3);
        apply(
            &mut world,
            Command::SeedSlots {
                slots: vec![(plate, SlotContent::Item(ItemKind::Shooter))],
            },
            &mut events,
        );
        apply(&mut world, Command::ClaimSlot { cell: plate }, &mut events);

        let events = drop_at(&mut world, DragSource::Item(ItemId::new(0)), CellCoord::new(3, 1));
        assert!(matches!(
            events.as_slice(),
            [Event::ItemPlaced {
                from_toolbar: false,
                ..
            }]
        ));
        assert_eq!(query::grid_info(&world).occupied_cells, 1);
    }

    #[test]
    fn exclusive_enemy_blocks_drop() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureLevel {
                config: LevelConfig::mini(),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnEnemy {
                cell: CellCoord::new(0, 2),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SeedSlots {
                slots: vec![(CellCoord::new(0, 3), SlotContent::Item(ItemKind::Explosive))],
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ClaimSlot {
                cell: CellCoord::new(0, 3),
            },
            &mut events,
        );

        let events = drop_at(&mut world, DragSource::Item(ItemId::new(0)), CellCoord::new(0, 2));
        assert_eq!(
            events,
            vec![Event::PlacementRejected {
                source: DragSource::Item(ItemId::new(0)),
                reason: PlacementError::Occupied,
                return_to: query::grid(&world).cell_center(CellCoord::new(0, 3)),
            }]
        );
    }
}
