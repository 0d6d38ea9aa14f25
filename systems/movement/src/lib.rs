#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that decides, on every march, whether each
//! enemy advances one column or deploys an axe against the item blocking it.

use space_defense_core::{
    CellCoord, Command, EnemyOccupancy, EnemyView, Event, Occupant, OccupancyView,
};

/// Pure system that reacts to march events and emits movement commands.
#[derive(Debug, Default)]
pub struct Movement {
    vacated: Vec<CellCoord>,
    claimed: Vec<CellCoord>,
    axes: Vec<CellCoord>,
}

impl Movement {
    /// Creates a new movement system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and immutable views to emit movement commands.
    ///
    /// Enemies are visited in identifier order, mirroring the order in which
    /// the world applies the resulting commands. A batch is expected to hold
    /// at most one march; callers split the clock at every march due time.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        occupancy: OccupancyView<'_>,
        policy: EnemyOccupancy,
        out: &mut Vec<Command>,
    ) {
        if !events.iter().any(|event| matches!(event, Event::MarchDue)) {
            return;
        }

        self.vacated.clear();
        self.claimed.clear();
        self.axes.clear();

        for enemy in enemies.iter() {
            if enemy.moving {
                continue;
            }
            let Some(front) = enemy.cell.front() else {
                continue;
            };

            match occupancy.occupant(front) {
                Some(Occupant::Item(_)) => {
                    if !self.axes.contains(&enemy.cell) {
                        self.axes.push(enemy.cell);
                        out.push(Command::DeployAxe { cell: enemy.cell });
                    }
                }
                Some(Occupant::Enemy(_)) if !self.vacated.contains(&front) => {}
                Some(Occupant::Enemy(_)) | None => {
                    if policy == EnemyOccupancy::Exclusive {
                        if self.claimed.contains(&front) {
                            continue;
                        }
                        self.claimed.push(front);
                        self.vacated.push(enemy.cell);
                    }
                    out.push(Command::AdvanceEnemy { enemy: enemy.id });
                }
            }
        }
    }
}
