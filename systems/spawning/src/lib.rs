#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use space_defense_core::{CellCoord, Command, EnemyView, Event, OccupancyView};
use tracing::debug;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that spawns one enemy in the rightmost column per spawn cycle.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events and immutable views to emit spawn commands.
    ///
    /// Each spawn cycle draws a row uniformly, then probes following rows
    /// (wrapping) until one has no enemy in the spawn column. A cycle with
    /// every row taken is skipped.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        occupancy: OccupancyView<'_>,
        out: &mut Vec<Command>,
    ) {
        let cycles = events
            .iter()
            .filter(|event| matches!(event, Event::SpawnDue))
            .count();
        if cycles == 0 {
            return;
        }

        let (rows, columns) = occupancy.dimensions();
        if rows == 0 || columns == 0 {
            return;
        }
        let spawn_column = columns - 1;

        let mut pending: Vec<CellCoord> = Vec::with_capacity(cycles);
        for _ in 0..cycles {
            let start = self.rng.gen_range(0..rows);
            let free = (0..rows)
                .map(|offset| CellCoord::new((start + offset) % rows, spawn_column))
                .find(|cell| {
                    occupancy.is_free(*cell) && !enemies.any_at(*cell) && !pending.contains(cell)
                });

            match free {
                Some(cell) => {
                    pending.push(cell);
                    out.push(Command::SpawnEnemy { cell });
                }
                None => debug!("every spawn row is taken, skipping cycle"),
            }
        }
    }
}
