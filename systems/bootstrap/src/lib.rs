#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares the opening command batch of a level.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use space_defense_core::{CellCoord, Command, ItemKind, LevelConfig, SlotContent};

/// Builds the commands that start a level.
#[derive(Debug)]
pub struct Bootstrap {
    rng: ChaCha8Rng,
}

impl Bootstrap {
    /// Creates a bootstrap system whose plate shuffle is driven by `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Emits `ConfigureLevel` followed, for plate levels, by `SeedSlots`.
    pub fn start_level(&mut self, config: LevelConfig, out: &mut Vec<Command>) {
        let slots = config
            .slots
            .as_ref()
            .map(|slots| self.deal(slots.cells(config.grid.rows), slots.shooters, slots.explosives));

        out.push(Command::ConfigureLevel { config });
        if let Some(slots) = slots {
            out.push(Command::SeedSlots { slots });
        }
    }

    fn deal(
        &mut self,
        cells: Vec<CellCoord>,
        shooters: usize,
        explosives: usize,
    ) -> Vec<(CellCoord, SlotContent)> {
        let mut contents: Vec<SlotContent> = Vec::with_capacity(cells.len());
        contents.extend(std::iter::repeat(SlotContent::Item(ItemKind::Shooter)).take(shooters));
        contents.extend(std::iter::repeat(SlotContent::Item(ItemKind::Explosive)).take(explosives));
        contents.resize(cells.len(), SlotContent::Enemy);
        contents.shuffle(&mut self.rng);

        cells.into_iter().zip(contents).collect()
    }
}
