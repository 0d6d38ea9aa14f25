use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::{CellCoord, ItemKind, LevelVariant, WorldPoint};

/// Whether enemies claim grid cells exclusively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyOccupancy {
    /// Enemies are tracked beside the grid and may share cells.
    #[default]
    Shared,
    /// Enemies are recorded in the grid and block one another.
    Exclusive,
}

/// Geometry of the placement grid.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of rows.
    pub rows: u32,
    /// Number of columns.
    pub columns: u32,
    /// Side length of a square cell in world units.
    pub cell_size: f32,
    /// Horizontal world offset of the grid origin.
    pub offset_x: f32,
    /// Vertical world offset of the grid origin.
    pub offset_y: f32,
    /// Number of leftmost columns that accept items.
    pub buildable_columns: u32,
    /// Enemy cell policy.
    pub enemy_occupancy: EnemyOccupancy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 5,
            columns: 9,
            cell_size: 80.0,
            offset_x: 100.0,
            offset_y: 150.0,
            buildable_columns: 7,
            enemy_occupancy: EnemyOccupancy::Shared,
        }
    }
}

/// Timer periods and cooldowns, expressed in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Minimum gap between two shots of one shooter.
    pub fire_cooldown_ms: u64,
    /// Minimum gap between two strikes of one axe.
    pub melee_cooldown_ms: u64,
    /// Period of the enemy march timer.
    pub march_interval_ms: u64,
    /// Period of the enemy spawn timer, absent when the level has no spawner.
    pub spawn_interval_ms: Option<u64>,
    /// Period of each producer's token timer.
    pub production_interval_ms: u64,
    /// Delay between dropping an explosive and its detonation.
    pub detonation_delay_ms: u64,
    /// Delay between completion and the scene transition.
    pub completion_delay_ms: u64,
    /// Duration of one enemy move animation.
    pub enemy_move_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fire_cooldown_ms: 1000,
            melee_cooldown_ms: 2000,
            march_interval_ms: 2000,
            spawn_interval_ms: Some(3000),
            production_interval_ms: 20_000,
            detonation_delay_ms: 200,
            completion_delay_ms: 2000,
            enemy_move_ms: 500,
        }
    }
}

impl TimingConfig {
    /// Minimum gap between two shots of one shooter.
    #[must_use]
    pub const fn fire_cooldown(&self) -> Duration {
        Duration::from_millis(self.fire_cooldown_ms)
    }

    /// Minimum gap between two strikes of one axe.
    #[must_use]
    pub const fn melee_cooldown(&self) -> Duration {
        Duration::from_millis(self.melee_cooldown_ms)
    }

    /// Period of the enemy march timer.
    #[must_use]
    pub const fn march_interval(&self) -> Duration {
        Duration::from_millis(self.march_interval_ms)
    }

    /// Period of the enemy spawn timer, if the level spawns enemies.
    #[must_use]
    pub fn spawn_interval(&self) -> Option<Duration> {
        self.spawn_interval_ms.map(Duration::from_millis)
    }

    /// Period of each producer's token timer.
    #[must_use]
    pub const fn production_interval(&self) -> Duration {
        Duration::from_millis(self.production_interval_ms)
    }

    /// Delay between dropping an explosive and its detonation.
    #[must_use]
    pub const fn detonation_delay(&self) -> Duration {
        Duration::from_millis(self.detonation_delay_ms)
    }

    /// Delay between completion and the scene transition.
    #[must_use]
    pub const fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    /// Duration of one enemy move animation.
    #[must_use]
    pub const fn enemy_move(&self) -> Duration {
        Duration::from_millis(self.enemy_move_ms)
    }
}

/// Entity constants.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Starting health of every item.
    pub item_health: u32,
    /// Starting health of every enemy.
    pub enemy_health: u32,
    /// Distance a projectile travels per frame.
    pub projectile_speed: f32,
    /// Collision radius of a projectile.
    pub projectile_radius: f32,
    /// Horizontal distance between a shooter and its muzzle.
    pub muzzle_offset: f32,
    /// Side length of an enemy's bounding box.
    pub enemy_extent: f32,
    /// Electricity added by one collected token.
    pub token_reward: u32,
    /// Vertical distance between a producer and its token.
    pub token_lift: f32,
    /// Width of the playfield; projectiles beyond it are discarded.
    pub viewport_width: f32,
    /// Height of the playfield.
    pub viewport_height: f32,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            item_health: 10,
            enemy_health: 9,
            projectile_speed: 10.0,
            projectile_radius: 5.0,
            muzzle_offset: 30.0,
            enemy_extent: 70.0,
            token_reward: 25,
            token_lift: 40.0,
            viewport_width: 1200.0,
            viewport_height: 800.0,
        }
    }
}

/// Toolbar template anchored at a fixed world position.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ToolbarSlot {
    /// Kind instantiated when the template is dropped on the grid.
    pub kind: ItemKind,
    /// Horizontal anchor of the template.
    pub x: f32,
    /// Vertical anchor of the template.
    pub y: f32,
}

impl ToolbarSlot {
    /// Anchor of the template expressed as a world point.
    #[must_use]
    pub const fn anchor(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y)
    }
}

/// Plate layout of the mini-game.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// First plate column, inclusive.
    pub first_column: u32,
    /// Last plate column, inclusive.
    pub last_column: u32,
    /// Number of plates hiding a shooter.
    pub shooters: usize,
    /// Number of plates hiding an explosive.
    pub explosives: usize,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            first_column: 3,
            last_column: 6,
            shooters: 5,
            explosives: 5,
        }
    }
}

impl SlotConfig {
    /// Enumerates every plate cell in row-major order.
    #[must_use]
    pub fn cells(&self, rows: u32) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        for row in 0..rows {
            for column in self.first_column..=self.last_column {
                cells.push(CellCoord::new(row, column));
            }
        }
        cells
    }
}

/// Complete description of a level.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Variant hosted by the level.
    pub variant: LevelVariant,
    /// Grid geometry.
    pub grid: GridConfig,
    /// Timer periods.
    pub timing: TimingConfig,
    /// Entity constants.
    pub tuning: TuningConfig,
    /// Toolbar templates, empty when the level has no toolbar.
    pub toolbar: Vec<ToolbarSlot>,
    /// Plate layout, present only for the mini-game.
    pub slots: Option<SlotConfig>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::main()
    }
}

/// Side length of a toolbar box.
pub const TOOLBAR_BOX_SIZE: f32 = 80.0;

impl LevelConfig {
    /// Open-ended defense level with a toolbar and a spawner.
    #[must_use]
    pub fn main() -> Self {
        Self {
            variant: LevelVariant::Main,
            grid: GridConfig::default(),
            timing: TimingConfig::default(),
            tuning: TuningConfig::default(),
            toolbar: vec![
                ToolbarSlot {
                    kind: ItemKind::Explosive,
                    x: 170.0,
                    y: 710.0,
                },
                ToolbarSlot {
                    kind: ItemKind::Producer,
                    x: 250.0,
                    y: 710.0,
                },
                ToolbarSlot {
                    kind: ItemKind::Shooter,
                    x: 330.0,
                    y: 710.0,
                },
            ],
            slots: None,
        }
    }

    /// Plate-smashing level with exclusive enemy cells and no spawner.
    #[must_use]
    pub fn mini() -> Self {
        Self {
            variant: LevelVariant::Mini,
            grid: GridConfig {
                buildable_columns: 3,
                enemy_occupancy: EnemyOccupancy::Exclusive,
                ..GridConfig::default()
            },
            timing: TimingConfig {
                spawn_interval_ms: None,
                ..TimingConfig::default()
            },
            tuning: TuningConfig::default(),
            toolbar: Vec::new(),
            slots: Some(SlotConfig::default()),
        }
    }

    /// Toolbar template for the provided kind, if the level offers one.
    #[must_use]
    pub fn toolbar_slot(&self, kind: ItemKind) -> Option<&ToolbarSlot> {
        self.toolbar.iter().find(|slot| slot.kind == kind)
    }

    /// Checks that the configuration describes a playable level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid = &self.grid;
        if grid.rows == 0 || grid.columns == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: grid.rows,
                columns: grid.columns,
            });
        }
        if !(grid.cell_size.is_finite() && grid.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(grid.cell_size));
        }
        if grid.buildable_columns > grid.columns {
            return Err(ConfigError::BuildableOutOfRange {
                buildable: grid.buildable_columns,
                columns: grid.columns,
            });
        }

        let timing = &self.timing;
        let periods = [
            ("march_interval_ms", timing.march_interval_ms),
            ("production_interval_ms", timing.production_interval_ms),
            (
                "spawn_interval_ms",
                timing.spawn_interval_ms.unwrap_or(u64::MAX),
            ),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(ConfigError::ZeroPeriod(name));
            }
        }

        if self.tuning.item_health == 0 || self.tuning.enemy_health == 0 {
            return Err(ConfigError::ZeroHealth);
        }

        if let Some(slots) = &self.slots {
            if slots.first_column > slots.last_column || slots.last_column >= grid.columns {
                return Err(ConfigError::SlotColumnsOutOfRange {
                    first: slots.first_column,
                    last: slots.last_column,
                    columns: grid.columns,
                });
            }
            let available = slots.cells(grid.rows).len();
            let requested = slots.shooters.saturating_add(slots.explosives);
            if requested > available {
                return Err(ConfigError::TooManySlotItems {
                    requested,
                    available,
                });
            }
        }

        let mut seen = Vec::with_capacity(self.toolbar.len());
        for slot in &self.toolbar {
            if seen.contains(&slot.kind) {
                return Err(ConfigError::DuplicateToolbarKind(slot.kind));
            }
            seen.push(slot.kind);
        }

        Ok(())
    }
}

/// Problems detected while validating a [`LevelConfig`].
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The grid has no cells.
    #[error("grid must have at least one row and column (got {rows}x{columns})")]
    EmptyGrid {
        /// Configured row count.
        rows: u32,
        /// Configured column count.
        columns: u32,
    },
    /// The cell size is not a positive finite number.
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
    /// More buildable columns than grid columns.
    #[error("buildable columns ({buildable}) exceed grid columns ({columns})")]
    BuildableOutOfRange {
        /// Configured buildable column count.
        buildable: u32,
        /// Configured column count.
        columns: u32,
    },
    /// A repeating timer has a zero period.
    #[error("{0} must be greater than zero")]
    ZeroPeriod(&'static str),
    /// Items or enemies would start destroyed.
    #[error("starting health must be greater than zero")]
    ZeroHealth,
    /// Plate columns fall outside the grid.
    #[error("plate columns {first}..={last} do not fit a grid of {columns} columns")]
    SlotColumnsOutOfRange {
        /// First plate column.
        first: u32,
        /// Last plate column.
        last: u32,
        /// Configured column count.
        columns: u32,
    },
    /// More hidden items than plates.
    #[error("{requested} hidden items requested but only {available} plates exist")]
    TooManySlotItems {
        /// Hidden items requested.
        requested: usize,
        /// Plates available.
        available: usize,
    },
    /// Two toolbar templates share a kind.
    #[error("toolbar lists {0:?} more than once")]
    DuplicateToolbarKind(ItemKind),
}
