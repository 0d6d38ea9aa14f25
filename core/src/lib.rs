#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Space Defense engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

mod config;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use config::{
    ConfigError, EnemyOccupancy, GridConfig, LevelConfig, SlotConfig, TimingConfig, ToolbarSlot,
    TuningConfig, TOOLBAR_BOX_SIZE,
};

/// Scenes the wider game can transition between.
///
/// The core never manages scenes itself; it only decides when a transition
/// should be requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneId {
    /// Asset loading scene shown at startup.
    Boot,
    /// Title menu.
    Menu,
    /// Level selection map.
    WorldMap,
    /// Main defense level.
    Game,
    /// Plate-smashing mini-game.
    MiniGame,
}

/// Level variants hosted by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelVariant {
    /// Open-ended defense with a toolbar and a periodic enemy spawner.
    Main,
    /// Constrained level driven by hidden plates and a completion check.
    Mini,
}

impl LevelVariant {
    /// Scene that hosts the variant.
    #[must_use]
    pub const fn scene(self) -> SceneId {
        match self {
            Self::Main => SceneId::Game,
            Self::Mini => SceneId::MiniGame,
        }
    }

    /// Scene requested when the player presses escape.
    #[must_use]
    pub const fn exit_scene(self) -> SceneId {
        match self {
            Self::Main => SceneId::Menu,
            Self::Mini => SceneId::WorldMap,
        }
    }

    /// Scene requested once the level is completed.
    #[must_use]
    pub const fn completion_scene(self) -> SceneId {
        SceneId::WorldMap
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the world for the provided level configuration.
    ConfigureLevel {
        /// Complete level description, validated by the caller.
        config: LevelConfig,
    },
    /// Assigns hidden contents to the level's plates.
    SeedSlots {
        /// Plate cells paired with what claiming them reveals.
        slots: Vec<(CellCoord, SlotContent)>,
    },
    /// Advances the simulation clock, firing every timer that falls due.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Runs the per-frame projectile and melee phases.
    ResolveFrame,
    /// Requests that a shooter fire a projectile.
    FireProjectile {
        /// Shooter that should fire.
        item: ItemId,
    },
    /// Resolves the end of a drag gesture at the provided world position.
    DropItem {
        /// What is being dragged.
        source: DragSource,
        /// Final pointer position expressed in world units.
        position: WorldPoint,
    },
    /// Requests that an enemy be created at the provided cell.
    SpawnEnemy {
        /// Cell the enemy should appear in.
        cell: CellCoord,
    },
    /// Requests that an enemy march one column toward the player.
    AdvanceEnemy {
        /// Enemy attempting to move.
        enemy: EnemyId,
    },
    /// Requests a melee attacker anchored at the provided cell.
    DeployAxe {
        /// Cell of the blocked enemy.
        cell: CellCoord,
    },
    /// Claims an unclaimed plate, revealing its content.
    ClaimSlot {
        /// Plate cell selected by the player.
        cell: CellCoord,
    },
    /// Collects a produced resource token.
    CollectToken {
        /// Token selected by the player.
        token: TokenId,
    },
    /// Leaves the level through the escape key.
    RequestExit,
    /// Requests a scene transition decided by a system.
    RequestTransition {
        /// Scene that should become active.
        target: SceneId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that the world was rebuilt for a level.
    LevelConfigured {
        /// Variant that became active.
        variant: LevelVariant,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// The periodic enemy march timer fired.
    MarchDue,
    /// The periodic enemy spawn timer fired.
    SpawnDue,
    /// Confirms that an item now occupies a grid cell.
    ItemPlaced {
        /// Identifier of the placed item.
        item: ItemId,
        /// Kind of the placed item.
        kind: ItemKind,
        /// Cell the item occupies.
        cell: CellCoord,
        /// Whether the item was instantiated from a toolbar template.
        from_toolbar: bool,
    },
    /// Reports that a plate revealed a draggable item.
    ItemStaged {
        /// Identifier of the revealed item.
        item: ItemId,
        /// Kind of the revealed item.
        kind: ItemKind,
        /// Plate cell hosting the item.
        anchor: CellCoord,
    },
    /// Reports that a drop was rejected and the dragged entity bounces back.
    PlacementRejected {
        /// What was being dragged.
        source: DragSource,
        /// Reason the drop failed.
        reason: PlacementError,
        /// Position the dragged entity returns to.
        return_to: WorldPoint,
    },
    /// Reports that a melee strike damaged an item.
    ItemDamaged {
        /// Identifier of the damaged item.
        item: ItemId,
        /// Remaining health after the strike.
        health: Health,
        /// Position of the item, used for the strike effect.
        position: WorldPoint,
    },
    /// Confirms that an item left the world.
    ItemDestroyed {
        /// Identifier of the destroyed item.
        item: ItemId,
        /// What destroyed the item.
        cause: DestroyCause,
    },
    /// Reports an area-effect detonation.
    ExplosionTriggered {
        /// Centre cell of the blast.
        cell: CellCoord,
        /// World position of the blast centre.
        position: WorldPoint,
    },
    /// Confirms that an enemy entered the world.
    EnemySpawned {
        /// Identifier of the new enemy.
        enemy: EnemyId,
        /// Cell the enemy occupies.
        cell: CellCoord,
    },
    /// Confirms that an enemy started moving to a new cell.
    EnemyAdvanced {
        /// Identifier of the moving enemy.
        enemy: EnemyId,
        /// Cell the enemy left.
        from: CellCoord,
        /// Cell the enemy is moving to.
        to: CellCoord,
    },
    /// Reports that a projectile hit an enemy.
    EnemyHit {
        /// Identifier of the enemy that was hit.
        enemy: EnemyId,
        /// Remaining health after the hit.
        health: Health,
        /// Position of the enemy, used for the hit effect.
        position: WorldPoint,
    },
    /// Confirms that an enemy left the world.
    EnemyRemoved {
        /// Identifier of the removed enemy.
        enemy: EnemyId,
        /// Logical cell the enemy occupied when removed.
        cell: CellCoord,
        /// What removed the enemy.
        cause: DestroyCause,
    },
    /// Confirms that a shooter fired.
    ProjectileFired {
        /// Identifier of the new projectile.
        projectile: ProjectileId,
        /// Shooter that fired it.
        item: ItemId,
        /// Spawn position of the projectile.
        position: WorldPoint,
    },
    /// Confirms that a projectile left the world.
    ProjectileRemoved {
        /// Identifier of the removed projectile.
        projectile: ProjectileId,
    },
    /// Confirms that a melee attacker was created.
    AxeDeployed {
        /// Identifier of the axe.
        axe: AxeId,
        /// Anchor cell of the axe.
        cell: CellCoord,
    },
    /// Confirms that a melee attacker was removed.
    AxeRetired {
        /// Identifier of the axe.
        axe: AxeId,
        /// Anchor cell of the axe.
        cell: CellCoord,
    },
    /// Reports that a producer emitted a collectible token.
    TokenProduced {
        /// Identifier of the token.
        token: TokenId,
        /// Producer that emitted it.
        item: ItemId,
        /// Position of the token.
        position: WorldPoint,
    },
    /// Reports that the player collected a token.
    TokenCollected {
        /// Identifier of the collected token.
        token: TokenId,
        /// Electricity total after the collection.
        total: u32,
    },
    /// Reports that a plate was claimed.
    SlotClaimed {
        /// Plate cell that was claimed.
        cell: CellCoord,
        /// Number of plates still unclaimed.
        remaining: usize,
    },
    /// Requests that the host switch scenes.
    SceneTransitionRequested {
        /// Scene that should become active.
        target: SceneId,
    },
}

/// Kinds of items that can be placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Turret that fires projectiles along its row.
    Shooter,
    /// Explosive that detonates shortly after placement.
    Explosive,
    /// Battery that periodically produces electricity tokens.
    Producer,
    /// Inert obstacle.
    Blocker,
}

impl ItemKind {
    /// Reports whether the kind stays draggable after being placed.
    #[must_use]
    pub const fn stays_draggable(self) -> bool {
        matches!(self, Self::Explosive)
    }
}

/// Origin of a dragged entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DragSource {
    /// A reusable toolbar template of the given kind.
    Toolbar(ItemKind),
    /// An item that already exists in the world.
    Item(ItemId),
}

/// Content hidden under a plate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotContent {
    /// A draggable item of the given kind.
    Item(ItemKind),
    /// An enemy.
    Enemy,
}

/// Reasons an entity left the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DestroyCause {
    /// Health was depleted by projectiles or melee strikes.
    Depleted,
    /// Caught in an explosion.
    Detonation,
}

/// Reasons a drop may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The drop position lies outside the grid.
    OutOfBounds,
    /// The target column lies outside the buildable region.
    NotBuildable,
    /// The target cell already holds an occupant.
    Occupied,
    /// The dragged item no longer accepts drags.
    NotDraggable,
    /// The level offers no toolbar template of the requested kind.
    UnknownTemplate,
}

/// Occupant recorded in a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Occupant {
    /// A placed item.
    Item(ItemId),
    /// An enemy, only recorded when enemies are grid-exclusive.
    Enemy(EnemyId),
}

/// Unique identifier assigned to a placed item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a melee attacker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AxeId(u32);

impl AxeId {
    /// Creates a new axe identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a collectible token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u32);

impl TokenId {
    /// Creates a new token identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Remaining hit points of an item or enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Health(u32);

impl Health {
    /// Creates a health value with the provided hit points.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the remaining hit points.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Removes a single hit point, saturating at zero.
    #[must_use]
    pub const fn damaged(self) -> Self {
        Self(self.0.saturating_sub(1))
    }

    /// Zero is terminal: the owner must be removed.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

/// Location of a single grid cell expressed as row and column indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Cell one column toward the player, if any.
    ///
    /// Enemies advance toward decreasing column indices, so the "front" of an
    /// enemy and the "behind" side of a melee attacker are the same cell.
    #[must_use]
    pub const fn front(&self) -> Option<CellCoord> {
        match self.column.checked_sub(1) {
            Some(column) => Some(Self::new(self.row, column)),
            None => None,
        }
    }

    /// Cell one column away from the player, if any.
    #[must_use]
    pub const fn rear(&self) -> Option<CellCoord> {
        match self.column.checked_add(1) {
            Some(column) => Some(Self::new(self.row, column)),
            None => None,
        }
    }

    /// Enumerates the 3×3 neighbourhood around the cell clipped to the grid.
    #[must_use]
    pub fn neighbourhood(&self, rows: u32, columns: u32) -> Vec<CellCoord> {
        let mut cells = Vec::with_capacity(9);
        let row_start = self.row.saturating_sub(1);
        let column_start = self.column.saturating_sub(1);
        for row in row_start..=self.row.saturating_add(1) {
            if row >= rows {
                continue;
            }
            for column in column_start..=self.column.saturating_add(1) {
                if column >= columns {
                    continue;
                }
                cells.push(Self::new(row, column));
            }
        }
        cells
    }
}

/// Continuous position expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    /// Horizontal coordinate, growing to the right.
    pub x: f32,
    /// Vertical coordinate, growing downward.
    pub y: f32,
}

impl WorldPoint {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the point shifted by the provided offsets.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Where an item currently lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemSite {
    /// Waiting on a plate; not recorded in the grid.
    Staged(CellCoord),
    /// Recorded in the grid at the given cell.
    Placed(CellCoord),
}

impl ItemSite {
    /// Grid cell occupied by the item, if it is grid-tracked.
    #[must_use]
    pub const fn placed_cell(&self) -> Option<CellCoord> {
        match self {
            Self::Placed(cell) => Some(*cell),
            Self::Staged(_) => None,
        }
    }
}

/// Reports whether a shooter that last fired at `last_shot` may fire at `now`.
///
/// The cooldown must be strictly exceeded; a shooter that never fired is
/// always ready.
#[must_use]
pub fn shot_ready(last_shot: Option<Duration>, now: Duration, cooldown: Duration) -> bool {
    last_shot.map_or(true, |last| now.saturating_sub(last) > cooldown)
}

/// Immutable representation of a single item's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemSnapshot {
    /// Identifier allocated to the item by the world.
    pub id: ItemId,
    /// Kind of the item.
    pub kind: ItemKind,
    /// Where the item lives.
    pub site: ItemSite,
    /// World position of the item's centre.
    pub position: WorldPoint,
    /// Remaining health.
    pub health: Health,
    /// Whether the item still accepts drags.
    pub draggable: bool,
    /// Time of the last shot fired, if any.
    pub last_shot: Option<Duration>,
}

/// Read-only snapshot describing all items in the world.
#[derive(Clone, Debug, Default)]
pub struct ItemView {
    snapshots: Vec<ItemSnapshot>,
}

impl ItemView {
    /// Creates a new item view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<ItemSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured item snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<ItemSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier allocated to the enemy by the world.
    pub id: EnemyId,
    /// Logical cell of the enemy, updated as soon as a move starts.
    pub cell: CellCoord,
    /// Animated world position of the enemy.
    pub position: WorldPoint,
    /// Remaining health.
    pub health: Health,
    /// Whether a move animation is still in flight.
    pub moving: bool,
}

/// Read-only snapshot describing all enemies in the world.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Reports whether any enemy occupies the provided cell.
    #[must_use]
    pub fn any_at(&self, cell: CellCoord) -> bool {
        self.snapshots.iter().any(|enemy| enemy.cell == cell)
    }

    /// Number of live enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemy is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Read-only view into the dense occupancy grid.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [Option<Occupant>],
    rows: u32,
    columns: u32,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [Option<Occupant>], rows: u32, columns: u32) -> Self {
        Self {
            cells,
            rows,
            columns,
        }
    }

    /// Returns the occupant recorded for the provided cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    /// Reports whether the cell is inside the grid and holds no occupant.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.index(cell).map_or(false, |index| {
            self.cells.get(index).copied().unwrap_or(None).is_none()
        })
    }

    /// Provides the dimensions of the underlying grid as `(rows, columns)`.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.rows, self.columns)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.row() < self.rows && cell.column() < self.columns {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbourhood_is_clipped_at_grid_corner() {
        let cells = CellCoord::new(0, 0).neighbourhood(5, 9);
        assert_eq!(
            cells,
            vec![
                CellCoord::new(0, 0),
                CellCoord::new(0, 1),
                CellCoord::new(1, 0),
                CellCoord::new(1, 1),
            ]
        );
    }

    #[test]
    fn neighbourhood_covers_nine_cells_in_interior() {
        let cells = CellCoord::new(2, 2).neighbourhood(5, 9);
        assert_eq!(cells.len(), 9);
        assert!(cells
            .iter()
            .all(|cell| cell.row().abs_diff(2) <= 1 && cell.column().abs_diff(2) <= 1));
    }

    #[test]
    fn front_stops_at_first_column() {
        assert_eq!(CellCoord::new(3, 1).front(), Some(CellCoord::new(3, 0)));
        assert_eq!(CellCoord::new(3, 0).front(), None);
    }

    #[test]
    fn health_saturates_at_zero() {
        let health = Health::new(1).damaged();
        assert!(health.is_depleted());
        assert!(health.damaged().is_depleted());
    }

    #[test]
    fn occupancy_view_treats_out_of_range_cells_as_blocked() {
        let cells = vec![None, Some(Occupant::Item(ItemId::new(3)))];
        let view = OccupancyView::new(&cells, 1, 2);

        assert!(view.is_free(CellCoord::new(0, 0)));
        assert!(!view.is_free(CellCoord::new(0, 1)));
        assert!(!view.is_free(CellCoord::new(1, 0)));
        assert_eq!(
            view.occupant(CellCoord::new(0, 1)),
            Some(Occupant::Item(ItemId::new(3)))
        );
    }
}
