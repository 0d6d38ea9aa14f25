//! Discrete grid geometry and per-cell occupancy.

use space_defense_core::{
    CellCoord, EnemyId, EnemyOccupancy, GridConfig, Occupant, OccupancyView, WorldPoint,
};

/// Permanent build state of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terrain {
    Buildable,
    Path,
}

/// Summary of grid usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridInfo {
    /// Number of cells in the grid.
    pub total_cells: usize,
    /// Number of cells holding an occupant.
    pub occupied_cells: usize,
}

/// Maps cells to world coordinates and tracks what occupies each cell.
///
/// Terrain is fixed when the grid is built: columns outside the buildable
/// region are path cells and never accept items, whatever happens to their
/// occupant slot afterwards.
#[derive(Clone, Debug)]
pub struct GridModel {
    rows: u32,
    columns: u32,
    cell_size: f32,
    offset: WorldPoint,
    enemy_occupancy: EnemyOccupancy,
    terrain: Vec<Terrain>,
    occupants: Vec<Option<Occupant>>,
}

impl GridModel {
    /// Builds an empty grid from the provided configuration.
    #[must_use]
    pub fn new(config: &GridConfig) -> Self {
        let capacity_u64 = u64::from(config.rows) * u64::from(config.columns);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        let mut terrain = Vec::with_capacity(capacity);
        for _ in 0..config.rows {
            for column in 0..config.columns {
                terrain.push(if column < config.buildable_columns {
                    Terrain::Buildable
                } else {
                    Terrain::Path
                });
            }
        }

        Self {
            rows: config.rows,
            columns: config.columns,
            cell_size: config.cell_size,
            offset: WorldPoint::new(config.offset_x, config.offset_y),
            enemy_occupancy: config.enemy_occupancy,
            terrain,
            occupants: vec![None; capacity],
        }
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Side length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Whether enemies claim cells in this grid.
    #[must_use]
    pub const fn enemy_occupancy(&self) -> EnemyOccupancy {
        self.enemy_occupancy
    }

    /// Converts a world position into `(row, column)` indices.
    ///
    /// The result may lie outside the grid; pair it with [`GridModel::is_valid`].
    #[must_use]
    pub fn to_grid(&self, point: WorldPoint) -> (i64, i64) {
        let column = ((point.x - self.offset.x) / self.cell_size).floor() as i64;
        let row = ((point.y - self.offset.y) / self.cell_size).floor() as i64;
        (row, column)
    }

    /// Converts a world position into a cell when it lies inside the grid.
    #[must_use]
    pub fn cell_at(&self, point: WorldPoint) -> Option<CellCoord> {
        let (row, column) = self.to_grid(point);
        if !self.is_valid(row, column) {
            return None;
        }
        Some(CellCoord::new(
            u32::try_from(row).ok()?,
            u32::try_from(column).ok()?,
        ))
    }

    /// World position of the top-left corner of the cell.
    #[must_use]
    pub fn to_world(&self, cell: CellCoord) -> WorldPoint {
        WorldPoint::new(
            self.offset.x + cell.column() as f32 * self.cell_size,
            self.offset.y + cell.row() as f32 * self.cell_size,
        )
    }

    /// World position of the centre of the cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> WorldPoint {
        let half = self.cell_size / 2.0;
        self.to_world(cell).offset(half, half)
    }

    /// Bounds check against the configured dimensions.
    #[must_use]
    pub fn is_valid(&self, row: i64, column: i64) -> bool {
        row >= 0 && column >= 0 && row < i64::from(self.rows) && column < i64::from(self.columns)
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    /// Reports whether the cell belongs to the buildable region.
    #[must_use]
    pub fn is_buildable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.terrain.get(index))
            .map_or(false, |terrain| *terrain == Terrain::Buildable)
    }

    /// Valid, buildable and without an occupant.
    #[must_use]
    pub fn can_place(&self, cell: CellCoord) -> bool {
        self.is_buildable(cell) && self.occupant(cell).is_none()
    }

    /// Occupant recorded for the cell, if any.
    #[must_use]
    pub fn occupant(&self, cell: CellCoord) -> Option<Occupant> {
        self.index(cell)
            .and_then(|index| self.occupants.get(index).copied().flatten())
    }

    /// Records an item occupant; returns `false` without mutating when
    /// [`GridModel::can_place`] fails.
    pub(crate) fn occupy(&mut self, cell: CellCoord, occupant: Occupant) -> bool {
        if !self.can_place(cell) {
            return false;
        }
        self.set(cell, Some(occupant))
    }

    /// Records an enemy in an exclusive grid. Terrain is ignored because
    /// enemies walk the path columns.
    pub(crate) fn admit_enemy(&mut self, cell: CellCoord, enemy: EnemyId) -> bool {
        if self.enemy_occupancy != EnemyOccupancy::Exclusive {
            return true;
        }
        if !self.contains(cell) || self.occupant(cell).is_some() {
            return false;
        }
        self.set(cell, Some(Occupant::Enemy(enemy)))
    }

    /// Clears the occupant slot if it still holds the provided occupant.
    pub(crate) fn release(&mut self, cell: CellCoord, occupant: Occupant) {
        if self.occupant(cell) == Some(occupant) {
            self.free(cell);
        }
    }

    /// Clears the occupant slot. Terrain is untouched.
    pub(crate) fn free(&mut self, cell: CellCoord) {
        let _ = self.set(cell, None);
    }

    /// Read-only occupancy view handed to systems.
    #[must_use]
    pub fn occupancy_view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.occupants, self.rows, self.columns)
    }

    /// Total and occupied cell counts.
    #[must_use]
    pub fn info(&self) -> GridInfo {
        GridInfo {
            total_cells: self.occupants.len(),
            occupied_cells: self.occupants.iter().filter(|slot| slot.is_some()).count(),
        }
    }

    fn set(&mut self, cell: CellCoord, value: Option<Occupant>) -> bool {
        match self.index(cell).and_then(|index| self.occupants.get_mut(index)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

#[cfg(test)]
mod tests {
    use space_defense_core::{ItemId, LevelConfig};

    use super::*;

    fn main_grid() -> GridModel {
        GridModel::new(&LevelConfig::main().grid)
    }

    #[test]
    fn world_to_grid_inverts_grid_to_world() {
        let grid = main_grid();
        for row in 0..5 {
            for column in 0..9 {
                let corner = grid.to_world(CellCoord::new(row, column));
                assert_eq!(
                    grid.to_grid(corner.offset(1.0, 1.0)),
                    (i64::from(row), i64::from(column))
                );
            }
        }
    }

    #[test]
    fn to_grid_reports_out_of_range_indices() {
        let grid = main_grid();
        let (row, column) = grid.to_grid(WorldPoint::new(50.0, 100.0));
        assert_eq!((row, column), (-1, -1));
        assert!(!grid.is_valid(row, column));
        assert_eq!(grid.cell_at(WorldPoint::new(50.0, 100.0)), None);
    }

    #[test]
    fn cell_center_is_half_a_cell_from_corner() {
        let grid = main_grid();
        assert_eq!(
            grid.cell_center(CellCoord::new(0, 0)),
            WorldPoint::new(140.0, 190.0)
        );
    }

    #[test]
    fn path_columns_never_accept_items() {
        let mut grid = main_grid();
        let path = CellCoord::new(2, 7);
        assert!(!grid.can_place(path));
        assert!(!grid.occupy(path, Occupant::Item(ItemId::new(0))));
        grid.free(path);
        assert!(!grid.can_place(path));
    }

    #[test]
    fn occupy_fails_on_occupied_cell() {
        let mut grid = main_grid();
        let cell = CellCoord::new(1, 1);
        assert!(grid.occupy(cell, Occupant::Item(ItemId::new(0))));
        assert!(!grid.occupy(cell, Occupant::Item(ItemId::new(1))));
        assert_eq!(grid.occupant(cell), Some(Occupant::Item(ItemId::new(0))));
        assert_eq!(grid.info().occupied_cells, 1);

        grid.free(cell);
        assert!(grid.can_place(cell));
    }

    #[test]
    fn shared_grid_never_records_enemies() {
        let mut grid = main_grid();
        assert!(grid.admit_enemy(CellCoord::new(0, 8), EnemyId::new(0)));
        assert_eq!(grid.occupant(CellCoord::new(0, 8)), None);
    }

    #[test]
    fn exclusive_grid_admits_one_enemy_per_cell() {
        let mut grid = GridModel::new(&LevelConfig::mini().grid);
        let cell = CellCoord::new(0, 5);
        assert!(grid.admit_enemy(cell, EnemyId::new(0)));
        assert!(!grid.admit_enemy(cell, EnemyId::new(1)));

        grid.release(cell, Occupant::Enemy(EnemyId::new(1)));
        assert_eq!(grid.occupant(cell), Some(Occupant::Enemy(EnemyId::new(0))));
    }
}
