//! Timed input scripts replayed by the headless runner.

use std::{collections::BTreeMap, fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;
use space_defense_core::{CellCoord, ItemKind, LevelConfig};
use space_defense_rendering::{to_vec2, FrameInput, PointerEvent};
use space_defense_world::GridModel;

/// Input steps keyed by the time they happen.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Script {
    #[serde(default, rename = "step")]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    at_ms: u64,
    #[serde(flatten)]
    action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Action {
    Drag { from: DragFrom, to: CellRef },
    Click { x: f32, y: f32 },
    Claim { cell: CellRef },
    Escape,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DragFrom {
    Toolbar(ItemKind),
    Cell(CellRef),
}

#[derive(Clone, Copy, Debug, Deserialize)]
struct CellRef {
    row: u32,
    column: u32,
}

impl Script {
    /// Reads a script from a TOML file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read input script {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse input script {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid input script toml contents")
    }

    /// Turns every step into pointer input for the frame it falls in.
    pub(crate) fn compile(
        &self,
        level: &LevelConfig,
        frame: Duration,
    ) -> Result<BTreeMap<u64, FrameInput>> {
        let grid = GridModel::new(&level.grid);
        let frame_ms = u64::try_from(frame.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);

        let mut frames: BTreeMap<u64, FrameInput> = BTreeMap::new();
        for step in &self.steps {
            let input = frames.entry(step.at_ms / frame_ms).or_default();
            match step.action {
                Action::Drag { from, to } => {
                    let start = match from {
                        DragFrom::Toolbar(kind) => match level.toolbar_slot(kind) {
                            Some(slot) => to_vec2(slot.anchor()),
                            None => bail!("level has no {kind:?} toolbar template"),
                        },
                        DragFrom::Cell(cell) => cell_center(&grid, cell)?,
                    };
                    let end = cell_center(&grid, to)?;
                    input.pointer.extend([
                        PointerEvent::Down(start),
                        PointerEvent::Move(start.lerp(end, 0.5)),
                        PointerEvent::Move(end),
                        PointerEvent::Up(end),
                    ]);
                }
                Action::Click { x, y } => {
                    let point = Vec2::new(x, y);
                    input
                        .pointer
                        .extend([PointerEvent::Down(point), PointerEvent::Up(point)]);
                }
                Action::Claim { cell } => {
                    let point = cell_center(&grid, cell)?;
                    input
                        .pointer
                        .extend([PointerEvent::Down(point), PointerEvent::Up(point)]);
                }
                Action::Escape => input.escape_pressed = true,
            }
        }
        Ok(frames)
    }
}

fn cell_center(grid: &GridModel, cell: CellRef) -> Result<Vec2> {
    let coord = CellCoord::new(cell.row, cell.column);
    if !grid.contains(coord) {
        bail!(
            "cell ({}, {}) lies outside the {}x{} grid",
            cell.row,
            cell.column,
            grid.rows(),
            grid.columns()
        );
    }
    Ok(to_vec2(grid.cell_center(coord)))
}
