#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Space Defense levels headlessly.

mod headless;
mod scene;
mod script;

use std::{cell::RefCell, collections::BTreeMap, fs, path::PathBuf, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use space_defense_core::{ItemSite, LevelConfig};
use space_defense_rendering::{
    to_world_point, Color, FrameControl, FrameInput, PointerEvent, Presentation, RenderingBackend,
};
use space_defense_simulation::Simulation;
use space_defense_world::query;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{headless::HeadlessBackend, scene::build_scene, script::Script};

const CLEAR_COLOR: Color = Color::from_rgb_u8(0x10, 0x12, 0x2b);

/// Runs a Space Defense level without a window.
#[derive(Parser, Debug)]
#[command(name = "space-defense", about = "Runs a Space Defense level headlessly")]
struct Args {
    /// Built-in level to run when no level file is given.
    #[arg(long, value_enum, default_value_t = LevelArg::Main)]
    level: LevelArg,

    /// TOML level file replacing the built-in level.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TOML input script replayed during the run.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Simulated time after which the run stops.
    #[arg(long, default_value_t = 60_000)]
    duration_ms: u64,

    /// Simulated time covered by each frame.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,

    /// Seed for plate dealing and enemy spawning.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Built-in levels.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LevelArg {
    /// Open-ended defense.
    Main,
    /// Plate mini-game.
    Mini,
}

/// Entry point for the Space Defense command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let level = load_level(&args)?;
    let frame = Duration::from_millis(args.frame_ms);
    let inputs = match &args.script {
        Some(path) => Script::load(path)?.compile(&level, frame)?,
        None => BTreeMap::new(),
    };

    let simulation =
        Simulation::new(level, args.seed).context("failed to start the level")?;
    let shared = Rc::new(RefCell::new(simulation));
    let presentation = Presentation::new(
        "Space Defense",
        CLEAR_COLOR,
        build_scene(&shared.borrow()),
    );

    let duration = Duration::from_millis(args.duration_ms);
    let frame_simulation = Rc::clone(&shared);
    let mut elapsed = Duration::ZERO;
    HeadlessBackend::new(frame, inputs).run(presentation, move |dt, input, scene| {
        let mut simulation = frame_simulation.borrow_mut();
        route_input(&mut simulation, input);
        simulation.advance(dt);
        *scene = build_scene(&simulation);

        elapsed = elapsed.saturating_add(dt);
        if simulation.transition().is_some() || elapsed >= duration {
            FrameControl::Exit
        } else {
            FrameControl::Continue
        }
    })?;

    print_summary(&shared.borrow());
    Ok(())
}

fn load_level(args: &Args) -> Result<LevelConfig> {
    let Some(path) = &args.config else {
        return Ok(match args.level {
            LevelArg::Main => LevelConfig::main(),
            LevelArg::Mini => LevelConfig::mini(),
        });
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    let level: LevelConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse level file {}", path.display()))?;
    level
        .validate()
        .with_context(|| format!("invalid level file {}", path.display()))?;
    info!(path = %path.display(), variant = ?level.variant, "level file loaded");
    Ok(level)
}

fn route_input(simulation: &mut Simulation, input: FrameInput) {
    for event in input.pointer {
        match event {
            PointerEvent::Down(position) => {
                if let Some(hit) = simulation.pointer_down(to_world_point(position)) {
                    debug!(?hit, "pointer down");
                }
            }
            PointerEvent::Move(position) => simulation.pointer_move(to_world_point(position)),
            PointerEvent::Up(position) => {
                if let Some(outcome) = simulation.pointer_up(to_world_point(position)) {
                    debug!(?outcome, "drop resolved");
                }
            }
        }
    }
    if input.escape_pressed {
        simulation.escape();
    }
}

fn print_summary(simulation: &Simulation) {
    let world = simulation.world();
    let items = query::item_view(world);
    let placed = items
        .iter()
        .filter(|item| matches!(item.site, ItemSite::Placed(_)))
        .count();
    let staged = items.iter().count() - placed;

    println!(
        "scene: {:?}, simulated time: {} ms",
        query::config(world).variant.scene(),
        query::now(world).as_millis()
    );
    println!("electricity: {}", query::electricity(world));
    println!("enemies alive: {}", query::enemy_view(world).len());
    println!("items placed: {placed} (staged: {staged})");
    println!("timers armed: {}", query::pending_timers(world));
    if query::config(world).slots.is_some() {
        println!("plates left: {}", query::remaining_slots(world));
    }
    match simulation.transition() {
        Some(target) => println!("transition: {target:?}"),
        None => println!("transition: none"),
    }
}
