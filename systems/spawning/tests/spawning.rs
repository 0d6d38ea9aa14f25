use std::time::Duration;

use space_defense_core::{CellCoord, Command, Event, LevelConfig};
use space_defense_system_spawning::{Config, Spawning};
use space_defense_world::{self as world, query, World};

fn main_world() -> World {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureLevel {
            config: LevelConfig::main(),
        },
        &mut events,
    );
    world
}

fn pump(world: &mut World, spawning: &mut Spawning, millis: u64) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
        &mut events,
    );
    let enemies = query::enemy_view(world);
    let mut commands = Vec::new();
    spawning.handle(
        &events,
        &enemies,
        query::occupancy_view(world),
        &mut commands,
    );
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

#[test]
fn spawns_once_per_interval_in_rightmost_column() {
    let mut world = main_world();
    let mut spawning = Spawning::new(Config::new(0x5eed));

    let quiet = pump(&mut world, &mut spawning, 2_999);
    assert!(!quiet
        .iter()
        .any(|event| matches!(event, Event::EnemySpawned { .. })));

    let events = pump(&mut world, &mut spawning, 1);
    let spawned: Vec<CellCoord> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].column(), 8);
}

#[test]
fn probing_fills_every_row_then_skips() {
    let mut world = main_world();
    let mut spawning = Spawning::new(Config::new(42));

    for _ in 0..7 {
        let _ = pump(&mut world, &mut spawning, 3_000);
    }

    let mut rows: Vec<u32> = query::enemy_view(&world)
        .iter()
        .map(|enemy| {
            assert_eq!(enemy.cell.column(), 8);
            enemy.cell.row()
        })
        .collect();
    rows.sort_unstable();
    assert_eq!(rows, vec![0, 1, 2, 3, 4]);
}

#[test]
fn same_seed_replays_same_rows() {
    let rows_for = |seed: u64| {
        let mut world = main_world();
        let mut spawning = Spawning::new(Config::new(seed));
        let mut rows = Vec::new();
        for _ in 0..3 {
            for event in pump(&mut world, &mut spawning, 3_000) {
                if let Event::EnemySpawned { cell, .. } = event {
                    rows.push(cell.row());
                }
            }
        }
        rows
    };

    assert_eq!(rows_for(0xdead_beef), rows_for(0xdead_beef));
}
