use std::time::Duration;

use space_defense_core::{
    CellCoord, Command, DestroyCause, DragSource, EnemyId, Event, ItemKind, LevelConfig, Occupant,
    PlacementError, SceneId, SlotConfig, WorldPoint,
};
use space_defense_simulation::{PointerHit, Simulation};
use space_defense_system_placement::DropOutcome;
use space_defense_world::{self as world, query, World};

const FRAME: Duration = Duration::from_millis(16);

fn quiet_main() -> Simulation {
    let mut config = LevelConfig::main();
    config.timing.spawn_interval_ms = None;
    Simulation::new(config, 7).expect("valid level")
}

fn center(simulation: &Simulation, row: u32, column: u32) -> WorldPoint {
    query::grid(simulation.world()).cell_center(CellCoord::new(row, column))
}

fn anchor(kind: ItemKind) -> WorldPoint {
    LevelConfig::main()
        .toolbar_slot(kind)
        .map(|slot| slot.anchor())
        .expect("toolbar template")
}

fn place(simulation: &mut Simulation, kind: ItemKind, row: u32, column: u32) {
    let target = center(simulation, row, column);
    assert_eq!(
        simulation.pointer_down(anchor(kind)),
        Some(PointerHit::Drag(DragSource::Toolbar(kind)))
    );
    simulation.pointer_move(target);
    let outcome = simulation.pointer_up(target);
    assert!(
        matches!(outcome, Some(DropOutcome::Placed { cell, .. }) if cell == CellCoord::new(row, column)),
        "placing {kind:?} at ({row}, {column}) gave {outcome:?}"
    );
}

fn run(simulation: &mut Simulation, frame: Duration, total: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    let frames = total.as_millis() / frame.as_millis();
    for _ in 0..frames {
        simulation.advance(frame);
        events.extend_from_slice(simulation.events());
    }
    events
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

#[test]
fn grid_round_trips_every_cell() {
    let world = World::new();
    let grid = query::grid(&world);
    for row in 0..5 {
        for column in 0..9 {
            let corner = grid.to_world(CellCoord::new(row, column));
            assert_eq!(
                grid.to_grid(WorldPoint::new(corner.x + 1.0, corner.y + 1.0)),
                (i64::from(row), i64::from(column))
            );
        }
    }
}

#[test]
fn path_columns_never_accept_items() {
    let mut world = World::new();
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::ConfigureLevel {
            config: LevelConfig::main(),
        },
        &mut events,
    );

    let assert_path_closed = |world: &World| {
        let grid = query::grid(world);
        for row in 0..5 {
            for column in 7..9 {
                assert!(!grid.can_place(CellCoord::new(row, column)));
            }
        }
    };

    assert_path_closed(&world);
    for row in 0..5 {
        world::apply(
            &mut world,
            Command::SpawnEnemy {
                cell: CellCoord::new(row, 8),
            },
            &mut events,
        );
        for column in 0..7 {
            let position = query::grid(&world).cell_center(CellCoord::new(row, column));
            world::apply(
                &mut world,
                Command::DropItem {
                    source: DragSource::Toolbar(ItemKind::Producer),
                    position,
                },
                &mut events,
            );
        }
    }
    assert_eq!(query::grid_info(&world).occupied_cells, 35);
    assert_path_closed(&world);

    events.clear();
    let position = query::grid(&world).cell_center(CellCoord::new(0, 7));
    world::apply(
        &mut world,
        Command::DropItem {
            source: DragSource::Toolbar(ItemKind::Shooter),
            position,
        },
        &mut events,
    );
    assert!(matches!(
        events.as_slice(),
        [Event::PlacementRejected {
            reason: PlacementError::NotBuildable,
            ..
        }]
    ));
}

#[test]
fn explosive_clears_its_neighbourhood_only() {
    let mut simulation = quiet_main();
    for (row, column) in [(1, 1), (3, 3), (2, 1), (0, 0), (4, 4), (2, 4)] {
        place(&mut simulation, ItemKind::Producer, row, column);
    }
    for (row, column) in [(1, 3), (3, 2), (2, 5), (0, 8)] {
        simulation.submit(Command::SpawnEnemy {
            cell: CellCoord::new(row, column),
        });
    }
    place(&mut simulation, ItemKind::Explosive, 2, 2);

    let events = run(&mut simulation, Duration::from_millis(50), Duration::from_millis(250));

    assert_eq!(
        count(&events, |event| matches!(
            event,
            Event::ExplosionTriggered { cell, .. } if *cell == CellCoord::new(2, 2)
        )),
        1
    );

    let world = simulation.world();
    let mut item_cells: Vec<CellCoord> = query::item_view(world)
        .iter()
        .filter_map(|item| item.site.placed_cell())
        .collect();
    item_cells.sort_unstable();
    assert_eq!(
        item_cells,
        vec![
            CellCoord::new(0, 0),
            CellCoord::new(2, 4),
            CellCoord::new(4, 4)
        ]
    );

    let mut enemy_cells: Vec<CellCoord> = query::enemy_view(world)
        .iter()
        .map(|enemy| enemy.cell)
        .collect();
    enemy_cells.sort_unstable();
    assert_eq!(enemy_cells, vec![CellCoord::new(0, 8), CellCoord::new(2, 5)]);

    let grid = query::grid(world);
    for cell in CellCoord::new(2, 2).neighbourhood(5, 9) {
        assert_eq!(grid.occupant(cell), None, "{cell:?} still occupied");
    }
}

#[test]
fn shooter_waits_for_strictly_elapsed_cooldown() {
    let mut simulation = quiet_main();
    place(&mut simulation, ItemKind::Shooter, 3, 0);
    simulation.submit(Command::SpawnEnemy {
        cell: CellCoord::new(3, 8),
    });
    let fired = |simulation: &Simulation| {
        count(simulation.events(), |event| {
            matches!(event, Event::ProjectileFired { .. })
        })
    };

    simulation.advance(FRAME);
    assert_eq!(fired(&simulation), 1);

    simulation.advance(Duration::from_millis(500));
    assert_eq!(fired(&simulation), 0, "fired 500ms after the last shot");

    simulation.advance(Duration::from_millis(500));
    assert_eq!(fired(&simulation), 0, "fired exactly at the cooldown");

    simulation.advance(Duration::from_millis(1));
    assert_eq!(fired(&simulation), 1, "held fire 1001ms after the last shot");
}

#[test]
fn axe_strikes_once_per_cooldown_window_at_any_frame_rate() {
    let strikes_with = |frame: Duration| {
        let mut simulation = quiet_main();
        place(&mut simulation, ItemKind::Producer, 1, 5);
        simulation.submit(Command::SpawnEnemy {
            cell: CellCoord::new(1, 6),
        });

        let events = run(&mut simulation, frame, Duration::from_millis(9_100));
        let healths: Vec<u32> = events
            .iter()
            .filter_map(|event| match event {
                Event::ItemDamaged { health, .. } => Some(health.get()),
                _ => None,
            })
            .collect();
        assert_eq!(query::axes(simulation.world()).len(), 1);
        healths
    };

    assert_eq!(strikes_with(FRAME), vec![9, 8, 7, 6]);
    assert_eq!(strikes_with(Duration::from_millis(7)), vec![9, 8, 7, 6]);
    assert_eq!(strikes_with(Duration::from_millis(100)), vec![9, 8, 7, 6]);
}

#[test]
fn shot_down_enemy_takes_its_axe_along() {
    let mut simulation = quiet_main();
    place(&mut simulation, ItemKind::Shooter, 2, 0);
    place(&mut simulation, ItemKind::Producer, 2, 5);
    simulation.submit(Command::SpawnEnemy {
        cell: CellCoord::new(2, 6),
    });

    let events = run(&mut simulation, FRAME, Duration::from_millis(12_000));

    assert_eq!(
        count(&events, |event| matches!(event, Event::AxeDeployed { .. })),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(event, Event::EnemyHit { .. })),
        9
    );
    assert_eq!(
        count(&events, |event| matches!(
            event,
            Event::EnemyRemoved {
                enemy,
                cell,
                cause: DestroyCause::Depleted,
            } if *enemy == EnemyId::new(0) && *cell == CellCoord::new(2, 6)
        )),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(
            event,
            Event::AxeRetired { cell, .. } if *cell == CellCoord::new(2, 6)
        )),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(event, Event::ItemDestroyed { .. })),
        0
    );

    let world = simulation.world();
    assert!(query::enemy_view(world).is_empty());
    assert!(query::axes(world).is_empty());
    assert!(query::projectiles(world).is_empty());
}

#[test]
fn missed_projectile_leaves_past_the_viewport() {
    let mut simulation = quiet_main();
    place(&mut simulation, ItemKind::Shooter, 0, 6);
    simulation.submit(Command::SpawnEnemy {
        cell: CellCoord::new(0, 0),
    });

    let events = run(&mut simulation, FRAME, Duration::from_millis(992));

    assert_eq!(
        count(&events, |event| matches!(event, Event::ProjectileFired { .. })),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(event, Event::ProjectileRemoved { .. })),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(event, Event::EnemyHit { .. })),
        0
    );
    assert!(query::projectiles(simulation.world()).is_empty());
    assert_eq!(query::enemy_view(simulation.world()).len(), 1);
}

#[test]
fn chopped_down_producer_frees_its_cell_and_timer() {
    let mut simulation = quiet_main();
    place(&mut simulation, ItemKind::Producer, 1, 5);
    simulation.submit(Command::SpawnEnemy {
        cell: CellCoord::new(1, 6),
    });
    assert_eq!(query::pending_timers(simulation.world()), 2);

    let events = run(&mut simulation, FRAME, Duration::from_millis(20_096));

    let healths: Vec<u32> = events
        .iter()
        .filter_map(|event| match event {
            Event::ItemDamaged { health, .. } => Some(health.get()),
            _ => None,
        })
        .collect();
    assert_eq!(healths, (0..10).rev().collect::<Vec<u32>>());
    assert_eq!(
        count(&events, |event| matches!(
            event,
            Event::ItemDestroyed {
                cause: DestroyCause::Depleted,
                ..
            }
        )),
        1
    );
    assert_eq!(
        count(&events, |event| matches!(
            event,
            Event::AxeRetired { cell, .. } if *cell == CellCoord::new(1, 6)
        )),
        1
    );

    let world = simulation.world();
    assert_eq!(query::pending_timers(world), 1);
    assert_eq!(query::grid_info(world).occupied_cells, 0);
    assert_eq!(query::item_view(world).iter().count(), 0);
    assert!(query::axes(world).is_empty());

    place(&mut simulation, ItemKind::Shooter, 1, 5);
}

#[test]
fn repeated_invalid_drop_returns_to_the_same_spot() {
    let mut simulation = quiet_main();
    place(&mut simulation, ItemKind::Shooter, 1, 1);
    place(&mut simulation, ItemKind::Explosive, 4, 4);
    let origin = center(&simulation, 4, 4);
    let occupied = center(&simulation, 1, 1);
    let before = query::grid_info(simulation.world());

    for _ in 0..3 {
        let Some(PointerHit::Drag(DragSource::Item(explosive))) =
            simulation.pointer_down(origin)
        else {
            panic!("explosive should stay draggable");
        };
        simulation.pointer_move(WorldPoint::new(300.0, 300.0));
        assert_eq!(
            simulation.pointer_up(occupied),
            Some(DropOutcome::Rejected {
                reason: PlacementError::Occupied,
                return_to: origin,
            })
        );

        let world = simulation.world();
        assert_eq!(query::grid_info(world), before);
        assert_eq!(
            query::grid(world).occupant(CellCoord::new(4, 4)),
            Some(Occupant::Item(explosive))
        );
        let position = query::item_view(world)
            .iter()
            .find(|item| item.id == explosive)
            .map(|item| item.position);
        assert_eq!(position, Some(origin));
    }
}

#[test]
fn lone_enemy_marches_five_columns_in_ten_seconds() {
    let mut simulation = quiet_main();
    simulation.submit(Command::SpawnEnemy {
        cell: CellCoord::new(3, 8),
    });

    let events = run(&mut simulation, FRAME, Duration::from_millis(10_000));

    assert_eq!(
        count(&events, |event| matches!(
            event,
            Event::EnemyAdvanced {
                enemy,
                ..
            } if *enemy == EnemyId::new(0)
        )),
        5
    );
    let cells: Vec<CellCoord> = query::enemy_view(simulation.world())
        .iter()
        .map(|enemy| enemy.cell)
        .collect();
    assert_eq!(cells, vec![CellCoord::new(3, 3)]);
}

#[test]
fn coarse_frames_still_march_once_per_interval() {
    for frame_ms in [2_000, 5_000, 10_000] {
        let mut simulation = quiet_main();
        simulation.submit(Command::SpawnEnemy {
            cell: CellCoord::new(3, 8),
        });

        let events = run(
            &mut simulation,
            Duration::from_millis(frame_ms),
            Duration::from_millis(10_000),
        );

        assert_eq!(
            count(&events, |event| matches!(event, Event::MarchDue)),
            5,
            "frame of {frame_ms} ms"
        );
        assert_eq!(
            count(&events, |event| matches!(event, Event::EnemyAdvanced { .. })),
            5,
            "frame of {frame_ms} ms"
        );
        let cells: Vec<CellCoord> = query::enemy_view(simulation.world())
            .iter()
            .map(|enemy| enemy.cell)
            .collect();
        assert_eq!(cells, vec![CellCoord::new(3, 3)], "frame of {frame_ms} ms");
    }
}

#[test]
fn producer_token_pays_out_once() {
    let mut simulation = quiet_main();
    place(&mut simulation, ItemKind::Producer, 0, 0);

    let _ = run(
        &mut simulation,
        Duration::from_millis(100),
        Duration::from_millis(19_900),
    );
    assert!(query::tokens(simulation.world()).is_empty());

    simulation.advance(Duration::from_millis(100));
    let tokens = query::tokens(simulation.world());
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].position, WorldPoint::new(140.0, 150.0));

    let press = tokens[0].position.offset(10.0, -10.0);
    assert_eq!(
        simulation.pointer_down(press),
        Some(PointerHit::Token(tokens[0].id))
    );
    assert_eq!(simulation.pointer_down(press), None);
    assert_eq!(query::electricity(simulation.world()), 25);
    assert!(query::tokens(simulation.world()).is_empty());
}

#[test]
fn escape_leaves_through_the_variant_exit() {
    let mut main = quiet_main();
    main.escape();
    assert_eq!(main.transition(), Some(SceneId::Menu));

    let now = query::now(main.world());
    main.advance(FRAME);
    assert_eq!(query::now(main.world()), now);
    assert!(main
        .events()
        .iter()
        .any(|event| matches!(event, Event::SceneTransitionRequested { .. })));

    let mut mini = Simulation::new(LevelConfig::mini(), 3).expect("valid level");
    mini.escape();
    assert_eq!(mini.transition(), Some(SceneId::WorldMap));
}

#[test]
fn mini_level_completes_after_every_plate_is_claimed() {
    let mut config = LevelConfig::mini();
    config.slots = Some(SlotConfig {
        first_column: 3,
        last_column: 3,
        shooters: 5,
        explosives: 0,
    });
    let mut simulation = Simulation::new(config, 11).expect("valid level");
    assert_eq!(query::remaining_slots(simulation.world()), 5);

    for row in 0..5 {
        let plate = center(&simulation, row, 3);
        assert_eq!(
            simulation.pointer_down(plate),
            Some(PointerHit::Plate(CellCoord::new(row, 3)))
        );
    }
    assert_eq!(query::item_view(simulation.world()).iter().count(), 5);

    let step = Duration::from_millis(100);
    let _ = run(&mut simulation, step, Duration::from_millis(1_900));
    assert_eq!(simulation.completion_pending(), Some(step));
    assert_eq!(simulation.transition(), None);

    simulation.advance(step);
    assert_eq!(simulation.transition(), Some(SceneId::WorldMap));
}

#[test]
fn claimed_plate_stages_a_draggable_item() {
    let mut config = LevelConfig::mini();
    config.slots = Some(SlotConfig {
        first_column: 3,
        last_column: 3,
        shooters: 5,
        explosives: 0,
    });
    let mut simulation = Simulation::new(config, 5).expect("valid level");
    let plate = center(&simulation, 2, 3);
    let _ = simulation.pointer_down(plate);

    let hit = simulation.pointer_down(plate);
    assert!(matches!(hit, Some(PointerHit::Drag(DragSource::Item(_)))));
    let target = center(&simulation, 2, 1);
    let outcome = simulation.pointer_up(target);
    assert!(matches!(
        outcome,
        Some(DropOutcome::Placed { cell, .. }) if cell == CellCoord::new(2, 1)
    ));
    assert_eq!(query::remaining_slots(simulation.world()), 4);
}
