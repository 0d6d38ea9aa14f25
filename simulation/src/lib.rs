#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame pipeline that wires the world and the pure systems together.
//!
//! A [`Simulation`] owns the authoritative [`World`] and every system. Hosts
//! feed it pointer and keyboard input between frames and call
//! [`Simulation::advance`] once per rendered frame. Within a frame the clock
//! advances first, stopping at every march so marching and spawning react to
//! each firing at its own due time. Then shooters pick targets, projectiles
//! and axes resolve, and finally the completion checker inspects everything
//! that happened.

use std::time::Duration;

use space_defense_core::{
    CellCoord, Command, ConfigError, DragSource, Event, LevelConfig, SceneId, TokenId, WorldPoint,
    TOOLBAR_BOX_SIZE,
};
use space_defense_system_bootstrap::Bootstrap;
use space_defense_system_completion::Completion;
use space_defense_system_movement::Movement;
use space_defense_system_placement::{DropOutcome, Placement};
use space_defense_system_spawning::{Config as SpawningConfig, Spawning};
use space_defense_system_tower_combat::TowerCombat;
use space_defense_world::{self as world, query, World};
use tracing::{debug, info};

/// Fraction of a cell within which a pointer press collects a token.
const TOKEN_REACH: f32 = 0.4;

/// What a pointer press landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerHit {
    /// A token was collected.
    Token(TokenId),
    /// A drag gesture started.
    Drag(DragSource),
    /// An unclaimed plate was claimed.
    Plate(CellCoord),
}

/// Running level: world state, systems and pending input.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    movement: Movement,
    spawning: Spawning,
    tower_combat: TowerCombat,
    placement: Placement,
    completion: Option<Completion>,
    inbox: Vec<Event>,
    frame_events: Vec<Event>,
    commands: Vec<Command>,
    transition: Option<SceneId>,
}

impl Simulation {
    /// Starts a level from `config`; `seed` drives plate dealing and spawning.
    pub fn new(config: LevelConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = World::new();
        let mut commands = Vec::new();
        let mut inbox = Vec::new();
        Bootstrap::new(seed).start_level(config, &mut commands);
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut inbox);
        }

        let config = query::config(&world);
        let completion = config.slots.is_some().then(|| {
            Completion::new(
                config.timing.completion_delay(),
                config.variant.completion_scene(),
                query::remaining_slots(&world),
            )
        });
        info!(variant = ?config.variant, seed, "level started");

        Ok(Self {
            world,
            movement: Movement::new(),
            spawning: Spawning::new(SpawningConfig::new(seed)),
            tower_combat: TowerCombat::new(),
            placement: Placement::new(),
            completion,
            inbox,
            frame_events: Vec::new(),
            commands,
            transition: None,
        })
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Drag-and-drop state.
    #[must_use]
    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Events produced by the most recent frame, including input handled
    /// since the frame before it.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.frame_events
    }

    /// Scene requested by the level, once one has been requested.
    #[must_use]
    pub const fn transition(&self) -> Option<SceneId> {
        self.transition
    }

    /// Time left before a completed plate level leaves, if counting down.
    #[must_use]
    pub fn completion_pending(&self) -> Option<Duration> {
        self.completion.as_ref().and_then(Completion::pending)
    }

    /// Applies a host command outside the frame pipeline.
    ///
    /// Its events are reported with the next frame.
    pub fn submit(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.inbox);
        self.observe_inbox();
    }

    /// Runs one frame covering `dt` of simulated time.
    ///
    /// Does nothing but flush pending input once a scene transition has been
    /// requested.
    pub fn advance(&mut self, dt: Duration) {
        let mut events = std::mem::take(&mut self.inbox);
        if self.transition.is_some() {
            self.frame_events = events;
            return;
        }

        let mut remaining = dt;
        loop {
            let step = self.next_step(remaining);
            remaining = remaining.saturating_sub(step);
            let start = events.len();
            world::apply(&mut self.world, Command::Tick { dt: step }, &mut events);
            self.react_to_timers(start, &mut events);
            if remaining.is_zero() {
                break;
            }
        }

        let items = query::item_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.tower_combat.handle(
            query::now(&self.world),
            query::config(&self.world).timing.fire_cooldown(),
            &items,
            &enemies,
            &mut self.commands,
        );
        self.flush(&mut events);

        world::apply(&mut self.world, Command::ResolveFrame, &mut events);

        if let Some(completion) = self.completion.as_mut() {
            let enemies = query::enemy_view(&self.world);
            completion.handle(&events, &enemies, &mut self.commands);
        }
        self.flush(&mut events);

        if let Some(target) = requested_scene(&events) {
            self.enter_transition(target);
        }
        self.frame_events = events;
    }

    /// Routes a pointer press: tokens first, then draggable entities, then
    /// plates.
    pub fn pointer_down(&mut self, point: WorldPoint) -> Option<PointerHit> {
        if self.transition.is_some() {
            return None;
        }

        if let Some(token) = self.token_at(point) {
            self.submit(Command::CollectToken { token });
            return Some(PointerHit::Token(token));
        }

        if let Some((source, origin)) = self.draggable_at(point) {
            if self.placement.begin(source, origin) {
                debug!(?source, "drag started");
                return Some(PointerHit::Drag(source));
            }
            return None;
        }

        let cell = self.plate_at(point)?;
        self.submit(Command::ClaimSlot { cell });
        Some(PointerHit::Plate(cell))
    }

    /// Follows the pointer while a drag is active.
    pub fn pointer_move(&mut self, point: WorldPoint) {
        self.placement.drag_to(point);
    }

    /// Ends the active drag at `point` and resolves the drop immediately.
    pub fn pointer_up(&mut self, point: WorldPoint) -> Option<DropOutcome> {
        self.placement.end(point, &mut self.commands);
        if self.commands.is_empty() {
            return None;
        }

        let mut events = Vec::new();
        self.flush(&mut events);
        let outcome = self.placement.handle(&events);
        self.inbox.append(&mut events);
        outcome
    }

    /// Leaves the level through its exit scene.
    pub fn escape(&mut self) {
        self.submit(Command::RequestExit);
    }

    /// Clock advance that ends on the next march, so every march is decided
    /// at its own due time whatever the frame length.
    fn next_step(&self, remaining: Duration) -> Duration {
        let now = query::now(&self.world);
        match query::next_march(&self.world) {
            Some(due) if due > now && due - now < remaining => due - now,
            _ => remaining,
        }
    }

    /// Lets marching and spawning answer the timers fired since `start`.
    fn react_to_timers(&mut self, start: usize, events: &mut Vec<Event>) {
        let policy = query::config(&self.world).grid.enemy_occupancy;
        let enemies = query::enemy_view(&self.world);
        self.movement.handle(
            &events[start..],
            &enemies,
            query::occupancy_view(&self.world),
            policy,
            &mut self.commands,
        );
        self.flush(events);

        let enemies = query::enemy_view(&self.world);
        self.spawning.handle(
            &events[start..],
            &enemies,
            query::occupancy_view(&self.world),
            &mut self.commands,
        );
        self.flush(events);
    }

    fn flush(&mut self, events: &mut Vec<Event>) {
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, events);
        }
    }

    fn observe_inbox(&mut self) {
        if let Some(target) = requested_scene(&self.inbox) {
            self.enter_transition(target);
        }
    }

    fn enter_transition(&mut self, target: SceneId) {
        if self.transition.is_none() {
            info!(?target, "scene transition requested");
            self.transition = Some(target);
        }
    }

    fn token_at(&self, point: WorldPoint) -> Option<TokenId> {
        let reach = query::grid(&self.world).cell_size() * TOKEN_REACH;
        query::tokens(&self.world)
            .into_iter()
            .find(|token| token.position.distance(point) <= reach)
            .map(|token| token.id)
    }

    fn draggable_at(&self, point: WorldPoint) -> Option<(DragSource, WorldPoint)> {
        let half = query::grid(&self.world).cell_size() / 2.0;
        let item = query::item_view(&self.world)
            .into_vec()
            .into_iter()
            .rev()
            .filter(|item| item.draggable)
            .find(|item| within(item.position, point, half));
        if let Some(item) = item {
            return Some((DragSource::Item(item.id), item.position));
        }

        query::config(&self.world)
            .toolbar
            .iter()
            .find(|slot| within(slot.anchor(), point, TOOLBAR_BOX_SIZE / 2.0))
            .map(|slot| (DragSource::Toolbar(slot.kind), slot.anchor()))
    }

    fn plate_at(&self, point: WorldPoint) -> Option<CellCoord> {
        let cell = query::grid(&self.world).cell_at(point)?;
        query::unclaimed_slots(&self.world)
            .contains(&cell)
            .then_some(cell)
    }
}

fn within(center: WorldPoint, point: WorldPoint, half_extent: f32) -> bool {
    (point.x - center.x).abs() <= half_extent && (point.y - center.y).abs() <= half_extent
}

fn requested_scene(events: &[Event]) -> Option<SceneId> {
    events.iter().find_map(|event| match event {
        Event::SceneTransitionRequested { target } => Some(*target),
        _ => None,
    })
}
