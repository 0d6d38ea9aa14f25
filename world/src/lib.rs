#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Space Defense.

mod combat;
mod economy;
mod grid;
mod placement;
mod registry;
mod scheduler;

use std::{collections::BTreeMap, time::Duration};

use space_defense_core::{
    CellCoord, Command, EnemyId, Event, Health, ItemSite, LevelConfig, Occupant, SlotContent,
    TokenId,
};
use tracing::{debug, info, warn};

pub use grid::{GridInfo, GridModel};

use economy::Economy;
use registry::{Motion, Registry};
use scheduler::{Scheduler, TimerAction};

/// Represents the authoritative Space Defense world state.
#[derive(Debug)]
pub struct World {
    config: LevelConfig,
    grid: GridModel,
    registry: Registry,
    scheduler: Scheduler,
    economy: Economy,
    slots: BTreeMap<CellCoord, SlotContent>,
}

impl World {
    /// Creates an idle world laid out like the main level.
    ///
    /// No timers run until a level is configured through
    /// [`Command::ConfigureLevel`].
    #[must_use]
    pub fn new() -> Self {
        Self::build(LevelConfig::main())
    }

    fn build(config: LevelConfig) -> Self {
        Self {
            grid: GridModel::new(&config.grid),
            registry: Registry::new(),
            scheduler: Scheduler::new(),
            economy: Economy::default(),
            slots: BTreeMap::new(),
            config,
        }
    }

    fn configured(config: LevelConfig) -> Self {
        let march = config.timing.march_interval();
        let spawn = config.timing.spawn_interval();
        let mut world = Self::build(config);
        let _ = world
            .scheduler
            .schedule_repeating(march, TimerAction::March);
        if let Some(period) = spawn {
            let _ = world
                .scheduler
                .schedule_repeating(period, TimerAction::Spawn);
        }
        world
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        out_events.push(Event::TimeAdvanced { dt });
        let target = self.scheduler.now().saturating_add(dt);
        while let Some(action) = self.scheduler.pop_due(target) {
            self.run_timer(action, out_events);
        }
        self.scheduler.settle(target);
    }

    fn run_timer(&mut self, action: TimerAction, out_events: &mut Vec<Event>) {
        match action {
            TimerAction::March => out_events.push(Event::MarchDue),
            TimerAction::Spawn => out_events.push(Event::SpawnDue),
            TimerAction::Detonate(item) => {
                let cell = self
                    .registry
                    .items
                    .get(&item)
                    .and_then(|item| item.site.placed_cell());
                if let Some(cell) = cell {
                    self.detonate(cell, out_events);
                }
            }
            TimerAction::Produce { item, cell } => self.produce(item, cell, out_events),
            TimerAction::SettleEnemy(enemy) => {
                if let Some(enemy) = self.registry.enemies.get_mut(&enemy) {
                    if let Some(motion) = enemy.motion.take() {
                        enemy.position = motion.to;
                    }
                }
            }
        }
    }

    fn spawn_enemy(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) -> Option<EnemyId> {
        if !self.grid.contains(cell) {
            debug!(row = cell.row(), column = cell.column(), "spawn outside grid ignored");
            return None;
        }
        let id = self.registry.peek_enemy_id();
        if !self.grid.admit_enemy(cell, id) {
            debug!(row = cell.row(), column = cell.column(), "spawn cell taken");
            return None;
        }

        let health = Health::new(self.config.tuning.enemy_health);
        let enemy = self
            .registry
            .insert_enemy(cell, self.grid.cell_center(cell), health);
        info!(
            enemy = enemy.get(),
            row = cell.row(),
            column = cell.column(),
            "enemy spawned"
        );
        out_events.push(Event::EnemySpawned { enemy, cell });
        Some(enemy)
    }

    fn advance_enemy(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        let now = self.scheduler.now();
        let Some(enemy) = self.registry.enemies.get(&id) else {
            return;
        };
        if enemy.motion.is_some() {
            return;
        }
        let from = enemy.cell;
        let Some(to) = from.front() else {
            return;
        };
        if self.grid.occupant(to).is_some() {
            return;
        }

        self.grid.release(from, Occupant::Enemy(id));
        let _ = self.grid.admit_enemy(to, id);

        let destination = self.grid.cell_center(to);
        if let Some(enemy) = self.registry.enemies.get_mut(&id) {
            enemy.cell = to;
            enemy.motion = Some(Motion {
                from: enemy.position,
                to: destination,
                started: now,
            });
        }
        let _ = self.scheduler.schedule(
            self.config.timing.enemy_move(),
            TimerAction::SettleEnemy(id),
        );
        out_events.push(Event::EnemyAdvanced {
            enemy: id,
            from,
            to,
        });

        if self.registry.enemies_at(from).is_empty() {
            self.retire_axe(from, out_events);
        }
    }

    fn deploy_axe(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if self.registry.enemies_at(cell).is_empty() {
            return;
        }
        if let Some(axe) = self.registry.insert_axe(cell) {
            debug!(
                axe = axe.get(),
                row = cell.row(),
                column = cell.column(),
                "axe deployed"
            );
            out_events.push(Event::AxeDeployed { axe, cell });
        }
    }

    fn claim_slot(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        let Some(content) = self.slots.get(&cell).copied() else {
            return;
        };

        match content {
            SlotContent::Item(kind) => {
                let health = Health::new(self.config.tuning.item_health);
                let item = self.registry.insert_item(
                    kind,
                    ItemSite::Staged(cell),
                    self.grid.cell_center(cell),
                    health,
                );
                out_events.push(Event::ItemStaged {
                    item,
                    kind,
                    anchor: cell,
                });
            }
            SlotContent::Enemy => {
                if self.spawn_enemy(cell, out_events).is_none() {
                    return;
                }
            }
        }

        let _ = self.slots.remove(&cell);
        let remaining = self.slots.len();
        info!(
            row = cell.row(),
            column = cell.column(),
            remaining,
            "plate claimed"
        );
        out_events.push(Event::SlotClaimed { cell, remaining });
    }

    fn collect_token(&mut self, token: TokenId, out_events: &mut Vec<Event>) {
        if self.registry.tokens.remove(&token).is_none() {
            return;
        }
        let total = self.economy.deposit(self.config.tuning.token_reward);
        info!(token = token.get(), total, "electricity collected");
        out_events.push(Event::TokenCollected { token, total });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureLevel { config } => {
            if let Err(error) = config.validate() {
                warn!(%error, "ignoring invalid level configuration");
                return;
            }
            let variant = config.variant;
            *world = World::configured(config);
            info!(?variant, "level configured");
            out_events.push(Event::LevelConfigured { variant });
        }
        Command::SeedSlots { slots } => {
            world.slots = slots
                .into_iter()
                .filter(|(cell, _)| world.grid.contains(*cell))
                .collect();
        }
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::ResolveFrame => {
            world.interpolate_enemies();
            world.resolve_projectiles(out_events);
            world.resolve_melee(out_events);
        }
        Command::FireProjectile { item } => world.fire(item, out_events),
        Command::DropItem { source, position } => world.drop_item(source, position, out_events),
        Command::SpawnEnemy { cell } => {
            let _ = world.spawn_enemy(cell, out_events);
        }
        Command::AdvanceEnemy { enemy } => world.advance_enemy(enemy, out_events),
        Command::DeployAxe { cell } => world.deploy_axe(cell, out_events),
        Command::ClaimSlot { cell } => world.claim_slot(cell, out_events),
        Command::CollectToken { token } => world.collect_token(token, out_events),
        Command::RequestExit => {
            let target = world.config.variant.exit_scene();
            info!(?target, "exit requested");
            out_events.push(Event::SceneTransitionRequested { target });
        }
        Command::RequestTransition { target } => {
            info!(?target, "scene transition requested");
            out_events.push(Event::SceneTransitionRequested { target });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use space_defense_core::{
        AxeId, CellCoord, EnemyView, ItemId, ItemView, LevelConfig, OccupancyView, ProjectileId,
        TokenId, WorldPoint,
    };

    use super::{GridInfo, GridModel, TimerAction, World};

    /// Current simulated time.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.scheduler.now()
    }

    /// Configuration of the active level.
    #[must_use]
    pub fn config(world: &World) -> &LevelConfig {
        &world.config
    }

    /// Provides read-only access to the grid model.
    #[must_use]
    pub fn grid(world: &World) -> &GridModel {
        &world.grid
    }

    /// Total and occupied cell counts.
    #[must_use]
    pub fn grid_info(world: &World) -> GridInfo {
        world.grid.info()
    }

    /// Exposes a read-only view of the dense occupancy grid.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        world.grid.occupancy_view()
    }

    /// Captures a read-only view of every live item, staged or placed.
    #[must_use]
    pub fn item_view(world: &World) -> ItemView {
        ItemView::from_snapshots(world.registry.item_snapshots())
    }

    /// Captures a read-only view of every live enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.registry.enemy_snapshots())
    }

    /// Enumerates live projectiles in identifier order.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .registry
            .projectiles
            .iter()
            .map(|(id, projectile)| ProjectileSnapshot {
                id: *id,
                item: projectile.item,
                position: projectile.position,
            })
            .collect()
    }

    /// Enumerates live melee attackers in identifier order.
    #[must_use]
    pub fn axes(world: &World) -> Vec<AxeSnapshot> {
        world
            .registry
            .axes
            .iter()
            .map(|(id, axe)| AxeSnapshot {
                id: *id,
                cell: axe.cell,
                last_strike: axe.last_strike,
            })
            .collect()
    }

    /// Enumerates uncollected tokens in identifier order.
    #[must_use]
    pub fn tokens(world: &World) -> Vec<TokenSnapshot> {
        world
            .registry
            .tokens
            .iter()
            .map(|(id, token)| TokenSnapshot {
                id: *id,
                item: token.item,
                position: token.position,
            })
            .collect()
    }

    /// Electricity collected so far.
    #[must_use]
    pub fn electricity(world: &World) -> u32 {
        world.economy.electricity()
    }

    /// Plates that have not been claimed yet.
    #[must_use]
    pub fn unclaimed_slots(world: &World) -> Vec<CellCoord> {
        world.slots.keys().copied().collect()
    }

    /// Number of plates that have not been claimed yet.
    #[must_use]
    pub fn remaining_slots(world: &World) -> usize {
        world.slots.len()
    }

    /// Simulated time at which the march timer next fires.
    #[must_use]
    pub fn next_march(world: &World) -> Option<Duration> {
        world.scheduler.next_due(TimerAction::March)
    }

    /// Number of armed timers, including the level's periodic timers.
    #[must_use]
    pub fn pending_timers(world: &World) -> usize {
        world.scheduler.pending()
    }

    /// Immutable representation of a projectile.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Identifier of the projectile.
        pub id: ProjectileId,
        /// Shooter that fired it.
        pub item: ItemId,
        /// Current position.
        pub position: WorldPoint,
    }

    /// Immutable representation of a melee attacker.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AxeSnapshot {
        /// Identifier of the axe.
        pub id: AxeId,
        /// Anchor cell shared with the blocked enemy.
        pub cell: CellCoord,
        /// Time of the last strike, if any.
        pub last_strike: Option<Duration>,
    }

    /// Immutable representation of a collectible token.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct TokenSnapshot {
        /// Identifier of the token.
        pub id: TokenId,
        /// Producer that emitted it.
        pub item: ItemId,
        /// Position of the token.
        pub position: WorldPoint,
    }
}
