//! Per-frame combat phases, detonation and entity removal.

use space_defense_core::{
    shot_ready, CellCoord, DestroyCause, EnemyId, Event, ItemId, ItemKind, ItemSite, Occupant,
    ProjectileId, WorldPoint,
};
use tracing::{debug, info};

use crate::World;

impl World {
    pub(crate) fn fire(&mut self, id: ItemId, out_events: &mut Vec<Event>) {
        let now = self.scheduler.now();
        let cooldown = self.config.timing.fire_cooldown();
        let muzzle = self.config.tuning.muzzle_offset;

        let position = {
            let Some(item) = self.registry.items.get_mut(&id) else {
                return;
            };
            if item.kind != ItemKind::Shooter || item.site.placed_cell().is_none() {
                return;
            }
            if !shot_ready(item.last_shot, now, cooldown) {
                return;
            }
            item.last_shot = Some(now);
            item.position.offset(muzzle, 0.0)
        };

        let projectile = self.registry.insert_projectile(id, position);
        out_events.push(Event::ProjectileFired {
            projectile,
            item: id,
            position,
        });
    }

    pub(crate) fn interpolate_enemies(&mut self) {
        let now = self.scheduler.now();
        let duration = self.config.timing.enemy_move().as_secs_f32();
        for enemy in self.registry.enemies.values_mut() {
            let Some(motion) = enemy.motion else {
                continue;
            };
            let elapsed = now.saturating_sub(motion.started).as_secs_f32();
            let progress = if duration > 0.0 {
                (elapsed / duration).clamp(0.0, 1.0)
            } else {
                1.0
            };
            enemy.position = lerp(motion.from, motion.to, ease_out_cubic(progress));
        }
    }

    /// Advances every projectile and resolves the first enemy it overlaps.
    pub(crate) fn resolve_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let speed = self.config.tuning.projectile_speed;
        let radius = self.config.tuning.projectile_radius;
        let half_extent = self.config.tuning.enemy_extent / 2.0;
        let width = self.config.tuning.viewport_width;

        let ids: Vec<ProjectileId> = self.registry.projectiles.keys().copied().collect();
        for id in ids {
            let Some(projectile) = self.registry.projectiles.get_mut(&id) else {
                continue;
            };
            projectile.position.x += speed;
            let position = projectile.position;

            let target = self
                .registry
                .enemies
                .iter()
                .find(|(_, enemy)| circle_hits_box(position, radius, enemy.position, half_extent))
                .map(|(enemy, _)| *enemy);

            if let Some(enemy) = target {
                let _ = self.registry.projectiles.remove(&id);
                out_events.push(Event::ProjectileRemoved { projectile: id });
                self.hit_enemy(enemy, out_events);
            } else if position.x > width {
                let _ = self.registry.projectiles.remove(&id);
                out_events.push(Event::ProjectileRemoved { projectile: id });
            }
        }
    }

    fn hit_enemy(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.registry.enemies.get_mut(&id) else {
            return;
        };
        enemy.health = enemy.health.damaged();
        let health = enemy.health;
        out_events.push(Event::EnemyHit {
            enemy: id,
            health,
            position: enemy.position,
        });
        if health.is_depleted() {
            self.remove_enemy(id, DestroyCause::Depleted, out_events);
        }
    }

    /// Lets every axe strike the item in front of its anchor once per cooldown.
    pub(crate) fn resolve_melee(&mut self, out_events: &mut Vec<Event>) {
        let now = self.scheduler.now();
        let cooldown = self.config.timing.melee_cooldown();

        let axes: Vec<_> = self
            .registry
            .axes
            .iter()
            .map(|(id, axe)| (*id, axe.cell))
            .collect();
        for (axe_id, anchor) in axes {
            let Some(target) = anchor.front() else {
                continue;
            };
            let Some(Occupant::Item(item_id)) = self.grid.occupant(target) else {
                continue;
            };
            let Some(axe) = self.registry.axes.get_mut(&axe_id) else {
                continue;
            };
            if matches!(axe.last_strike, Some(last) if now.saturating_sub(last) < cooldown) {
                continue;
            }
            let Some(item) = self.registry.items.get_mut(&item_id) else {
                continue;
            };
            axe.last_strike = Some(now);
            item.health = item.health.damaged();
            let health = item.health;
            out_events.push(Event::ItemDamaged {
                item: item_id,
                health,
                position: item.position,
            });
            if health.is_depleted() {
                self.destroy_item(item_id, DestroyCause::Depleted, out_events);
            }
        }
    }

    /// Clears the 3×3 neighbourhood around `center`.
    pub(crate) fn detonate(&mut self, center: CellCoord, out_events: &mut Vec<Event>) {
        let position = self.grid.cell_center(center);
        info!(row = center.row(), column = center.column(), "explosion");
        out_events.push(Event::ExplosionTriggered {
            cell: center,
            position,
        });

        for cell in center.neighbourhood(self.grid.rows(), self.grid.columns()) {
            if let Some(Occupant::Item(item)) = self.grid.occupant(cell) {
                self.destroy_item(item, DestroyCause::Detonation, out_events);
            }
            for enemy in self.registry.enemies_at(cell) {
                self.remove_enemy(enemy, DestroyCause::Detonation, out_events);
            }
            self.retire_axe(cell, out_events);
        }
    }

    pub(crate) fn produce(&mut self, id: ItemId, cell: CellCoord, out_events: &mut Vec<Event>) {
        let still_home = self
            .registry
            .items
            .get(&id)
            .map_or(false, |item| item.site == ItemSite::Placed(cell));
        if !still_home {
            return;
        }

        let position = self
            .grid
            .cell_center(cell)
            .offset(0.0, -self.config.tuning.token_lift);
        let token = self.registry.insert_token(id, position);
        info!(item = id.get(), token = token.get(), "token produced");
        out_events.push(Event::TokenProduced {
            token,
            item: id,
            position,
        });
    }

    /// Removes an item, its timer, its grid slot and the axe aiming at it.
    pub(crate) fn destroy_item(&mut self, id: ItemId, cause: DestroyCause, out_events: &mut Vec<Event>) {
        let Some(item) = self.registry.items.remove(&id) else {
            return;
        };
        if let Some(timer) = item.timer {
            let _ = self.scheduler.cancel(timer);
        }
        info!(item = id.get(), kind = ?item.kind, ?cause, "item destroyed");
        out_events.push(Event::ItemDestroyed { item: id, cause });

        if let ItemSite::Placed(cell) = item.site {
            self.grid.release(cell, Occupant::Item(id));
            if let Some(anchor) = cell.rear() {
                self.retire_axe(anchor, out_events);
            }
        }
    }

    pub(crate) fn remove_enemy(&mut self, id: EnemyId, cause: DestroyCause, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.registry.enemies.remove(&id) else {
            return;
        };
        self.grid.release(enemy.cell, Occupant::Enemy(id));
        info!(enemy = id.get(), ?cause, "enemy removed");
        out_events.push(Event::EnemyRemoved {
            enemy: id,
            cell: enemy.cell,
            cause,
        });
        self.retire_axe(enemy.cell, out_events);
    }

    pub(crate) fn retire_axe(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) {
        if let Some(axe) = self.registry.remove_axe_at(cell) {
            debug!(axe = axe.get(), "axe retired");
            out_events.push(Event::AxeRetired { axe, cell });
        }
    }
}

/// Circle against an axis-aligned box centred on `center`; touching counts.
fn circle_hits_box(circle: WorldPoint, radius: f32, center: WorldPoint, half_extent: f32) -> bool {
    let closest_x = circle.x.clamp(center.x - half_extent, center.x + half_extent);
    let closest_y = circle.y.clamp(center.y - half_extent, center.y + half_extent);
    let dx = circle.x - closest_x;
    let dy = circle.y - closest_y;
    dx * dx + dy * dy <= radius * radius
}

fn ease_out_cubic(progress: f32) -> f32 {
    let inverse = 1.0 - progress;
    1.0 - inverse * inverse * inverse
}

fn lerp(from: WorldPoint, to: WorldPoint, t: f32) -> WorldPoint {
    WorldPoint::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t)
}
