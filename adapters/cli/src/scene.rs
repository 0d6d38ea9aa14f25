//! Builds declarative scenes from simulation snapshots.

use space_defense_core::DragSource;
use space_defense_rendering::{effect_cues, to_vec2, Scene, SceneSprite, SpriteKey, VisualKind};
use space_defense_simulation::Simulation;
use space_defense_world::query;

/// Describes everything visible after the latest frame.
pub(crate) fn build_scene(simulation: &Simulation) -> Scene {
    let world = simulation.world();
    let grid = query::grid(world);
    let dragged = simulation
        .placement()
        .dragging()
        .and_then(|session| match session.source {
            DragSource::Item(item) => Some((item, session.position)),
            DragSource::Toolbar(_) => None,
        });

    let mut sprites: Vec<SceneSprite> = query::unclaimed_slots(world)
        .into_iter()
        .map(|cell| {
            SceneSprite::new(
                SpriteKey::Plate(cell),
                VisualKind::Plate,
                to_vec2(grid.cell_center(cell)),
            )
        })
        .collect();

    for item in query::item_view(world).iter() {
        let position = match dragged {
            Some((id, pointer)) if id == item.id => pointer,
            _ => item.position,
        };
        sprites.push(SceneSprite::new(
            SpriteKey::Item(item.id),
            VisualKind::Item(item.kind),
            to_vec2(position),
        ));
    }
    for enemy in query::enemy_view(world).iter() {
        sprites.push(SceneSprite::new(
            SpriteKey::Enemy(enemy.id),
            VisualKind::Enemy,
            to_vec2(enemy.position),
        ));
    }
    for projectile in query::projectiles(world) {
        sprites.push(SceneSprite::new(
            SpriteKey::Projectile(projectile.id),
            VisualKind::Projectile,
            to_vec2(projectile.position),
        ));
    }
    for axe in query::axes(world) {
        sprites.push(SceneSprite::new(
            SpriteKey::Axe(axe.id),
            VisualKind::Axe,
            to_vec2(grid.cell_center(axe.cell)),
        ));
    }
    for token in query::tokens(world) {
        sprites.push(SceneSprite::new(
            SpriteKey::Token(token.id),
            VisualKind::Token,
            to_vec2(token.position),
        ));
    }

    Scene {
        sprites,
        effects: effect_cues(simulation.events()),
        electricity: query::electricity(world),
    }
}
