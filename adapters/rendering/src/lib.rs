#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Space Defense adapters.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use anyhow::Result as AnyResult;
use glam::Vec2;
use space_defense_core::{
    AxeId, CellCoord, EnemyId, Event, ItemId, ItemKind, ProjectileId, TokenId, WorldPoint,
};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

/// Converts a world position into the vector type used by backends.
#[must_use]
pub fn to_vec2(point: WorldPoint) -> Vec2 {
    Vec2::new(point.x, point.y)
}

/// Converts a backend vector into a world position.
#[must_use]
pub fn to_world_point(vector: Vec2) -> WorldPoint {
    WorldPoint::new(vector.x, vector.y)
}

/// Pointer transition captured by an adapter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// The primary button went down.
    Down(Vec2),
    /// The pointer moved.
    Move(Vec2),
    /// The primary button was released.
    Up(Vec2),
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Pointer transitions in the order they happened, in world units.
    pub pointer: Vec<PointerEvent>,
    /// Whether the escape key was pressed on this frame.
    pub escape_pressed: bool,
}

impl FrameInput {
    /// Returns `true` when nothing happened on this frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pointer.is_empty() && !self.escape_pressed
    }
}

/// Transient effects drawn on top of the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectKind {
    /// Projectile impact on an enemy.
    Hit,
    /// Axe strike on an item.
    Strike,
    /// Explosive detonation.
    Explosion,
}

impl EffectKind {
    /// Radius of the effect circle when it spawns.
    #[must_use]
    pub const fn radius(self) -> f32 {
        match self {
            Self::Hit => 15.0,
            Self::Strike => 20.0,
            Self::Explosion => 60.0,
        }
    }

    /// Scale reached when the effect finishes.
    #[must_use]
    pub const fn final_scale(self) -> f32 {
        match self {
            Self::Hit | Self::Explosion => 2.0,
            Self::Strike => 1.5,
        }
    }

    /// Opacity when the effect spawns; it fades to zero.
    #[must_use]
    pub const fn initial_alpha(self) -> f32 {
        match self {
            Self::Hit | Self::Explosion => 0.8,
            Self::Strike => 0.6,
        }
    }

    /// Lifetime of the effect.
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::Hit | Self::Strike => Duration::from_millis(300),
            Self::Explosion => Duration::from_millis(800),
        }
    }

    /// Fill color of the effect.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Hit => Color::from_rgb_u8(0xff, 0x00, 0x00),
            Self::Strike => Color::from_rgb_u8(0xff, 0xff, 0x00),
            Self::Explosion => Color::from_rgb_u8(0xff, 0x66, 0x00),
        }
    }
}

/// Kinds of visuals a substrate is asked to create.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisualKind {
    /// A placed or staged item.
    Item(ItemKind),
    /// An enemy unit.
    Enemy,
    /// A shooter projectile.
    Projectile,
    /// An axe next to a blocked enemy.
    Axe,
    /// A collectible token.
    Token,
    /// An unclaimed plate.
    Plate,
    /// A transient effect.
    Effect(EffectKind),
}

/// Stable identity of a scene sprite across frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteKey {
    /// Sprite of an item.
    Item(ItemId),
    /// Sprite of an enemy.
    Enemy(EnemyId),
    /// Sprite of a projectile.
    Projectile(ProjectileId),
    /// Sprite of an axe.
    Axe(AxeId),
    /// Sprite of a token.
    Token(TokenId),
    /// Sprite of an unclaimed plate.
    Plate(CellCoord),
}

/// Sprite that should be visible this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSprite {
    /// Identity used to match the sprite across frames.
    pub key: SpriteKey,
    /// What the sprite depicts.
    pub kind: VisualKind,
    /// Centre of the sprite in world units.
    pub position: Vec2,
}

impl SceneSprite {
    /// Creates a new scene sprite.
    #[must_use]
    pub const fn new(key: SpriteKey, kind: VisualKind, position: Vec2) -> Self {
        Self {
            key,
            kind,
            position,
        }
    }
}

/// Effect that starts on this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectCue {
    /// Effect to play.
    pub kind: EffectKind,
    /// Centre of the effect in world units.
    pub position: Vec2,
}

/// Derives the effects announced by a batch of world events.
#[must_use]
pub fn effect_cues(events: &[Event]) -> Vec<EffectCue> {
    events
        .iter()
        .filter_map(|event| {
            let (kind, position) = match event {
                Event::EnemyHit { position, .. } => (EffectKind::Hit, *position),
                Event::ItemDamaged { position, .. } => (EffectKind::Strike, *position),
                Event::ExplosionTriggered { position, .. } => (EffectKind::Explosion, *position),
                _ => return None,
            };
            Some(EffectCue {
                kind,
                position: to_vec2(position),
            })
        })
        .collect()
}

/// Declarative description of one frame.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Scene {
    /// Every sprite that should be visible.
    pub sprites: Vec<SceneSprite>,
    /// Effects that start on this frame.
    pub effects: Vec<EffectCue>,
    /// Electricity counter shown in the toolbar.
    pub electricity: u32,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Opaque handle to a visual owned by a substrate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(u64);

impl VisualHandle {
    /// Wraps a substrate-specific identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the substrate-specific identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Drawing primitives a backend provides.
pub trait VisualSubstrate {
    /// Creates a visual of `kind` centred on `position`.
    fn spawn_visual(&mut self, kind: VisualKind, position: Vec2) -> VisualHandle;
    /// Moves a visual.
    fn set_position(&mut self, handle: VisualHandle, position: Vec2);
    /// Scales a visual relative to its spawn size.
    fn set_scale(&mut self, handle: VisualHandle, scale: f32);
    /// Changes the opacity of a visual.
    fn set_alpha(&mut self, handle: VisualHandle, alpha: f32);
    /// Destroys a visual. Unknown handles are ignored.
    fn destroy(&mut self, handle: VisualHandle);
}

/// Whether a backend keeps running after a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameControl {
    /// Render another frame.
    Continue,
    /// Stop the backend.
    Exit,
}

/// Rendering backend capable of presenting Space Defense scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta
    /// and the input captured by the adapter, rewrites the scene before it is
    /// rendered, and decides whether the backend keeps running.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl + 'static;
}

const BLINK_HALF_PERIOD: Duration = Duration::from_millis(200);
const BLINK_CYCLES: u32 = 4;
const BLINK_MIN_ALPHA: f32 = 0.3;

#[derive(Clone, Copy, Debug)]
struct LiveSprite {
    handle: VisualHandle,
    position: Vec2,
}

#[derive(Clone, Copy, Debug)]
struct ActiveEffect {
    kind: EffectKind,
    handle: VisualHandle,
    elapsed: Duration,
}

/// Keeps substrate visuals in step with successive scenes.
#[derive(Debug, Default)]
pub struct VisualSync {
    live: BTreeMap<SpriteKey, LiveSprite>,
    effects: Vec<ActiveEffect>,
    blinks: BTreeMap<SpriteKey, Duration>,
}

impl VisualSync {
    /// Creates a synchroniser that owns no visuals yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sprites currently mirrored on the substrate.
    #[must_use]
    pub fn live_sprites(&self) -> usize {
        self.live.len()
    }

    /// Number of effects still animating.
    #[must_use]
    pub fn active_effects(&self) -> usize {
        self.effects.len()
    }

    /// Reconciles the substrate with `scene`, starts its effects and
    /// advances every animation by `dt`.
    pub fn present<S>(&mut self, scene: &Scene, dt: Duration, substrate: &mut S)
    where
        S: VisualSubstrate,
    {
        self.reconcile(&scene.sprites, substrate);
        for cue in &scene.effects {
            let handle = substrate.spawn_visual(VisualKind::Effect(cue.kind), cue.position);
            substrate.set_alpha(handle, cue.kind.initial_alpha());
            self.effects.push(ActiveEffect {
                kind: cue.kind,
                handle,
                elapsed: Duration::ZERO,
            });
        }
        self.animate(dt, substrate);
    }

    fn reconcile<S>(&mut self, sprites: &[SceneSprite], substrate: &mut S)
    where
        S: VisualSubstrate,
    {
        let wanted: BTreeSet<SpriteKey> = sprites.iter().map(|sprite| sprite.key).collect();
        let stale: Vec<SpriteKey> = self
            .live
            .keys()
            .filter(|key| !wanted.contains(key))
            .copied()
            .collect();
        for key in stale {
            if let Some(live) = self.live.remove(&key) {
                substrate.destroy(live.handle);
            }
            let _ = self.blinks.remove(&key);
        }

        for sprite in sprites {
            match self.live.get_mut(&sprite.key) {
                Some(live) => {
                    if live.position != sprite.position {
                        substrate.set_position(live.handle, sprite.position);
                        live.position = sprite.position;
                    }
                }
                None => {
                    let handle = substrate.spawn_visual(sprite.kind, sprite.position);
                    let _ = self.live.insert(
                        sprite.key,
                        LiveSprite {
                            handle,
                            position: sprite.position,
                        },
                    );
                    if sprite.kind == VisualKind::Token {
                        let _ = self.blinks.insert(sprite.key, Duration::ZERO);
                    }
                }
            }
        }
    }

    fn animate<S>(&mut self, dt: Duration, substrate: &mut S)
    where
        S: VisualSubstrate,
    {
        self.effects.retain_mut(|effect| {
            effect.elapsed = effect.elapsed.saturating_add(dt);
            let duration = effect.kind.duration();
            if effect.elapsed >= duration {
                substrate.destroy(effect.handle);
                return false;
            }
            let linear = effect.elapsed.as_secs_f32() / duration.as_secs_f32();
            let progress = match effect.kind {
                EffectKind::Explosion => ease_out_cubic(linear),
                EffectKind::Hit | EffectKind::Strike => linear,
            };
            let scale = 1.0 + (effect.kind.final_scale() - 1.0) * progress;
            substrate.set_scale(effect.handle, scale);
            substrate.set_alpha(effect.handle, effect.kind.initial_alpha() * (1.0 - progress));
            true
        });

        let live = &self.live;
        self.blinks.retain(|key, elapsed| {
            let Some(sprite) = live.get(key) else {
                return false;
            };
            *elapsed = elapsed.saturating_add(dt);
            let alpha = blink_alpha(*elapsed);
            substrate.set_alpha(sprite.handle, alpha.unwrap_or(1.0));
            alpha.is_some()
        });
    }
}

/// Opacity of a blinking token, or `None` once the blink is over.
fn blink_alpha(elapsed: Duration) -> Option<f32> {
    let half = BLINK_HALF_PERIOD.as_millis();
    let elapsed = elapsed.as_millis();
    if elapsed >= half * u128::from(2 * BLINK_CYCLES) {
        return None;
    }
    let within = (elapsed % half) as f32 / half as f32;
    let fade = if (elapsed / half) % 2 == 0 {
        within
    } else {
        1.0 - within
    };
    Some(1.0 - (1.0 - BLINK_MIN_ALPHA) * fade)
}

fn ease_out_cubic(t: f32) -> f32 {
    let inverse = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inverse * inverse * inverse
}
