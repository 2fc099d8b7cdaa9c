//! Components, session record, and asset handles
//!
//! Entities carry an open set of these components inside [`crate::World`].
//! Everything the pipeline and scheduler callbacks mutate is bundled into the
//! single exclusively-owned [`Session`] record; nothing gameplay-related is
//! global.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::ecs::{Entity, World};
use crate::tuning::Tuning;

/// Current phase of the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Ball rests on the paddle, awaiting launch input
    Aiming,
    /// Simulation active
    Playing,
    /// Frozen; deferred effects do not advance
    Paused,
    /// Terminal per level/run (win or lose)
    Score,
}

/// Logical input events, device-agnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Left,
    Right,
    Confirm,
    Cancel,
}

/// Linear velocity applied each fixed tick
#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec2);

/// Block durability and its score value on destruction
#[derive(Debug, Clone, Copy)]
pub struct Life {
    pub hp: f32,
    pub reward: u32,
}

impl Default for Life {
    fn default() -> Self {
        Self {
            hp: 1.0,
            reward: 200,
        }
    }
}

impl Life {
    pub fn new(hp: f32) -> Self {
        Self {
            hp,
            ..Self::default()
        }
    }
}

/// Opaque texture handle supplied by the asset collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureId(pub u32);

/// Presentation-only texture reference; `None` renders as a solid fill
#[derive(Debug, Clone, Copy, Default)]
pub struct Sprite {
    pub texture: Option<TextureId>,
}

/// Effect applied when a pickup reaches the paddle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    Triplet,
    EnlargePaddle,
    Laser,
}

impl PickupKind {
    pub const ALL: [PickupKind; 3] = [
        PickupKind::Triplet,
        PickupKind::EnlargePaddle,
        PickupKind::Laser,
    ];
}

#[derive(Debug, Clone, Copy)]
pub struct Pickup {
    pub kind: PickupKind,
}

/// Child tracks its parent's position plus a fixed offset every tick.
/// A dead parent destroys the child immediately.
#[derive(Debug, Clone, Copy)]
pub struct Attach {
    pub parent: Entity,
    pub offset: Vec2,
}

// Marker tags: presence is truth
pub struct Collidable;
pub struct Block;
pub struct Paddle;
pub struct Ball;
pub struct Laser;
/// One-tick deferred-deletion quarantine, purged at the end of the pipeline
pub struct PendingDestroy;

/// Number of block colour variants
pub const BLOCK_COLORS: usize = 5;
/// Number of crack overlays swapped in when a block takes a hit
pub const CRACK_VARIANTS: usize = 2;

/// Opaque handles for everything the presentation draws.
///
/// All optional: a missing handle falls back to a solid fill downstream, so a
/// headless session runs with `Assets::default()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assets {
    pub ball: Option<TextureId>,
    pub paddle: Option<TextureId>,
    pub laser: Option<TextureId>,
    pub pickup: Option<TextureId>,
    pub blocks: [Option<TextureId>; BLOCK_COLORS],
    pub cracks: [Option<TextureId>; CRACK_VARIANTS],
}

/// Lives, score and level index for the current run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub lives: i32,
    pub score: u32,
    pub level: u32,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            lives: 3,
            score: 0,
            level: 0,
        }
    }
}

/// All mutable session state, threaded explicitly through the tick pipeline
/// and into scheduler callbacks
pub struct Session {
    pub world: World,
    pub player: PlayerState,
    pub rng: Pcg32,
    pub assets: Assets,
    pub tuning: Tuning,
}

impl Session {
    pub fn new(seed: u64, tuning: Tuning, assets: Assets) -> Self {
        Self {
            world: World::new(),
            player: PlayerState::default(),
            rng: Pcg32::seed_from_u64(seed),
            assets,
            tuning,
        }
    }
}

/// Shape-agnostic position read: works uniformly across rect and circle
/// entities, `None` when the entity has neither shape
pub fn entity_position(world: &World, entity: Entity) -> Option<Vec2> {
    if let Some(rect) = world.try_get::<super::geom::Rect>(entity) {
        Some(rect.position)
    } else {
        world
            .try_get::<super::geom::Circle>(entity)
            .map(|circle| circle.position)
    }
}

/// Shape-agnostic position write; false when the entity has no shape
pub fn set_entity_position(world: &mut World, entity: Entity, position: Vec2) -> bool {
    if let Some(rect) = world.try_get_mut::<super::geom::Rect>(entity) {
        rect.position = position;
        true
    } else if let Some(circle) = world.try_get_mut::<super::geom::Circle>(entity) {
        circle.position = position;
        true
    } else {
        false
    }
}
