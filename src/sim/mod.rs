//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Deferred destruction, swept once per tick
//! - No rendering or platform dependencies

pub mod geom;
pub mod state;
pub mod tick;

pub use geom::{aim_reflect, circle_rect_intersect, rect_intersect, Bounds, Circle, Rect};
pub use state::{
    Assets, Attach, Ball, Block, Collidable, GamePhase, InputEvent, Laser, Life, Paddle,
    PendingDestroy, Pickup, PickupKind, PlayerState, Session, Sprite, TextureId, Velocity,
    BLOCK_COLORS, CRACK_VARIANTS,
};
pub use tick::Game;
