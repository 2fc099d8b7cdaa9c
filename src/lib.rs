//! Arcanoid - a fixed-step brick-breaker core
//!
//! Core modules:
//! - `ecs`: Entity store with per-component sparse storage
//! - `scheduler`: Deferred one-shot callback queue
//! - `sim`: Deterministic simulation (collision, pickups, session state machine)
//! - `render`: Backend-agnostic presentation adapter
//! - `platform`: Outer loop driver and input/render collaborator traits
//! - `tuning`: Data-driven game balance

pub mod ecs;
pub mod platform;
pub mod render;
pub mod scheduler;
pub mod sim;
pub mod tuning;

pub use ecs::{Entity, World};
pub use scheduler::Scheduler;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation rate (120 Hz for smooth physics)
    pub const FIXED_RATE: u32 = 120;
    /// Fixed simulation timestep
    pub const FIXED_DT: f32 = 1.0 / FIXED_RATE as f32;

    /// Screen dimensions (presentation space)
    pub const SCREEN_AREA: Vec2 = Vec2::new(400.0, 500.0);
    /// Playable area, centered on the screen
    pub const GAME_AREA: Vec2 = Vec2::new(350.0, 400.0);
    /// Center of the playable area
    pub const GAME_CENTER: Vec2 = Vec2::new(SCREEN_AREA.x / 2.0, SCREEN_AREA.y / 2.0);

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 6.0;

    /// Paddle defaults
    pub const PADDLE_DIMENSIONS: Vec2 = Vec2::new(42.0, 10.0);
    /// Distance from the bottom edge to the paddle center
    pub const PADDLE_ELEVATION: f32 = 10.0;

    /// Pickup capsule size
    pub const PICKUP_DIMENSIONS: Vec2 = Vec2::new(20.0, 20.0);
    /// Laser beam width
    pub const LASER_WIDTH: f32 = 15.0;

    /// Maximum paddle-bounce deflection half-angle (100 degree cone)
    pub const AIM_HALF_ANGLE: f32 = 100.0_f32.to_radians() / 2.0;
    /// Rotation applied per tick while the ball direction is nearly axis-aligned
    pub const ANGLE_NUDGE: f32 = 1.0_f32.to_radians();
    /// Ball-clone deflection for the triplet pickup
    pub const TRIPLET_ANGLE: f32 = 17.0_f32.to_radians();

    /// Block HP at or below this counts as destroyed
    pub const LIFE_EPSILON: f32 = 1e-15;
}

/// Center+size rectangle of the playable area
pub fn game_area() -> crate::sim::geom::Rect {
    crate::sim::geom::Rect {
        position: consts::GAME_CENTER,
        dimensions: consts::GAME_AREA,
    }
}

/// Min/max bounds of the playable area
pub fn game_bounds() -> crate::sim::geom::Bounds {
    game_area().bounds()
}

/// Rotate a vector by an angle (radians, counter-clockwise in screen space)
#[inline]
pub fn rotated(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}
