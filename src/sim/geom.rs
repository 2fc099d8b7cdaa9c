//! Axis-aligned shapes and the intersection tests the simulation needs
//!
//! Everything works in screen coordinates: +x right, +y down, so "straight
//! up" is (0, -1).

use glam::Vec2;

use crate::consts::AIM_HALF_ANGLE;
use crate::rotated;

/// Axis-aligned rectangle as min/max corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

/// Axis-aligned rectangle as center + full size
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub position: Vec2,
    pub dimensions: Vec2,
}

/// Circle as center + radius
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Circle {
    pub position: Vec2,
    pub radius: f32,
}

impl Rect {
    pub fn new(position: Vec2, dimensions: Vec2) -> Self {
        Self {
            position,
            dimensions,
        }
    }

    pub fn bounds(&self) -> Bounds {
        let half = self.dimensions / 2.0;
        Bounds {
            min: self.position - half,
            max: self.position + half,
        }
    }
}

impl Circle {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self { position, radius }
    }

    /// Bounding rectangle (used by the shape-agnostic accessors and renderer)
    pub fn to_rect(&self) -> Rect {
        Rect {
            position: self.position,
            dimensions: Vec2::splat(self.radius * 2.0),
        }
    }
}

pub fn circle_bounds_intersect(c: &Circle, b: &Bounds) -> bool {
    let dx = c.position.x.clamp(b.min.x, b.max.x) - c.position.x;
    let dy = c.position.y.clamp(b.min.y, b.max.y) - c.position.y;
    dx * dx + dy * dy <= c.radius * c.radius
}

pub fn circle_rect_intersect(c: &Circle, r: &Rect) -> bool {
    circle_bounds_intersect(c, &r.bounds())
}

pub fn bounds_intersect(a: &Bounds, b: &Bounds) -> bool {
    a.min.x <= b.max.x && a.max.x >= b.min.x && a.min.y <= b.max.y && a.max.y >= b.min.y
}

pub fn rect_intersect(a: &Rect, b: &Rect) -> bool {
    bounds_intersect(&a.bounds(), &b.bounds())
}

/// Deterministic paddle-bounce direction.
///
/// `delta_x` is paddle center minus ball center, `width` the paddle width.
/// The normalized offset is clamped to the deflection cone and the straight-up
/// vector rotated by the negated angle: steep near the paddle center, shallow
/// at the edges.
pub fn aim_reflect(max_angle: f32, delta_x: f32, width: f32) -> Vec2 {
    let p = delta_x / width * 2.0;
    let angle = (p * max_angle).clamp(-max_angle, max_angle);
    rotated(Vec2::new(0.0, -1.0), -angle)
}

/// `aim_reflect` with the configured deflection cone
pub fn paddle_bounce_dir(delta_x: f32, width: f32) -> Vec2 {
    aim_reflect(AIM_HALF_ANGLE, delta_x, width)
}
