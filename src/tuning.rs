//! Data-driven game balance
//!
//! Defaults match the shipped game; a JSON file named by the
//! `ARCANOID_TUNING` environment variable overrides them. A missing or
//! malformed file falls back to defaults with a log line, never an error.

use serde::{Deserialize, Serialize};

/// Gameplay balance values
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Ball launch speed, also the enforced speed floor (units/s)
    pub ball_speed: f32,
    /// Paddle travel speed while playing (units/s)
    pub paddle_speed: f32,
    /// Resting-ball slide speed during aiming (units/s)
    pub aim_slide_speed: f32,
    /// Pickup fall speed (units/s)
    pub pickup_fall_speed: f32,
    /// Seconds between automatic pickup drops
    pub pickup_interval: f32,
    /// Laser damage per second of block overlap
    pub laser_dps: f32,
    /// Seconds a laser stays attached to the paddle
    pub laser_lifetime: f32,
    /// Width added by the enlarge pickup
    pub paddle_enlarge: f32,
    /// Seconds before an enlarged paddle shrinks back
    pub enlarge_duration: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ball_speed: 220.0,
            paddle_speed: 460.0,
            aim_slide_speed: 120.0,
            pickup_fall_speed: 320.0,
            pickup_interval: 5.0,
            laser_dps: 5.0,
            laser_lifetime: 3.0,
            paddle_enlarge: 30.0,
            enlarge_duration: 5.0,
        }
    }
}

impl Tuning {
    /// Environment variable naming the override file
    pub const ENV_PATH: &'static str = "ARCANOID_TUNING";

    /// Load tuning overrides, falling back to defaults
    pub fn load() -> Self {
        let Ok(path) = std::env::var(Self::ENV_PATH) else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning overrides from {path}");
                    tuning
                }
                Err(err) => {
                    log::warn!("Ignoring malformed tuning file {path}: {err}");
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!("Cannot read tuning file {path}: {err}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{ "ball_speed": 300.0 }"#).unwrap();
        assert_eq!(tuning.ball_speed, 300.0);
        assert_eq!(tuning.paddle_speed, Tuning::default().paddle_speed);
        assert_eq!(tuning.laser_lifetime, Tuning::default().laser_lifetime);
    }

    #[test]
    fn test_roundtrip() {
        let json = serde_json::to_string(&Tuning::default()).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ball_speed, Tuning::default().ball_speed);
    }
}
