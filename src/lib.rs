//! Tank Defense - two-player cooperative tank arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tanks, weapons, missiles, AI, progression)
//! - `game`: Composition root wiring the simulation to injected services
//! - `config`: Data-driven game balance with baked-in defaults
//! - `settings`: Player preferences (audio, vibration)
//! - `audio`: Sound effect ids and the sink the game plays them through
//! - `platform`: Per-player input sources
//! - `renderer`: Per-entity render sink

pub mod audio;
pub mod config;
pub mod error;
pub mod game;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use config::{ConfigProvider, GameConfig};
pub use error::{Error, Result};
pub use game::Game;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Frames with a longer delta than this skip the update (tab was backgrounded)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Tank footprint (axis-aligned, independent of hull angle)
    pub const TANK_WIDTH: f32 = 30.0;
    pub const TANK_HEIGHT: f32 = 20.0;
    /// Distance from tank centre to the muzzle
    pub const MUZZLE_DISTANCE: f32 = 25.0;

    /// Tanks are kept this far inside the arena edge
    pub const TANK_EDGE_MARGIN: f32 = 20.0;

    /// Boundary wall thickness
    pub const WALL_THICKNESS: f32 = 10.0;

    /// Eagle sits this far above the bottom edge
    pub const EAGLE_BOTTOM_OFFSET: f32 = 60.0;

    /// Player spawn offsets from the eagle
    pub const SPAWN_OFFSET_X: f32 = 60.0;
    pub const SPAWN_OFFSET_Y: f32 = -80.0;

    /// Bullets nudge this fraction of a second along their new velocity after a bounce
    pub const BOUNCE_NUDGE: f32 = 0.1;
    /// Nudge used for shield deflections (larger, the eagle is solid)
    pub const SHIELD_NUDGE: f32 = 0.2;

    /// Number of trail points a missile keeps
    pub const MISSILE_TRAIL_LENGTH: usize = 12;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation from `from` to `to`, in [-π, π)
#[inline]
pub fn angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

/// Unit vector for a heading angle
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Heading angle of a vector (atan2)
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
