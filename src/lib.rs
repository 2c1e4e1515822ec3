//! Mini Motors - arcade car game simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (vehicle dynamics, damage, world state)
//! - `input`: Input source aggregation (keyboard, touch, gamepad)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player-facing selections and preferences
//! - `net`: Multiplayer broadcast payloads
//!
//! Rendering, the rigid-body engine, and audio synthesis are external
//! collaborators: this crate consumes kinematic state and collision contacts
//! and produces velocity/yaw targets, telemetry, and world entity lists.

pub mod input;
pub mod net;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use input::{DriveInput, InputAggregator};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Damage at which the run is lost
    pub const MAX_DAMAGE: u32 = 100;
    /// Side length of the fixed ring-track ground plane
    pub const TRACK_SIZE: f32 = 60.0;
    /// Collection distance for pickups
    pub const PICKUP_RADIUS: f32 = 1.5;
    /// Horizontal overshoot (relative to world half-extent) that triggers
    /// the teleport-to-start recovery
    pub const OUT_OF_BOUNDS_SCALE: f32 = 1.08;
    /// Spawn height of the chassis above the terrain surface
    pub const SPAWN_CLEARANCE: f32 = 1.05;
    /// Minimum simulated time between damage events from one contact stream
    pub const DAMAGE_DEBOUNCE_SEC: f64 = 0.35;
}

/// Normalize an angle to (-pi, pi]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector along the vehicle heading for a given yaw.
///
/// The world is XZ-planar: yaw 0 faces +Z, positive yaw turns toward +X.
#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec2 {
    Vec2::new(yaw.sin(), yaw.cos())
}

/// Unit vector perpendicular to (right of) the vehicle heading
#[inline]
pub fn right_from_yaw(yaw: f32) -> Vec2 {
    Vec2::new(yaw.cos(), -yaw.sin())
}
