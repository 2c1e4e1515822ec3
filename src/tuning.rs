//! Data-driven game balance
//!
//! Everything a designer would want to retune lives here: car profiles,
//! surface grip/speed tables, damage-to-handling loss factors, and the
//! kid-friendly assist scales. All types are serde round-trippable so a
//! tuning file can override the built-in defaults.

use serde::{Deserialize, Serialize};

/// Engine sound family, forwarded to the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineTone {
    Low,
    #[default]
    Mid,
    High,
}

/// Selectable car profile identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CarProfileId {
    #[default]
    Steady,
    Zippy,
    Tank,
}

impl CarProfileId {
    pub const ALL: [CarProfileId; 3] = [CarProfileId::Steady, CarProfileId::Zippy, CarProfileId::Tank];

    pub fn label(self) -> &'static str {
        match self {
            CarProfileId::Steady => "Steady",
            CarProfileId::Zippy => "Zippy",
            CarProfileId::Tank => "Tank",
        }
    }

    /// Built-in tuning for this profile
    pub fn profile(self) -> &'static CarProfile {
        match self {
            CarProfileId::Steady => &STEADY,
            CarProfileId::Zippy => &ZIPPY,
            CarProfileId::Tank => &TANK,
        }
    }
}

/// Per-car multipliers applied on top of the surface/vehicle base values.
///
/// Exactly one profile is active per run; switching profiles takes effect on
/// the next restart, never mid-frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarProfile {
    pub accel_mult: f32,
    pub top_speed_mult: f32,
    pub reverse_speed_mult: f32,
    pub steering_mult: f32,
    pub grip_mult: f32,
    /// Scales every damage delta this car receives
    pub damage_taken_mult: f32,
    /// Mass handed to the rigid-body collaborator
    pub mass: f32,
    pub engine_tone: EngineTone,
}

static STEADY: CarProfile = CarProfile {
    accel_mult: 1.0,
    top_speed_mult: 1.0,
    reverse_speed_mult: 1.0,
    steering_mult: 1.0,
    grip_mult: 1.0,
    damage_taken_mult: 1.0,
    mass: 11.0,
    engine_tone: EngineTone::Mid,
};

static ZIPPY: CarProfile = CarProfile {
    accel_mult: 1.18,
    top_speed_mult: 1.12,
    reverse_speed_mult: 1.05,
    steering_mult: 1.08,
    grip_mult: 0.94,
    damage_taken_mult: 1.15,
    mass: 9.0,
    engine_tone: EngineTone::High,
};

static TANK: CarProfile = CarProfile {
    accel_mult: 0.85,
    top_speed_mult: 0.92,
    reverse_speed_mult: 0.9,
    steering_mult: 0.88,
    grip_mult: 1.12,
    damage_taken_mult: 0.7,
    mass: 14.0,
    engine_tone: EngineTone::Low,
};

/// Acceleration/top-speed/grip profile of one driving surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceProfile {
    pub forward_acceleration: f32,
    pub reverse_acceleration: f32,
    pub forward_top_speed: f32,
    /// Negative: top speed while reversing
    pub reverse_top_speed: f32,
    /// Scales the lateral-velocity decay rate (1.0 = paved road)
    pub grip_factor: f32,
}

/// Road vs. grass surface table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveSurfaces {
    pub road: SurfaceProfile,
    pub grass: SurfaceProfile,
}

impl Default for DriveSurfaces {
    fn default() -> Self {
        Self {
            road: SurfaceProfile {
                forward_acceleration: 13.5,
                reverse_acceleration: 8.0,
                forward_top_speed: 15.0,
                reverse_top_speed: -6.0,
                grip_factor: 1.0,
            },
            grass: SurfaceProfile {
                forward_acceleration: 7.2,
                reverse_acceleration: 5.0,
                forward_top_speed: 8.5,
                reverse_top_speed: -4.2,
                grip_factor: 0.72,
            },
        }
    }
}

/// Chassis constants shared by every car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclePhysics {
    /// Deceleration while braking against forward motion
    pub brake_decel: f32,
    /// Deceleration while braking against reverse motion
    pub reverse_brake_decel: f32,
    /// Passive deceleration with no throttle input
    pub engine_brake: f32,
    /// Linear speed drag coefficient
    pub rolling_resistance: f32,
    /// Quadratic speed drag coefficient
    pub aero_drag: f32,
    /// Full-lock steering angle (radians)
    pub max_steer_rad: f32,
    /// First-order lag rate blending steering toward its target
    pub steer_response: f32,
    /// Front-to-rear axle distance for the bicycle steering model
    pub wheel_base: f32,
}

impl Default for VehiclePhysics {
    fn default() -> Self {
        Self {
            brake_decel: 16.0,
            reverse_brake_decel: 13.0,
            engine_brake: 4.2,
            rolling_resistance: 0.32,
            aero_drag: 0.02,
            max_steer_rad: 0.6,
            steer_response: 8.5,
            wheel_base: 2.55,
        }
    }
}

/// How cumulative damage degrades handling.
///
/// Each `*_loss` is the fraction of the stat removed at full damage; the
/// integrator applies `1 - damage_ratio * loss`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageDriveEffects {
    pub acceleration_loss: f32,
    pub top_speed_loss: f32,
    pub steering_loss: f32,
    pub grip_loss: f32,
    /// Damage at which the engine starts sputtering
    pub critical_threshold: u32,
}

impl Default for DamageDriveEffects {
    fn default() -> Self {
        Self {
            acceleration_loss: 0.55,
            top_speed_loss: 0.38,
            steering_loss: 0.5,
            grip_loss: 0.45,
            critical_threshold: 78,
        }
    }
}

/// Randomized throttle-cut duty cycle active at critical damage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SputterTuning {
    /// Shortest interval between duty-cycle rerolls (seconds)
    pub min_interval: f32,
    /// Extra random interval added on each reroll
    pub variable_interval: f32,
    /// Probability a reroll lands in the cut phase
    pub chance: f32,
    /// Throttle multiplier while the cut phase is active
    pub throttle_factor: f32,
}

impl Default for SputterTuning {
    fn default() -> Self {
        Self {
            min_interval: 0.32,
            variable_interval: 0.55,
            chance: 0.55,
            throttle_factor: 0.35,
        }
    }
}

/// Forgiveness knobs: global damage scaling and the spare-parts shield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistTuning {
    /// Global multiplier on every damage delta
    pub damage_taken_scale: f32,
    /// Damage multiplier while a shield is active
    pub shield_damage_scale: f32,
    /// Shield duration granted by a parts pickup (seconds)
    pub shield_duration_sec: f32,
    /// Damage above which the spawner starts offering extra repairs
    pub repair_assist_threshold: u32,
    /// Chance per spawn cycle of that extra repair
    pub repair_assist_chance: f32,
}

impl Default for AssistTuning {
    fn default() -> Self {
        Self {
            damage_taken_scale: 0.8,
            shield_damage_scale: 0.45,
            shield_duration_sec: 6.0,
            repair_assist_threshold: 60,
            repair_assist_chance: 0.35,
        }
    }
}

/// Complete balance bundle threaded through the simulation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub surfaces: DriveSurfaces,
    pub vehicle: VehiclePhysics,
    pub damage_effects: DamageDriveEffects,
    pub sputter: SputterTuning,
    pub assist: AssistTuning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuning_json_round_trip() {
        let tuning = Tuning::default();
        let json = serde_json::to_string(&tuning).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vehicle.wheel_base, tuning.vehicle.wheel_base);
        assert_eq!(back.damage_effects.critical_threshold, 78);
    }

    #[test]
    fn test_partial_tuning_file_uses_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{"assist":{"damage_taken_scale":1.0,"shield_damage_scale":0.5,"shield_duration_sec":4.0,"repair_assist_threshold":50,"repair_assist_chance":0.2}}"#).unwrap();
        assert_eq!(tuning.assist.damage_taken_scale, 1.0);
        assert_eq!(tuning.surfaces.road.forward_top_speed, DriveSurfaces::default().road.forward_top_speed);
    }

    #[test]
    fn test_profiles_distinct() {
        let steady = CarProfileId::Steady.profile();
        let zippy = CarProfileId::Zippy.profile();
        let tank = CarProfileId::Tank.profile();
        assert!(zippy.top_speed_mult > steady.top_speed_mult);
        assert!(tank.damage_taken_mult < steady.damage_taken_mult);
        assert!(zippy.mass < tank.mass);
    }
}
