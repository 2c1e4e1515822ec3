//! Player-facing selections and preferences
//!
//! Serialized as JSON by the platform layer (browser local storage on wasm,
//! a config file natively). Unknown fields are ignored and missing fields
//! fall back to defaults, so older saved blobs keep loading.

use serde::{Deserialize, Serialize};

use crate::sim::map::MapId;
use crate::tuning::CarProfileId;

/// Selectable paint colors, hex RGB
pub const CAR_COLOR_OPTIONS: [&str; 6] =
    ["#ef4444", "#f97316", "#facc15", "#22c55e", "#3b82f6", "#a855f7"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub car_color: String,
    pub car_profile: CarProfileId,
    pub map_id: MapId,
    /// Seed used when `map_id` is the procedural map
    pub procedural_seed: u64,
    pub engine_muted: bool,
    /// Renderer hint: fewer particles and no shadows
    pub low_power_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            car_color: CAR_COLOR_OPTIONS[0].to_string(),
            car_profile: CarProfileId::default(),
            map_id: MapId::default(),
            procedural_seed: 1,
            engine_muted: false,
            low_power_mode: false,
        }
    }
}

impl Settings {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a saved blob, falling back to defaults if it is unreadable
    pub fn from_json_or_default(raw: &str) -> Settings {
        match serde_json::from_str(raw) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("unreadable settings blob ({err}), using defaults");
                Settings::default()
            }
        }
    }

    /// Clamp the color to a known option (saved blobs may predate a palette
    /// change)
    pub fn sanitized(mut self) -> Settings {
        if !CAR_COLOR_OPTIONS.contains(&self.car_color.as_str()) {
            self.car_color = CAR_COLOR_OPTIONS[0].to_string();
        }
        self
    }
}
