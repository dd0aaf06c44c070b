//! Player preferences
//!
//! Separate from `GameConfig`: these never change gameplay, only what the
//! outer services do with the events the simulation emits.

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    pub music_enabled: bool,
    pub sound_enabled: bool,
    /// Music volume (0 - 100)
    pub music_volume: u8,
    /// Sound effects volume (0 - 100)
    pub sound_volume: u8,

    // === Controls ===
    /// Rumble controllers on damage, death and respawn
    pub vibration_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_enabled: true,
            sound_enabled: true,
            music_volume: 70,
            sound_volume: 80,
            vibration_enabled: true,
        }
    }
}

impl Settings {
    /// Sound effects gain (0.0 - 1.0), zero when disabled
    pub fn effective_sound_volume(&self) -> f32 {
        if self.sound_enabled {
            f32::from(self.sound_volume.min(100)) / 100.0
        } else {
            0.0
        }
    }

    /// Music gain (0.0 - 1.0), zero when disabled
    pub fn effective_music_volume(&self) -> f32 {
        if self.music_enabled {
            f32::from(self.music_volume.min(100)) / 100.0
        } else {
            0.0
        }
    }

    /// Parse settings JSON, keeping defaults for anything missing or malformed
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => {
                log::info!("Loaded settings");
                settings
            }
            Err(err) => {
                log::warn!("Using default settings: {err}");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        // Plain data struct, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
