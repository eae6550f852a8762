//! Playback settings and preferences
//!
//! Persisted in LocalStorage, separate from any duel data.

use serde::{Deserialize, Serialize};

/// Playback speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpeedPreset {
    Slow,
    #[default]
    Normal,
    Fast,
    Turbo,
}

impl SpeedPreset {
    pub const ALL: [SpeedPreset; 4] = [
        SpeedPreset::Slow,
        SpeedPreset::Normal,
        SpeedPreset::Fast,
        SpeedPreset::Turbo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::Slow => "Slow",
            SpeedPreset::Normal => "Normal",
            SpeedPreset::Fast => "Fast",
            SpeedPreset::Turbo => "Turbo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slow" | "0.5x" => Some(SpeedPreset::Slow),
            "normal" | "1x" => Some(SpeedPreset::Normal),
            "fast" | "2x" => Some(SpeedPreset::Fast),
            "turbo" | "4x" => Some(SpeedPreset::Turbo),
            _ => None,
        }
    }

    /// Timeline speed factor
    pub fn factor(&self) -> f64 {
        match self {
            SpeedPreset::Slow => 0.5,
            SpeedPreset::Normal => 1.0,
            SpeedPreset::Fast => 2.0,
            SpeedPreset::Turbo => 4.0,
        }
    }

    /// Next preset, wrapping (for a single speed button)
    pub fn cycle(&self) -> Self {
        match self {
            SpeedPreset::Slow => SpeedPreset::Normal,
            SpeedPreset::Normal => SpeedPreset::Fast,
            SpeedPreset::Fast => SpeedPreset::Turbo,
            SpeedPreset::Turbo => SpeedPreset::Slow,
        }
    }
}

/// Playback preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Initial speed for every duel
    pub speed: SpeedPreset,
    /// Start playing as soon as steps arrive
    pub auto_play: bool,

    // === Accessibility ===
    /// Reduced motion (no deck shuffle animation, no clash shake)
    pub reduced_motion: bool,

    // === Deck ===
    /// Shuffle the environment deck when a new duel loads
    pub shuffle_between_duels: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            speed: SpeedPreset::Normal,
            auto_play: true,
            reduced_motion: false,
            shuffle_between_duels: true,
        }
    }
}

impl PlaybackSettings {
    pub fn speed_factor(&self) -> f64 {
        self.speed.factor()
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "duel_replay_settings";

    /// Browser LocalStorage, when the page allows it
    #[cfg(target_arch = "wasm32")]
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }

    /// Stored settings, or defaults when missing or unreadable
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = Self::storage()
            .and_then(|storage| storage.get_item(Self::STORAGE_KEY).ok().flatten())
            .and_then(|json| serde_json::from_str::<Self>(&json).ok());
        match stored {
            Some(settings) => {
                log::info!("Playback settings restored ({})", settings.speed.as_str());
                settings
            }
            None => Self::default(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = Self::storage() else {
            log::warn!("LocalStorage unavailable, playback settings not saved");
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Could not write playback settings");
                }
            }
            Err(e) => log::warn!("Could not encode playback settings: {}", e),
        }
    }

    /// Native builds keep no settings between runs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}
