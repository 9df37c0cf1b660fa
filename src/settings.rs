//! Game settings and preferences
//!
//! Persisted separately from game saves.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{FLIP_BACK_DELAY_MS, REVEAL_DELAY_MS};
use crate::persistence::Result;
use crate::platform::Storage;
use crate::sim::Level;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Board size preselected on startup
    pub default_level: Level,
    /// Pause before a face-up pair is checked (ms)
    pub reveal_delay_ms: u64,
    /// Pause before a mismatched pair turns back over (ms)
    pub flip_back_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_level: Level::Easy,
            reveal_delay_ms: REVEAL_DELAY_MS,
            flip_back_delay_ms: FLIP_BACK_DELAY_MS,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "memory_pairs_settings";

    /// No pauses at all (headless runs)
    pub fn instant() -> Self {
        Self {
            reveal_delay_ms: 0,
            flip_back_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn flip_back_delay(&self) -> Duration {
        Duration::from_millis(self.flip_back_delay_ms)
    }

    /// Load settings, falling back to defaults
    pub fn load(storage: &impl Storage) -> Self {
        match storage.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {e}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not read settings: {e}"),
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, storage: &mut impl Storage) -> Result<()> {
        let json = serde_json::to_string(self)?;
        storage.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
