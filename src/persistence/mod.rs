//! Save/load persistence for the in-progress game and best records
//!
//! Features:
//! - Versioned JSON envelope for the single resumable slot
//! - One stored entry per record key
//! - Works over any `Storage` backend

mod error;

pub use error::{Result, StoreError};

use serde::{Deserialize, Serialize};

use crate::consts::CURRENT_GAME_SLOT;
use crate::platform::Storage;
use crate::records::{Record, RecordKey, Records};
use crate::sim::GameState;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

/// Prefix for every storage key owned by the game
pub const KEY_PREFIX: &str = "memory_pairs_";

/// Stored form of the in-progress game
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    version: u32,
    id: String,
    /// Unix timestamp (ms) of the save
    saved_at: u64,
    state: T,
}

fn storage_key(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Game and record persistence over a `Storage` backend
#[derive(Debug, Clone)]
pub struct GameStore<S> {
    storage: S,
}

impl<S: Storage> GameStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Upsert the resumable game
    pub fn save_game(&mut self, state: &GameState, now_ms: u64) -> Result<()> {
        let envelope = Envelope {
            version: SAVE_VERSION,
            id: CURRENT_GAME_SLOT.to_string(),
            saved_at: now_ms,
            state,
        };
        let json = serde_json::to_string(&envelope)?;
        self.storage.set(&storage_key(CURRENT_GAME_SLOT), &json)?;
        log::info!(
            "Game saved ({}/{} pairs, {} attempts)",
            state.matched_pairs,
            state.total_pairs(),
            state.attempts
        );
        Ok(())
    }

    /// Load the resumable game, if one was saved
    pub fn load_game(&self) -> Result<Option<GameState>> {
        let Some(json) = self.storage.get(&storage_key(CURRENT_GAME_SLOT))? else {
            return Ok(None);
        };
        let envelope: Envelope<GameState> = serde_json::from_str(&json)?;
        if envelope.version != SAVE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: envelope.version,
                expected: SAVE_VERSION,
            });
        }
        Ok(Some(envelope.state))
    }

    /// Clear the resumable game
    pub fn delete_game(&mut self) -> Result<()> {
        self.storage.remove(&storage_key(CURRENT_GAME_SLOT))?;
        log::info!("Saved game cleared");
        Ok(())
    }

    pub fn get_record(&self, key: RecordKey) -> Result<Option<Record>> {
        match self.storage.get(&storage_key(key.as_str()))? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn set_record(&mut self, record: &Record) -> Result<()> {
        let json = serde_json::to_string(record)?;
        self.storage.set(&storage_key(record.key.as_str()), &json)?;
        log::info!("Record {} set to {}", record.key.as_str(), record.value);
        Ok(())
    }

    /// Load both records
    pub fn load_records(&self) -> Result<Records> {
        let mut records = Records::new();
        for key in RecordKey::ALL {
            if let Some(record) = self.get_record(key)? {
                records.set(key, record.value);
            }
        }
        Ok(records)
    }
}
