//! Best-record tracking
//!
//! Best time and fewest attempts across all completed games. A record is
//! only replaced by a strictly lower value; the first completion sets both.

use serde::{Deserialize, Serialize};

use crate::consts::{BEST_ATTEMPTS_KEY, BEST_TIME_KEY};
use crate::format_clock;

/// Which metric a record tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKey {
    #[serde(rename = "bestTime")]
    BestTime,
    #[serde(rename = "bestAttempts")]
    BestAttempts,
}

impl RecordKey {
    pub const ALL: [RecordKey; 2] = [RecordKey::BestTime, RecordKey::BestAttempts];

    /// Storage key
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::BestTime => BEST_TIME_KEY,
            RecordKey::BestAttempts => BEST_ATTEMPTS_KEY,
        }
    }
}

/// A single stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub value: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: u64,
}

/// In-memory copy of both records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Records {
    /// Seconds
    pub best_time: Option<u32>,
    pub best_attempts: Option<u32>,
}

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: RecordKey) -> Option<u32> {
        match key {
            RecordKey::BestTime => self.best_time,
            RecordKey::BestAttempts => self.best_attempts,
        }
    }

    pub fn set(&mut self, key: RecordKey, value: u32) {
        match key {
            RecordKey::BestTime => self.best_time = Some(value),
            RecordKey::BestAttempts => self.best_attempts = Some(value),
        }
    }

    /// Check if a value would beat the stored record
    pub fn improves(&self, key: RecordKey, value: u32) -> bool {
        self.get(key).is_none_or(|best| value < best)
    }

    /// Fold a completed game into the records.
    /// Returns the records that were improved (empty if none).
    pub fn apply(&mut self, game_time: u32, attempts: u32, timestamp: u64) -> Vec<Record> {
        let mut improved = Vec::new();
        for (key, value) in [
            (RecordKey::BestTime, game_time),
            (RecordKey::BestAttempts, attempts),
        ] {
            if self.improves(key, value) {
                self.set(key, value);
                improved.push(Record {
                    key,
                    value,
                    timestamp,
                });
            }
        }
        improved
    }

    /// Best time as `MM:SS`, or `--:--` when unset
    pub fn best_time_display(&self) -> String {
        self.best_time
            .map(format_clock)
            .unwrap_or_else(|| "--:--".to_string())
    }

    /// Best attempts, or `--` when unset
    pub fn best_attempts_display(&self) -> String {
        self.best_attempts
            .map(|a| a.to_string())
            .unwrap_or_else(|| "--".to_string())
    }
}
