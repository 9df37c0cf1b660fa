//! Memory Pairs - a card-matching game for the browser
//!
//! Core modules:
//! - `sim`: Deterministic game logic (board generation, flip state machine, view)
//! - `records`: Best time / best attempts across completed games
//! - `persistence`: Save/load of the in-progress game and records
//! - `platform`: Browser/native abstraction (storage, clock, timers)
//! - `settings`: Player preferences

pub mod persistence;
pub mod platform;
pub mod records;
pub mod settings;
pub mod sim;

pub use persistence::{GameStore, StoreError};
pub use records::{Record, RecordKey, Records};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Pause before a face-up pair is evaluated (ms)
    pub const REVEAL_DELAY_MS: u64 = 1000;
    /// Pause before a mismatched pair is turned back over (ms)
    pub const FLIP_BACK_DELAY_MS: u64 = 1000;
    /// Interval of the elapsed-time display refresh (ms)
    pub const TICK_INTERVAL_MS: u64 = 1000;

    /// Slot holding the single resumable game
    pub const CURRENT_GAME_SLOT: &str = "current_game";
    /// Record keys
    pub const BEST_TIME_KEY: &str = "bestTime";
    pub const BEST_ATTEMPTS_KEY: &str = "bestAttempts";
}

/// Format whole seconds as `MM:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
