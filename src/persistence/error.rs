//! Error types raised by storage backends and the game store.

use thiserror::Error;

/// Errors surfaced by persistence operations.
///
/// None of these are fatal to gameplay: the engine logs them and keeps
/// playing from memory.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage is not available")]
    Unavailable,

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported save version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
