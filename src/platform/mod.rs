//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Storage (LocalStorage on web, files natively)
//! - Time (`Date.now()` / system clock)
//! - Delayed tasks (`setTimeout` / virtual time)

pub mod storage;
pub mod time;
pub mod timer;

pub use storage::{Fallback, MemoryStorage, Storage};
pub use time::{Clock, ManualClock};
pub use timer::{ManualScheduler, Scheduler};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(not(target_arch = "wasm32"))]
pub use time::SystemClock;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
#[cfg(target_arch = "wasm32")]
pub use time::JsClock;
#[cfg(target_arch = "wasm32")]
pub use timer::TimeoutScheduler;
