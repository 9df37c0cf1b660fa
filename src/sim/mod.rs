//! Deterministic game logic
//!
//! All gameplay lives here. This module must stay platform-free:
//! - Seeded RNG only
//! - Time comes in through `Clock`, delays go out through `Scheduler`
//! - Rendering is a pure function of engine state

pub mod board;
pub mod engine;
pub mod state;
pub mod view;

pub use board::{SYMBOLS, generate_board, shuffle};
pub use engine::{Engine, Task};
pub use state::{Card, GamePhase, GameState, Level};
pub use view::{BoardView, CardFace, CardView, Notice, Status, Tone, render};
