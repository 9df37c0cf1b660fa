//! Render model
//!
//! `render` turns engine state into a `BoardView`: a full redraw directive
//! for whatever front end is attached. Pure, no platform dependencies.

use std::fmt;

use super::state::{Card, GamePhase, GameState, Level};
use crate::format_clock;
use crate::records::Records;

/// Visual state of one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardFace {
    Hidden,
    Revealed(String),
    Matched(String),
}

impl CardFace {
    pub fn of(card: &Card) -> Self {
        if card.is_matched {
            CardFace::Matched(card.symbol.clone())
        } else if card.is_flipped {
            CardFace::Revealed(card.symbol.clone())
        } else {
            CardFace::Hidden
        }
    }

    /// CSS class suffix
    pub fn class(&self) -> &'static str {
        match self {
            CardFace::Hidden => "hidden",
            CardFace::Revealed(_) => "revealed",
            CardFace::Matched(_) => "matched",
        }
    }

    /// Text shown on the card
    pub fn label(&self) -> &str {
        match self {
            CardFace::Hidden => "?",
            CardFace::Revealed(s) | CardFace::Matched(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: u32,
    pub face: CardFace,
}

/// Message tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Success => "success",
            Tone::Error => "error",
        }
    }
}

/// Transient user-visible message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LevelSelected(Level),
    /// Difficulty change attempted mid-game
    FinishCurrentGame,
    /// Resume attempted mid-game
    FinishBeforeResume,
    NewGame,
    Resumed,
    NoSavedGame,
    SavedGameAvailable,
    Completed {
        time: u32,
        attempts: u32,
        new_record: bool,
    },
}

impl Notice {
    pub fn tone(&self) -> Tone {
        match self {
            Notice::FinishCurrentGame | Notice::FinishBeforeResume | Notice::NoSavedGame => {
                Tone::Error
            }
            _ => Tone::Success,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::LevelSelected(level) => write!(f, "Difficulty selected: {}", level.as_str()),
            Notice::FinishCurrentGame => {
                write!(f, "Finish the current game before changing difficulty")
            }
            Notice::FinishBeforeResume => write!(f, "Finish the current game before resuming"),
            Notice::NewGame => write!(f, "New game started! Find all the pairs."),
            Notice::Resumed => write!(f, "Game resumed. Carry on where you left off."),
            Notice::NoSavedGame => write!(f, "No saved game"),
            Notice::SavedGameAvailable => write!(f, "There is a saved game. You can resume it."),
            Notice::Completed {
                time,
                attempts,
                new_record,
            } => {
                write!(
                    f,
                    "Congratulations! You finished in {} with {} attempts.",
                    format_clock(*time),
                    attempts
                )?;
                if *new_record {
                    write!(f, " New record! 🏆")?;
                }
                Ok(())
            }
        }
    }
}

/// Engine bookkeeping shown alongside the board
#[derive(Debug, Clone, Default)]
pub struct Status {
    pub phase: GamePhase,
    /// Level the next new game will use
    pub selected_level: Level,
    pub records: Records,
    pub notice: Option<Notice>,
    /// A saved game can be resumed
    pub resume_available: bool,
}

/// Full redraw directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub phase: GamePhase,
    /// Board side of the game on screen
    pub level: Level,
    pub selected_level: Level,
    pub cards: Vec<CardView>,
    pub attempts: u32,
    pub pairs_found: u32,
    pub total_pairs: u32,
    /// `MM:SS`
    pub elapsed: String,
    pub best_time: String,
    pub best_attempts: String,
    pub notice: Option<Notice>,
    pub resume_available: bool,
}

impl BoardView {
    /// `found/total`
    pub fn pairs_display(&self) -> String {
        format!("{}/{}", self.pairs_found, self.total_pairs)
    }

    pub fn can_select_level(&self) -> bool {
        self.phase.is_idle()
    }
}

/// Render the current game (if any) plus status into a redraw directive
pub fn render(state: Option<&GameState>, status: &Status) -> BoardView {
    let (cards, level, attempts, pairs_found, total_pairs, game_time) = match state {
        Some(s) => (
            s.cards
                .iter()
                .map(|c| CardView {
                    id: c.id,
                    face: CardFace::of(c),
                })
                .collect(),
            s.level,
            s.attempts,
            s.matched_pairs,
            s.total_pairs(),
            s.game_time,
        ),
        None => (Vec::new(), status.selected_level, 0, 0, 0, 0),
    };

    BoardView {
        phase: status.phase,
        level,
        selected_level: status.selected_level,
        cards,
        attempts,
        pairs_found,
        total_pairs,
        elapsed: format_clock(game_time),
        best_time: status.records.best_time_display(),
        best_attempts: status.records.best_attempts_display(),
        notice: status.notice,
        resume_available: status.resume_available,
    }
}
