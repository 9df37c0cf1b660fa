//! Game state and core board types
//!
//! All state that must be persisted for Resume lives in `GameState`.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::board::generate_board;

/// Board size (cards per side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    /// 4x4, 8 pairs
    #[default]
    Easy,
    /// 6x6, 18 pairs
    Medium,
    /// 10x10, 50 pairs
    Hard,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Easy, Level::Medium, Level::Hard];

    /// Cards per side of the board
    pub fn side(&self) -> u8 {
        match self {
            Level::Easy => 4,
            Level::Medium => 6,
            Level::Hard => 10,
        }
    }

    pub fn card_count(&self) -> usize {
        let side = self.side() as usize;
        side * side
    }

    pub fn pair_count(&self) -> usize {
        self.card_count() / 2
    }

    pub fn from_side(side: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.side() == side)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Easy => "Easy (4x4)",
            Level::Medium => "Medium (6x6)",
            Level::Hard => "Hard (10x10)",
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(side: u8) -> Result<Self, Self::Error> {
        Level::from_side(side).ok_or_else(|| format!("unsupported board size: {side}"))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        level.side()
    }
}

/// A single card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Board position (0..N-1)
    pub id: u32,
    /// Pair identity; two cards share each symbol
    #[serde(alias = "animal")]
    pub symbol: String,
    pub is_flipped: bool,
    pub is_matched: bool,
}

impl Card {
    pub fn new(id: u32, symbol: impl Into<String>) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            is_flipped: false,
            is_matched: false,
        }
    }

    /// Whether a click on this card may turn it over
    pub fn is_selectable(&self) -> bool {
        !self.is_flipped && !self.is_matched
    }
}

/// Current phase of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// No game on the board
    #[default]
    Idle,
    /// Timer running, accepting flips
    Active,
    /// Two cards face up, waiting for the match check
    Resolving,
    /// Every pair found
    Complete,
}

impl GamePhase {
    /// Whether difficulty changes and resumes are allowed
    pub fn is_idle(&self) -> bool {
        matches!(self, GamePhase::Idle | GamePhase::Complete)
    }
}

/// Complete game state (serializable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Cards in board order
    pub cards: Vec<Card>,
    /// Ids of face-up, unresolved cards (at most 2)
    pub flipped_cards: Vec<u32>,
    pub matched_pairs: u32,
    /// One per pair of flips
    pub attempts: u32,
    /// Wall-clock start (ms), back-dated on resume
    pub start_time: Option<u64>,
    /// Elapsed seconds
    pub game_time: u32,
    pub is_game_active: bool,
    pub level: Level,
    /// Board shuffle seed
    #[serde(default)]
    pub seed: u64,
}

impl GameState {
    /// Create a fresh, active game with a shuffled board
    pub fn new(level: Level, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        Self {
            cards: generate_board(level, &mut rng),
            flipped_cards: Vec::with_capacity(2),
            matched_pairs: 0,
            attempts: 0,
            start_time: None,
            game_time: 0,
            is_game_active: true,
            level,
            seed,
        }
    }

    pub fn card(&self, id: u32) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: u32) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    pub fn total_pairs(&self) -> u32 {
        (self.cards.len() / 2) as u32
    }

    pub fn all_matched(&self) -> bool {
        self.matched_pairs == self.total_pairs()
    }

    /// Structural sanity check for a loaded save
    pub fn is_consistent(&self) -> bool {
        let n = self.level.card_count();
        let ids_ok = self.cards.len() == n
            && self.cards.iter().enumerate().all(|(i, c)| c.id == i as u32);
        let matched = self.cards.iter().filter(|c| c.is_matched).count();
        ids_ok
            && matched == self.matched_pairs as usize * 2
            && self.flipped_cards.len() <= 2
            && self.flipped_cards.iter().all(|&id| (id as usize) < n)
    }

    /// Whether a loaded save can be picked up again
    pub fn is_resumable(&self) -> bool {
        self.is_game_active && self.is_consistent()
    }

    /// Turn every unmatched card face down and drop any unresolved pair.
    ///
    /// A resumed game never restores a pair that was mid-evaluation.
    pub fn settle(&mut self) {
        for card in self.cards.iter_mut().filter(|c| !c.is_matched) {
            card.is_flipped = false;
        }
        self.flipped_cards.clear();
    }

    /// Start (or restart) the clock so elapsed time continues from `game_time`
    pub fn start_clock(&mut self, now_ms: u64) {
        self.start_time = Some(now_ms.saturating_sub(self.game_time as u64 * 1000));
    }

    /// Recompute `game_time` from the clock
    pub fn update_game_time(&mut self, now_ms: u64) {
        if let Some(start) = self.start_time {
            self.game_time = (now_ms.saturating_sub(start) / 1000) as u32;
        }
    }
}
