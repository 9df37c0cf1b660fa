//! Board generation
//!
//! Builds `level²/2` symbol pairs and deals them with a Fisher-Yates shuffle.

use rand::Rng;

use super::state::{Card, Level};

/// Pair symbols, in deal order
pub const SYMBOLS: [&str; 60] = [
    "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", //
    "🦁", "🐮", "🐷", "🐸", "🐵", "🐔", "🐧", "🐦", "🐤", "🐣", //
    "🐥", "🦆", "🦅", "🦉", "🦇", "🐺", "🐗", "🐴", "🦄", "🐝", //
    "🐛", "🦋", "🐌", "🐞", "🐜", "🦟", "🦗", "🕷️", "🕸️", "🦂", //
    "🐢", "🐍", "🦎", "🦖", "🦕", "🐙", "🦑", "🦐", "🦞", "🦀", //
    "🐡", "🐠", "🐟", "🐬", "🐳", "🐋", "🦈", "🐊", "🐅", "🐆",
];

/// In-place uniform shuffle: for i from last down to 1, swap with [0, i]
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

/// Generate a shuffled, face-down board for `level`
pub fn generate_board<R: Rng + ?Sized>(level: Level, rng: &mut R) -> Vec<Card> {
    let pairs = level.pair_count();
    debug_assert!(pairs <= SYMBOLS.len());

    let mut symbols: Vec<&str> = SYMBOLS
        .iter()
        .cycle()
        .take(pairs)
        .flat_map(|&s| [s, s])
        .collect();
    shuffle(&mut symbols, rng);

    symbols
        .into_iter()
        .enumerate()
        .map(|(i, symbol)| Card::new(i as u32, symbol))
        .collect()
}
