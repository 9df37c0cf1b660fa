//! Card-flip state machine
//!
//! Idle → Active → Resolving → Active/Complete. The engine owns the
//! in-memory `GameState`; the store only holds an advisory copy for Resume.
//! Delays go through a `Scheduler`, so the whole loop runs synchronously
//! under test.

use super::state::{GamePhase, GameState, Level};
use super::view::{BoardView, Notice, Status, render};
use crate::persistence::GameStore;
use crate::platform::{Clock, Scheduler, Storage};
use crate::records::Records;
use crate::settings::Settings;

/// Deferred work handed back through `Engine::run_task`.
///
/// `game` is the session generation the task was scheduled for; tasks
/// from an abandoned session are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    EvaluateMatch { game: u64 },
    FlipBack { game: u64, cards: [u32; 2] },
}

type Observer = Box<dyn FnMut(&BoardView)>;

pub struct Engine<S, T, C> {
    store: GameStore<S>,
    scheduler: T,
    clock: C,
    settings: Settings,
    state: Option<GameState>,
    status: Status,
    /// Session generation, bumped on every start/resume
    game: u64,
    observers: Vec<Observer>,
}

impl<S: Storage, T: Scheduler, C: Clock> Engine<S, T, C> {
    /// Create an idle engine, loading records and checking for a saved game
    pub fn new(store: GameStore<S>, scheduler: T, clock: C, settings: Settings) -> Self {
        let records = store.load_records().unwrap_or_else(|e| {
            log::warn!("Could not load records: {e}");
            Records::new()
        });

        let resume_available = match store.load_game() {
            Ok(Some(saved)) if saved.is_resumable() => true,
            Ok(Some(_)) => {
                log::warn!("Ignoring saved game that cannot be resumed");
                false
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!("Could not check for a saved game: {e}");
                false
            }
        };
        if resume_available {
            log::info!("Found a saved game");
        }

        let status = Status {
            phase: GamePhase::Idle,
            selected_level: settings.default_level,
            records,
            notice: resume_available.then_some(Notice::SavedGameAvailable),
            resume_available,
        };

        Self {
            store,
            scheduler,
            clock,
            settings,
            state: None,
            status,
            game: 0,
            observers: Vec::new(),
        }
    }

    /// Register a redraw callback; it is called right away with the current view
    pub fn subscribe(&mut self, mut observer: impl FnMut(&BoardView) + 'static) {
        observer(&self.view());
        self.observers.push(Box::new(observer));
    }

    pub fn view(&self) -> BoardView {
        render(self.state.as_ref(), &self.status)
    }

    pub fn phase(&self) -> GamePhase {
        self.status.phase
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn records(&self) -> Records {
        self.status.records
    }

    pub fn notice(&self) -> Option<Notice> {
        self.status.notice
    }

    pub fn selected_level(&self) -> Level {
        self.status.selected_level
    }

    pub fn resume_available(&self) -> bool {
        self.status.resume_available
    }

    pub fn store(&self) -> &GameStore<S> {
        &self.store
    }

    fn in_play(&self) -> bool {
        matches!(self.status.phase, GamePhase::Active | GamePhase::Resolving)
    }

    /// Choose the level for the next game. Rejected while a game is running.
    pub fn select_level(&mut self, level: Level) -> bool {
        let accepted = !self.in_play();
        if accepted {
            self.status.selected_level = level;
            self.status.notice = Some(Notice::LevelSelected(level));
            self.remember_level(level);
        } else {
            self.status.notice = Some(Notice::FinishCurrentGame);
        }
        self.notify();
        accepted
    }

    /// Make `level` the preselected board size for later sessions
    fn remember_level(&mut self, level: Level) {
        if self.settings.default_level == level {
            return;
        }
        self.settings.default_level = level;
        if let Err(e) = self.settings.save(self.store.storage_mut()) {
            log::warn!("Could not save settings: {e}");
        }
    }

    /// Deal a new board. Overrides (without saving) any game in progress.
    pub fn start_new_game(&mut self, level: Level) {
        let seed = self.clock.now_ms() ^ self.game.rotate_left(32);
        self.start_new_game_with_seed(level, seed);
    }

    pub fn start_new_game_with_seed(&mut self, level: Level, seed: u64) {
        if self.in_play() {
            // The saved slot is left alone; the next save overwrites it
            log::info!("Abandoning game in progress");
        }

        let mut state = GameState::new(level, seed);
        state.start_clock(self.clock.now_ms());
        self.state = Some(state);
        self.game += 1;

        self.status.phase = GamePhase::Active;
        self.status.selected_level = level;
        self.status.resume_available = false;
        self.status.notice = Some(Notice::NewGame);

        log::info!("New {} game started with seed: {}", level.as_str(), seed);
        self.notify();
    }

    /// Continue the saved game. Returns false (with a notice) if there is none.
    pub fn resume_game(&mut self) -> bool {
        if self.in_play() {
            self.status.notice = Some(Notice::FinishBeforeResume);
            self.notify();
            return false;
        }

        let saved = match self.store.load_game() {
            Ok(Some(saved)) if saved.is_resumable() => Some(saved),
            Ok(Some(_)) => {
                log::warn!("Saved game is not resumable");
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Could not load saved game: {e}");
                None
            }
        };

        let Some(mut state) = saved else {
            self.status.resume_available = false;
            self.status.notice = Some(Notice::NoSavedGame);
            self.notify();
            return false;
        };

        state.settle();
        state.start_clock(self.clock.now_ms());
        log::info!(
            "Resumed game at {}/{} pairs, {} attempts, {}s",
            state.matched_pairs,
            state.total_pairs(),
            state.attempts,
            state.game_time
        );

        self.status.selected_level = state.level;
        self.state = Some(state);
        self.game += 1;
        self.status.phase = GamePhase::Active;
        self.status.resume_available = false;
        self.status.notice = Some(Notice::Resumed);
        self.notify();
        true
    }

    /// Handle a click on a card. Invalid clicks are ignored.
    pub fn flip(&mut self, card_id: u32) -> bool {
        if self.status.phase != GamePhase::Active {
            log::debug!("Ignoring click on card {card_id} while {:?}", self.status.phase);
            return false;
        }
        let Some(state) = self.state.as_mut() else {
            return false;
        };
        if state.flipped_cards.len() >= 2 {
            return false;
        }
        let Some(card) = state.card_mut(card_id).filter(|c| c.is_selectable()) else {
            log::debug!("Ignoring click on card {card_id}");
            return false;
        };

        card.is_flipped = true;
        state.flipped_cards.push(card_id);

        if state.flipped_cards.len() == 2 {
            state.attempts += 1;
            self.status.phase = GamePhase::Resolving;
            self.persist();
            self.scheduler.after(
                self.settings.reveal_delay(),
                Task::EvaluateMatch { game: self.game },
            );
        }

        self.notify();
        true
    }

    /// Run a task previously handed to the scheduler
    pub fn run_task(&mut self, task: Task) {
        match task {
            Task::EvaluateMatch { game } if game == self.game => self.evaluate_match(),
            Task::FlipBack { game, cards } if game == self.game => self.flip_back(cards),
            stale => log::debug!("Dropping stale {:?}", stale),
        }
    }

    /// Refresh the elapsed time (observational only)
    pub fn tick(&mut self) {
        if !self.in_play() {
            return;
        }
        let now = self.clock.now_ms();
        if let Some(state) = self.state.as_mut() {
            state.update_game_time(now);
        }
        self.notify();
    }

    fn evaluate_match(&mut self) {
        if self.status.phase != GamePhase::Resolving {
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let pair: Vec<u32> = state.flipped_cards.drain(..).collect();
        let [a, b] = pair[..] else {
            log::warn!("Expected two face-up cards, found {}", pair.len());
            self.status.phase = GamePhase::Active;
            self.notify();
            return;
        };

        let same = match (state.card(a), state.card(b)) {
            (Some(x), Some(y)) => x.symbol == y.symbol,
            _ => false,
        };

        if same {
            for id in [a, b] {
                if let Some(card) = state.card_mut(id) {
                    card.is_matched = true;
                }
            }
            state.matched_pairs += 1;
            if state.all_matched() {
                self.end_game();
                self.notify();
                return;
            }
        } else {
            self.scheduler.after(
                self.settings.flip_back_delay(),
                Task::FlipBack {
                    game: self.game,
                    cards: [a, b],
                },
            );
        }

        self.status.phase = GamePhase::Active;
        self.persist();
        self.notify();
    }

    fn flip_back(&mut self, cards: [u32; 2]) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        for id in cards {
            if let Some(card) = state.card_mut(id).filter(|c| !c.is_matched) {
                card.is_flipped = false;
            }
        }
        self.notify();
    }

    fn end_game(&mut self) {
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.update_game_time(now);
        state.is_game_active = false;
        let (time, attempts) = (state.game_time, state.attempts);
        self.status.phase = GamePhase::Complete;

        // Compare against what is stored, not just what this session saw
        match self.store.load_records() {
            Ok(records) => self.status.records = records,
            Err(e) => log::warn!("Could not reload records: {e}"),
        }
        let improved = self.status.records.apply(time, attempts, now);
        for record in &improved {
            if let Err(e) = self.store.set_record(record) {
                log::warn!("Failed to save record {}: {e}", record.key.as_str());
            }
        }

        if let Err(e) = self.store.delete_game() {
            log::warn!("Failed to clear saved game: {e}");
        }

        self.status.resume_available = false;
        self.status.notice = Some(Notice::Completed {
            time,
            attempts,
            new_record: !improved.is_empty(),
        });
        log::info!("Game complete in {time}s with {attempts} attempts");
    }

    /// Save the active game. Failures are logged, never surfaced.
    fn persist(&mut self) -> bool {
        let now = self.clock.now_ms();
        let Some(state) = self.state.as_mut().filter(|s| s.is_game_active) else {
            return false;
        };
        state.update_game_time(now);
        match self.store.save_game(state, now) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save game: {e}");
                false
            }
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let view = self.view();
        for observer in &mut self.observers {
            observer(&view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ManualClock, ManualScheduler, MemoryStorage};
    use crate::records::{Record, RecordKey};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    type TestEngine = Engine<MemoryStorage, ManualScheduler, ManualClock>;

    struct Harness {
        engine: TestEngine,
        scheduler: ManualScheduler,
        clock: ManualClock,
    }

    impl Harness {
        fn with_storage(storage: MemoryStorage) -> Self {
            let scheduler = ManualScheduler::new();
            let clock = ManualClock::new(1_000_000);
            let engine = Engine::new(
                GameStore::new(storage.clone()),
                scheduler.clone(),
                clock.clone(),
                Settings::default(),
            );
            Self {
                engine,
                scheduler,
                clock,
            }
        }

        fn new() -> Self {
            Self::with_storage(MemoryStorage::new())
        }

        /// Step scheduler time one second at a time, leaving the clock alone
        fn run_due(&mut self, secs: u64) {
            for _ in 0..secs {
                for task in self.scheduler.advance(Duration::from_secs(1)) {
                    self.engine.run_task(task);
                }
            }
        }

        /// Let `secs` of virtual time pass, running whatever comes due
        fn wait(&mut self, secs: u64) {
            for _ in 0..secs {
                self.clock.advance_secs(1);
                self.run_due(1);
            }
        }

        fn state(&self) -> &GameState {
            self.engine.state().unwrap()
        }

        /// Two unmatched card ids with the same symbol
        fn matching_pair(&self) -> (u32, u32) {
            let cards = &self.state().cards;
            for a in cards.iter().filter(|c| !c.is_matched) {
                if let Some(b) = cards
                    .iter()
                    .find(|b| b.id != a.id && !b.is_matched && b.symbol == a.symbol)
                {
                    return (a.id, b.id);
                }
            }
            panic!("no pair left");
        }

        /// Two unmatched card ids with different symbols
        fn mismatched_pair(&self) -> (u32, u32) {
            let cards = &self.state().cards;
            let a = cards.iter().find(|c| !c.is_matched).unwrap();
            let b = cards
                .iter()
                .find(|c| !c.is_matched && c.symbol != a.symbol)
                .unwrap();
            (a.id, b.id)
        }

        fn play_pair(&mut self, (a, b): (u32, u32)) {
            assert!(self.engine.flip(a));
            assert!(self.engine.flip(b));
            self.wait(2);
        }
    }

    #[test]
    fn test_new_game_is_active() {
        let mut h = Harness::new();
        assert_eq!(h.engine.phase(), GamePhase::Idle);

        h.engine.start_new_game(Level::Easy);

        assert_eq!(h.engine.phase(), GamePhase::Active);
        assert_eq!(h.state().cards.len(), 16);
        assert_eq!(h.state().attempts, 0);
        assert_eq!(h.state().game_time, 0);
        assert_eq!(h.engine.notice(), Some(Notice::NewGame));
    }

    #[test]
    fn test_mismatch_flips_back() {
        let mut h = Harness::new();
        h.engine.start_new_game_with_seed(Level::Easy, 1);
        let (a, b) = h.mismatched_pair();

        assert!(h.engine.flip(a));
        assert_eq!(h.engine.phase(), GamePhase::Active);
        assert!(h.engine.flip(b));
        assert_eq!(h.engine.phase(), GamePhase::Resolving);
        assert_eq!(h.state().attempts, 1);

        // Evaluation after the reveal delay
        h.wait(1);
        assert_eq!(h.engine.phase(), GamePhase::Active);
        assert!(h.state().flipped_cards.is_empty());
        assert!(h.state().card(a).unwrap().is_flipped);

        // Turned back after the second delay
        h.wait(1);
        assert!(!h.state().card(a).unwrap().is_flipped);
        assert!(!h.state().card(b).unwrap().is_flipped);
        assert_eq!(h.state().attempts, 1);
        assert_eq!(h.state().matched_pairs, 0);
    }

    #[test]
    fn test_match_is_retired() {
        let mut h = Harness::new();
        h.engine.start_new_game_with_seed(Level::Easy, 2);
        let (a, c) = h.matching_pair();

        h.play_pair((a, c));

        assert!(h.state().card(a).unwrap().is_matched);
        assert!(h.state().card(c).unwrap().is_matched);
        assert_eq!(h.state().matched_pairs, 1);
        assert_eq!(h.state().attempts, 1);
        assert_eq!(h.scheduler.pending(), 0);
    }

    #[test]
    fn test_third_flip_rejected_while_resolving() {
        let mut h = Harness::new();
        h.engine.start_new_game_with_seed(Level::Easy, 3);
        let (a, b) = h.mismatched_pair();
        let third = h
            .state()
            .cards
            .iter()
            .find(|c| c.id != a && c.id != b)
            .unwrap()
            .id;

        h.engine.flip(a);
        h.engine.flip(b);
        assert!(!h.engine.flip(third));
        assert_eq!(h.state().flipped_cards.len(), 2);
        assert!(!h.state().card(third).unwrap().is_flipped);
    }

    #[test]
    fn test_invalid_clicks_ignored() {
        let mut h = Harness::new();
        // No game yet
        assert!(!h.engine.flip(0));

        h.engine.start_new_game_with_seed(Level::Easy, 4);
        assert!(!h.engine.flip(999));

        let (a, c) = h.matching_pair();
        h.engine.flip(a);
        // Same card again
        assert!(!h.engine.flip(a));
        assert_eq!(h.state().flipped_cards, vec![a]);

        h.engine.flip(c);
        h.wait(1);
        // Matched card
        assert!(!h.engine.flip(a));
        assert_eq!(h.state().attempts, 1);
        assert_eq!(h.state().matched_pairs, 1);
    }

    #[test]
    fn test_pair_is_saved_on_second_flip() {
        let mut h = Harness::new();
        h.engine.start_new_game_with_seed(Level::Easy, 5);
        let (a, b) = h.mismatched_pair();

        h.engine.flip(a);
        assert!(h.engine.store().load_game().unwrap().is_none());

        h.engine.flip(b);
        let saved = h.engine.store().load_game().unwrap().unwrap();
        assert_eq!(saved.attempts, 1);
        assert_eq!(saved.flipped_cards.len(), 2);
    }

    #[test]
    fn test_completion_sets_records_and_clears_save() {
        let mut h = Harness::new();
        h.engine.start_new_game_with_seed(Level::Easy, 6);

        // Two misses, then all 8 pairs: 10 attempts in 45 seconds
        for _ in 0..2 {
            let pair = h.mismatched_pair();
            h.play_pair(pair);
        }
        for _ in 0..8 {
            let pair = h.matching_pair();
            h.play_pair(pair);
        }
        assert_eq!(h.engine.phase(), GamePhase::Complete);
        assert_eq!(h.state().attempts, 10);
        assert!(!h.state().is_game_active);
        assert!(h.engine.store().load_game().unwrap().is_none());

        let records = h.engine.records();
        assert_eq!(records.best_attempts, Some(10));
        assert_eq!(records.best_time, Some(h.state().game_time));
        assert!(matches!(
            h.engine.notice(),
            Some(Notice::Completed {
                attempts: 10,
                new_record: true,
                ..
            })
        ));
    }

    /// Play a full level-4 game with `misses` wasted pairs before the clock
    /// is wound to `secs` and the last match is made
    fn complete_game(h: &mut Harness, misses: u32, secs: u64) {
        h.engine.start_new_game_with_seed(Level::Easy, 77);
        let start = h.clock.now_ms();
        for _ in 0..misses {
            let pair = h.mismatched_pair();
            h.engine.flip(pair.0);
            h.engine.flip(pair.1);
            h.run_due(2);
        }
        for _ in 0..8 {
            let pair = h.matching_pair();
            h.engine.flip(pair.0);
            h.engine.flip(pair.1);
            h.clock.set(start + secs * 1000);
            h.run_due(1);
        }
        assert_eq!(h.engine.phase(), GamePhase::Complete);
    }

    #[test]
    fn test_records_scenario() {
        let mut h = Harness::new();

        complete_game(&mut h, 2, 45);
        assert_eq!(h.state().attempts, 10);
        assert_eq!(h.engine.records().best_time, Some(45));
        assert_eq!(h.engine.records().best_attempts, Some(10));

        complete_game(&mut h, 0, 60);
        assert_eq!(h.state().attempts, 8);
        assert_eq!(h.engine.records().best_time, Some(45));
        assert_eq!(h.engine.records().best_attempts, Some(8));

        let stored = h.engine.store().load_records().unwrap();
        assert_eq!(stored.best_time, Some(45));
        assert_eq!(stored.best_attempts, Some(8));
    }

    #[test]
    fn test_records_read_from_store_at_completion() {
        let storage = MemoryStorage::new();
        let mut h = Harness::with_storage(storage.clone());

        // Another session sets a better time after this engine loaded
        GameStore::new(storage)
            .set_record(&Record {
                key: RecordKey::BestTime,
                value: 5,
                timestamp: 0,
            })
            .unwrap();

        complete_game(&mut h, 0, 30);
        assert_eq!(h.engine.records().best_time, Some(5));
        assert_eq!(h.engine.records().best_attempts, Some(8));
    }

    #[test]
    fn test_resume_round_trip() {
        let storage = MemoryStorage::new();
        let mut h = Harness::with_storage(storage.clone());
        h.engine.start_new_game_with_seed(Level::Medium, 8);

        let pair = h.matching_pair();
        h.play_pair(pair);
        let miss = h.mismatched_pair();
        h.engine.flip(miss.0);
        h.engine.flip(miss.1);
        // Saved mid-resolution, with two cards face up
        let before = h.state().clone();

        let mut next = Harness::with_storage(storage);
        assert!(next.engine.resume_available());
        assert_eq!(next.engine.notice(), Some(Notice::SavedGameAvailable));
        assert!(next.engine.resume_game());

        let resumed = next.state();
        assert_eq!(next.engine.phase(), GamePhase::Active);
        assert_eq!(resumed.level, Level::Medium);
        assert_eq!(resumed.attempts, before.attempts);
        assert_eq!(resumed.matched_pairs, before.matched_pairs);
        assert!(resumed.flipped_cards.is_empty());
        for (r, b) in resumed.cards.iter().zip(&before.cards) {
            assert_eq!(r.symbol, b.symbol);
            assert_eq!(r.is_matched, b.is_matched);
            assert_eq!(r.is_flipped, b.is_matched);
        }
        assert!(!next.engine.resume_available());
    }

    #[test]
    fn test_resume_continues_clock() {
        let storage = MemoryStorage::new();
        let mut h = Harness::with_storage(storage.clone());
        h.engine.start_new_game_with_seed(Level::Easy, 9);
        h.clock.advance_secs(30);
        let miss = h.mismatched_pair();
        h.engine.flip(miss.0);
        h.engine.flip(miss.1);

        let mut next = Harness::with_storage(storage);
        next.clock.set(50_000_000);
        next.engine.resume_game();
        assert_eq!(next.state().game_time, 30);

        next.clock.advance_secs(5);
        next.engine.tick();
        assert_eq!(next.state().game_time, 35);
        assert_eq!(next.engine.view().elapsed, "00:35");
    }

    #[test]
    fn test_resume_without_save() {
        let mut h = Harness::new();
        assert!(!h.engine.resume_game());
        assert_eq!(h.engine.phase(), GamePhase::Idle);
        assert_eq!(h.engine.notice(), Some(Notice::NoSavedGame));
    }

    #[test]
    fn test_resume_rejects_inconsistent_save() {
        let storage = MemoryStorage::new();
        let mut state = GameState::new(Level::Easy, 10);
        state.cards.pop();
        GameStore::new(storage.clone()).save_game(&state, 0).unwrap();

        let mut h = Harness::with_storage(storage);
        assert!(!h.engine.resume_game());
        assert_eq!(h.engine.notice(), Some(Notice::NoSavedGame));
    }

    #[test]
    fn test_inconsistent_save_not_offered_at_startup() {
        let storage = MemoryStorage::new();
        let mut state = GameState::new(Level::Easy, 10);
        state.cards.pop();
        GameStore::new(storage.clone()).save_game(&state, 0).unwrap();

        let h = Harness::with_storage(storage);
        assert!(!h.engine.resume_available());
        assert_ne!(h.engine.notice(), Some(Notice::SavedGameAvailable));
        assert!(!h.engine.view().resume_available);
    }

    #[test]
    fn test_resume_rejected_mid_game() {
        let mut h = Harness::new();
        h.engine.start_new_game_with_seed(Level::Easy, 21);
        let miss = h.mismatched_pair();
        h.play_pair(miss);

        assert!(!h.engine.resume_game());
        assert_eq!(h.engine.notice(), Some(Notice::FinishBeforeResume));
        assert_eq!(
            h.engine.notice().unwrap().to_string(),
            "Finish the current game before resuming"
        );
        assert_eq!(h.engine.phase(), GamePhase::Active);
    }

    #[test]
    fn test_selected_level_is_remembered() {
        let storage = MemoryStorage::new();
        let mut h = Harness::with_storage(storage.clone());
        assert!(h.engine.select_level(Level::Medium));
        assert_eq!(Settings::load(&storage).default_level, Level::Medium);

        h.engine.start_new_game(Level::Medium);
        assert!(!h.engine.select_level(Level::Hard));
        assert_eq!(Settings::load(&storage).default_level, Level::Medium);
    }

    #[test]
    fn test_level_change_rejected_mid_game() {
        let mut h = Harness::new();
        assert!(h.engine.select_level(Level::Hard));
        assert_eq!(h.engine.selected_level(), Level::Hard);

        h.engine.start_new_game(Level::Hard);
        assert!(!h.engine.select_level(Level::Easy));
        assert_eq!(h.engine.notice(), Some(Notice::FinishCurrentGame));
        assert_eq!(h.engine.selected_level(), Level::Hard);
        assert_eq!(h.state().level, Level::Hard);
    }

    #[test]
    fn test_new_game_drops_pending_tasks_of_abandoned_game() {
        let mut h = Harness::new();
        h.engine.start_new_game_with_seed(Level::Easy, 11);
        let miss = h.mismatched_pair();
        h.engine.flip(miss.0);
        h.engine.flip(miss.1);

        h.engine.start_new_game_with_seed(Level::Easy, 12);
        let pair = h.matching_pair();
        h.engine.flip(pair.0);

        // The old evaluation fires but belongs to the abandoned game
        h.wait(1);
        assert_eq!(h.state().flipped_cards, vec![pair.0]);
        assert_eq!(h.state().attempts, 0);
        assert_eq!(h.engine.phase(), GamePhase::Active);
    }

    #[test]
    fn test_abandoned_game_stays_resumable_until_next_save() {
        // Starting over does not clear the slot; a crash before the next
        // save leaves the abandoned game resumable.
        let storage = MemoryStorage::new();
        let mut h = Harness::with_storage(storage.clone());
        h.engine.start_new_game_with_seed(Level::Easy, 13);
        let miss = h.mismatched_pair();
        h.play_pair(miss);

        h.engine.start_new_game_with_seed(Level::Medium, 14);
        let saved = h.engine.store().load_game().unwrap().unwrap();
        assert_eq!(saved.level, Level::Easy);
        assert!(Harness::with_storage(storage.clone()).engine.resume_available());

        // First save of the new game overwrites it
        let miss = h.mismatched_pair();
        h.play_pair(miss);
        let saved = h.engine.store().load_game().unwrap().unwrap();
        assert_eq!(saved.level, Level::Medium);
    }

    #[test]
    fn test_storage_failure_is_not_fatal() {
        let storage = MemoryStorage::new();
        storage.set_failing(true);
        let mut h = Harness::with_storage(storage.clone());
        assert!(!h.engine.resume_available());

        complete_game(&mut h, 1, 40);
        assert_eq!(h.state().matched_pairs, 8);
        // Records still tracked in memory for the session
        assert_eq!(h.engine.records().best_attempts, Some(9));

        storage.set_failing(false);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_tick_is_observational() {
        let mut h = Harness::new();
        h.engine.tick();
        assert!(h.engine.state().is_none());

        h.engine.start_new_game_with_seed(Level::Easy, 15);
        h.clock.advance_secs(3);
        h.engine.tick();
        assert_eq!(h.state().game_time, 3);
        assert_eq!(h.state().attempts, 0);
        assert_eq!(h.engine.phase(), GamePhase::Active);
    }

    #[test]
    fn test_observers_see_every_change() {
        let mut h = Harness::new();
        let seen: Rc<RefCell<Vec<BoardView>>> = Rc::default();
        let sink = seen.clone();
        h.engine.subscribe(move |view| sink.borrow_mut().push(view.clone()));
        assert_eq!(seen.borrow().len(), 1);

        h.engine.start_new_game_with_seed(Level::Easy, 16);
        let (a, b) = h.mismatched_pair();
        h.engine.flip(a);
        h.engine.flip(b);

        let views = seen.borrow();
        assert_eq!(views.len(), 4);
        let last = views.last().unwrap();
        assert_eq!(last.phase, GamePhase::Resolving);
        assert_eq!(last.attempts, 1);
        assert_eq!(last.cards.iter().filter(|c| c.face.class() == "revealed").count(), 2);
    }

    #[test]
    fn test_custom_delays() {
        let storage = MemoryStorage::new();
        let scheduler = ManualScheduler::new();
        let clock = ManualClock::new(0);
        let mut engine = Engine::new(
            GameStore::new(storage),
            scheduler.clone(),
            clock,
            Settings::instant(),
        );
        engine.start_new_game_with_seed(Level::Easy, 17);
        let a = engine.state().unwrap().cards[0].clone();
        let b = engine
            .state()
            .unwrap()
            .cards
            .iter()
            .find(|c| c.symbol != a.symbol)
            .unwrap()
            .id;
        engine.flip(a.id);
        engine.flip(b);

        assert_eq!(scheduler.next_due(), Some(Duration::ZERO));
        for task in scheduler.advance(Duration::ZERO) {
            engine.run_task(task);
        }
        for task in scheduler.advance(Duration::ZERO) {
            engine.run_task(task);
        }
        assert!(engine.state().unwrap().cards.iter().all(|c| !c.is_flipped));
    }

    proptest! {
        #[test]
        fn flipped_cards_never_exceed_two(clicks in prop::collection::vec((0u32..20, any::<bool>()), 0..80)) {
            let mut h = Harness::new();
            h.engine.start_new_game_with_seed(Level::Easy, 18);
            for (id, wait) in clicks {
                let before = h.state().clone();
                let accepted = h.engine.flip(id);
                if !accepted {
                    prop_assert_eq!(&h.state().flipped_cards, &before.flipped_cards);
                    prop_assert_eq!(h.state().attempts, before.attempts);
                    prop_assert_eq!(h.state().matched_pairs, before.matched_pairs);
                }
                prop_assert!(h.state().flipped_cards.len() <= 2);
                if wait {
                    h.wait(1);
                }
                prop_assert!(h.state().matched_pairs <= h.state().total_pairs());
            }
        }
    }
}
