//! Memory Pairs entry point
//!
//! Binds the engine to the page on wasm32; natively runs a small
//! line-oriented terminal version over the same engine.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::{Rc, Weak};

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, MouseEvent};

    use memory_pairs::consts::TICK_INTERVAL_MS;
    use memory_pairs::platform::{Fallback, JsClock, LocalStorage, TimeoutScheduler};
    use memory_pairs::sim::{BoardView, CardView, Engine, Level};
    use memory_pairs::{GameStore, Settings};

    type Game = Engine<Fallback<LocalStorage>, TimeoutScheduler, JsClock>;

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Memory Pairs starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let storage = Fallback::or_memory(LocalStorage::open());
        let settings = Settings::load(&storage);

        // Timeouts call back into the engine through a weak handle
        let game: Rc<RefCell<Game>> = Rc::new_cyclic(|weak: &Weak<RefCell<Game>>| {
            let weak = weak.clone();
            let scheduler = TimeoutScheduler::new(move |task| {
                if let Some(game) = weak.upgrade() {
                    game.borrow_mut().run_task(task);
                }
            });
            RefCell::new(Engine::new(
                GameStore::new(storage),
                scheduler,
                JsClock,
                settings,
            ))
        });

        {
            let document = document.clone();
            let mut last_cards: Option<Vec<CardView>> = None;
            game.borrow_mut()
                .subscribe(move |view| render_view(&document, view, &mut last_cards));
        }

        setup_board(&document, game.clone());
        setup_difficulty_buttons(&document, game.clone());
        setup_game_buttons(&document, game.clone());
        setup_timer(game);

        log::info!("Memory Pairs running!");
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_disabled(el: &Element, disabled: bool) {
        if let Some(btn) = el.dyn_ref::<HtmlButtonElement>() {
            btn.set_disabled(disabled);
        }
    }

    /// Level encoded in a difficulty button's `data-level`
    fn button_level(el: &Element) -> Option<Level> {
        el.get_attribute("data-level")?
            .parse::<u8>()
            .ok()
            .and_then(Level::from_side)
    }

    fn difficulty_buttons(document: &Document) -> Vec<Element> {
        let Ok(list) = document.query_selector_all(".difficulty-btn") else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    /// Redraw the page from a view
    fn render_view(document: &Document, view: &BoardView, last_cards: &mut Option<Vec<CardView>>) {
        // Only rebuild the board when a card changed (ticks arrive every second)
        if last_cards.as_ref() != Some(&view.cards) {
            render_board(document, view);
            *last_cards = Some(view.cards.clone());
        }

        set_text(document, "attempts", &view.attempts.to_string());
        set_text(document, "pairs-found", &view.pairs_display());
        set_text(document, "timer", &view.elapsed);
        set_text(document, "best-time", &view.best_time);
        set_text(document, "best-attempts", &view.best_attempts);

        if let Some(el) = document.get_element_by_id("game-message") {
            match view.notice {
                Some(notice) => {
                    el.set_text_content(Some(&notice.to_string()));
                    let _ = el.set_attribute(
                        "class",
                        &format!("game-message {}", notice.tone().as_str()),
                    );
                }
                None => {
                    el.set_text_content(Some(""));
                    let _ = el.set_attribute("class", "game-message");
                }
            }
        }

        if let Some(el) = document.get_element_by_id("resume-game") {
            set_disabled(&el, !view.resume_available);
        }
        if let Some(el) = document.get_element_by_id("new-game") {
            let label = if view.can_select_level() {
                "New Game"
            } else {
                "Restart"
            };
            el.set_text_content(Some(label));
        }

        for btn in difficulty_buttons(document) {
            set_disabled(&btn, !view.can_select_level());
            let active = button_level(&btn) == Some(view.selected_level);
            let _ = btn.class_list().toggle_with_force("active", active);
        }
    }

    fn render_board(document: &Document, view: &BoardView) {
        let Some(board) = document.get_element_by_id("game-board") else {
            return;
        };
        board.set_inner_html("");

        let side = view.level.side();
        let _ = board.set_attribute("class", &format!("game-board level-{side}"));
        if let Some(board) = board.dyn_ref::<HtmlElement>() {
            let _ = board
                .style()
                .set_property("grid-template-columns", &format!("repeat({side}, 1fr)"));
        }

        for card in &view.cards {
            let Ok(el) = document.create_element("div") else {
                continue;
            };
            let class = match card.face.class() {
                "hidden" => "card",
                "revealed" => "card flipped",
                _ => "card flipped matched",
            };
            let _ = el.set_attribute("class", class);
            let _ = el.set_attribute("data-card-id", &card.id.to_string());
            if let Ok(span) = document.create_element("span") {
                span.set_text_content(Some(card.face.label()));
                let _ = el.append_child(&span);
            }
            let _ = board.append_child(&el);
        }
    }

    fn setup_board(document: &Document, game: Rc<RefCell<Game>>) {
        let Some(board) = document.get_element_by_id("game-board") else {
            log::error!("No #game-board element");
            return;
        };

        // One delegated listener; cards are rebuilt on redraw
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let card_id = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .and_then(|el| el.closest(".card").ok().flatten())
                .and_then(|el| el.get_attribute("data-card-id"))
                .and_then(|id| id.parse::<u32>().ok());
            if let Some(id) = card_id {
                game.borrow_mut().flip(id);
            }
        });
        let _ = board.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_difficulty_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        for btn in difficulty_buttons(document) {
            let Some(level) = button_level(&btn) else {
                log::warn!("Difficulty button without a valid data-level");
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().select_level(level);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_game_buttons(document: &Document, game: Rc<RefCell<Game>>) {
        if let Some(btn) = document.get_element_by_id("new-game") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                let level = g.selected_level();
                g.start_new_game(level);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("resume-game") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().resume_game();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_timer(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut()>::new(move || {
            game.borrow_mut().tick();
        });
        if let Err(e) = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            TICK_INTERVAL_MS as i32,
        ) {
            log::error!("setInterval failed: {:?}", e);
        }
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod terminal {
    use std::io::{self, BufRead, Write};
    use std::path::PathBuf;

    use memory_pairs::platform::{Fallback, FileStorage, ManualScheduler, SystemClock};
    use memory_pairs::sim::{BoardView, Engine, GamePhase, Level};
    use memory_pairs::{GameStore, Settings};

    type Game = Engine<Fallback<FileStorage>, ManualScheduler, SystemClock>;

    const HELP: &str = "\
commands:
  <id> | flip <id>   turn a card over
  new [4|6|10]       start a new game
  level <4|6|10>     choose difficulty for the next game
  resume             continue the saved game
  show               redraw the board
  help               this text
  quit               leave (an unfinished game stays saved)";

    fn data_dir() -> PathBuf {
        std::env::var_os("MEMORY_PAIRS_DATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".memory-pairs"))
    }

    fn print_view(view: &BoardView) {
        let side = view.level.side() as usize;
        if !view.cards.is_empty() {
            for row in view.cards.chunks(side) {
                let line: Vec<String> = row
                    .iter()
                    .map(|c| match c.face.class() {
                        "hidden" => format!("{:>3}", c.id),
                        _ => format!("{:>3}", c.face.label()),
                    })
                    .collect();
                println!("{}", line.join(" "));
            }
        }
        println!(
            "attempts {}  pairs {}  time {}  best {} / {}",
            view.attempts,
            view.pairs_display(),
            view.elapsed,
            view.best_time,
            view.best_attempts
        );
        if let Some(notice) = view.notice {
            println!("> {notice}");
        }
    }

    /// Let pending delays pass for real, running each task as it comes due
    fn settle(game: &mut Game, scheduler: &ManualScheduler) {
        while let Some(wait) = scheduler.next_due() {
            std::thread::sleep(wait);
            for task in scheduler.advance(wait) {
                game.run_task(task);
            }
        }
    }

    fn parse_level(arg: Option<&str>) -> Option<Level> {
        arg?.parse::<u8>().ok().and_then(Level::from_side)
    }

    pub fn run() -> io::Result<()> {
        env_logger::init();
        log::info!("Memory Pairs (terminal) starting...");

        let opened = FileStorage::open(data_dir());
        if let Ok(files) = &opened {
            log::info!("Saving progress in {}", files.dir().display());
        }
        let storage = Fallback::or_memory(opened);
        if !storage.is_persistent() {
            println!("(storage unavailable, progress will not be saved)");
        }
        let settings = Settings::load(&storage);
        let scheduler = ManualScheduler::new();
        let mut game: Game = Engine::new(
            GameStore::new(storage),
            scheduler.clone(),
            SystemClock,
            settings,
        );

        println!("Memory Pairs. Type `help` for commands.");
        print_view(&game.view());

        let stdin = io::stdin();
        let mut input = String::new();
        loop {
            print!("> ");
            io::stdout().flush()?;
            input.clear();
            if stdin.lock().read_line(&mut input)? == 0 {
                break;
            }

            let mut words = input.split_whitespace();
            let Some(command) = words.next() else {
                continue;
            };
            game.tick();

            match command {
                "quit" | "exit" => break,
                "help" => {
                    println!("{HELP}");
                    continue;
                }
                "show" => {}
                "new" => {
                    let level = parse_level(words.next()).unwrap_or(game.selected_level());
                    game.start_new_game(level);
                }
                "level" => match parse_level(words.next()) {
                    Some(level) => {
                        game.select_level(level);
                    }
                    None => println!("levels: 4, 6, 10"),
                },
                "resume" => {
                    game.resume_game();
                }
                other => {
                    let arg = if other == "flip" { words.next() } else { Some(other) };
                    match arg.and_then(|a| a.parse::<u32>().ok()) {
                        Some(id) => {
                            game.flip(id);
                            if game.phase() == GamePhase::Resolving {
                                print_view(&game.view());
                                settle(&mut game, &scheduler);
                            }
                        }
                        None => {
                            println!("unknown command, try `help`");
                            continue;
                        }
                    }
                }
            }
            print_view(&game.view());
        }

        log::info!("Bye");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::io::Result<()> {
    terminal::run()
}
