//! Delayed task scheduling
//!
//! The engine never sleeps: it hands a `Task` to a `Scheduler` and the host
//! gives it back through `Engine::run_task` once the delay has passed.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::sim::Task;

pub trait Scheduler {
    /// Run `task` once `delay` has elapsed
    fn after(&mut self, delay: Duration, task: Task);
}

#[derive(Debug, Default)]
struct Queue {
    now: Duration,
    next_seq: u64,
    pending: Vec<(Duration, u64, Task)>,
}

/// Virtual-time scheduler for tests and the terminal front end.
///
/// Nothing fires on its own; `advance` moves virtual time forward and
/// returns the tasks that came due, oldest first. Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<Queue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `by` and drain every task due at or before it
    pub fn advance(&self, by: Duration) -> Vec<Task> {
        let mut queue = self.queue.borrow_mut();
        queue.now += by;
        let now = queue.now;

        let mut due: Vec<_> = Vec::new();
        queue.pending.retain(|entry| {
            if entry.0 <= now {
                due.push(entry.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, seq, _)| (*at, *seq));
        due.into_iter().map(|(_, _, task)| task).collect()
    }

    /// Time until the earliest pending task, if any
    pub fn next_due(&self) -> Option<Duration> {
        let queue = self.queue.borrow();
        queue
            .pending
            .iter()
            .map(|(at, _, _)| at.saturating_sub(queue.now))
            .min()
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }
}

impl Scheduler for ManualScheduler {
    fn after(&mut self, delay: Duration, task: Task) {
        let mut queue = self.queue.borrow_mut();
        let at = queue.now + delay;
        let seq = queue.next_seq;
        queue.next_seq += 1;
        queue.pending.push((at, seq, task));
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::TimeoutScheduler;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::rc::Rc;
    use std::time::Duration;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::Scheduler;
    use crate::sim::Task;

    /// `setTimeout`-backed scheduler; `dispatch` receives each task when it fires
    pub struct TimeoutScheduler {
        dispatch: Rc<dyn Fn(Task)>,
    }

    impl TimeoutScheduler {
        pub fn new(dispatch: impl Fn(Task) + 'static) -> Self {
            Self {
                dispatch: Rc::new(dispatch),
            }
        }
    }

    impl Scheduler for TimeoutScheduler {
        fn after(&mut self, delay: Duration, task: Task) {
            let Some(window) = web_sys::window() else {
                log::error!("No window, dropping {:?}", task);
                return;
            };
            let dispatch = self.dispatch.clone();
            let closure = Closure::once(move || dispatch(task));
            if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay.as_millis() as i32,
            ) {
                log::error!("setTimeout failed: {:?}", e);
            }
            closure.forget();
        }
    }
}
