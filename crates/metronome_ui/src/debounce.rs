//! Debounced actions, e.g. relayout after a window resize burst.

use crate::action::{self, Action};
use metronome_core::{Item, ItemConfig, Scheduler, SchedulerResult};
use parking_lot::Mutex;
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Runs an action once a burst of triggers has been quiet for `delay`.
///
/// Every trigger silently destroys the pending one-shot item and registers a
/// fresh one, so only the last trigger of a burst survives.
pub struct Debouncer {
    scheduler: Scheduler,
    delay: Duration,
    action: Action,
    pending: Mutex<Option<Item>>,
}

impl Debouncer {
    /// Creates a debouncer on `scheduler`.
    pub fn new(scheduler: &Scheduler, delay: Duration, action: impl FnMut() + Send + 'static) -> Self {
        Self {
            scheduler: scheduler.clone(),
            delay,
            action: action::shared(action),
            pending: Mutex::new(None),
        }
    }

    /// Restarts the quiet period.
    ///
    /// # Errors
    ///
    /// Propagates item construction errors.
    pub fn trigger(&self) -> SchedulerResult<()> {
        let action = Action::clone(&self.action);
        let item = Item::with_clock(
            ItemConfig::new()
                .with_duration(self.delay)
                .on_timeout(move || action::run(&action)),
            self.scheduler.clock(),
        )?;

        let previous = self.pending.lock().replace(item.clone());
        if let Some(previous) = previous {
            self.drop_silently(&previous);
            trace!("debounce restarted");
        }
        self.scheduler.register(item);
        Ok(())
    }

    /// Drops the pending run, if any.
    pub fn cancel(&self) {
        let pending = self.pending.lock().take();
        if let Some(pending) = pending {
            self.drop_silently(&pending);
        }
    }

    /// Runs the pending action now instead of waiting.
    pub fn flush(&self) {
        let pending = self.pending.lock().take();
        if let Some(pending) = pending {
            if !pending.is_retired() && !pending.do_remove_on_next_tick() {
                self.drop_silently(&pending);
                action::run(&self.action);
            }
        }
    }

    fn drop_silently(&self, item: &Item) {
        item.destroy(true);
        self.scheduler.remove(item);
    }

    /// Returns true while a run is scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|item| !item.is_retired() && !item.do_remove_on_next_tick())
    }

    /// Quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}
