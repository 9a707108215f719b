//! One-shot delayed actions, e.g. moving focus after a menu opens.

use metronome_core::{Item, ItemConfig, Scheduler, SchedulerResult, WeakScheduler};
use std::time::Duration;
use tracing::debug;

/// An action scheduled to run once after a delay.
#[derive(Debug)]
pub struct DeferredAction {
    item: Item,
    scheduler: WeakScheduler,
}

impl DeferredAction {
    /// Schedules `action` to run once `delay` of unpaused time has passed.
    ///
    /// # Errors
    ///
    /// Propagates item construction errors.
    pub fn schedule(
        scheduler: &Scheduler,
        delay: Duration,
        action: impl FnMut() + Send + 'static,
    ) -> SchedulerResult<Self> {
        let item = Item::with_clock(
            ItemConfig::new().with_duration(delay).on_timeout(action),
            scheduler.clock(),
        )?;
        scheduler.register(item.clone());
        debug!(?delay, "deferred action scheduled");

        Ok(Self {
            item,
            scheduler: scheduler.downgrade(),
        })
    }

    /// Drops the action without running it.
    pub fn cancel(&self) {
        self.item.destroy(true);
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.remove(&self.item);
        }
    }

    /// Runs the action now and unschedules it.
    pub fn fire_now(&self) {
        if !self.is_pending() {
            return;
        }
        self.item.destroy(true);
        self.item.timeout();
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.remove(&self.item);
        }
    }

    /// Returns true until the action runs or is cancelled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.item.is_retired() && !self.item.do_remove_on_next_tick()
    }

    /// The scheduled item.
    #[must_use]
    pub fn item(&self) -> &Item {
        &self.item
    }
}
