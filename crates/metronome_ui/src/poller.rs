//! Polling-style refreshes.

use crate::action::{self, Action};
use metronome_core::{Item, ItemConfig, Scheduler, SchedulerResult, WeakScheduler};
use std::time::Duration;
use tracing::debug;

/// Runs a refresh every interval until cancelled.
#[derive(Debug)]
pub struct Poller {
    item: Item,
    scheduler: WeakScheduler,
}

impl Poller {
    /// Starts polling on `scheduler`.
    ///
    /// # Errors
    ///
    /// Propagates item construction errors.
    pub fn start(
        scheduler: &Scheduler,
        id: impl Into<String>,
        interval: Duration,
        refresh: impl FnMut() + Send + 'static,
    ) -> SchedulerResult<Self> {
        Self::build(scheduler, id.into(), interval, action::shared(refresh), None)
    }

    /// Starts polling; `on_stop` runs once when the poller is cancelled.
    ///
    /// # Errors
    ///
    /// Propagates item construction errors.
    pub fn start_with_stop(
        scheduler: &Scheduler,
        id: impl Into<String>,
        interval: Duration,
        refresh: impl FnMut() + Send + 'static,
        on_stop: impl FnMut() + Send + 'static,
    ) -> SchedulerResult<Self> {
        Self::build(
            scheduler,
            id.into(),
            interval,
            action::shared(refresh),
            Some(action::shared(on_stop)),
        )
    }

    fn build(
        scheduler: &Scheduler,
        id: String,
        interval: Duration,
        refresh: Action,
        on_stop: Option<Action>,
    ) -> SchedulerResult<Self> {
        let mut config = ItemConfig::new()
            .with_id(id)
            .indefinite()
            .with_update_interval(interval)
            .on_update(move || action::run(&refresh));
        if let Some(on_stop) = on_stop {
            config = config.on_timeout(move || action::run(&on_stop));
        }

        let item = Item::with_clock(config, scheduler.clock())?;
        scheduler.register(item.clone());
        debug!(id = ?item.id(), ?interval, "poller started");

        Ok(Self {
            item,
            scheduler: scheduler.downgrade(),
        })
    }

    /// Poller id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.item.id().unwrap_or_default()
    }

    /// Changes the interval in milliseconds. Invalid values fall back to the
    /// minimum interval and trigger one refresh right away.
    pub fn set_interval_ms(&self, ms: f64) {
        self.item.set_update_duration_ms(ms);
    }

    /// Current interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.item.update_duration()
    }

    /// Suspends refreshes.
    pub fn pause(&self) {
        self.item.pause();
    }

    /// Continues refreshing.
    pub fn resume(&self) {
        self.item.resume();
    }

    /// Stops polling. Returns false if it was already stopped.
    pub fn cancel(&self) -> bool {
        self.scheduler
            .upgrade()
            .and_then(|scheduler| scheduler.remove(&self.item))
            .is_some()
    }
}
