//! # Schedulable Items
//!
//! An [`Item`] is one unit of timed work: either a one-shot action that fires
//! after its duration elapses, or an indefinite action that repeats every
//! update interval until it is removed.
//!
//! ## Lifecycle
//!
//! ```text
//!            pause()            duration elapsed
//!  Active ──────────► Paused      Active ──────────► Retired(TimedOut)
//!    ▲                  │         Active ──destroy──► Retired(Destroyed)
//!    └──── resume() ────┘         any    ──remove───► Retired(Removed)
//! ```
//!
//! Retired is terminal. Elapsed time always excludes paused intervals,
//! including a pause that is still in progress.
//!
//! Items are handles: cloning one shares the same state, so a component can
//! keep a copy to pause or destroy the item the scheduler is sweeping.

use crate::clock::{system_clock, Clock};
use crate::config::{interval_from_millis, ItemTiming, RawMillis, MIN_UPDATE_INTERVAL};
use crate::error::{SchedulerError, SchedulerResult};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{trace, warn};

/// Item callback. Runs on the thread that pumps the scheduler.
pub type Callback = Box<dyn FnMut() + Send>;

/// How long an item lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemDuration {
    /// Fire the timeout callback once this much unpaused time has passed, then retire.
    Finite(Duration),
    /// Never retire on time alone. Update callbacks repeat until removal.
    Indefinite,
}

impl ItemDuration {
    /// Millisecond sentinel for [`ItemDuration::Indefinite`].
    pub const INDEFINITE_MILLIS: i64 = -1;

    /// Parses a millisecond duration where `-1` means indefinite.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidDuration`] for negatives other than `-1`.
    pub fn from_millis(ms: i64) -> SchedulerResult<Self> {
        match ms {
            Self::INDEFINITE_MILLIS => Ok(Self::Indefinite),
            ms if ms >= 0 => Ok(Self::Finite(Duration::from_millis(ms.unsigned_abs()))),
            ms => Err(SchedulerError::InvalidDuration(ms)),
        }
    }

    /// Returns true for indefinite (periodic) items.
    #[must_use]
    pub const fn is_indefinite(self) -> bool {
        matches!(self, Self::Indefinite)
    }

    /// Millisecond form, `-1` for indefinite.
    #[must_use]
    pub fn as_millis(self) -> i64 {
        match self {
            Self::Indefinite => Self::INDEFINITE_MILLIS,
            Self::Finite(duration) => i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        }
    }
}

impl From<Duration> for ItemDuration {
    fn from(duration: Duration) -> Self {
        Self::Finite(duration)
    }
}

/// Why an item left its scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetireReason {
    /// Duration elapsed during a sweep.
    TimedOut,
    /// Flagged by [`Item::destroy`] and collected by the next sweep.
    Destroyed,
    /// Taken out by [`Scheduler::remove`](crate::Scheduler::remove).
    Removed,
}

/// Observable lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Swept every tick.
    Active,
    /// Skipped by sweeps; elapsed time is frozen.
    Paused,
    /// Terminal.
    Retired(RetireReason),
}

enum DurationInput {
    Millis(i64),
    Exact(ItemDuration),
}

/// Builder describing an item before validation.
#[derive(Default)]
pub struct ItemConfig {
    id: Option<String>,
    duration: Option<DurationInput>,
    update_duration: Option<RawMillis>,
    timeout_callback: Option<Callback>,
    update_callback: Option<Callback>,
}

impl ItemConfig {
    /// Empty config. Needs an id or duration and at least one callback.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the timing half loaded from a config file.
    #[must_use]
    pub fn from_timing(timing: ItemTiming) -> Self {
        Self {
            id: timing.id,
            duration: timing.duration_ms.map(DurationInput::Millis),
            update_duration: timing.update_duration_ms,
            ..Self::default()
        }
    }

    /// Stable id used by [`Scheduler::remove`](crate::Scheduler::remove).
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the lifetime.
    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<ItemDuration>) -> Self {
        self.duration = Some(DurationInput::Exact(duration.into()));
        self
    }

    /// Sets the lifetime in milliseconds, `-1` for indefinite.
    #[must_use]
    pub fn with_duration_ms(mut self, ms: i64) -> Self {
        self.duration = Some(DurationInput::Millis(ms));
        self
    }

    /// Shorthand for an indefinite lifetime.
    #[must_use]
    pub fn indefinite(self) -> Self {
        self.with_duration(ItemDuration::Indefinite)
    }

    /// Interval between update callbacks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_duration = Some(RawMillis::Number(interval.as_nanos() as f64 / 1_000_000.0));
        self
    }

    /// Interval between update callbacks from an unchecked value. Invalid
    /// values are corrected to [`MIN_UPDATE_INTERVAL`].
    #[must_use]
    pub fn with_update_duration_ms(mut self, ms: impl Into<RawMillis>) -> Self {
        self.update_duration = Some(ms.into());
        self
    }

    /// Callback fired when the item times out or is removed.
    #[must_use]
    pub fn on_timeout(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.timeout_callback = Some(Box::new(callback));
        self
    }

    /// Callback fired every update interval while an indefinite item is active.
    #[must_use]
    pub fn on_update(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.update_callback = Some(Box::new(callback));
        self
    }

    /// Validates and builds the item on the process-wide system clock.
    ///
    /// # Errors
    ///
    /// See [`Item::with_clock`].
    pub fn build(self) -> SchedulerResult<Item> {
        Item::new(self)
    }
}

impl fmt::Debug for ItemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemConfig")
            .field("id", &self.id)
            .field("update_duration", &self.update_duration)
            .field("has_timeout_callback", &self.timeout_callback.is_some())
            .field("has_update_callback", &self.update_callback.is_some())
            .finish_non_exhaustive()
    }
}

struct ItemTimes {
    start_time: Duration,
    paused: bool,
    last_pause_time: Option<Duration>,
    total_stopped_time: Duration,
    /// Elapsed time at the last update callback.
    last_update: Duration,
    update_duration: Duration,
    remove_on_next_tick: bool,
    silent: bool,
    retired: Option<RetireReason>,
}

impl ItemTimes {
    fn elapsed_at(&self, now: Duration) -> Duration {
        let mut stopped = self.total_stopped_time;
        if self.paused {
            if let Some(paused_at) = self.last_pause_time {
                stopped += now.saturating_sub(paused_at);
            }
        }
        now.saturating_sub(self.start_time).saturating_sub(stopped)
    }
}

struct ItemInner {
    id: Option<String>,
    duration: ItemDuration,
    clock: Arc<dyn Clock>,
    timeout_callback: Option<Mutex<Callback>>,
    update_callback: Option<Mutex<Callback>>,
    times: Mutex<ItemTimes>,
}

/// Shared handle to a schedulable unit of work.
#[derive(Clone)]
pub struct Item {
    inner: Arc<ItemInner>,
}

/// Non-owning item handle, for callbacks that need to reach their own item.
#[derive(Clone, Default)]
pub struct WeakItem {
    inner: Weak<ItemInner>,
}

impl WeakItem {
    /// The item, if any handle to it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Item> {
        self.inner.upgrade().map(|inner| Item { inner })
    }
}

impl fmt::Debug for WeakItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakItem")
    }
}

impl Item {
    /// Builds an item on the process-wide system clock.
    ///
    /// # Errors
    ///
    /// See [`Item::with_clock`].
    pub fn new(config: ItemConfig) -> SchedulerResult<Self> {
        Self::with_clock(config, system_clock())
    }

    /// Builds an item whose timing is read from `clock`.
    ///
    /// An id without a duration makes an indefinite item. Invalid update
    /// intervals are corrected to [`MIN_UPDATE_INTERVAL`].
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::MissingIdentity`] with neither id nor duration
    /// - [`SchedulerError::InvalidDuration`] for negatives other than `-1`
    /// - [`SchedulerError::MissingCallback`] with neither callback
    pub fn with_clock(config: ItemConfig, clock: Arc<dyn Clock>) -> SchedulerResult<Self> {
        let ItemConfig {
            id,
            duration,
            update_duration,
            timeout_callback,
            update_callback,
        } = config;

        let duration = match duration {
            Some(DurationInput::Exact(duration)) => duration,
            Some(DurationInput::Millis(ms)) => ItemDuration::from_millis(ms)?,
            None if id.is_some() => ItemDuration::Indefinite,
            None => return Err(SchedulerError::MissingIdentity),
        };

        if timeout_callback.is_none() && update_callback.is_none() {
            return Err(SchedulerError::MissingCallback);
        }

        let update_duration = match update_duration {
            None => MIN_UPDATE_INTERVAL,
            Some(raw) => raw.to_interval().unwrap_or_else(|| {
                warn!(item = ?id, value = ?raw, "invalid update duration, using minimum");
                MIN_UPDATE_INTERVAL
            }),
        };

        let start_time = clock.now();
        Ok(Self {
            inner: Arc::new(ItemInner {
                id,
                duration,
                clock,
                timeout_callback: timeout_callback.map(Mutex::new),
                update_callback: update_callback.map(Mutex::new),
                times: Mutex::new(ItemTimes {
                    start_time,
                    paused: false,
                    last_pause_time: None,
                    total_stopped_time: Duration::ZERO,
                    last_update: Duration::ZERO,
                    update_duration,
                    remove_on_next_tick: false,
                    silent: false,
                    retired: None,
                }),
            }),
        })
    }

    /// Stable id, if one was given.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    /// Configured lifetime.
    #[must_use]
    pub fn duration(&self) -> ItemDuration {
        self.inner.duration
    }

    /// Clock time at construction.
    #[must_use]
    pub fn start_time(&self) -> Duration {
        self.inner.times.lock().start_time
    }

    /// Time since construction minus every paused interval.
    #[must_use]
    pub fn elapsed_time(&self) -> Duration {
        let now = self.inner.clock.now();
        self.inner.times.lock().elapsed_at(now)
    }

    /// Clock time of the most recent `pause()`.
    #[must_use]
    pub fn last_pause_time(&self) -> Option<Duration> {
        self.inner.times.lock().last_pause_time
    }

    /// Sum of completed paused intervals.
    #[must_use]
    pub fn total_stopped_time(&self) -> Duration {
        self.inner.times.lock().total_stopped_time
    }

    /// Returns true while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.times.lock().paused
    }

    /// Interval between update callbacks.
    #[must_use]
    pub fn update_duration(&self) -> Duration {
        self.inner.times.lock().update_duration
    }

    /// Returns true once [`destroy`](Self::destroy) has flagged the item.
    #[must_use]
    pub fn do_remove_on_next_tick(&self) -> bool {
        self.inner.times.lock().remove_on_next_tick
    }

    /// Returns true if the timeout callback is suppressed on removal.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.inner.times.lock().silent
    }

    /// Returns true once the item has left its scheduler for good.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.inner.times.lock().retired.is_some()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ItemState {
        let times = self.inner.times.lock();
        match times.retired {
            Some(reason) => ItemState::Retired(reason),
            None if times.paused => ItemState::Paused,
            None => ItemState::Active,
        }
    }

    /// Returns true if a timeout callback was supplied.
    #[must_use]
    pub fn has_timeout_callback(&self) -> bool {
        self.inner.timeout_callback.is_some()
    }

    /// Returns true if an update callback was supplied.
    #[must_use]
    pub fn has_update_callback(&self) -> bool {
        self.inner.update_callback.is_some()
    }

    /// Freezes elapsed time. A second call while paused is a no-op.
    pub fn pause(&self) {
        let now = self.inner.clock.now();
        let mut times = self.inner.times.lock();
        if times.paused || times.retired.is_some() {
            return;
        }
        times.paused = true;
        times.last_pause_time = Some(now);
        trace!(item = self.label(), "paused");
    }

    /// Resumes elapsed time, adding the paused interval to
    /// [`total_stopped_time`](Self::total_stopped_time). No-op unless paused,
    /// and on a retired item.
    pub fn resume(&self) {
        let now = self.inner.clock.now();
        let mut times = self.inner.times.lock();
        if !times.paused || times.retired.is_some() {
            return;
        }
        if let Some(paused_at) = times.last_pause_time {
            times.total_stopped_time += now.saturating_sub(paused_at);
        }
        times.paused = false;
        trace!(item = self.label(), "resumed");
    }

    /// Fires the timeout callback now. The item stays registered; removing it
    /// is a separate call.
    pub fn timeout(&self) {
        self.fire_timeout();
    }

    /// Flags the item for removal on the next sweep. With `silent` the timeout
    /// callback is suppressed when it goes.
    pub fn destroy(&self, silent: bool) {
        let mut times = self.inner.times.lock();
        if times.retired.is_some() {
            return;
        }
        times.remove_on_next_tick = true;
        times.silent = silent;
        trace!(item = self.label(), silent, "flagged for removal");
    }

    /// Sets the update interval. A zero interval is corrected like any other
    /// invalid value, see [`set_update_duration_ms`](Self::set_update_duration_ms).
    pub fn set_update_duration(&self, interval: Duration) {
        self.apply_update_duration((!interval.is_zero()).then_some(interval));
    }

    /// Sets the update interval in milliseconds.
    ///
    /// Anything that is not a finite positive number is corrected to
    /// [`MIN_UPDATE_INTERVAL`], and the update callback runs once right away
    /// so a registered item keeps making progress.
    pub fn set_update_duration_ms(&self, ms: f64) {
        self.apply_update_duration(interval_from_millis(ms));
    }

    /// Sets the update interval from text, e.g. a form field. Unparseable
    /// text is corrected as in [`set_update_duration_ms`](Self::set_update_duration_ms).
    pub fn set_update_duration_raw(&self, raw: &str) {
        self.apply_update_duration(RawMillis::from(raw).to_interval());
    }

    /// Non-owning handle to this item.
    #[must_use]
    pub fn downgrade(&self) -> WeakItem {
        WeakItem {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Returns true if both handles refer to the same item.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn label(&self) -> &str {
        self.inner.id.as_deref().unwrap_or("<anonymous>")
    }

    fn apply_update_duration(&self, interval: Option<Duration>) {
        if let Some(interval) = interval {
            self.inner.times.lock().update_duration = interval;
            return;
        }

        self.inner.times.lock().update_duration = MIN_UPDATE_INTERVAL;
        warn!(
            item = self.label(),
            "invalid update duration, corrected to {MIN_UPDATE_INTERVAL:?}"
        );
        self.fire_update();
    }

    fn fire_timeout(&self) -> bool {
        invoke(self.inner.timeout_callback.as_ref(), self.label(), "timeout")
    }

    fn fire_update(&self) -> bool {
        invoke(self.inner.update_callback.as_ref(), self.label(), "update")
    }

    /// Evaluates the item for one sweep. Returns true if it must leave the
    /// scheduler's list.
    pub(crate) fn sweep(&self) -> bool {
        let now = self.inner.clock.now();
        let mut times = self.inner.times.lock();
        if times.retired.is_some() {
            return true;
        }

        // Paused items are skipped whole, a pending destroy included.
        if times.paused {
            return false;
        }

        let elapsed = times.elapsed_at(now);
        match self.inner.duration {
            ItemDuration::Indefinite => {
                if self.inner.update_callback.is_some()
                    && elapsed.saturating_sub(times.last_update) >= times.update_duration
                {
                    times.last_update = elapsed;
                    drop(times);
                    self.fire_update();

                    // The callback may have destroyed or removed its own item.
                    times = self.inner.times.lock();
                    if times.retired.is_some() {
                        return true;
                    }
                }
            }
            ItemDuration::Finite(limit) => {
                if elapsed >= limit {
                    times.retired = Some(RetireReason::TimedOut);
                    drop(times);
                    self.fire_timeout();
                    return true;
                }
            }
        }

        if times.remove_on_next_tick {
            times.retired = Some(RetireReason::Destroyed);
            let silent = times.silent;
            drop(times);
            if !silent {
                self.fire_timeout();
            }
            return true;
        }

        false
    }

    /// Retires the item on explicit removal. Fires the timeout callback unless
    /// suppressed or already retired. Returns true if it fired.
    pub(crate) fn retire_removed(&self) -> bool {
        let mut times = self.inner.times.lock();
        if times.retired.is_some() {
            return false;
        }
        times.retired = Some(RetireReason::Removed);
        let silent = times.silent;
        drop(times);

        !silent && self.fire_timeout()
    }

    /// Pauses on behalf of a stopping scheduler. Returns true if this call
    /// paused it, so the scheduler knows what to resume.
    pub(crate) fn pause_for_scheduler(&self) -> bool {
        if self.is_paused() || self.is_retired() {
            return false;
        }
        self.pause();
        true
    }
}

fn invoke(slot: Option<&Mutex<Callback>>, item: &str, kind: &'static str) -> bool {
    let Some(slot) = slot else {
        return false;
    };
    let Some(mut guard) = slot.try_lock() else {
        warn!(item, kind, "callback re-entered its own item, skipped");
        return false;
    };
    let callback: &mut (dyn FnMut() + Send) = &mut **guard;
    callback();
    true
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Item {}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.inner.id)
            .field("duration", &self.inner.duration)
            .field("state", &self.state())
            .field("update_duration", &self.update_duration())
            .finish_non_exhaustive()
    }
}
