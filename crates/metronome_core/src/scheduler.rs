//! # Scheduler
//!
//! Owns the registered items and sweeps them once per tick.
//!
//! ## Tick
//!
//! ```text
//!  tick source ──► on_frame ──► tick() ──► re-arm
//!                                 │
//!                 snapshot items (registration order)
//!                                 │
//!            for each item: update / timeout / destroy
//!                                 │
//!              drop retired items in one pass at the end
//! ```
//!
//! Callbacks run without the scheduler lock held, so they may register,
//! remove, stop or start freely. Items registered mid-sweep are first seen on
//! the next tick; items removed mid-sweep are not evaluated again.

use crate::clock::{system_clock, Clock};
use crate::config::SchedulerOptions;
use crate::item::Item;
use crate::shared::shared_frame_signal;
use crate::tick_source::{TickHandle, TickSource};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Target of [`Scheduler::remove`]: an item handle or an id.
#[derive(Clone, Copy, Debug)]
pub enum ItemRef<'a> {
    /// Match by identity.
    Item(&'a Item),
    /// Match by id.
    Id(&'a str),
}

impl ItemRef<'_> {
    fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Item(target) => target.ptr_eq(item),
            Self::Id(id) => item.id() == Some(*id),
        }
    }
}

impl<'a> From<&'a Item> for ItemRef<'a> {
    fn from(item: &'a Item) -> Self {
        Self::Item(item)
    }
}

impl<'a> From<&'a str> for ItemRef<'a> {
    fn from(id: &'a str) -> Self {
        Self::Id(id)
    }
}

impl<'a> From<&'a String> for ItemRef<'a> {
    fn from(id: &'a String) -> Self {
        Self::Id(id.as_str())
    }
}

struct LoopState {
    items: Vec<Item>,
    do_loop: bool,
    start_time: Duration,
    last_stop_time: Option<Duration>,
    resume_time: Option<Duration>,
    total_stopped_time: Duration,
    pending_tick: Option<TickHandle>,
    /// Items paused by `stop()`, resumed by the next `start()`.
    paused_by_stop: Vec<Item>,
    tick_count: u64,
}

struct SchedulerInner {
    clock: Arc<dyn Clock>,
    tick_source: Arc<dyn TickSource>,
    state: Mutex<LoopState>,
}

/// Shared handle to a render-loop scheduler.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

/// Non-owning scheduler handle. Consumers that live inside an item's callback
/// hold one of these so the item does not keep its scheduler alive.
#[derive(Clone, Default)]
pub struct WeakScheduler {
    inner: Weak<SchedulerInner>,
}

impl WeakScheduler {
    /// The scheduler, if any handle to it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Scheduler> {
        self.inner.upgrade().map(|inner| Scheduler { inner })
    }
}

impl fmt::Debug for WeakScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakScheduler")
    }
}

impl Scheduler {
    /// Creates a scheduler on the process-wide system clock, driven by
    /// [`shared_frame_signal`]. The host pumps that signal once per frame.
    #[must_use]
    pub fn new(options: SchedulerOptions) -> Self {
        Self::with_tick_source(options, shared_frame_signal())
    }

    /// Creates a scheduler on the system clock, driven by `tick_source`.
    #[must_use]
    pub fn with_tick_source(options: SchedulerOptions, tick_source: Arc<dyn TickSource>) -> Self {
        Self::with_parts(options, system_clock(), tick_source)
    }

    /// Creates a scheduler with an injected clock and tick source.
    #[must_use]
    pub fn with_parts(
        options: SchedulerOptions,
        clock: Arc<dyn Clock>,
        tick_source: Arc<dyn TickSource>,
    ) -> Self {
        let start_time = clock.now();
        let scheduler = Self {
            inner: Arc::new(SchedulerInner {
                clock,
                tick_source,
                state: Mutex::new(LoopState {
                    items: Vec::new(),
                    do_loop: false,
                    start_time,
                    last_stop_time: None,
                    resume_time: None,
                    total_stopped_time: Duration::ZERO,
                    pending_tick: None,
                    paused_by_stop: Vec::new(),
                    tick_count: 0,
                }),
            }),
        };

        if options.auto_start {
            scheduler.start();
        }
        scheduler
    }

    /// Appends an item. No deduplication; retired items are ignored.
    pub fn register(&self, item: Item) {
        if item.is_retired() {
            warn!(item = ?item.id(), "ignoring registration of a retired item");
            return;
        }

        let mut state = self.inner.state.lock();
        state.items.push(item);
        debug!(
            id = ?state.items.last().and_then(Item::id),
            registered = state.items.len(),
            "item registered"
        );
    }

    /// Removes the first item matching `target` and fires its timeout
    /// callback unless it was destroyed silently. Returns the removed item,
    /// `None` if nothing matched.
    pub fn remove<'a>(&self, target: impl Into<ItemRef<'a>>) -> Option<Item> {
        let target = target.into();
        let removed = {
            let mut state = self.inner.state.lock();
            let index = state.items.iter().position(|item| target.matches(item))?;
            let item = state.items.remove(index);
            state.paused_by_stop.retain(|paused| !paused.ptr_eq(&item));
            item
        };

        let fired = removed.retire_removed();
        debug!(id = ?removed.id(), fired, "item removed");
        Some(removed)
    }

    /// Starts (or resumes) ticking.
    ///
    /// Resuming after [`stop`](Self::stop) adds the stopped interval to
    /// [`total_stopped_time`](Self::total_stopped_time) and resumes the items
    /// the stop paused. No-op while running.
    pub fn start(&self) {
        let now = self.inner.clock.now();
        let resumed = {
            let mut state = self.inner.state.lock();
            if state.do_loop {
                return;
            }
            state.do_loop = true;
            state.resume_time = Some(now);
            if let Some(stopped_at) = state.last_stop_time {
                state.total_stopped_time += now.saturating_sub(stopped_at);
            }
            std::mem::take(&mut state.paused_by_stop)
        };

        for item in &resumed {
            item.resume();
        }
        self.request_tick();
        info!(resumed = resumed.len(), "scheduler started");
    }

    /// Halts ticking and pauses every registered item so none of them accrue
    /// elapsed time while the loop is down.
    pub fn stop(&self) {
        let now = self.inner.clock.now();
        let (items, pending) = {
            let mut state = self.inner.state.lock();
            if state.do_loop {
                state.do_loop = false;
                state.last_stop_time = Some(now);
            }
            (state.items.clone(), state.pending_tick.take())
        };

        if let Some(handle) = pending {
            self.inner.tick_source.cancel_tick(handle);
        }

        let paused: Vec<Item> = items
            .into_iter()
            .filter(Item::pause_for_scheduler)
            .collect();
        info!(paused = paused.len(), "scheduler stopped");
        self.inner.state.lock().paused_by_stop.extend(paused);
    }

    /// Sweeps every registered item once, in registration order. No-op while
    /// stopped. Normally called by the tick source.
    pub fn tick(&self) {
        let snapshot = {
            let mut state = self.inner.state.lock();
            if !state.do_loop {
                return;
            }
            state.tick_count += 1;
            state.items.clone()
        };

        let mut retired = 0usize;
        for item in &snapshot {
            if item.sweep() {
                retired += 1;
            }
        }

        if retired > 0 {
            self.inner.state.lock().items.retain(|item| !item.is_retired());
        }
        trace!(swept = snapshot.len(), retired, "tick");
    }

    /// Snapshot of the registered items in registration order.
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.inner.state.lock().items.clone()
    }

    /// Number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().items.is_empty()
    }

    /// Returns true if `item` is registered.
    #[must_use]
    pub fn contains(&self, item: &Item) -> bool {
        self.inner.state.lock().items.iter().any(|registered| registered.ptr_eq(item))
    }

    /// Returns true if an item with `id` is registered.
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.inner.state.lock().items.iter().any(|item| item.id() == Some(id))
    }

    /// Returns true while the tick loop is active.
    #[must_use]
    pub fn do_loop(&self) -> bool {
        self.inner.state.lock().do_loop
    }

    /// Clock time at construction.
    #[must_use]
    pub fn start_time(&self) -> Duration {
        self.inner.state.lock().start_time
    }

    /// Time since construction minus every stopped interval.
    #[must_use]
    pub fn elapsed_time(&self) -> Duration {
        let now = self.inner.clock.now();
        let state = self.inner.state.lock();
        let mut stopped = state.total_stopped_time;
        if !state.do_loop {
            if let Some(stopped_at) = state.last_stop_time {
                stopped += now.saturating_sub(stopped_at);
            }
        }
        now.saturating_sub(state.start_time).saturating_sub(stopped)
    }

    /// Clock time of the most recent `stop()`.
    #[must_use]
    pub fn last_stop_time(&self) -> Option<Duration> {
        self.inner.state.lock().last_stop_time
    }

    /// Clock time of the most recent `start()`.
    #[must_use]
    pub fn resume_time(&self) -> Option<Duration> {
        self.inner.state.lock().resume_time
    }

    /// Sum of completed stopped intervals.
    #[must_use]
    pub fn total_stopped_time(&self) -> Duration {
        self.inner.state.lock().total_stopped_time
    }

    /// Number of sweeps performed.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.inner.state.lock().tick_count
    }

    /// The clock this scheduler reads. Build items on it so their timing
    /// agrees with the sweep.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.inner.clock)
    }

    /// Non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakScheduler {
        WeakScheduler {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Returns true if both handles refer to the same scheduler.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn request_tick(&self) {
        {
            let state = self.inner.state.lock();
            if !state.do_loop || state.pending_tick.is_some() {
                return;
            }
        }

        let weak = Arc::downgrade(&self.inner);
        let handle = self.inner.tick_source.request_tick(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                Scheduler { inner }.on_frame();
            }
        }));

        let mut state = self.inner.state.lock();
        if state.do_loop && state.pending_tick.is_none() {
            state.pending_tick = Some(handle);
        } else {
            drop(state);
            self.inner.tick_source.cancel_tick(handle);
        }
    }

    fn on_frame(&self) {
        {
            let mut state = self.inner.state.lock();
            state.pending_tick = None;
            if !state.do_loop {
                return;
            }
        }

        self.tick();
        self.request_tick();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Scheduler")
            .field("items", &state.items.len())
            .field("do_loop", &state.do_loop)
            .field("tick_count", &state.tick_count)
            .finish_non_exhaustive()
    }
}
