//! Programmatic animation sequencing.
//!
//! A [`Tween`] registers one indefinite item whose update step seeks its
//! [`Animation`] to the item's elapsed time. Pausing the item (or stopping
//! the scheduler) therefore freezes the animation in place. When the
//! animation completes the tween removes its own item, which fires the
//! completion callback.

use crate::animation::Animation;
use metronome_core::{
    Item, ItemConfig, Scheduler, SchedulerResult, WeakItem, WeakScheduler, MIN_UPDATE_INTERVAL,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A running animation driven by a scheduler.
#[derive(Debug)]
pub struct Tween {
    item: Item,
    animation: Arc<Mutex<Animation>>,
    scheduler: WeakScheduler,
}

impl Tween {
    /// Starts animating on `scheduler`. `on_complete` runs once when the
    /// value reaches its target, but not if the tween is cancelled.
    ///
    /// # Errors
    ///
    /// Propagates item construction errors.
    pub fn start(
        scheduler: &Scheduler,
        animation: Animation,
        on_complete: impl FnMut() + Send + 'static,
    ) -> SchedulerResult<Self> {
        let animation = Arc::new(Mutex::new(animation));
        let own_item: Arc<Mutex<WeakItem>> = Arc::new(Mutex::new(WeakItem::default()));
        let weak_scheduler = scheduler.downgrade();

        let step = {
            let animation = Arc::clone(&animation);
            let own_item = Arc::clone(&own_item);
            let weak_scheduler = weak_scheduler.clone();
            move || {
                let Some(item) = own_item.lock().upgrade() else {
                    return;
                };

                let done = {
                    let mut animation = animation.lock();
                    animation.seek(item.elapsed_time());
                    animation.is_complete()
                };

                if done {
                    if let Some(scheduler) = weak_scheduler.upgrade() {
                        scheduler.remove(&item);
                    }
                }
            }
        };

        let item = Item::with_clock(
            ItemConfig::new()
                .indefinite()
                .with_update_interval(MIN_UPDATE_INTERVAL)
                .on_update(step)
                .on_timeout(on_complete),
            scheduler.clock(),
        )?;
        *own_item.lock() = item.downgrade();
        scheduler.register(item.clone());
        debug!(to = animation.lock().target(), "tween started");

        Ok(Self {
            item,
            animation,
            scheduler: weak_scheduler,
        })
    }

    /// Current animated value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.animation.lock().value()
    }

    /// Returns true once the value has reached its target.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.animation.lock().is_complete()
    }

    /// Returns true while the tween's item is still scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.item.is_retired() && !self.item.do_remove_on_next_tick()
    }

    /// Freezes the animation.
    pub fn pause(&self) {
        self.item.pause();
    }

    /// Continues a paused animation from where it stopped.
    pub fn resume(&self) {
        self.item.resume();
    }

    /// Stops without completing. The completion callback does not run.
    /// Works on a paused tween too.
    pub fn cancel(&self) {
        self.item.destroy(true);
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.remove(&self.item);
        }
    }

    /// Jumps to the target and completes right away.
    pub fn finish(&self) {
        self.animation.lock().seek(Duration::MAX);
        if let Some(scheduler) = self.scheduler.upgrade() {
            scheduler.remove(&self.item);
        }
    }

    /// The scheduled item.
    #[must_use]
    pub fn item(&self) -> &Item {
        &self.item
    }
}
