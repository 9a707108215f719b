//! # Shared Scheduler
//!
//! One lazily created scheduler for call sites that want zero configuration.
//! Components that can take a [`Scheduler`] handle at construction should do
//! that instead; the shared instance is a convenience, not the primary path.
//!
//! The host drives the shared scheduler by pumping [`shared_frame_signal`]
//! once per frame. There is no teardown: both live for the whole process.

use crate::config::SchedulerOptions;
use crate::scheduler::Scheduler;
use crate::tick_source::FrameSignal;
use std::sync::{Arc, OnceLock};
use tracing::info;

static SHARED_SIGNAL: OnceLock<Arc<FrameSignal>> = OnceLock::new();
static SHARED_SCHEDULER: OnceLock<Scheduler> = OnceLock::new();

/// The frame signal that drives [`shared_scheduler`].
pub fn shared_frame_signal() -> Arc<FrameSignal> {
    Arc::clone(SHARED_SIGNAL.get_or_init(|| Arc::new(FrameSignal::new())))
}

/// The process-wide scheduler, created with default options on first call.
/// Every call returns a handle to the same instance.
pub fn shared_scheduler() -> Scheduler {
    SHARED_SCHEDULER
        .get_or_init(|| {
            info!("creating shared scheduler");
            Scheduler::new(SchedulerOptions::default())
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_scheduler_is_a_singleton() {
        let a = shared_scheduler();
        let b = shared_scheduler();
        assert!(a.ptr_eq(&b));
        assert!(a.do_loop());
        assert!(Arc::ptr_eq(&shared_frame_signal(), &shared_frame_signal()));
    }

    #[test]
    fn test_default_scheduler_rides_the_shared_signal() {
        let idle = Scheduler::new(SchedulerOptions::manual_start());
        assert!(!idle.do_loop());

        let scheduler = Scheduler::new(SchedulerOptions::default());
        assert!(scheduler.do_loop());
        shared_frame_signal().pump();
        assert!(scheduler.tick_count() >= 1);
    }
}
