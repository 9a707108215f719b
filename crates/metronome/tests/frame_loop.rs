//! # Frame Loop Tests
//!
//! Real-time runs: a pacer pumping the frame signal that drives a scheduler.
//!
//! Run with: cargo test --package metronome --test frame_loop

use metronome::{
    shared_frame_signal, shared_scheduler, Debouncer, FramePacer, FrameSignal, Item, ItemConfig,
    Poller, Scheduler, SchedulerOptions,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&hits);
    (hits, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn paced_one_shot_fires_after_duration() {
    let signal = Arc::new(FrameSignal::new());
    let scheduler = Scheduler::with_tick_source(SchedulerOptions::default(), signal.clone());
    let (hits, cb) = counter();
    let item = Item::with_clock(
        ItemConfig::new().with_duration_ms(200).on_timeout(cb),
        scheduler.clock(),
    )
    .unwrap();
    scheduler.register(item.clone());

    let mut pacer = FramePacer::new(120, signal);
    pacer.run_for(Duration::from_millis(250));

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!scheduler.contains(&item));
    assert!(pacer.frame_count() > 10);
}

#[test]
fn paced_periodic_item_repeats() {
    let signal = Arc::new(FrameSignal::new());
    let scheduler = Scheduler::with_tick_source(SchedulerOptions::default(), signal.clone());
    let (refreshes, refresh) = counter();
    let poller = Poller::start(&scheduler, "x", Duration::from_millis(50), refresh).unwrap();

    let mut pacer = FramePacer::new(120, signal);
    pacer.run_for(Duration::from_millis(300));

    assert!(refreshes.load(Ordering::SeqCst) > 2);
    assert!(poller.cancel());
    assert!(scheduler.is_empty());
}

#[test]
fn shared_scheduler_is_driven_by_shared_signal() {
    let scheduler = shared_scheduler();
    assert!(scheduler.ptr_eq(&shared_scheduler()));

    let (runs, action) = counter();
    let debouncer = Debouncer::new(&scheduler, Duration::from_millis(30), action);
    debouncer.trigger().unwrap();
    debouncer.trigger().unwrap();

    let mut pacer = FramePacer::new(200, shared_frame_signal());
    let watched = Arc::clone(&runs);
    pacer.run_until(Duration::from_secs(2), move || watched.load(Ordering::SeqCst) > 0);

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!debouncer.is_pending());
}
