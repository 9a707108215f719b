//! # Scheduler Scenario Tests
//!
//! End-to-end behavior of items on a scheduler, driven frame by frame with a
//! manual clock and frame signal.
//!
//! Run with: cargo test --package metronome_core --test scheduler_scenarios

use metronome_core::{
    Clock, FrameSignal, Item, ItemConfig, ManualClock, Scheduler, SchedulerError,
    SchedulerOptions, TickSource, MIN_UPDATE_INTERVAL,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const FRAME_MS: u64 = 10;

struct Host {
    clock: Arc<ManualClock>,
    signal: Arc<FrameSignal>,
    scheduler: Scheduler,
}

impl Host {
    fn new(options: SchedulerOptions) -> Self {
        let clock = Arc::new(ManualClock::new());
        let signal = Arc::new(FrameSignal::new());
        let scheduler = Scheduler::with_parts(
            options,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&signal) as Arc<dyn TickSource>,
        );
        Self {
            clock,
            signal,
            scheduler,
        }
    }

    fn item(&self, config: ItemConfig) -> Item {
        Item::with_clock(config, self.scheduler.clock()).unwrap()
    }

    /// Advances to `until_ms`, pumping one frame every `FRAME_MS`.
    fn run_until(&self, until_ms: u64) {
        while self.clock.now() < Duration::from_millis(until_ms) {
            self.clock.advance(Duration::from_millis(FRAME_MS));
            self.signal.pump();
        }
    }
}

fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&hits);
    (hits, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn construction_errors_are_synchronous() {
    assert_eq!(
        Item::new(ItemConfig::new().on_timeout(|| {})).unwrap_err(),
        SchedulerError::MissingIdentity
    );
    assert_eq!(
        Item::new(ItemConfig::new().with_duration_ms(10)).unwrap_err(),
        SchedulerError::MissingCallback
    );
}

#[test]
fn scenario_a_one_shot_fires_once_and_leaves() {
    let host = Host::new(SchedulerOptions::default());
    let (hits, cb) = counter();
    let item = host.item(ItemConfig::new().with_duration_ms(200).on_timeout(cb));
    host.scheduler.register(item.clone());

    host.run_until(190);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    host.run_until(250);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!host.scheduler.contains(&item));
    assert!(host.scheduler.is_empty());
}

#[test]
fn scenario_b_periodic_item_repeats_until_removed() {
    let host = Host::new(SchedulerOptions::default());
    let (hits, cb) = counter();
    host.scheduler.register(host.item(
        ItemConfig::new()
            .with_id("x")
            .with_duration_ms(-1)
            .with_update_duration_ms(50u64)
            .on_update(cb),
    ));

    host.run_until(300);
    let fired = hits.load(Ordering::SeqCst);
    assert!(fired > 2, "update fired {fired} times");

    assert!(host.scheduler.remove("x").is_some());
    assert!(!host.scheduler.contains_id("x"));

    host.run_until(600);
    assert_eq!(hits.load(Ordering::SeqCst), fired);
}

#[test]
fn scenario_c_remove_by_id_only_touches_that_item() {
    let host = Host::new(SchedulerOptions::default());
    let flag = Arc::new(AtomicBool::new(false));
    let flag2 = Arc::new(AtomicBool::new(false));

    let f = Arc::clone(&flag);
    host.scheduler.register(host.item(
        ItemConfig::new()
            .with_id("test")
            .with_duration_ms(-1)
            .on_timeout(move || f.store(true, Ordering::SeqCst)),
    ));
    let f2 = Arc::clone(&flag2);
    host.scheduler.register(host.item(
        ItemConfig::new()
            .with_duration_ms(500)
            .on_timeout(move || f2.store(true, Ordering::SeqCst)),
    ));

    host.run_until(10);
    assert!(host.scheduler.remove("test").is_some());

    host.run_until(40);
    assert!(flag.load(Ordering::SeqCst));
    assert!(!flag2.load(Ordering::SeqCst));
    assert_eq!(host.scheduler.items().len(), 1);
}

#[test]
fn scenario_d_manual_start_waits_for_start() {
    let host = Host::new(SchedulerOptions { auto_start: false });
    assert!(!host.scheduler.do_loop());

    let (hits, cb) = counter();
    host.scheduler
        .register(host.item(ItemConfig::new().with_duration_ms(0).on_timeout(cb)));

    host.run_until(100);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(host.scheduler.tick_count(), 0);

    host.scheduler.start();
    host.run_until(110);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn scenario_e_text_update_duration_is_corrected() {
    let host = Host::new(SchedulerOptions::default());
    let (hits, cb) = counter();
    let item = host.item(
        ItemConfig::new()
            .with_id("repaint")
            .indefinite()
            .with_update_duration_ms(100u64)
            .on_update(cb),
    );
    host.scheduler.register(item.clone());

    item.set_update_duration_raw("five");
    assert_eq!(item.update_duration(), MIN_UPDATE_INTERVAL);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn pause_blocks_callbacks_and_tracks_stopped_time() {
    let host = Host::new(SchedulerOptions::default());
    let (hits, cb) = counter();
    let item = host.item(
        ItemConfig::new()
            .indefinite()
            .with_update_interval(Duration::from_millis(20))
            .on_update(cb),
    );
    host.scheduler.register(item.clone());

    host.run_until(100);
    let before = hits.load(Ordering::SeqCst);
    item.pause();

    host.run_until(300);
    assert_eq!(hits.load(Ordering::SeqCst), before);

    item.resume();
    assert_eq!(item.total_stopped_time(), Duration::from_millis(200));

    host.run_until(400);
    assert!(hits.load(Ordering::SeqCst) > before);
}

#[test]
fn stop_pauses_everything_and_start_accumulates() {
    let host = Host::new(SchedulerOptions::default());
    let items: Vec<Item> = (0..4)
        .map(|i| host.item(ItemConfig::new().with_id(format!("item-{i}")).on_update(|| {})))
        .collect();
    for item in &items {
        host.scheduler.register(item.clone());
    }

    host.run_until(50);
    host.scheduler.stop();
    assert!(items.iter().all(Item::is_paused));

    host.run_until(130);
    host.scheduler.start();
    assert_eq!(host.scheduler.total_stopped_time(), Duration::from_millis(80));
    assert!(items.iter().all(|item| !item.is_paused()));
}

#[test]
fn destroy_silent_and_loud() {
    let host = Host::new(SchedulerOptions::default());
    let (loud_hits, loud_cb) = counter();
    let (quiet_hits, quiet_cb) = counter();
    let loud = host.item(ItemConfig::new().with_duration_ms(1_000).on_timeout(loud_cb));
    let quiet = host.item(ItemConfig::new().with_duration_ms(1_000).on_timeout(quiet_cb));
    host.scheduler.register(loud.clone());
    host.scheduler.register(quiet.clone());

    loud.destroy(false);
    quiet.destroy(true);
    assert_eq!(host.scheduler.len(), 2, "removal waits for the next sweep");

    host.run_until(10);
    assert!(host.scheduler.is_empty());
    assert_eq!(loud_hits.load(Ordering::SeqCst), 1);
    assert_eq!(quiet_hits.load(Ordering::SeqCst), 0);
}

#[test]
fn destroy_on_a_paused_item_waits_for_resume() {
    let host = Host::new(SchedulerOptions::default());
    let (hits, cb) = counter();
    let item = host.item(ItemConfig::new().with_id("tooltip").on_timeout(cb));
    host.scheduler.register(item.clone());

    item.pause();
    item.destroy(false);
    host.run_until(50);
    assert_eq!(host.scheduler.len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    item.resume();
    host.run_until(60);
    assert!(host.scheduler.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn timeout_fires_but_keeps_the_item_registered() {
    let host = Host::new(SchedulerOptions::default());
    let (hits, cb) = counter();
    let item = host.item(ItemConfig::new().with_duration_ms(1_000).on_timeout(cb));
    host.scheduler.register(item.clone());

    item.timeout();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(host.scheduler.contains(&item));

    host.run_until(100);
    assert!(host.scheduler.contains(&item));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn removed_item_stays_paused() {
    let host = Host::new(SchedulerOptions::default());
    let item = host.item(ItemConfig::new().with_id("r").on_update(|| {}));
    host.scheduler.register(item.clone());

    item.pause();
    assert!(host.scheduler.remove("r").is_some());
    host.clock.advance(Duration::from_millis(100));
    item.resume();

    assert!(item.is_paused());
    assert_eq!(item.total_stopped_time(), Duration::ZERO);
}

#[test]
fn unmatched_remove_is_not_an_error() {
    let host = Host::new(SchedulerOptions::default());
    let stranger = host.item(ItemConfig::new().with_id("stranger").on_update(|| {}));
    host.scheduler
        .register(host.item(ItemConfig::new().with_id("kept").on_update(|| {})));

    assert!(host.scheduler.remove("missing").is_none());
    assert!(host.scheduler.remove(&stranger).is_none());
    assert_eq!(host.scheduler.len(), 1);
}

#[test]
fn real_clock_one_shot_fires_after_its_duration() {
    let signal = Arc::new(FrameSignal::new());
    let scheduler = Scheduler::with_tick_source(SchedulerOptions::default(), Arc::clone(&signal) as Arc<dyn TickSource>);
    let (hits, cb) = counter();
    scheduler.register(
        Item::with_clock(ItemConfig::new().with_duration_ms(200).on_timeout(cb), scheduler.clock())
            .unwrap(),
    );

    let begin = Instant::now();
    while begin.elapsed() < Duration::from_millis(250) {
        signal.pump();
        std::thread::sleep(Duration::from_millis(5));
    }
    signal.pump();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(scheduler.is_empty());
}
