//! # Metronome Demo
//!
//! Drives the shared scheduler from a fixed-rate frame loop with a handful of
//! typical consumers attached.
//!
//! ## Usage
//!
//! ```bash
//! metronome_demo --config demo.toml --hz 60 --seconds 3
//! ```

use metronome::{
    shared_frame_signal, shared_scheduler, Animation, Debouncer, DeferredAction, Easing,
    FramePacer, Item, ItemConfig, MetronomeConfig, Poller, Tween,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse command line arguments (simple parsing, no external deps)
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut rate_hz: Option<u32> = None;
    let mut seconds = 2u64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--hz" | "-r" => {
                if i + 1 < args.len() {
                    rate_hz = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--seconds" | "-s" => {
                if i + 1 < args.len() {
                    seconds = args[i + 1].parse().unwrap_or(2);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: metronome_demo [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>     TOML config with [scheduler], [frame], [[items]]");
                println!("  -r, --hz <RATE>         Frame rate in Hz (default: from config, 60)");
                println!("  -s, --seconds <SECS>    Run for N seconds then exit (default: 2)");
                println!("  -h, --help              Show this help");
                return;
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => match MetronomeConfig::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("{e}");
                std::process::exit(1);
            }
        },
        None => MetronomeConfig::default(),
    };
    if let Some(rate_hz) = rate_hz {
        config.frame.rate_hz = rate_hz;
    }

    let scheduler = shared_scheduler();
    let fired = Arc::new(AtomicUsize::new(0));

    // Items declared in the config file just log when they fire.
    for timing in config.items.clone() {
        let label = timing.id.clone().unwrap_or_else(|| "<anonymous>".to_string());
        let update_label = label.clone();
        let counter = Arc::clone(&fired);
        let built = Item::with_clock(
            ItemConfig::from_timing(timing)
                .on_timeout(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                    info!(item = %label, "timeout");
                })
                .on_update(move || info!(item = %update_label, "update")),
            scheduler.clock(),
        );
        match built {
            Ok(item) => scheduler.register(item),
            Err(e) => error!("skipping configured item: {e}"),
        }
    }

    let result = run_consumers(&scheduler, &config, seconds);
    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }

    info!(
        configured_timeouts = fired.load(Ordering::Relaxed),
        still_registered = scheduler.len(),
        "demo finished"
    );
}

fn run_consumers(
    scheduler: &metronome::Scheduler,
    config: &MetronomeConfig,
    seconds: u64,
) -> metronome::SchedulerResult<()> {
    let _focus = DeferredAction::schedule(scheduler, Duration::from_millis(120), || {
        info!("menu opened: focusing first entry");
    })?;

    let repaints = Arc::new(AtomicUsize::new(0));
    let repaint_count = Arc::clone(&repaints);
    let clock_face = Poller::start(scheduler, "clock-face", Duration::from_millis(250), move || {
        repaint_count.fetch_add(1, Ordering::Relaxed);
    })?;

    let layouts = Arc::new(AtomicUsize::new(0));
    let layout_count = Arc::clone(&layouts);
    let resize = Debouncer::new(scheduler, Duration::from_millis(100), move || {
        layout_count.fetch_add(1, Ordering::Relaxed);
        info!("relayout after resize burst");
    });

    let opacity = Tween::start(
        scheduler,
        Animation::new(0.0, 1.0, Easing::ExponentialOut).with_duration(Duration::from_millis(400)),
        || info!("fade-in complete"),
    )?;

    let mut pacer = FramePacer::from_config(&config.frame, shared_frame_signal());
    info!(rate_hz = config.frame.rate_hz, seconds, "running frame loop");

    // A resize burst: ten events a frame apart, then quiet.
    let mut burst_left = 10u32;
    pacer.run_until(Duration::from_millis(300), || {
        if burst_left > 0 {
            burst_left -= 1;
            if let Err(e) = resize.trigger() {
                error!("resize trigger failed: {e}");
            }
        }
        false
    });
    pacer.run_for(Duration::from_secs(seconds).saturating_sub(Duration::from_millis(300)));

    clock_face.cancel();
    let stats = pacer.stats();
    info!(
        frames = pacer.frame_count(),
        avg_frame_us = stats.avg_frame_us,
        late_frames = stats.late_frames,
        repaints = repaints.load(Ordering::Relaxed),
        relayouts = layouts.load(Ordering::Relaxed),
        opacity = opacity.value(),
        "frame loop finished"
    );
    Ok(())
}
