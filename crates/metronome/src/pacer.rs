//! # Frame Pacer
//!
//! Fixed-rate host loop that pumps a [`FrameSignal`] once per frame.
//!
//! ## Design
//!
//! The pacer must:
//! - Pump at a steady rate regardless of how long a sweep takes
//! - Never make timing decisions for the scheduler
//! - Record how expensive each frame was
//!
//! Frames are scheduled against a deadline that moves forward by exactly one
//! frame per pump, so a slow frame is caught up rather than lost. After a
//! long stall the deadline is rebased instead of replaying every missed frame.

use metronome_core::{FrameConfig, FrameSignal};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Most frames pumped back to back before the deadline is rebased.
const MAX_CATCH_UP: u32 = 4;

/// Below this much slack the pacer spins instead of sleeping.
const SPIN_MARGIN: Duration = Duration::from_micros(500);

/// Weight of a new sample in the rolling average, as `1 / AVG_WINDOW`.
const AVG_WINDOW: u64 = 16;

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    /// Cheapest frame observed (microseconds).
    pub min_frame_us: u64,
    /// Most expensive frame observed (microseconds).
    pub max_frame_us: u64,
    /// Rolling average frame cost (microseconds).
    pub avg_frame_us: u64,
    /// Frames that took longer than the frame budget.
    pub late_frames: u64,
    /// Frames measured.
    pub total_frames: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            avg_frame_us: 0,
            late_frames: 0,
            total_frames: 0,
        }
    }
}

impl FrameStats {
    fn observe(&mut self, cost_us: u64, budget_us: u64) {
        self.avg_frame_us = if self.total_frames == 0 {
            cost_us
        } else {
            self.avg_frame_us - self.avg_frame_us / AVG_WINDOW + cost_us / AVG_WINDOW
        };
        self.total_frames += 1;
        self.min_frame_us = self.min_frame_us.min(cost_us);
        self.max_frame_us = self.max_frame_us.max(cost_us);
        if cost_us > budget_us {
            self.late_frames += 1;
        }
    }
}

fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Fixed-timestep frame loop.
#[derive(Debug)]
pub struct FramePacer {
    signal: Arc<FrameSignal>,
    frame_duration: Duration,
    /// When the next frame should be pumped.
    deadline: Instant,
    frame_count: u64,
    rebases: u64,
    stats: FrameStats,
}

impl FramePacer {
    /// Default frame rate.
    pub const DEFAULT_RATE_HZ: u32 = 60;

    /// Creates a pacer running at `rate_hz`. A zero rate falls back to
    /// [`DEFAULT_RATE_HZ`](Self::DEFAULT_RATE_HZ).
    ///
    /// The first frame is due one frame duration after construction.
    #[must_use]
    pub fn new(rate_hz: u32, signal: Arc<FrameSignal>) -> Self {
        let rate_hz = if rate_hz == 0 {
            warn!("frame rate of 0 Hz requested, using {}", Self::DEFAULT_RATE_HZ);
            Self::DEFAULT_RATE_HZ
        } else {
            rate_hz
        };
        let frame_duration = Duration::from_micros(1_000_000 / u64::from(rate_hz));

        Self {
            signal,
            frame_duration,
            deadline: Instant::now() + frame_duration,
            frame_count: 0,
            rebases: 0,
            stats: FrameStats::default(),
        }
    }

    /// Creates a pacer from config.
    #[must_use]
    pub fn from_config(config: &FrameConfig, signal: Arc<FrameSignal>) -> Self {
        Self::new(config.rate_hz, signal)
    }

    /// Number of frames whose deadline has passed and that have not run yet.
    #[must_use]
    pub fn frames_due(&self) -> u32 {
        let now = Instant::now();
        if now < self.deadline {
            return 0;
        }
        let late = now - self.deadline;
        let behind = late.as_nanos() / self.frame_duration.as_nanos().max(1);
        u32::try_from(behind).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// Pumps the signal once, records the cost and moves the deadline one
    /// frame ahead. Runs regardless of whether a frame is due.
    pub fn run_frame(&mut self) {
        self.frame_count += 1;
        self.deadline += self.frame_duration;

        let started = Instant::now();
        self.signal.pump();
        let cost = started.elapsed();

        self.stats.observe(as_micros(cost), as_micros(self.frame_duration));
    }

    /// Blocks until the next deadline. Sleeps while there is slack and spins
    /// through the last half millisecond.
    pub fn wait_for_deadline(&self) {
        let slack = self.deadline.saturating_duration_since(Instant::now());
        if slack > SPIN_MARGIN {
            std::thread::sleep(slack - SPIN_MARGIN);
        }
        while Instant::now() < self.deadline {
            std::hint::spin_loop();
        }
    }

    /// Runs frames until `stop` returns true or `limit` has passed. Returns
    /// the number of frames run.
    ///
    /// `stop` is checked before every frame.
    pub fn run_until(&mut self, limit: Duration, mut stop: impl FnMut() -> bool) -> u64 {
        let began = Instant::now();
        let first = self.frame_count;

        'pacing: while began.elapsed() < limit {
            let due = self.frames_due();
            if due > MAX_CATCH_UP {
                self.deadline = Instant::now();
                self.rebases += 1;
                debug!(skipped = due - 1, "pacer fell behind, rebasing");
            }

            for _ in 0..due.min(MAX_CATCH_UP) {
                if stop() {
                    break 'pacing;
                }
                self.run_frame();
            }
            self.wait_for_deadline();
        }

        let ran = self.frame_count - first;
        debug!(
            frames = ran,
            late = self.stats.late_frames,
            rebases = self.rebases,
            "pacer finished"
        );
        ran
    }

    /// Runs frames for `limit`.
    pub fn run_for(&mut self, limit: Duration) -> u64 {
        self.run_until(limit, || false)
    }

    /// Frames run so far.
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Times the deadline was rebased after falling too far behind.
    #[must_use]
    pub const fn rebases(&self) -> u64 {
        self.rebases
    }

    /// Frame timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Target frame duration.
    #[must_use]
    pub const fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// The signal this pacer pumps.
    #[must_use]
    pub fn signal(&self) -> &Arc<FrameSignal> {
        &self.signal
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = FrameStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacer_creation() {
        let pacer = FramePacer::new(60, Arc::new(FrameSignal::new()));
        assert_eq!(pacer.frame_count(), 0);
        assert_eq!(pacer.frame_duration(), Duration::from_micros(16666));
        assert_eq!(pacer.frames_due(), 0);
    }

    #[test]
    fn test_zero_rate_falls_back_to_default() {
        let pacer = FramePacer::new(0, Arc::new(FrameSignal::new()));
        assert_eq!(pacer.frame_duration(), Duration::from_micros(16666));
    }

    #[test]
    fn test_frame_execution_pumps_signal() {
        let signal = Arc::new(FrameSignal::new());
        let mut pacer = FramePacer::new(1000, Arc::clone(&signal));

        std::thread::sleep(Duration::from_millis(5));
        assert!(pacer.frames_due() >= 1);

        pacer.run_frame();
        assert_eq!(pacer.frame_count(), 1);
        assert_eq!(signal.frame_count(), 1);
        assert_eq!(pacer.stats().total_frames, 1);
    }

    #[test]
    fn test_stats_track_cost_and_late_frames() {
        let mut stats = FrameStats::default();
        stats.observe(800, 1_000);
        assert_eq!(stats.avg_frame_us, 800);

        stats.observe(2_400, 1_000);
        assert_eq!(stats.min_frame_us, 800);
        assert_eq!(stats.max_frame_us, 2_400);
        assert_eq!(stats.avg_frame_us, 800 - 50 + 150);
        assert_eq!(stats.late_frames, 1);
        assert_eq!(stats.total_frames, 2);
    }

    #[test]
    fn test_run_until_stops_on_predicate() {
        let signal = Arc::new(FrameSignal::new());
        let mut pacer = FramePacer::new(500, Arc::clone(&signal));

        let watched = Arc::clone(&signal);
        let ran = pacer.run_until(Duration::from_secs(2), move || watched.frame_count() >= 3);

        assert_eq!(ran, 3);
        assert!(pacer.stats().min_frame_us <= pacer.stats().max_frame_us);
    }

    #[test]
    fn test_stall_rebases_instead_of_replaying() {
        let mut pacer = FramePacer::new(1000, Arc::new(FrameSignal::new()));
        std::thread::sleep(Duration::from_millis(30));
        assert!(pacer.frames_due() > MAX_CATCH_UP);

        pacer.run_until(Duration::from_millis(1), || false);
        assert_eq!(pacer.rebases(), 1);
        assert!(pacer.frame_count() <= u64::from(MAX_CATCH_UP));
    }

    #[test]
    fn test_reset_stats() {
        let mut pacer = FramePacer::new(1000, Arc::new(FrameSignal::new()));
        pacer.run_frame();
        pacer.reset_stats();
        assert_eq!(pacer.stats().total_frames, 0);
    }
}
