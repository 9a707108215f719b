//! # Clocks
//!
//! Every timestamp in the scheduler is a [`Duration`] offset from a clock's
//! origin. Production code uses the monotonic [`SystemClock`]; tests drive a
//! [`ManualClock`] by hand so sweeps are deterministic.

use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Time elapsed since this clock's origin.
    fn now(&self) -> Duration;
}

/// Monotonic wall clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    /// Creates a clock stopped at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    /// Jumps to an absolute time. Going backwards is allowed; elapsed-time
    /// math saturates at zero.
    pub fn set(&self, at: Duration) {
        *self.now.lock() = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}

static DEFAULT_CLOCK: OnceLock<Arc<SystemClock>> = OnceLock::new();

/// Process-wide system clock shared by items and schedulers that were not
/// given one explicitly.
pub fn system_clock() -> Arc<dyn Clock> {
    let clock = DEFAULT_CLOCK.get_or_init(|| Arc::new(SystemClock::new()));
    Arc::clone(clock) as Arc<dyn Clock>
}
