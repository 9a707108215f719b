//! # Tick Sources
//!
//! The scheduler never owns a timer. It asks a [`TickSource`] for "call me on
//! the next frame" and re-arms itself after every sweep, the same contract as
//! an animation-frame request.
//!
//! [`FrameSignal`] is the queue-backed implementation: the host frame loop
//! calls [`FrameSignal::pump`] once per frame, tests call it by hand.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// One-shot callback run on the next tick.
pub type TickCallback = Box<dyn FnOnce() + Send>;

/// Handle for cancelling a requested tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    /// Raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Injected periodic signal that drives a scheduler.
pub trait TickSource: Send + Sync {
    /// Queues `callback` for the next tick.
    fn request_tick(&self, callback: TickCallback) -> TickHandle;

    /// Drops a queued callback. Unknown or already-run handles are ignored.
    fn cancel_tick(&self, handle: TickHandle);
}

/// Per-frame signal pumped by the host.
pub struct FrameSignal {
    pending: Mutex<Vec<(TickHandle, TickCallback)>>,
    next_handle: AtomicU64,
    frames: AtomicU64,
}

impl FrameSignal {
    /// Creates a signal with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
            frames: AtomicU64::new(0),
        }
    }

    /// Runs every callback queued before this call.
    ///
    /// Callbacks queued while pumping (a scheduler re-arming itself) wait for
    /// the next pump. Returns how many callbacks ran.
    pub fn pump(&self) -> usize {
        let batch = std::mem::take(&mut *self.pending.lock());
        self.frames.fetch_add(1, Ordering::Relaxed);

        let ran = batch.len();
        for (_, callback) in batch {
            callback();
        }
        ran
    }

    /// Number of callbacks waiting for the next pump.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of times [`pump`](Self::pump) has been called.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl Default for FrameSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSignal")
            .field("pending", &self.pending())
            .field("frames", &self.frame_count())
            .finish()
    }
}

impl TickSource for FrameSignal {
    fn request_tick(&self, callback: TickCallback) -> TickHandle {
        let handle = TickHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.pending.lock().push((handle, callback));
        handle
    }

    fn cancel_tick(&self, handle: TickHandle) {
        self.pending.lock().retain(|(queued, _)| *queued != handle);
    }
}
