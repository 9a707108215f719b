//! # METRONOME
//!
//! Host side of the render-loop scheduler: the [`FramePacer`] that feeds a
//! [`FrameSignal`](metronome_core::FrameSignal) its frames, and re-exports of
//! the scheduler and its UI consumers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use metronome::{shared_frame_signal, shared_scheduler, DeferredAction, FramePacer};
//!
//! let scheduler = shared_scheduler();
//! let _focus = DeferredAction::schedule(&scheduler, Duration::from_millis(120), || {
//!     println!("focus first menu entry");
//! })?;
//!
//! let mut pacer = FramePacer::new(60, shared_frame_signal());
//! pacer.run_for(Duration::from_millis(200));
//! # Ok::<(), metronome::SchedulerError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod pacer;

pub use pacer::{FramePacer, FrameStats};

pub use metronome_core::{
    shared_frame_signal, shared_scheduler, Clock, FrameConfig, FrameSignal, Item, ItemConfig,
    ItemDuration, ItemTiming, MetronomeConfig, Scheduler, SchedulerError, SchedulerOptions,
    SchedulerResult,
};
pub use metronome_ui::{Animation, Debouncer, DeferredAction, Easing, Poller, Tween};
