//! # METRONOME Core
//!
//! The shared render-loop scheduler. Many unrelated components register timed
//! or periodic work against one tick source instead of each polling on its own:
//! deferred focus after a menu opens, debounced resize handling, polling-style
//! refreshes, programmatic animation sequencing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  request_tick   ┌─────────────┐  sweep (FIFO)  ┌────────┐
//! │ TickSource   │ ◄────────────── │  Scheduler  │ ─────────────► │ Item * │
//! │ (FrameSignal)│ ──────────────► │             │                │        │
//! └──────────────┘    callback     └─────────────┘                └────────┘
//!        ▲                                ▲
//!   host frame loop            shared_scheduler() / injected handle
//! ```
//!
//! ## Threading
//!
//! Everything runs on the thread that pumps the tick source. Handles are
//! `Send + Sync` only so the shared instance can live in a `static`; there is
//! no parallel sweep and no per-item fault boundary.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use metronome_core::{FrameSignal, Item, ItemConfig, Scheduler, SchedulerOptions};
//!
//! let signal = Arc::new(FrameSignal::new());
//! let scheduler = Scheduler::with_tick_source(SchedulerOptions::default(), signal.clone());
//!
//! let item = Item::new(
//!     ItemConfig::new()
//!         .with_id("focus-search")
//!         .with_duration_ms(0)
//!         .on_timeout(|| println!("focus")),
//! )?;
//! scheduler.register(item);
//!
//! signal.pump();
//! assert!(scheduler.is_empty());
//! # Ok::<(), metronome_core::SchedulerError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod config;
pub mod error;
pub mod item;
pub mod scheduler;
pub mod shared;
pub mod tick_source;

pub use clock::{system_clock, Clock, ManualClock, SystemClock};
pub use config::{
    FrameConfig, ItemTiming, MetronomeConfig, RawMillis, SchedulerOptions, MIN_UPDATE_INTERVAL,
};
pub use error::{SchedulerError, SchedulerResult};
pub use item::{Callback, Item, ItemConfig, ItemDuration, ItemState, RetireReason, WeakItem};
pub use scheduler::{ItemRef, Scheduler, WeakScheduler};
pub use shared::{shared_frame_signal, shared_scheduler};
pub use tick_source::{FrameSignal, TickCallback, TickHandle, TickSource};
