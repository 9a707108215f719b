//! # METRONOME UI
//!
//! Components that need timed work hold a [`Scheduler`](metronome_core::Scheduler)
//! handle and register items on it. None of them sweep, poll or own a timer.
//!
//! | Need | Consumer |
//! |---|---|
//! | animate a value | [`Tween`] |
//! | collapse a burst of events | [`Debouncer`] |
//! | do X once after N ms | [`DeferredAction`] |
//! | do Y every N ms until cancelled | [`Poller`] |

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod action;
pub mod animation;
pub mod debounce;
pub mod deferred;
pub mod poller;
pub mod tween;

pub use action::Action;
pub use animation::{Animation, Easing};
pub use debounce::Debouncer;
pub use deferred::DeferredAction;
pub use poller::Poller;
pub use tween::Tween;
