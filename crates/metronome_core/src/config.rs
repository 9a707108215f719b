//! # Configuration
//!
//! TOML-backed settings, loaded once at startup:
//!
//! ```toml
//! [scheduler]
//! auto_start = true
//!
//! [frame]
//! rate_hz = 60
//!
//! [[items]]
//! id = "clock-repaint"
//! duration_ms = -1
//! update_duration_ms = 1000
//! ```
//!
//! Callbacks cannot live in a file, so an [`ItemTiming`] only carries the
//! timing half of an item. Attach callbacks with
//! [`ItemConfig::from_timing`](crate::ItemConfig::from_timing).

use crate::error::{SchedulerError, SchedulerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Smallest update interval. Invalid intervals are corrected to this.
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

/// Millisecond value as it arrives from a config file or a text field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMillis {
    /// Numeric milliseconds.
    Number(f64),
    /// Milliseconds still in text form, e.g. `"250"`.
    Text(String),
}

impl RawMillis {
    /// Numeric value, `NaN` when the text does not parse.
    #[must_use]
    pub fn to_millis(&self) -> f64 {
        match self {
            Self::Number(ms) => *ms,
            Self::Text(text) => text.trim().parse::<f64>().unwrap_or(f64::NAN),
        }
    }

    /// The interval this value describes, if it is a finite positive number.
    #[must_use]
    pub fn to_interval(&self) -> Option<Duration> {
        interval_from_millis(self.to_millis())
    }
}

impl From<f64> for RawMillis {
    fn from(ms: f64) -> Self {
        Self::Number(ms)
    }
}

impl From<u64> for RawMillis {
    #[allow(clippy::cast_precision_loss)]
    fn from(ms: u64) -> Self {
        Self::Number(ms as f64)
    }
}

impl From<&str> for RawMillis {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Converts milliseconds to an interval. `None` for anything that is not a
/// finite positive number. Positive values outside what a nanosecond
/// interval can hold are clamped to 1ns or `u64::MAX` nanoseconds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub(crate) fn interval_from_millis(ms: f64) -> Option<Duration> {
    if !ms.is_finite() || ms <= 0.0 {
        return None;
    }

    let nanos = (ms * 1_000_000.0).round();
    let nanos = if nanos < 1.0 {
        1
    } else if nanos >= u64::MAX as f64 {
        u64::MAX
    } else {
        nanos as u64
    };
    Some(Duration::from_nanos(nanos))
}

/// Timing half of an item, deserializable from config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemTiming {
    /// Stable id for lookup-based removal.
    #[serde(default)]
    pub id: Option<String>,
    /// Lifetime in milliseconds, `-1` for indefinite.
    #[serde(default)]
    pub duration_ms: Option<i64>,
    /// Interval between update callbacks.
    #[serde(default)]
    pub update_duration_ms: Option<RawMillis>,
}

/// Scheduler construction options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerOptions {
    /// Start ticking immediately. When false nothing is swept until
    /// [`Scheduler::start`](crate::Scheduler::start).
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

fn default_auto_start() -> bool {
    true
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            auto_start: default_auto_start(),
        }
    }
}

impl SchedulerOptions {
    /// Options for a scheduler that waits for an explicit `start()`.
    #[must_use]
    pub const fn manual_start() -> Self {
        Self { auto_start: false }
    }
}

/// Host frame loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Frames per second the host pumps the tick source at.
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

fn default_rate_hz() -> u32 {
    60
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
        }
    }
}

/// Top-level config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetronomeConfig {
    /// Scheduler options.
    #[serde(default)]
    pub scheduler: SchedulerOptions,
    /// Frame loop settings.
    #[serde(default)]
    pub frame: FrameConfig,
    /// Items to register at startup.
    #[serde(default)]
    pub items: Vec<ItemTiming>,
}

impl MetronomeConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidConfig`] on malformed TOML or a zero
    /// frame rate.
    pub fn from_toml_str(text: &str) -> SchedulerResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SchedulerError::InvalidConfig(e.to_string()))?;

        if config.frame.rate_hz == 0 {
            return Err(SchedulerError::InvalidConfig(
                "frame.rate_hz must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Io`] if the file cannot be read, otherwise
    /// the errors of [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> SchedulerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SchedulerError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
