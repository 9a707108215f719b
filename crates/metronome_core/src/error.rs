//! # Scheduler Error Types
//!
//! Only construction and config loading can fail. Every operation on a live
//! scheduler or item is infallible.

use thiserror::Error;

/// Errors raised while building items or loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The item has neither an id nor a duration to identify or bound it.
    #[error("item needs an id or a duration")]
    MissingIdentity,

    /// The item has neither a timeout nor an update callback.
    #[error("item needs a timeout callback or an update callback")]
    MissingCallback,

    /// Durations are non-negative milliseconds or -1 for indefinite.
    #[error("invalid duration {0}ms: expected a value >= 0 or -1")]
    InvalidDuration(i64),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(String),
}

/// Result type for scheduler construction.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_problem() {
        assert_eq!(
            SchedulerError::InvalidDuration(-7).to_string(),
            "invalid duration -7ms: expected a value >= 0 or -1"
        );
        assert!(SchedulerError::MissingCallback.to_string().contains("callback"));
    }
}
