//! crates/logging/src/error.rs
//!
//! Error types for channel registration and configuration.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type for fallible registry and configuration operations.
pub type LogResult<T> = Result<T, LogError>;

/// Errors reported by the logging facility.
///
/// Dispatch itself never returns these; they only surface from registration
/// and configuration calls where the caller can act on them.
#[derive(Debug, Error)]
pub enum LogError {
    /// Storage for a channel or message buffer could not be obtained.
    #[error("no memory to allocate {what}")]
    Allocation {
        /// What was being allocated.
        what: &'static str,
        /// Underlying reservation failure, absent when a configured limit was hit.
        #[source]
        source: Option<TryReserveError>,
    },
    /// A configuration value could not be parsed.
    #[error("invalid {key} value: {value:?}")]
    InvalidConfig {
        /// Configuration key.
        key: &'static str,
        /// Offending value.
        value: String,
    },
    /// The default context is already in use further up this thread's stack
    /// (a channel called back into the facility), or the thread is exiting.
    #[error("logging context is unavailable on this thread")]
    Unavailable,
}

impl LogError {
    pub(crate) const fn channel_limit() -> Self {
        Self::Allocation {
            what: "output channel",
            source: None,
        }
    }

    pub(crate) const fn channel_reserve(source: TryReserveError) -> Self {
        Self::Allocation {
            what: "output channel",
            source: Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn limit_error_has_no_source() {
        let err = LogError::channel_limit();
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "no memory to allocate output channel");
    }

    #[test]
    fn reserve_error_keeps_source() {
        let mut buffer = String::new();
        let reserve = buffer.try_reserve(usize::MAX).unwrap_err();
        let err = LogError::channel_reserve(reserve);
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_config_mentions_key_and_value() {
        let err = LogError::InvalidConfig {
            key: "stream",
            value: "printer".to_owned(),
        };
        let text = err.to_string();
        assert!(text.contains("stream"));
        assert!(text.contains("printer"));
    }

    #[test]
    fn unavailable_has_fixed_message() {
        assert_eq!(
            LogError::Unavailable.to_string(),
            "logging context is unavailable on this thread"
        );
    }

    #[test]
    fn log_result_err() {
        let result: LogResult<()> = Err(LogError::channel_limit());
        assert!(matches!(result, Err(LogError::Allocation { .. })));
    }
}
