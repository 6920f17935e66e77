//! Error types shared across the engine.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A name could not be turned into something the engine can work with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum NameError {
    /// Normalization left nothing usable (empty or shorter than the minimum).
    #[error("company name `{name}` is empty or shorter than {min} characters after normalization")]
    EmptyName {
        /// The raw input as given.
        name: String,
        /// Minimum normalized length.
        min: usize,
    },
    /// Suggestion generation found no token to build on.
    #[error("base name `{0}` has no usable token to build suggestions from")]
    InsufficientBaseName(String),
    /// Requested suggestion count is outside the supported range.
    #[error("suggestion count {count} is out of range (expected 1..={max})")]
    InvalidSuggestionCount {
        /// Requested count.
        count: usize,
        /// Largest supported count.
        max: usize,
    },
}

/// Failure to query the external registry.
///
/// Always recovered by the engine: a failed lookup degrades the result to
/// "unknown availability", never to "available".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// Network or transport failure.
    #[error("registry transport error: {0}")]
    Transport(String),
    /// The registry answered with an unexpected HTTP status.
    #[error("registry returned HTTP {0}")]
    Status(u16),
    /// The lookup did not finish in time.
    #[error("registry lookup timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// The batch deadline passed before the lookup could run.
    #[error("batch deadline passed before the registry could be queried")]
    DeadlineExceeded,
    /// The registry response could not be decoded.
    #[error("could not decode registry response: {0}")]
    Decode(String),
    /// The lookup worker died before reporting back.
    #[error("registry lookup aborted: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(code) => matches!(*code, 408 | 429 | 500..=599),
            Self::Timeout(_) | Self::DeadlineExceeded | Self::Decode(_) | Self::Internal(_) => {
                false
            }
        }
    }
}

/// Malformed input to the batch orchestrator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BatchError {
    /// Zero names, or more than the configured maximum.
    #[error("batch size {size} is out of range (expected 1..={max})")]
    InvalidBatchSize {
        /// Number of names submitted.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Configuration could not be loaded or is out of range.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The config file is not valid TOML for [`EngineConfig`](crate::config::EngineConfig).
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// A value is outside its supported range.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors surfaced to callers of the [`Engine`](crate::check::Engine).
///
/// Registry failures never appear here: they degrade into a
/// [`CheckResult`](crate::check::CheckResult) instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckError {
    /// The name (or suggestion base) is unusable.
    #[error(transparent)]
    Name(#[from] NameError),
    /// The batch request itself is malformed.
    #[error(transparent)]
    Batch(#[from] BatchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(RegistryError::Status(503).is_retryable());
        assert!(RegistryError::Status(429).is_retryable());
        assert!(RegistryError::Status(408).is_retryable());
        assert!(!RegistryError::Status(400).is_retryable());
        assert!(!RegistryError::Status(401).is_retryable());
    }

    #[test]
    fn transport_is_retryable_timeout_is_not() {
        assert!(RegistryError::Transport("reset".into()).is_retryable());
        assert!(!RegistryError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!RegistryError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn timeout_message_is_in_millis() {
        let err = RegistryError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "registry lookup timed out after 250ms");
    }

    #[test]
    fn check_error_is_transparent() {
        let err = CheckError::from(BatchError::InvalidBatchSize { size: 0, max: 20 });
        assert_eq!(err.to_string(), "batch size 0 is out of range (expected 1..=20)");
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_normal<T: Sized + Send + Sync>() {}
        assert_normal::<NameError>();
        assert_normal::<RegistryError>();
        assert_normal::<CheckError>();
        assert_normal::<ConfigError>();
    }
}
