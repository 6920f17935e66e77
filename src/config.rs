//! Engine configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. Durations are given in milliseconds.
//!
//! ```toml
//! workers = 6
//! max_batch_size = 20
//! lookup_timeout_ms = 8000
//! batch_deadline_ms = 30000
//! legal_suffix = "Private Limited"
//!
//! [retry]
//! max_retries = 2
//! initial_delay_ms = 250
//! max_delay_ms = 2000
//!
//! [registry]
//! base_url = "https://registry.example/api"
//! api_key = "..."
//! api_key_header = "x-api-key"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::http::DEFAULT_API_KEY_HEADER;
use crate::registry::RetryPolicy;
use crate::suggest::DEFAULT_LEGAL_SUFFIX;

/// Largest worker pool the engine will run.
pub const MAX_WORKERS: usize = 16;

/// Engine tuning and registry connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Concurrent units of work in a batch.
    pub workers: usize,
    /// Most names accepted in one batch.
    pub max_batch_size: usize,
    /// Upper bound on a single registry lookup, retries included.
    pub lookup_timeout_ms: u64,
    /// Optional bound on a whole batch.
    pub batch_deadline_ms: Option<u64>,
    /// Legal suffix appended to generated suggestions.
    pub legal_suffix: String,
    /// Retry behaviour for transient registry failures.
    pub retry: RetryPolicy,
    /// Where the registry lives.
    pub registry: RegistryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_batch_size: 20,
            lookup_timeout_ms: 10_000,
            batch_deadline_ms: None,
            legal_suffix: DEFAULT_LEGAL_SUFFIX.to_owned(),
            retry: RetryPolicy::default(),
            registry: RegistryConfig::default(),
        }
    }
}

/// Registry connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Base URL of the HTTP registry.
    pub base_url: Option<String>,
    /// API key sent with every request.
    pub api_key: Option<String>,
    /// Header carrying the API key.
    pub api_key_header: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_owned(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a TOML config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Check every value is in its supported range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(ConfigError::Invalid {
                field: "workers",
                reason: format!("{} is not in 1..={MAX_WORKERS}", self.workers),
            });
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "max_batch_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.lookup_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "lookup_timeout_ms",
                reason: "must be at least 1".into(),
            });
        }
        if self.batch_deadline_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "batch_deadline_ms",
                reason: "must be at least 1 when set".into(),
            });
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid {
                field: "retry.initial_delay_ms",
                reason: "must not exceed retry.max_delay_ms".into(),
            });
        }
        Ok(())
    }

    /// Per-lookup timeout.
    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Whole-batch deadline, if any.
    #[must_use]
    pub fn batch_deadline(&self) -> Option<Duration> {
        self.batch_deadline_ms.map(Duration::from_millis)
    }
}
