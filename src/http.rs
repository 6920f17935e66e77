//! HTTP registry adapter.

use std::time::Duration;

use serde::Deserialize;
use ureq::Agent;

use crate::error::RegistryError;
use crate::registry::{Registry, RegistryRecord};

/// Header the API key is sent in unless configured otherwise.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Search responses come either as a bare array or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Records(Vec<RegistryRecord>),
    Wrapped {
        #[serde(alias = "companies", alias = "results")]
        data: Vec<RegistryRecord>,
    },
}

impl SearchResponse {
    fn into_records(self) -> Vec<RegistryRecord> {
        match self {
            Self::Records(records) | Self::Wrapped { data: records } => records,
        }
    }
}

/// A registry reachable over HTTP.
///
/// Wraps the underlying HTTP agent to insulate callers from the specific
/// HTTP library version used internally.
///
/// Endpoints, relative to the base URL:
/// - `GET /search?name=<normalized>`: matching registrations; 404 means none.
/// - `GET /health`: any 2xx means reachable.
///
/// ```no_run
/// use std::time::Duration;
/// use company_avail::http::HttpRegistry;
///
/// let registry = HttpRegistry::new("https://registry.example/api", Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    agent: Agent,
    base_url: String,
    timeout: Duration,
    api_key: Option<(String, String)>,
}

impl HttpRegistry {
    /// Create a client for `base_url` with a per-request timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
                " (",
                env!("CARGO_PKG_REPOSITORY"),
                ")"
            ))
            .build();
        Self {
            agent: Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout,
            api_key: None,
        }
    }

    /// Send `key` in `header` on every request.
    #[must_use]
    pub fn with_api_key(mut self, header: impl Into<String>, key: impl Into<String>) -> Self {
        self.api_key = Some((header.into(), key.into()));
        self
    }

    /// Base URL requests are made against, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> ureq::RequestBuilder<ureq::typestate::WithoutBody> {
        let request = self.agent.get(format!("{}{path}", self.base_url));
        match &self.api_key {
            Some((header, key)) => request.header(header.as_str(), key.as_str()),
            None => request,
        }
    }

    fn map_error(&self, error: ureq::Error) -> RegistryError {
        match error {
            ureq::Error::StatusCode(code) => RegistryError::Status(code),
            ureq::Error::Timeout(_) => RegistryError::Timeout(self.timeout),
            other => RegistryError::Transport(other.to_string()),
        }
    }
}

impl Registry for HttpRegistry {
    fn lookup(&self, normalized: &str) -> Result<Vec<RegistryRecord>, RegistryError> {
        tracing::debug!(base_url = %self.base_url, name = normalized, "querying registry");
        match self.get("/search").query("name", normalized).call() {
            Ok(mut response) => {
                let body = response
                    .body_mut()
                    .read_to_string()
                    .map_err(|e| RegistryError::Transport(e.to_string()))?;
                decode_search(&body)
            }
            Err(ureq::Error::StatusCode(404)) => Ok(Vec::new()),
            Err(e) => Err(self.map_error(e)),
        }
    }

    fn health(&self) -> Result<(), RegistryError> {
        self.get("/health")
            .call()
            .map(|_| ())
            .map_err(|e| self.map_error(e))
    }
}

/// Decode a search response body.
///
/// # Errors
///
/// Returns [`RegistryError::Decode`] when the body is neither a record array
/// nor an object wrapping one.
pub fn decode_search(body: &str) -> Result<Vec<RegistryRecord>, RegistryError> {
    serde_json::from_str::<SearchResponse>(body)
        .map(SearchResponse::into_records)
        .map_err(|e| RegistryError::Decode(e.to_string()))
}
