//! Core compliance and availability checking for company names.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::batch::{self, CallPermits};
use crate::config::EngineConfig;
use crate::error::{BatchError, CheckError, NameError, RegistryError};
use crate::normalize::CandidateName;
use crate::registry::{Registry, RegistryMatch, RegistryRecord, match_records};
use crate::report::BatchResult;
use crate::resolve::{Recommendation, resolve};
use crate::suggest::{self, SuggestionSet};
use crate::validation::{self, ValidationResult};

/// Prefix of the warning added when the registry could not be consulted.
pub const REGISTRY_INCOMPLETE: &str = "Registry check incomplete";

/// The verdict for one name.
///
/// Built once per check and never mutated afterwards. `validation.errors`,
/// `validation.warnings` and `existing_companies` are always present, even
/// when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// The name as supplied.
    pub name: String,
    /// Comparison form; absent when normalization failed.
    pub normalized_name: Option<String>,
    /// Whether the name can be filed as far as the engine can tell.
    pub is_available: bool,
    /// Naming rule outcome.
    pub validation: ValidationResult,
    /// Related registrations, in registry response order.
    pub existing_companies: Vec<RegistryMatch>,
    /// Overall verdict.
    pub recommendation: Recommendation,
    /// Why the check could not complete, if it could not.
    pub degraded: Option<String>,
    /// When the check ran.
    pub timestamp: DateTime<Utc>,
}

impl CheckResult {
    fn completed(
        candidate: &CandidateName,
        mut validation: ValidationResult,
        lookup: Result<Vec<RegistryMatch>, RegistryError>,
    ) -> Self {
        let recommendation = resolve(&validation, lookup.as_deref());
        let (existing_companies, degraded) = match lookup {
            Ok(matches) => (matches, None),
            Err(err) => {
                tracing::warn!(name = candidate.original(), error = %err, "registry lookup failed; availability unknown");
                validation
                    .warnings
                    .push(format!("{REGISTRY_INCOMPLETE}: {err}"));
                validation.score =
                    validation::score(validation.errors.len(), validation.warnings.len());
                (Vec::new(), Some(err.to_string()))
            }
        };
        Self {
            name: candidate.original().to_owned(),
            normalized_name: Some(candidate.normalized().to_owned()),
            is_available: recommendation.is_available(),
            validation,
            existing_companies,
            recommendation,
            degraded,
            timestamp: Utc::now(),
        }
    }

    /// A result for a name that could not be normalized.
    ///
    /// The rule outcome is kept and the normalization failure is added as the
    /// first error.
    #[must_use]
    pub fn rejected(name: &str, error: &NameError) -> Self {
        let mut validation = validation::validate(name);
        validation.errors.insert(0, error.to_string());
        validation.score = validation::score(validation.errors.len(), validation.warnings.len());
        Self {
            name: name.to_owned(),
            normalized_name: None,
            is_available: false,
            validation,
            existing_companies: Vec::new(),
            recommendation: Recommendation::NonCompliant,
            degraded: None,
            timestamp: Utc::now(),
        }
    }

    /// A result for a check that died before producing anything.
    #[must_use]
    pub fn aborted(name: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            name: name.to_owned(),
            normalized_name: None,
            is_available: false,
            validation: ValidationResult::failed(format!("Check aborted: {reason}")),
            existing_companies: Vec::new(),
            recommendation: Recommendation::Unknown,
            degraded: Some(reason),
            timestamp: Utc::now(),
        }
    }

    /// True when the registry could not be consulted or the check died.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Registry reachability snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Whether the registry answered in time.
    pub reachable: bool,
    /// Round-trip time of the probe, in milliseconds.
    pub latency_ms: u64,
    /// Failure detail when unreachable.
    pub message: Option<String>,
    /// When the probe ran.
    pub checked_at: DateTime<Utc>,
}

/// The name compliance and availability engine.
///
/// Holds no results between calls and is safe to share across threads.
///
/// # Example
///
/// ```
/// use company_avail::check::Engine;
/// use company_avail::registry::{InMemoryRegistry, RegistryRecord};
/// use company_avail::resolve::Recommendation;
///
/// let registry = InMemoryRegistry::new(vec![RegistryRecord::new("Acme Tech Pvt Ltd", "U1")]);
/// let engine = Engine::with_registry(registry);
///
/// let result = engine.check_one("Acme Tech Private Limited").unwrap();
/// assert_eq!(result.recommendation, Recommendation::Unavailable);
/// assert!(!result.is_available);
/// ```
#[derive(Clone)]
pub struct Engine {
    registry: Arc<dyn Registry>,
    permits: Arc<CallPermits>,
    config: EngineConfig,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine over a shared registry.
    ///
    /// At most `config.workers` registry calls are in flight at once across
    /// every clone of the engine, including calls abandoned after a timeout.
    #[must_use]
    pub fn new(registry: Arc<dyn Registry>, config: EngineConfig) -> Self {
        Self {
            registry,
            permits: CallPermits::new(config.workers),
            config,
        }
    }

    /// Create an engine with default configuration.
    #[must_use]
    pub fn with_registry(registry: impl Registry + 'static) -> Self {
        Self::new(Arc::new(registry), EngineConfig::default())
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check a single name end to end.
    ///
    /// Runs normalization, the naming rules and a registry lookup, then
    /// resolves a verdict. A failed or slow lookup yields a degraded result
    /// rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Name`] when the name normalizes to nothing usable.
    pub fn check_one(&self, name: &str) -> Result<CheckResult, CheckError> {
        Ok(self.run(name, None)?)
    }

    /// Check many names concurrently on the bounded worker pool.
    ///
    /// Per-name failures are folded into their [`CheckResult`]; the output
    /// always has one entry per input, in input order.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Batch`] for an empty list or one longer than
    /// the configured maximum.
    pub fn check_batch<S>(&self, names: &[S]) -> Result<BatchResult, CheckError>
    where
        S: AsRef<str> + Sync,
    {
        let max = self.config.max_batch_size;
        if names.is_empty() || names.len() > max {
            return Err(BatchError::InvalidBatchSize {
                size: names.len(),
                max,
            }
            .into());
        }

        let started = Instant::now();
        let deadline = self.config.batch_deadline().map(|d| started + d);
        let results = batch::run_ordered(
            names,
            self.config.workers,
            |name| {
                let name = name.as_ref();
                self.run(name, deadline)
                    .unwrap_or_else(|err| CheckResult::rejected(name, &err))
            },
            |name, reason| CheckResult::aborted(name.as_ref(), reason),
        );
        let batch = BatchResult::new(results, started.elapsed());
        tracing::info!(
            total = batch.total_processed,
            available = batch.summary.available,
            degraded = batch.summary.degraded,
            elapsed_ms = batch.elapsed_ms,
            "batch complete"
        );
        Ok(batch)
    }

    /// Generate alternative names for `base_name`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Name`] for an out-of-range count or a base name
    /// with no usable word.
    pub fn suggest(&self, base_name: &str, count: usize) -> Result<SuggestionSet, CheckError> {
        Ok(suggest::suggest(base_name, count, &self.config.legal_suffix)?)
    }

    /// Check `name` followed by up to `count` generated alternatives.
    ///
    /// Alternatives beyond what fits in one batch next to the base name
    /// (`max_batch_size - 1`) are dropped.
    ///
    /// # Errors
    ///
    /// Propagates suggestion errors.
    pub fn check_with_alternatives(
        &self,
        name: &str,
        count: usize,
    ) -> Result<BatchResult, CheckError> {
        let mut set = self.suggest(name, count)?;
        let room = self.config.max_batch_size.saturating_sub(1);
        if set.len() > room {
            tracing::debug!(generated = set.len(), room, "dropping alternatives that do not fit the batch");
            set.suggestions.truncate(room);
        }
        let mut names = Vec::with_capacity(set.len() + 1);
        names.push(name.to_owned());
        names.extend(set.suggestions);
        self.check_batch(&names)
    }

    /// Probe the registry within the per-lookup timeout.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        let started = Instant::now();
        let outcome = self.call_registry(self.config.lookup_timeout(), |registry| registry.health());
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "registry health probe failed");
        }
        HealthReport {
            reachable: outcome.is_ok(),
            latency_ms,
            message: outcome.err().map(|e| e.to_string()),
            checked_at: Utc::now(),
        }
    }

    fn run(&self, name: &str, deadline: Option<Instant>) -> Result<CheckResult, NameError> {
        let candidate = CandidateName::parse(name)?;
        let validation = validation::validate(name);
        let lookup = self
            .lookup(candidate.normalized(), deadline)
            .map(|records| match_records(candidate.normalized(), records));
        Ok(CheckResult::completed(&candidate, validation, lookup))
    }

    fn lookup(
        &self,
        normalized: &str,
        deadline: Option<Instant>,
    ) -> Result<Vec<RegistryRecord>, RegistryError> {
        let mut budget = self.config.lookup_timeout();
        if let Some(deadline) = deadline {
            budget = budget.min(deadline.saturating_duration_since(Instant::now()));
            if budget.is_zero() {
                return Err(RegistryError::DeadlineExceeded);
            }
        }

        let retry = self.config.retry.clone();
        let query = normalized.to_owned();
        let until = Instant::now() + budget;
        tracing::debug!(name = normalized, budget_ms = %budget.as_millis(), "registry lookup");
        self.call_registry(budget, move |registry| {
            retry.run(Some(until), || registry.lookup(&query))
        })
    }

    /// Run `call` against the registry on its own thread, giving up after
    /// `budget`. A call that overruns keeps running detached and keeps its
    /// permit until it returns; its answer is discarded.
    fn call_registry<T, F>(&self, budget: Duration, call: F) -> Result<T, RegistryError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Registry) -> Result<T, RegistryError> + Send + 'static,
    {
        let started = Instant::now();
        let Some(permit) = self.permits.acquire(budget) else {
            tracing::debug!(budget_ms = %budget.as_millis(), "no registry permit within budget");
            return Err(RegistryError::Timeout(budget));
        };
        let remaining = budget.saturating_sub(started.elapsed());

        let registry = Arc::clone(&self.registry);
        let (tx, rx) = mpsc::sync_channel(1);
        thread::Builder::new()
            .name("registry-call".into())
            .spawn(move || {
                let _permit = permit;
                let _ = tx.send(call(registry.as_ref()));
            })
            .map_err(|e| RegistryError::Internal(e.to_string()))?;

        match rx.recv_timeout(remaining) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => Err(RegistryError::Timeout(budget)),
            Err(RecvTimeoutError::Disconnected) => Err(RegistryError::Internal(
                "registry call panicked".into(),
            )),
        }
    }
}
