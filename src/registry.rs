//! The registry capability the engine depends on, plus match classification
//! and retry policy around it.
//!
//! Concrete transports implement [`Registry`]; see [`crate::http`] for the
//! HTTP adapter and [`InMemoryRegistry`] for an in-process one.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::normalize::comparison_form;

/// One existing registration as reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// Registered company name.
    #[serde(alias = "company_name", alias = "companyName")]
    pub name: String,
    /// Registry identifier (e.g. a corporate identification number).
    #[serde(alias = "cin", alias = "id")]
    pub identifier: String,
}

impl RegistryRecord {
    /// Build a record.
    #[must_use]
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

/// Query capability over an external company registry.
///
/// Implementations receive the normalized (comparison-form) name and return
/// registrations that match or overlap it, in the registry's own order.
pub trait Registry: Send + Sync {
    /// Look up registrations for a normalized name.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] when the registry cannot be queried.
    fn lookup(&self, normalized: &str) -> Result<Vec<RegistryRecord>, RegistryError>;

    /// Check that the registry is reachable.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] describing why it is not.
    fn health(&self) -> Result<(), RegistryError>;
}

/// How a registry record relates to the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Same normalized name.
    Exact,
    /// One normalized name begins with the other at a word boundary.
    Prefix,
    /// The names share a significant word.
    Overlap,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Prefix => write!(f, "prefix"),
            Self::Overlap => write!(f, "overlap"),
        }
    }
}

/// A registry record classified against the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryMatch {
    /// Registered company name.
    pub name: String,
    /// Registry identifier.
    pub identifier: String,
    /// Relationship to the candidate.
    pub kind: MatchKind,
}

/// Words too generic to count as an overlap on their own.
const FILLER_WORDS: &[&str] = &["a", "an", "and", "the", "of", "for", "in", "india"];

/// Classify how `record_name` relates to the `candidate` comparison form.
///
/// Returns `None` when the two share nothing worth reporting.
#[must_use]
pub fn classify(candidate: &str, record_name: &str) -> Option<MatchKind> {
    let existing = comparison_form(record_name);
    if existing.is_empty() {
        return None;
    }
    if existing == candidate {
        return Some(MatchKind::Exact);
    }
    if starts_with_words(&existing, candidate) || starts_with_words(candidate, &existing) {
        return Some(MatchKind::Prefix);
    }
    let shares_word = candidate
        .split(' ')
        .filter(|w| !FILLER_WORDS.contains(w))
        .any(|w| existing.split(' ').any(|e| e == w));
    shares_word.then_some(MatchKind::Overlap)
}

/// Classify every record, keeping registry order and dropping unrelated ones.
#[must_use]
pub fn match_records(candidate: &str, records: Vec<RegistryRecord>) -> Vec<RegistryMatch> {
    records
        .into_iter()
        .filter_map(|record| {
            let kind = classify(candidate, &record.name);
            if kind.is_none() {
                tracing::debug!(candidate, record = %record.name, "dropping unrelated registry record");
            }
            kind.map(|kind| RegistryMatch {
                name: record.name,
                identifier: record.identifier,
                kind,
            })
        })
        .collect()
}

fn starts_with_words(haystack: &str, prefix: &str) -> bool {
    haystack
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with(' '))
}

/// Retry behaviour for registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 250,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    /// Exponential backoff before retry number `step` (0-based), capped.
    #[must_use]
    pub fn delay(&self, step: u32) -> Duration {
        let factor = 1u64.checked_shl(step).unwrap_or(u64::MAX);
        let millis = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }

    /// Run `attempt` until it succeeds, fails with a non-retryable error,
    /// exhausts the retry budget, or the next backoff would pass `deadline`.
    ///
    /// # Errors
    ///
    /// Returns the last error seen.
    pub fn run<T>(
        &self,
        deadline: Option<Instant>,
        mut attempt: impl FnMut() -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut step = 0;
        loop {
            match attempt() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && step < self.max_retries => {
                    let delay = self.delay(step);
                    if deadline.is_some_and(|d| Instant::now() + delay >= d) {
                        return Err(err);
                    }
                    tracing::warn!(error = %err, retry = step + 1, delay_ms = %delay.as_millis(), "retrying registry lookup");
                    thread::sleep(delay);
                    step += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// A registry held entirely in memory.
///
/// `lookup` behaves like a registry search endpoint: it returns every record
/// whose normalized name shares a word with the query, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    records: Vec<RegistryRecord>,
}

impl InMemoryRegistry {
    /// Build from records.
    #[must_use]
    pub fn new(records: Vec<RegistryRecord>) -> Self {
        Self { records }
    }

    /// Load records from a JSON file holding an array of records.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or is not valid JSON.
    pub fn from_json_file(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let records: Vec<RegistryRecord> = serde_json::from_str(&text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(records))
    }

    /// Registered records, in insertion order.
    #[must_use]
    pub fn records(&self) -> &[RegistryRecord] {
        &self.records
    }
}

impl Registry for InMemoryRegistry {
    fn lookup(&self, normalized: &str) -> Result<Vec<RegistryRecord>, RegistryError> {
        let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
        Ok(self
            .records
            .iter()
            .filter(|record| {
                let existing = comparison_form(&record.name);
                existing.split(' ').any(|e| words.contains(&e))
            })
            .cloned()
            .collect())
    }

    fn health(&self) -> Result<(), RegistryError> {
        Ok(())
    }
}
