//! Batch results and their summary.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::check::CheckResult;
use crate::resolve::Recommendation;

/// How many distinct issues a summary lists.
const TOP_ISSUES: usize = 10;

/// Results of a batch, in input order, with a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// One result per input name, in input order.
    pub results: Vec<CheckResult>,
    /// Number of results; always equal to the number of inputs.
    pub total_processed: usize,
    /// Wall-clock time for the whole batch, in milliseconds.
    pub elapsed_ms: u64,
    /// Aggregate figures for presentation.
    pub summary: BatchSummary,
}

impl BatchResult {
    /// Assemble results and compute the summary.
    #[must_use]
    pub fn new(results: Vec<CheckResult>, elapsed: Duration) -> Self {
        let summary = BatchSummary::from_results(&results);
        Self {
            total_processed: results.len(),
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            results,
            summary,
        }
    }
}

/// A distinct error or warning and how often it appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueCount {
    /// The message.
    pub message: String,
    /// Occurrences across the batch.
    pub count: usize,
}

/// Aggregate figures over a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Names judged available.
    pub available: usize,
    /// Names whose check could not complete.
    pub degraded: usize,
    /// Names failing a blocking rule.
    pub non_compliant: usize,
    /// Mean compliance score; 0 for an empty batch.
    pub average_score: f64,
    /// Highest compliance score.
    pub best_score: u8,
    /// First name (in input order) holding the best score.
    pub best_name: Option<String>,
    /// Most frequent issues, most frequent first, ties alphabetical.
    pub common_issues: Vec<IssueCount>,
}

impl BatchSummary {
    /// Summarize a slice of results.
    #[must_use]
    pub fn from_results(results: &[CheckResult]) -> Self {
        let mut best: Option<&CheckResult> = None;
        let mut issues: BTreeMap<&str, usize> = BTreeMap::new();
        let mut total_score = 0u64;

        for result in results {
            total_score += u64::from(result.validation.score);
            if best.is_none_or(|b| result.validation.score > b.validation.score) {
                best = Some(result);
            }
            for issue in result
                .validation
                .errors
                .iter()
                .chain(&result.validation.warnings)
            {
                *issues.entry(issue.as_str()).or_default() += 1;
            }
        }

        let mut common_issues: Vec<IssueCount> = issues
            .into_iter()
            .map(|(message, count)| IssueCount {
                message: message.to_owned(),
                count,
            })
            .collect();
        // BTreeMap order is alphabetical; a stable sort keeps it for ties.
        common_issues.sort_by(|a, b| b.count.cmp(&a.count));
        common_issues.truncate(TOP_ISSUES);

        let average_score = if results.is_empty() {
            0.0
        } else {
            total_score as f64 / results.len() as f64
        };

        Self {
            available: results.iter().filter(|r| r.is_available).count(),
            degraded: results.iter().filter(|r| r.is_degraded()).count(),
            non_compliant: results
                .iter()
                .filter(|r| r.recommendation == Recommendation::NonCompliant)
                .count(),
            average_score,
            best_score: best.map_or(0, |b| b.validation.score),
            best_name: best.map(|b| b.name.clone()),
            common_issues,
        }
    }
}
