//! Merge rule validation and registry matches into a verdict.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::registry::{MatchKind, RegistryMatch};
use crate::validation::ValidationResult;

/// The verdict shown to a founder.
///
/// Ordered from worst to best for availability; compliance blockers always
/// dominate registry availability, and exact registrations always dominate
/// advisory warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[must_use]
#[non_exhaustive]
pub enum Recommendation {
    /// A blocking naming rule failed.
    NonCompliant,
    /// The same name is already registered.
    Unavailable,
    /// The registry could not be consulted; availability is unknown.
    Unknown,
    /// Usable, but warnings or similar registrations deserve a look.
    AvailableWithIssues,
    /// No errors, warnings or matches.
    AvailableAndCompliant,
}

impl Recommendation {
    /// Whether a name with this verdict can be filed.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::AvailableWithIssues | Self::AvailableAndCompliant)
    }

    /// Short machine-friendly label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NonCompliant => "non-compliant",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
            Self::AvailableWithIssues => "available-with-issues",
            Self::AvailableAndCompliant => "available",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonCompliant => write!(f, "Non-compliant"),
            Self::Unavailable => write!(f, "Unavailable - name registered"),
            Self::Unknown => write!(f, "Availability unknown - registry unreachable"),
            Self::AvailableWithIssues => write!(f, "Available with minor issues"),
            Self::AvailableAndCompliant => write!(f, "Available and compliant"),
        }
    }
}

/// Decide the verdict; first matching rule wins.
///
/// 1. any validation error: [`Recommendation::NonCompliant`]
/// 2. registry lookup failed: [`Recommendation::Unknown`]
/// 3. any exact match: [`Recommendation::Unavailable`]
/// 4. warnings or non-exact matches: [`Recommendation::AvailableWithIssues`]
/// 5. otherwise: [`Recommendation::AvailableAndCompliant`]
pub fn resolve(
    validation: &ValidationResult,
    matches: Result<&[RegistryMatch], &RegistryError>,
) -> Recommendation {
    if !validation.errors.is_empty() {
        return Recommendation::NonCompliant;
    }
    let Ok(matches) = matches else {
        return Recommendation::Unknown;
    };
    if matches.iter().any(|m| m.kind == MatchKind::Exact) {
        return Recommendation::Unavailable;
    }
    if !validation.warnings.is_empty() || !matches.is_empty() {
        return Recommendation::AvailableWithIssues;
    }
    Recommendation::AvailableAndCompliant
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn validation(errors: &[&str], warnings: &[&str]) -> ValidationResult {
        ValidationResult {
            score: 100,
            errors: errors.iter().map(ToString::to_string).collect(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }

    fn matched(kind: MatchKind) -> RegistryMatch {
        RegistryMatch {
            name: "Acme Ltd".into(),
            identifier: "U1".into(),
            kind,
        }
    }

    #[test]
    fn errors_dominate_everything() {
        let v = validation(&["bad"], &[]);
        assert_eq!(resolve(&v, Ok(&[])), Recommendation::NonCompliant);
        assert_eq!(
            resolve(&v, Ok(&[matched(MatchKind::Exact)])),
            Recommendation::NonCompliant
        );
        let err = RegistryError::Timeout(Duration::from_secs(1));
        assert_eq!(resolve(&v, Err(&err)), Recommendation::NonCompliant);
    }

    #[test]
    fn failed_lookup_is_never_available() {
        let err = RegistryError::Transport("down".into());
        let verdict = resolve(&validation(&[], &[]), Err(&err));
        assert_eq!(verdict, Recommendation::Unknown);
        assert!(!verdict.is_available());
    }

    #[test]
    fn exact_match_dominates_warnings() {
        let v = validation(&[], &["spacing"]);
        assert_eq!(
            resolve(&v, Ok(&[matched(MatchKind::Overlap), matched(MatchKind::Exact)])),
            Recommendation::Unavailable
        );
    }

    #[test]
    fn warnings_or_overlaps_are_minor_issues() {
        assert_eq!(
            resolve(&validation(&[], &["suffix"]), Ok(&[])),
            Recommendation::AvailableWithIssues
        );
        assert_eq!(
            resolve(&validation(&[], &[]), Ok(&[matched(MatchKind::Prefix)])),
            Recommendation::AvailableWithIssues
        );
    }

    #[test]
    fn clean_is_available_and_compliant() {
        let verdict = resolve(&validation(&[], &[]), Ok(&[]));
        assert_eq!(verdict, Recommendation::AvailableAndCompliant);
        assert!(verdict.is_available());
        assert_eq!(verdict.to_string(), "Available and compliant");
    }

    #[test]
    fn serializes_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&Recommendation::AvailableWithIssues).unwrap(),
            r#""available_with_issues""#
        );
    }
}
