//! Static registry naming rules and compliance scoring.
//!
//! Rules are evaluated against the name as supplied (length, leading
//! character, punctuation, suffix, spacing) and against a word-boundary view
//! of it (prohibited terms). Every rule either blocks (an error) or advises
//! (a warning); the score is derived from the two counts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::{MIN_NAME_LENGTH, collapse_whitespace};

/// Longest accepted company name, in characters.
pub const MAX_NAME_LENGTH: usize = 120;

/// Highest score a name with any blocking error can receive; it always
/// falls in [`ScoreBand::Moderate`] or below.
pub const BLOCKED_SCORE_CEILING: u8 = 59;

const ERROR_PENALTY: u8 = 30;
const WARNING_PENALTY: u8 = 10;

/// Terms implying government, banking or insurance affiliation.
const PROHIBITED_TERMS: &[&str] = &[
    "bank",
    "insurance",
    "government",
    "ministry",
    "national",
    "central",
    "reserve",
    "federal",
    "authority",
    "commission",
    "corporation of india",
    "registrar",
    "co-operative",
    "municipal",
    "panchayat",
];

/// Whether a single lowercase word is itself a prohibited term.
pub(crate) fn is_prohibited_word(word: &str) -> bool {
    PROHIBITED_TERMS.contains(&word)
}

/// Legal-entity endings the registry accepts, lowercase.
const LEGAL_SUFFIXES: &[&str] = &[
    "private limited",
    "private limited.",
    "pvt ltd",
    "pvt. ltd.",
    "pvt. ltd",
    "limited",
    "ltd",
    "ltd.",
];

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Violation {
    /// Fewer than [`MIN_NAME_LENGTH`] characters.
    TooShort,
    /// More than [`MAX_NAME_LENGTH`] characters.
    TooLong,
    /// First character is a digit.
    StartsWithDigit,
    /// Contains a term reserved for regulated or public bodies.
    ProhibitedTerm(&'static str),
    /// No recognised legal-entity suffix.
    MissingLegalSuffix,
    /// Characters outside letters, digits, whitespace and `. - & ( )`.
    SpecialCharacters,
    /// Two or more whitespace characters in a row.
    ConsecutiveSpaces,
    /// Whitespace before or after the name.
    SurroundingWhitespace,
}

impl Violation {
    /// Whether this violation makes the name non-compliant.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::TooShort | Self::TooLong | Self::StartsWithDigit | Self::ProhibitedTerm(_)
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(
                f,
                "Company name too short (minimum {MIN_NAME_LENGTH} characters)"
            ),
            Self::TooLong => write!(
                f,
                "Company name too long (maximum {MAX_NAME_LENGTH} characters)"
            ),
            Self::StartsWithDigit => write!(f, "Company name cannot start with a number"),
            Self::ProhibitedTerm(term) => write!(f, "Prohibited word '{term}' found in name"),
            Self::MissingLegalSuffix => write!(
                f,
                "Consider adding proper suffix (Pvt Ltd or Private Limited)"
            ),
            Self::SpecialCharacters => write!(
                f,
                "Special characters may cause issues during incorporation"
            ),
            Self::ConsecutiveSpaces => write!(f, "Multiple consecutive spaces found"),
            Self::SurroundingWhitespace => write!(f, "Leading or trailing spaces detected"),
        }
    }
}

/// Outcome of evaluating the naming rules against one name.
///
/// `errors` and `warnings` are always present, possibly empty, and hold no
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Compliance score, 0 to 100.
    pub score: u8,
    /// Blocking violations.
    pub errors: Vec<String>,
    /// Advisory concerns.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// A result for a name that could not be evaluated at all.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            score: 0,
            errors: vec![reason.into()],
            warnings: Vec::new(),
        }
    }

    /// True when no blocking rule failed.
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.errors.is_empty()
    }

    /// Presentation band of the score.
    #[must_use]
    pub const fn band(&self) -> ScoreBand {
        ScoreBand::of(self.score)
    }
}

/// Presentation band for a compliance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    /// 90 and above.
    Excellent,
    /// 70 to 89.
    Good,
    /// 50 to 69.
    Moderate,
    /// Below 50.
    Poor,
}

impl ScoreBand {
    /// Band a score falls into.
    #[must_use]
    pub const fn of(score: u8) -> Self {
        match score {
            90.. => Self::Excellent,
            70..=89 => Self::Good,
            50..=69 => Self::Moderate,
            _ => Self::Poor,
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "excellent"),
            Self::Good => write!(f, "good"),
            Self::Moderate => write!(f, "moderate"),
            Self::Poor => write!(f, "poor"),
        }
    }
}

/// Collect every rule violation for `name`, in rule order.
#[must_use]
pub fn violations(name: &str) -> Vec<Violation> {
    let mut found = Vec::new();
    let trimmed = name.trim();
    let length = trimmed.chars().count();

    if length < MIN_NAME_LENGTH {
        found.push(Violation::TooShort);
    } else if length > MAX_NAME_LENGTH {
        found.push(Violation::TooLong);
    }

    if trimmed.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        found.push(Violation::StartsWithDigit);
    }

    let joined = word_view(trimmed, true);
    let split = word_view(trimmed, false);
    for term in PROHIBITED_TERMS {
        let view = if term.contains('-') { &joined } else { &split };
        if view.contains(&format!(" {term} ")) {
            found.push(Violation::ProhibitedTerm(*term));
        }
    }

    let lowered = collapse_whitespace(trimmed).to_lowercase();
    if !LEGAL_SUFFIXES.iter().any(|suffix| has_word_suffix(&lowered, suffix)) {
        found.push(Violation::MissingLegalSuffix);
    }

    if trimmed
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || c.is_whitespace() || ".-&()".contains(c)))
    {
        found.push(Violation::SpecialCharacters);
    }

    if has_whitespace_run(name) {
        found.push(Violation::ConsecutiveSpaces);
    }

    if name.len() != trimmed.len() {
        found.push(Violation::SurroundingWhitespace);
    }

    found
}

/// Evaluate the naming rules and score the result.
///
/// Deterministic: the same input always yields the same result.
///
/// ```
/// use company_avail::validation::validate;
/// let result = validate("XYZ Solutions Private Limited");
/// assert_eq!(result.score, 100);
/// assert!(result.errors.is_empty() && result.warnings.is_empty());
/// ```
#[must_use]
pub fn validate(name: &str) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for violation in violations(name) {
        let bucket = if violation.is_blocking() {
            &mut errors
        } else {
            &mut warnings
        };
        let message = violation.to_string();
        if !bucket.contains(&message) {
            bucket.push(message);
        }
    }

    let score = score(errors.len(), warnings.len());
    ValidationResult {
        score,
        errors,
        warnings,
    }
}

/// Score from violation counts: 100 minus penalties, clamped, and capped at
/// [`BLOCKED_SCORE_CEILING`] when anything blocks.
#[must_use]
pub fn score(errors: usize, warnings: usize) -> u8 {
    let penalty = errors
        .saturating_mul(usize::from(ERROR_PENALTY))
        .saturating_add(warnings.saturating_mul(usize::from(WARNING_PENALTY)));
    let raw = 100usize.saturating_sub(penalty);
    let raw = u8::try_from(raw).unwrap_or(0);
    if errors > 0 {
        raw.min(BLOCKED_SCORE_CEILING)
    } else {
        raw
    }
}

/// Lowercase, punctuation turned into spaces, padded with a space on both
/// ends so terms can be matched on word boundaries. With `keep_hyphens`,
/// `-` stays inside words so hyphenated terms match whole.
fn word_view(name: &str, keep_hyphens: bool) -> String {
    let spaced: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || (keep_hyphens && c == '-') {
                c
            } else {
                ' '
            }
        })
        .collect();
    format!(" {} ", collapse_whitespace(&spaced))
}

fn has_word_suffix(lowered: &str, suffix: &str) -> bool {
    lowered == suffix
        || lowered
            .strip_suffix(suffix)
            .is_some_and(|head| head.ends_with(' '))
}

fn has_whitespace_run(name: &str) -> bool {
    name.trim()
        .chars()
        .zip(name.trim().chars().skip(1))
        .any(|(a, b)| a.is_whitespace() && b.is_whitespace())
}
