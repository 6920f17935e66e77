//! Canonical comparison form for company names.

use std::fmt;

use serde::Serialize;

use crate::error::NameError;

/// Minimum number of characters a normalized name must keep.
pub const MIN_NAME_LENGTH: usize = 3;

/// Trailing tokens that denote the legal entity rather than the brand.
///
/// Matched after punctuation is removed, so `Pvt. Ltd.` is covered by
/// `pvt` + `ltd`.
const LEGAL_TOKENS: &[&str] = &["private", "pvt", "limited", "ltd", "llp"];

/// Reduce a raw name to the form used for comparison and matching.
///
/// Lowercases, drops punctuation, collapses whitespace and strips trailing
/// legal-entity tokens. Never fails; an unusable name simply comes back
/// empty or short.
///
/// ```
/// use company_avail::normalize::comparison_form;
/// assert_eq!(comparison_form("  Acme   Tech Pvt. Ltd. "), "acme tech");
/// assert_eq!(comparison_form("XYZ Solutions Private Limited"), "xyz solutions");
/// ```
#[must_use]
pub fn comparison_form(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    while let Some(last) = tokens.last() {
        if LEGAL_TOKENS.contains(last) {
            tokens.pop();
        } else {
            break;
        }
    }
    tokens.join(" ")
}

/// Collapse whitespace runs and trim, keeping case and punctuation.
#[must_use]
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A candidate company name: the input as given plus its comparison form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateName {
    original: String,
    normalized: String,
}

impl CandidateName {
    /// Normalize `raw`, rejecting names with nothing usable left.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::EmptyName`] when the comparison form is shorter
    /// than [`MIN_NAME_LENGTH`] characters.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let normalized = comparison_form(raw);
        if normalized.chars().count() < MIN_NAME_LENGTH {
            return Err(NameError::EmptyName {
                name: raw.to_owned(),
                min: MIN_NAME_LENGTH,
            });
        }
        Ok(Self {
            original: raw.to_owned(),
            normalized,
        })
    }

    /// The name exactly as supplied.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The comparison form.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Whitespace-separated tokens of the comparison form.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.normalized.split(' ')
    }
}

impl fmt::Display for CandidateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
