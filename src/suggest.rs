//! Alternative name generation.
//!
//! Purely combinatorial: the first significant word of the base name, title
//! cased, paired with a fixed rotation of business nouns and the legal
//! suffix. Words that would make every suggestion non-compliant (a leading
//! digit, a prohibited term) are never used as the stem.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::NameError;
use crate::normalize::comparison_form;
use crate::validation::is_prohibited_word;

/// Most suggestions a single request may ask for.
pub const MAX_SUGGESTIONS: usize = 20;

/// Legal suffix appended when the caller does not choose one.
pub const DEFAULT_LEGAL_SUFFIX: &str = "Private Limited";

const BUSINESS_NOUNS: &[&str] = &[
    "Solutions",
    "Systems",
    "Services",
    "Technologies",
    "Innovations",
    "Ventures",
    "Labs",
    "Enterprises",
    "Consulting",
    "Digital",
    "Networks",
    "Industries",
    "Dynamics",
    "Partners",
    "Works",
    "Logic",
    "Group",
    "Holdings",
    "Studios",
    "Global",
];

/// Words skipped when looking for the first significant one.
const STOP_WORDS: &[&str] = &["the", "a", "an", "and", "of", "ms"];

/// Ordered, duplicate-free alternative names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionSet {
    /// Name the suggestions were derived from.
    pub base_name: String,
    /// Suggestions in generation order.
    pub suggestions: Vec<String>,
}

impl SuggestionSet {
    /// Number of suggestions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    /// True when nothing could be generated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Generate up to `count` alternatives for `base_name`.
///
/// Stops early when the noun rotation is exhausted. Suggestions that
/// normalize to the same form as each other or as the base name are skipped.
///
/// # Errors
///
/// [`NameError::InvalidSuggestionCount`] when `count` is outside
/// `1..=MAX_SUGGESTIONS`; [`NameError::InsufficientBaseName`] when the base
/// name has no word to build on, or only words that cannot start a
/// compliant name.
///
/// ```
/// use company_avail::suggest::{suggest, DEFAULT_LEGAL_SUFFIX};
/// let set = suggest("acme tech pvt ltd", 2, DEFAULT_LEGAL_SUFFIX).unwrap();
/// assert_eq!(set.suggestions, [
///     "Acme Solutions Private Limited",
///     "Acme Systems Private Limited",
/// ]);
/// ```
pub fn suggest(base_name: &str, count: usize, legal_suffix: &str) -> Result<SuggestionSet, NameError> {
    if count == 0 || count > MAX_SUGGESTIONS {
        return Err(NameError::InvalidSuggestionCount {
            count,
            max: MAX_SUGGESTIONS,
        });
    }

    let normalized = comparison_form(base_name);
    let stem = significant_word(&normalized)
        .map(title_case)
        .ok_or_else(|| NameError::InsufficientBaseName(base_name.to_owned()))?;

    let mut seen = HashSet::from([normalized]);
    let mut suggestions = Vec::with_capacity(count);
    for noun in BUSINESS_NOUNS {
        if suggestions.len() == count {
            break;
        }
        if noun.eq_ignore_ascii_case(&stem) {
            continue;
        }
        let candidate = [stem.as_str(), *noun, legal_suffix]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if seen.insert(comparison_form(&candidate)) {
            suggestions.push(candidate);
        }
    }

    tracing::debug!(base = base_name, generated = suggestions.len(), "generated suggestions");
    Ok(SuggestionSet {
        base_name: base_name.to_owned(),
        suggestions,
    })
}

fn significant_word(normalized: &str) -> Option<&str> {
    let mut usable = normalized.split(' ').filter(|w| {
        !w.is_empty()
            && !w.starts_with(|c: char| c.is_ascii_digit())
            && !is_prohibited_word(w)
    });
    let first = usable.clone().next()?;
    Some(usable.find(|w| !STOP_WORDS.contains(w)).unwrap_or(first))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_first_word_with_noun_rotation() {
        let set = suggest("acme", 3, DEFAULT_LEGAL_SUFFIX).unwrap();
        assert_eq!(
            set.suggestions,
            [
                "Acme Solutions Private Limited",
                "Acme Systems Private Limited",
                "Acme Services Private Limited",
            ]
        );
        assert_eq!(set.base_name, "acme");
    }

    #[test]
    fn skips_suggestion_equal_to_base() {
        let set = suggest("Tech Innovations Pvt Ltd", 5, DEFAULT_LEGAL_SUFFIX).unwrap();
        assert_eq!(
            set.suggestions,
            [
                "Tech Solutions Private Limited",
                "Tech Systems Private Limited",
                "Tech Services Private Limited",
                "Tech Technologies Private Limited",
                "Tech Ventures Private Limited",
            ]
        );
    }

    #[test]
    fn skips_stop_words() {
        let set = suggest("The Acme Company", 1, DEFAULT_LEGAL_SUFFIX).unwrap();
        assert_eq!(set.suggestions, ["Acme Solutions Private Limited"]);
    }

    #[test]
    fn falls_back_to_first_word_when_all_are_stop_words() {
        let set = suggest("The", 1, "Ltd").unwrap();
        assert_eq!(set.suggestions, ["The Solutions Ltd"]);
    }

    #[test]
    fn skips_stems_that_cannot_be_compliant() {
        let set = suggest("1 A Pvt Ltd", 1, DEFAULT_LEGAL_SUFFIX).unwrap();
        assert_eq!(set.suggestions, ["A Solutions Private Limited"]);

        let set = suggest("National Orbit Ltd", 1, DEFAULT_LEGAL_SUFFIX).unwrap();
        assert_eq!(set.suggestions, ["Orbit Solutions Private Limited"]);

        assert!(matches!(
            suggest("National Bank 42", 3, DEFAULT_LEGAL_SUFFIX),
            Err(NameError::InsufficientBaseName(_))
        ));
    }

    #[test]
    fn skips_noun_equal_to_stem() {
        let set = suggest("Solutions", 1, DEFAULT_LEGAL_SUFFIX).unwrap();
        assert_eq!(set.suggestions, ["Solutions Systems Private Limited"]);
    }

    #[test]
    fn empty_legal_suffix_is_omitted() {
        let set = suggest("acme", 1, "").unwrap();
        assert_eq!(set.suggestions, ["Acme Solutions"]);
    }

    #[test]
    fn stops_when_rotation_is_exhausted() {
        let set = suggest("acme", MAX_SUGGESTIONS, DEFAULT_LEGAL_SUFFIX).unwrap();
        assert_eq!(set.len(), BUSINESS_NOUNS.len());
    }

    #[test]
    fn rejects_bad_counts() {
        assert!(matches!(
            suggest("acme", 0, DEFAULT_LEGAL_SUFFIX),
            Err(NameError::InvalidSuggestionCount { count: 0, .. })
        ));
        assert!(matches!(
            suggest("acme", 21, DEFAULT_LEGAL_SUFFIX),
            Err(NameError::InvalidSuggestionCount { count: 21, .. })
        ));
    }

    #[test]
    fn rejects_base_without_words() {
        assert!(matches!(
            suggest("  Pvt. Ltd. ", 3, DEFAULT_LEGAL_SUFFIX),
            Err(NameError::InsufficientBaseName(_))
        ));
        assert!(matches!(
            suggest("!!!", 3, DEFAULT_LEGAL_SUFFIX),
            Err(NameError::InsufficientBaseName(_))
        ));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_exceeds_count_or_repeats(
                base in "[A-Za-z]{1,12}( [A-Za-z]{1,12}){0,3}",
                count in 1..=MAX_SUGGESTIONS,
            ) {
                let result = suggest(&base, count, DEFAULT_LEGAL_SUFFIX);
                prop_assume!(result.is_ok());
                let set = result.unwrap();
                prop_assert!(set.len() <= count);
                let forms: HashSet<String> =
                    set.suggestions.iter().map(|s| comparison_form(s)).collect();
                prop_assert_eq!(forms.len(), set.len());
            }
        }
    }
}
