//! Word-level match predicates.
//!
//! Span finding never compares words directly; it asks a [`WordMatcher`]
//! whether an entity word and a document word should be treated as the same
//! token. Swapping the matcher changes recall without touching the alignment
//! machinery.

/// Decides whether an entity word matches a document word.
///
/// Implemented for plain closures of the same shape, so ad-hoc predicates
/// can be passed wherever a `&dyn WordMatcher` is expected.
pub trait WordMatcher {
    /// `true` if `entity_word` should be considered a match for
    /// `document_word`.
    fn matches(&self, entity_word: &str, document_word: &str) -> bool;

    /// Short identifier for logs.
    fn name(&self) -> &'static str {
        "matcher"
    }
}

impl<F> WordMatcher for F
where
    F: Fn(&str, &str) -> bool,
{
    fn matches(&self, entity_word: &str, document_word: &str) -> bool {
        self(entity_word, document_word)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Case-sensitive exact equality. The default matcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactMatcher;

impl WordMatcher for ExactMatcher {
    fn matches(&self, entity_word: &str, document_word: &str) -> bool {
        entity_word == document_word
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

/// Exact equality after case folding.
#[derive(Debug, Default, Clone, Copy)]
pub struct CaseInsensitiveMatcher;

impl WordMatcher for CaseInsensitiveMatcher {
    fn matches(&self, entity_word: &str, document_word: &str) -> bool {
        fold_eq(entity_word, document_word)
    }

    fn name(&self) -> &'static str {
        "case-insensitive"
    }
}

/// Matches when the document word contains the entity word.
///
/// Useful for sources that emit stems or clipped surface forms. Substring
/// containment is directional: the entity word is the needle.
#[derive(Debug, Clone, Copy)]
pub struct SubstringMatcher {
    case_sensitive: bool,
}

impl SubstringMatcher {
    /// Create a substring matcher.
    #[must_use]
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }
}

impl Default for SubstringMatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

impl WordMatcher for SubstringMatcher {
    fn matches(&self, entity_word: &str, document_word: &str) -> bool {
        if self.case_sensitive {
            document_word.contains(entity_word)
        } else {
            document_word
                .to_lowercase()
                .contains(&entity_word.to_lowercase())
        }
    }

    fn name(&self) -> &'static str {
        "substring"
    }
}

// ASCII fast path; full case folding only when needed.
fn fold_eq(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}
