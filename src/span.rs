//! Locating entity word sequences inside a tokenized term sequence.
//!
//! Positions are expressed in tree coordinates, not character offsets: a
//! [`WordSpan`] names an inclusive range from (start term, start word) to
//! (stop term, stop word). For the terms below, the entity
//! `["New", "York", "City"]` occupies `0.1..1.0`:
//!
//! ```text
//! term 0            term 1         term 2
//! +-----------+    +---------+    +------+
//! | in   New  |    | York    |    | is   |
//! | 0.0  0.1  |    | City    |    | 2.0  |
//! |           |    | 1.0 1.1 |    |      |
//! +-----------+    +---------+    +------+
//! ```
//!
//! [`find_spans`] walks every word once, left to right, carrying a cursor
//! into the entity word list:
//!
//! - a match advances the cursor; when the cursor reaches the end of the
//!   entity the span is emitted and the cursor resets, so matches never
//!   overlap and the leftmost occurrence wins;
//! - a mismatch mid-entity resets the cursor and re-tests the *same* word
//!   against the first entity word, so an occurrence starting at the failing
//!   word is not skipped.
//!
//! The re-test is a single O(1) cursor reset, not a backtrack: in `a a a b`
//! the entity `[a, a, b]` is missed because the scan consumes the first two
//! `a`s, fails on the third, and restarts there with only one `a` left
//! before `b`. Recovering such overlapping-prefix occurrences is the job of
//! the backtracking seek in the rewrite module.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::matcher::WordMatcher;
use crate::term::Term;

// =============================================================================
// WordSpan
// =============================================================================

/// An inclusive range of words inside one sentence, in tree coordinates.
///
/// `start_word` indexes into the words of `start_term`, and `stop_word` into
/// the words of `stop_term`. Both ends are inclusive; a single word is the
/// span with equal start and stop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WordSpan {
    start_term: usize,
    start_word: usize,
    stop_term: usize,
    stop_word: usize,
}

impl WordSpan {
    /// Create a span from its four coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpan`] if the stop coordinate precedes the
    /// start coordinate.
    pub fn new(
        start_term: usize,
        start_word: usize,
        stop_term: usize,
        stop_word: usize,
    ) -> Result<Self> {
        if (stop_term, stop_word) < (start_term, start_word) {
            return Err(Error::invalid_span(format!(
                "stop {stop_term}.{stop_word} precedes start {start_term}.{start_word}"
            )));
        }
        Ok(Self {
            start_term,
            start_word,
            stop_term,
            stop_word,
        })
    }

    /// Internal constructor for coordinates known to be ordered.
    pub(crate) fn from_parts(
        start_term: usize,
        start_word: usize,
        stop_term: usize,
        stop_word: usize,
    ) -> Self {
        debug_assert!((start_term, start_word) <= (stop_term, stop_word));
        Self {
            start_term,
            start_word,
            stop_term,
            stop_word,
        }
    }

    /// Index of the term containing the first word.
    #[must_use]
    pub fn start_term(&self) -> usize {
        self.start_term
    }

    /// Word index inside the start term.
    #[must_use]
    pub fn start_word(&self) -> usize {
        self.start_word
    }

    /// Index of the term containing the last word.
    #[must_use]
    pub fn stop_term(&self) -> usize {
        self.stop_term
    }

    /// Word index inside the stop term.
    #[must_use]
    pub fn stop_word(&self) -> usize {
        self.stop_word
    }

    /// Whether the span starts and ends in the same term.
    #[must_use]
    pub fn is_single_term(&self) -> bool {
        self.start_term == self.stop_term
    }

    /// Whether the span covers every word of a single term with `word_count`
    /// words.
    #[must_use]
    pub fn covers_whole_term(&self, word_count: usize) -> bool {
        self.is_single_term() && self.start_word == 0 && self.stop_word + 1 == word_count
    }

    /// Whether this span ends strictly before `other` begins.
    #[must_use]
    pub fn precedes(&self, other: &WordSpan) -> bool {
        (self.stop_term, self.stop_word) < (other.start_term, other.start_word)
    }
}

impl fmt::Display for WordSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}..{}.{}",
            self.start_term, self.start_word, self.stop_term, self.stop_word
        )
    }
}

// =============================================================================
// Span finding
// =============================================================================

/// Find every non-overlapping occurrence of `entity_words` in `terms`.
///
/// The words of `terms` are treated as one flat stream; term boundaries are
/// transparent to matching and only show up in the reported coordinates.
/// Word comparison is delegated to `matcher`. Returned spans are in document
/// order and pairwise disjoint; the leftmost occurrence wins when candidates
/// overlap. An empty entity matches nothing.
#[must_use]
pub fn find_spans<S: AsRef<str>>(
    terms: &[Term],
    entity_words: &[S],
    matcher: &dyn WordMatcher,
) -> Vec<WordSpan> {
    if entity_words.is_empty() {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut found = 0;
    let mut start = (0, 0);

    for (term_idx, term) in terms.iter().enumerate() {
        for (word_idx, word) in term.words().iter().enumerate() {
            // Runs at most twice per word: once at the current entity
            // position and, after a mid-entity mismatch, once at position 0.
            loop {
                if matcher.matches(entity_words[found].as_ref(), word.text()) {
                    if found == 0 {
                        start = (term_idx, word_idx);
                    }
                    found += 1;
                    if found == entity_words.len() {
                        spans.push(WordSpan::from_parts(start.0, start.1, term_idx, word_idx));
                        found = 0;
                    }
                    break;
                } else if found > 0 {
                    found = 0;
                } else {
                    break;
                }
            }
        }
    }

    spans
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::matcher::ExactMatcher;
    use crate::term::Word;
    use proptest::prelude::*;

    fn letters() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[ab]", 1..16)
    }

    fn terms_of(words: &[String]) -> Vec<Term> {
        words
            .iter()
            .map(|w| Term::from_word(Word::spaced(w.as_str())))
            .collect()
    }

    proptest! {
        #[test]
        fn spans_are_sorted_and_disjoint(
            doc in letters(),
            entity in prop::collection::vec("[ab]", 1..4),
        ) {
            let ts = terms_of(&doc);
            let spans = find_spans(&ts, &entity, &ExactMatcher);
            for pair in spans.windows(2) {
                prop_assert!(pair[0].precedes(&pair[1]));
            }
        }

        #[test]
        fn single_word_entity_finds_every_occurrence(doc in letters()) {
            let ts = terms_of(&doc);
            let spans = find_spans(&ts, &["a"], &ExactMatcher);
            let expected = doc.iter().filter(|w| w.as_str() == "a").count();
            prop_assert_eq!(spans.len(), expected);
        }

        #[test]
        fn every_span_matches_entity_text(
            doc in letters(),
            entity in prop::collection::vec("[ab]", 1..4),
        ) {
            let ts = terms_of(&doc);
            for span in find_spans(&ts, &entity, &ExactMatcher) {
                // One word per term in this harness, so word coordinates are
                // always zero and term indices address the flat word list.
                prop_assert_eq!(span.start_word(), 0);
                prop_assert_eq!(span.stop_word(), 0);
                let covered = &doc[span.start_term()..=span.stop_term()];
                prop_assert_eq!(covered, entity.as_slice());
            }
        }
    }
}
