//! Rewriting a term sequence so entity boundaries coincide with term
//! boundaries.
//!
//! [`rewrite`] consumes a term sequence plus the spans a finder located and
//! produces the aligned sequence. Per span, three shapes:
//!
//! ```text
//! input:   [New] [York] [is] [big]      span 0.0..1.0, tag LOC
//! output:  [New York](LOC) [is] [big]   merge across terms
//!
//! input:   [Big Apple](NE)              span 0.0..0.1, tag LOC
//! output:  [Big Apple](NE, LOC)         span covers one whole term: the
//!                                       tag is added, words and prior
//!                                       tags are kept
//!
//! input:   [downtown New York]          span 0.1..0.2, tag LOC
//! output:  [downtown] [New York](LOC)   split: uncovered words of a cut
//!                                       term become plain single-word
//!                                       terms
//! ```
//!
//! Everything outside a span survives untouched: whole uncovered terms move
//! into the output verbatim, tags and all. Only terms actually cut by a
//! span boundary are re-split, and only on their uncovered side. By default
//! a merged term carries just the new tag; [`MergePolicy::Union`] keeps the
//! contributing terms' tags as well.
//!
//! [`find_spans_backtracking`] is the stronger seek for sources whose
//! occurrences can share prefixes. Where [`find_spans`](crate::find_spans)
//! resets its cursor in place on a mismatch, the backtracking seek abandons
//! the failed candidate entirely and resumes scanning at the word *after*
//! the candidate's start, stepping the term cursor backward when the
//! candidate had crossed term boundaries. That recovers occurrences the
//! in-place reset walks past: in `a a a b` it finds `[a, a, b]` at the
//! second word. An abandoned candidate commits nothing, so the words it
//! touched stay available for matching and for verbatim reconstruction;
//! with zero completed matches the rewrite returns its input unchanged.

use serde::{Deserialize, Serialize};

use crate::matcher::WordMatcher;
use crate::span::WordSpan;
use crate::term::{Tag, Term, Word};

// =============================================================================
// Merge policy
// =============================================================================

/// How tags on pre-existing terms combine into a merged span term.
///
/// Applies whenever a span is merged into a freshly built term (multi-term
/// spans and intra-term splits). A span that lines up with one whole
/// existing term always keeps that term's tags and adds the new one, under
/// either policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MergePolicy {
    /// The merged term carries only the newly applied tag; tags on the
    /// narrower terms being merged are discarded.
    #[default]
    Replace,
    /// The merged term carries every tag of every term that contributed at
    /// least one word, deduplicated in first-seen order, plus the newly
    /// applied tag.
    Union,
}

// =============================================================================
// Rewrite
// =============================================================================

/// Rewrite `terms` so each span becomes a single tagged term.
///
/// Spans must be sorted, pairwise disjoint, and in bounds, the contract a
/// finder's output satisfies. A span violating it is an internal invariant
/// violation: it trips an assertion in debug builds and is logged and
/// skipped in release builds.
///
/// Merged terms keep only the new tag; see [`rewrite_with`] for the
/// tag-preserving variant.
#[must_use]
pub fn rewrite(terms: Vec<Term>, spans: &[WordSpan], tag: Tag, set_unmodifiable: bool) -> Vec<Term> {
    rewrite_with(terms, spans, tag, set_unmodifiable, MergePolicy::Replace)
}

/// [`rewrite`] with an explicit [`MergePolicy`].
#[must_use]
pub fn rewrite_with(
    terms: Vec<Term>,
    spans: &[WordSpan],
    tag: Tag,
    set_unmodifiable: bool,
    merge: MergePolicy,
) -> Vec<Term> {
    let spans = validated_spans(&terms, spans);
    if spans.is_empty() {
        return terms;
    }

    let mut out = Vec::with_capacity(terms.len());
    let mut si = 0;
    let mut acc: Option<MergeAcc> = None;

    for (term_idx, term) in terms.into_iter().enumerate() {
        if acc.is_none() {
            if si >= spans.len() || spans[si].start_term() > term_idx {
                // Untouched by any remaining span.
                out.push(term);
                continue;
            }
            debug_assert!(spans[si].start_term() == term_idx);
            if spans[si].covers_whole_term(term.word_count()) {
                // Entity lines up with an existing term: add the tag, keep
                // everything else.
                out.push(term.with_tag(tag.clone(), set_unmodifiable));
                si += 1;
                continue;
            }
        }

        // This term is cut by a span boundary, or continues a merge begun
        // in an earlier term.
        let term_tags = term.tags().to_vec();
        let words = term.into_words();
        if let Some(a) = acc.as_mut() {
            a.enter_term(&term_tags, merge);
        }
        for (word_idx, word) in words.into_iter().enumerate() {
            let here = (term_idx, word_idx);
            if let Some(a) = acc.as_mut() {
                a.push(word);
                if here == a.stop {
                    if let Some(done) = acc.take() {
                        out.push(done.finish(&tag, set_unmodifiable));
                        si += 1;
                    }
                }
                continue;
            }
            let starts_here =
                si < spans.len() && (spans[si].start_term(), spans[si].start_word()) == here;
            if starts_here {
                let mut a = MergeAcc::new(spans[si]);
                a.enter_term(&term_tags, merge);
                a.push(word);
                if here == a.stop {
                    out.push(a.finish(&tag, set_unmodifiable));
                    si += 1;
                } else {
                    acc = Some(a);
                }
            } else {
                // Split-off remainder of a divided term.
                out.push(Term::from_word(word));
            }
        }
    }

    debug_assert!(acc.is_none(), "span left unfinished after rewrite");
    out
}

/// Accumulates the words (and, under [`MergePolicy::Union`], the tags) of
/// one in-progress span.
struct MergeAcc {
    words: Vec<Word>,
    tags: Vec<Tag>,
    stop: (usize, usize),
}

impl MergeAcc {
    fn new(span: WordSpan) -> Self {
        Self {
            words: Vec::new(),
            tags: Vec::new(),
            stop: (span.stop_term(), span.stop_word()),
        }
    }

    /// Called once per term contributing words to this span.
    fn enter_term(&mut self, tags: &[Tag], merge: MergePolicy) {
        if merge == MergePolicy::Union {
            for tag in tags {
                if !self.tags.contains(tag) {
                    self.tags.push(tag.clone());
                }
            }
        }
    }

    fn push(&mut self, word: Word) {
        self.words.push(word);
    }

    fn finish(mut self, tag: &Tag, set_unmodifiable: bool) -> Term {
        if !self.tags.contains(tag) {
            self.tags.push(tag.clone());
        }
        Term::from_parts(self.words, self.tags, set_unmodifiable)
    }
}

// =============================================================================
// Backtracking seek
// =============================================================================

/// Scan state for the backtracking seek. Mismatch handling is the whole
/// difference from the in-place reset: a failed candidate rewinds the
/// position to one past its start instead of continuing at the failure
/// point.
enum Seek {
    Scanning,
    Matching { start: usize, progress: usize },
}

/// Find non-overlapping occurrences of `entity_words`, abandoning failed
/// partial matches and re-seeking from the word after their start.
///
/// Candidate starts strictly increase across abandonments and completions,
/// which bounds the scan and rules out rescanning a candidate. Output spans
/// are sorted, pairwise disjoint, and leftmost-first, exactly like
/// [`find_spans`](crate::find_spans); the two differ only in which
/// occurrences they can reach. An empty entity matches nothing.
#[must_use]
pub fn find_spans_backtracking<S: AsRef<str>>(
    terms: &[Term],
    entity_words: &[S],
    matcher: &dyn WordMatcher,
) -> Vec<WordSpan> {
    if entity_words.is_empty() {
        return Vec::new();
    }

    // Flat word positions; coords[p] locates word p in the term tree.
    let coords: Vec<(usize, usize)> = terms
        .iter()
        .enumerate()
        .flat_map(|(t, term)| (0..term.word_count()).map(move |w| (t, w)))
        .collect();
    let word_at = |pos: usize| {
        let (t, w) = coords[pos];
        terms[t].words()[w].text()
    };

    let mut spans = Vec::new();
    let mut state = Seek::Scanning;
    let mut pos = 0;

    while pos < coords.len() {
        state = match state {
            Seek::Scanning => {
                if matcher.matches(entity_words[0].as_ref(), word_at(pos)) {
                    let start = pos;
                    pos += 1;
                    if entity_words.len() == 1 {
                        let (t, w) = coords[start];
                        spans.push(WordSpan::from_parts(t, w, t, w));
                        Seek::Scanning
                    } else {
                        Seek::Matching { start, progress: 1 }
                    }
                } else {
                    pos += 1;
                    Seek::Scanning
                }
            }
            Seek::Matching { start, progress } => {
                if matcher.matches(entity_words[progress].as_ref(), word_at(pos)) {
                    let progress = progress + 1;
                    pos += 1;
                    if progress == entity_words.len() {
                        let (start_t, start_w) = coords[start];
                        let (stop_t, stop_w) = coords[pos - 1];
                        spans.push(WordSpan::from_parts(start_t, start_w, stop_t, stop_w));
                        Seek::Scanning
                    } else {
                        Seek::Matching { start, progress }
                    }
                } else {
                    // Abandon the candidate; re-seek from the word after its
                    // start. This may step back across term boundaries.
                    log::trace!("abandoned candidate at word {start} after {progress} match(es)");
                    pos = start + 1;
                    Seek::Scanning
                }
            }
        };
    }

    spans
}

// =============================================================================
// Span validation
// =============================================================================

fn validated_spans(terms: &[Term], spans: &[WordSpan]) -> Vec<WordSpan> {
    let mut ok: Vec<WordSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(issue) = span_issue(terms, ok.last(), span) {
            debug_assert!(false, "rejected span {span}: {issue}");
            log::warn!("ignoring span {span}: {issue}");
            continue;
        }
        ok.push(*span);
    }
    ok
}

fn span_issue(terms: &[Term], prev: Option<&WordSpan>, span: &WordSpan) -> Option<String> {
    if span.start_term() >= terms.len() || span.stop_term() >= terms.len() {
        return Some(format!("term index out of bounds for {} terms", terms.len()));
    }
    if span.start_word() >= terms[span.start_term()].word_count()
        || span.stop_word() >= terms[span.stop_term()].word_count()
    {
        return Some("word index out of bounds".to_string());
    }
    if (span.stop_term(), span.stop_word()) < (span.start_term(), span.start_word()) {
        return Some("stop precedes start".to_string());
    }
    if let Some(prev) = prev {
        if !prev.precedes(span) {
            return Some(format!("not strictly after prior span {prev}"));
        }
    }
    None
}

// =============================================================================
// Tests
// =============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::matcher::ExactMatcher;
    use crate::span::find_spans;
    use proptest::prelude::*;

    fn doc_terms() -> impl Strategy<Value = Vec<Term>> {
        prop::collection::vec(
            (prop::collection::vec("[ab]", 1..4), any::<bool>()),
            1..8,
        )
        .prop_map(|groups| {
            groups
                .into_iter()
                .map(|(words, flag)| {
                    let tags = if flag {
                        vec![Tag::new("POS", "NNP")]
                    } else {
                        Vec::new()
                    };
                    Term::new(
                        words.into_iter().map(Word::spaced).collect(),
                        tags,
                        flag,
                    )
                    .unwrap()
                })
                .collect()
        })
    }

    fn entity() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[ab]", 1..4)
    }

    fn word_texts(terms: &[Term]) -> Vec<String> {
        terms
            .iter()
            .flat_map(|t| t.words().iter().map(|w| w.text().to_string()))
            .collect()
    }

    proptest! {
        #[test]
        fn word_sequence_survives_rewrite(
            doc in doc_terms(),
            entity in entity(),
            backtrack in any::<bool>(),
            union in any::<bool>(),
        ) {
            let spans = if backtrack {
                find_spans_backtracking(&doc, &entity, &ExactMatcher)
            } else {
                find_spans(&doc, &entity, &ExactMatcher)
            };
            let merge = if union { MergePolicy::Union } else { MergePolicy::Replace };
            let before = word_texts(&doc);
            let out = rewrite_with(doc, &spans, Tag::new("NE", "X"), false, merge);

            // Stronger than multiset preservation: document order holds too.
            prop_assert_eq!(word_texts(&out), before);
            prop_assert!(out.iter().all(|t| t.word_count() >= 1));
        }

        #[test]
        fn zero_matches_is_identity(doc in doc_terms()) {
            let spans = find_spans_backtracking(&doc, &["z"], &ExactMatcher);
            prop_assert!(spans.is_empty());
            let out = rewrite_with(
                doc.clone(),
                &spans,
                Tag::new("NE", "X"),
                true,
                MergePolicy::Replace,
            );
            prop_assert_eq!(out, doc);
        }

        #[test]
        fn each_span_yields_exactly_one_tagged_term(
            doc in doc_terms(),
            entity in entity(),
        ) {
            let spans = find_spans_backtracking(&doc, &entity, &ExactMatcher);
            let expected = spans.len();
            let tag = Tag::new("NE", "X");
            let out = rewrite(doc, &spans, tag.clone(), false);
            let tagged = out.iter().filter(|t| t.has_tag(&tag)).count();
            prop_assert_eq!(tagged, expected);
        }

        #[test]
        fn backtracking_spans_sorted_and_disjoint(
            doc in doc_terms(),
            entity in entity(),
        ) {
            let spans = find_spans_backtracking(&doc, &entity, &ExactMatcher);
            for pair in spans.windows(2) {
                prop_assert!(pair[0].precedes(&pair[1]));
            }
        }
    }
}
