//! The per-sentence tagging driver.
//!
//! [`SentenceTagger`] takes the entities an external source detected for a
//! sentence and folds them into the sentence's term sequence one at a time:
//! tokenize the entity text, locate its occurrences, rewrite the terms,
//! then hand the rewritten sequence to the next entity. Later entities see
//! the term boundaries earlier entities created. That sequencing is part
//! of the contract, not an implementation detail, because an entity may
//! line up exactly with a term a previous entity merged (and then simply
//! adds its tag to it).
//!
//! The driver is stateless between calls; collaborators (entity source,
//! tokenizer, matcher) are passed per call, so one configured driver can
//! serve any number of threads.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::matcher::WordMatcher;
use crate::rewrite::{find_spans_backtracking, rewrite_with, MergePolicy};
use crate::span::find_spans;
use crate::term::{Sentence, Tag};
use crate::tokenize::Tokenizer;

// =============================================================================
// Entity input
// =============================================================================

/// One detection from an external tagger: raw surface text plus the label
/// to apply.
///
/// The text is not yet tokenized; the driver splits it with the same
/// tokenizer the document went through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaggedEntity {
    text: String,
    label: String,
}

impl TaggedEntity {
    /// Create an entity from its surface text and tag label.
    #[must_use]
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }

    /// The detected surface text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The tag label to apply.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for TaggedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.text, self.label)
    }
}

/// A source of detected entities for one sentence.
///
/// This is the whole interface to statistical models, dictionary lookups,
/// or anything else that can point at text: an ordered list of (surface
/// text, label) pairs per sentence. Implemented for plain closures of the
/// same shape.
pub trait Tagger {
    /// Detected entities for `sentence`, in document order.
    fn entities(&self, sentence: &Sentence) -> Vec<TaggedEntity>;

    /// Short identifier for logs.
    fn name(&self) -> &'static str {
        "tagger"
    }
}

impl<F> Tagger for F
where
    F: Fn(&Sentence) -> Vec<TaggedEntity>,
{
    fn entities(&self, sentence: &Sentence) -> Vec<TaggedEntity> {
        self(sentence)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

// =============================================================================
// Seek strategy
// =============================================================================

/// How occurrences are located before rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SeekStrategy {
    /// Linear scan with an in-place cursor reset on mismatch
    /// ([`find_spans`]). Cheap, and sufficient for sources whose entity
    /// texts do not start with a repeated prefix of themselves.
    #[default]
    Restart,
    /// Abandon failed partial matches and re-seek from the word after
    /// their start ([`find_spans_backtracking`]). Finds occurrences that
    /// overlap a failed candidate's prefix.
    Backtrack,
}

// =============================================================================
// Driver
// =============================================================================

/// Applies detected entities to sentences, one entity at a time.
///
/// Configuration is fixed at construction: the tag type every label is
/// filed under, whether tagged terms are marked unmodifiable, how merged
/// terms treat pre-existing tags, and which seek strategy locates
/// occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceTagger {
    tag_type: String,
    set_unmodifiable: bool,
    merge: MergePolicy,
    seek: SeekStrategy,
}

impl SentenceTagger {
    /// Create a driver filing every applied tag under `tag_type`.
    ///
    /// Defaults: tagged terms stay modifiable, merged terms keep only the
    /// new tag, occurrences are located with [`SeekStrategy::Restart`].
    #[must_use]
    pub fn new(tag_type: impl Into<String>) -> Self {
        Self {
            tag_type: tag_type.into(),
            set_unmodifiable: false,
            merge: MergePolicy::default(),
            seek: SeekStrategy::default(),
        }
    }

    /// Mark every tagged term unmodifiable.
    #[must_use]
    pub fn mark_unmodifiable(mut self, yes: bool) -> Self {
        self.set_unmodifiable = yes;
        self
    }

    /// Choose how merged terms treat tags of the terms they replace.
    #[must_use]
    pub fn with_merge_policy(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    /// Choose how occurrences are located.
    #[must_use]
    pub fn with_seek(mut self, seek: SeekStrategy) -> Self {
        self.seek = seek;
        self
    }

    /// The tag type applied tags are filed under.
    #[must_use]
    pub fn tag_type(&self) -> &str {
        &self.tag_type
    }

    /// Fold `entities` into `sentence`, in order.
    ///
    /// An empty entity list or an empty sentence comes back unchanged. An
    /// entity whose text tokenizes to zero words is skipped; an entity with
    /// no occurrence in the sentence is a no-op.
    ///
    /// ```
    /// use termtag::{ExactMatcher, SentenceTagger, TaggedEntity, WhitespaceTokenizer};
    ///
    /// let tokenizer = WhitespaceTokenizer::new();
    /// let sentence = tokenizer.sentence("New York is big");
    /// let entities = [TaggedEntity::new("New York", "LOC")];
    ///
    /// let driver = SentenceTagger::new("NE");
    /// let tagged = driver.tag_sentence(sentence, &entities, &tokenizer, &ExactMatcher);
    ///
    /// let texts: Vec<&str> = tagged.terms().iter().map(|t| t.text()).collect();
    /// assert_eq!(texts, ["New York", "is", "big"]);
    /// assert_eq!(tagged.terms()[0].tags()[0].value(), "LOC");
    /// ```
    #[must_use]
    pub fn tag_sentence(
        &self,
        sentence: Sentence,
        entities: &[TaggedEntity],
        tokenizer: &dyn Tokenizer,
        matcher: &dyn WordMatcher,
    ) -> Sentence {
        if entities.is_empty() || sentence.is_empty() {
            return sentence;
        }

        let mut terms = sentence.into_terms();
        for entity in entities {
            let words = tokenizer.tokenize(entity.text());
            if words.is_empty() {
                log::debug!(
                    "entity '{}' tokenized to zero words by {}, skipping",
                    entity.text(),
                    tokenizer.name()
                );
                continue;
            }
            let spans = match self.seek {
                SeekStrategy::Restart => find_spans(&terms, &words, matcher),
                SeekStrategy::Backtrack => find_spans_backtracking(&terms, &words, matcher),
            };
            log::trace!(
                "entity '{entity}': {} occurrence(s) under the {} matcher",
                spans.len(),
                matcher.name()
            );
            let tag = Tag::new(self.tag_type.as_str(), entity.label());
            terms = rewrite_with(terms, &spans, tag, self.set_unmodifiable, self.merge);
        }
        Sentence::new(terms)
    }

    /// Tag a sequence of sentences, pulling each sentence's entities from
    /// `tagger`.
    #[must_use]
    pub fn tag_sentences(
        &self,
        sentences: Vec<Sentence>,
        tagger: &dyn Tagger,
        tokenizer: &dyn Tokenizer,
        matcher: &dyn WordMatcher,
    ) -> Vec<Sentence> {
        log::debug!("tagging {} sentence(s) with {}", sentences.len(), tagger.name());
        sentences
            .into_iter()
            .map(|sentence| {
                let entities = tagger.entities(&sentence);
                self.tag_sentence(sentence, &entities, tokenizer, matcher)
            })
            .collect()
    }

    /// [`tag_sentences`](Self::tag_sentences) across a thread pool.
    ///
    /// Sentences are independent units of work; output order matches input
    /// order.
    #[must_use]
    pub fn tag_sentences_par(
        &self,
        sentences: Vec<Sentence>,
        tagger: &(dyn Tagger + Sync),
        tokenizer: &(dyn Tokenizer + Sync),
        matcher: &(dyn WordMatcher + Sync),
    ) -> Vec<Sentence> {
        log::debug!(
            "tagging {} sentence(s) with {} across the thread pool",
            sentences.len(),
            tagger.name()
        );
        sentences
            .into_par_iter()
            .map(|sentence| {
                let entities = tagger.entities(&sentence);
                self.tag_sentence(sentence, &entities, tokenizer, matcher)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::ExactMatcher;
    use crate::term::Term;
    use crate::tokenize::WhitespaceTokenizer;

    fn driver() -> SentenceTagger {
        SentenceTagger::new("NE")
    }

    fn sentence(text: &str) -> Sentence {
        WhitespaceTokenizer::new().sentence(text)
    }

    fn texts(s: &Sentence) -> Vec<&str> {
        s.terms().iter().map(Term::text).collect()
    }

    #[test]
    fn test_single_entity_merges_terms() {
        let out = driver().tag_sentence(
            sentence("New York is big"),
            &[TaggedEntity::new("New York", "LOC")],
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(texts(&out), ["New York", "is", "big"]);
        assert!(out.terms()[0].has_tag(&Tag::new("NE", "LOC")));
        assert!(out.terms()[1].tags().is_empty());
    }

    #[test]
    fn test_later_entities_see_earlier_rewrites() {
        // "New York" is merged first; "New York City" must then match
        // across the merged term's boundary.
        let out = driver().tag_sentence(
            sentence("New York City hall"),
            &[
                TaggedEntity::new("New York", "LOC"),
                TaggedEntity::new("New York City", "CITY"),
            ],
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(texts(&out), ["New York City", "hall"]);
        // The second merge replaces the first entity's tag.
        assert_eq!(out.terms()[0].tags(), &[Tag::new("NE", "CITY")]);
    }

    #[test]
    fn test_exact_realignment_adds_tag() {
        // The second entity covers exactly the term the first created, so
        // its tag is added instead of replacing.
        let out = driver().tag_sentence(
            sentence("New York is big"),
            &[
                TaggedEntity::new("New York", "LOC"),
                TaggedEntity::new("New York", "CITY"),
            ],
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(texts(&out), ["New York", "is", "big"]);
        assert_eq!(
            out.terms()[0].tags(),
            &[Tag::new("NE", "LOC"), Tag::new("NE", "CITY")]
        );
    }

    #[test]
    fn test_empty_inputs_are_identity() {
        let s = sentence("a b");
        let out = driver().tag_sentence(
            s.clone(),
            &[],
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(out, s);

        let empty = Sentence::new(Vec::new());
        let out = driver().tag_sentence(
            empty.clone(),
            &[TaggedEntity::new("a", "X")],
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(out, empty);
    }

    #[test]
    fn test_blank_entity_skipped() {
        let s = sentence("a b");
        let out = driver().tag_sentence(
            s.clone(),
            &[TaggedEntity::new("   ", "X")],
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(out, s);
    }

    #[test]
    fn test_absent_entity_is_noop() {
        let s = sentence("a b c");
        let out = driver().tag_sentence(
            s.clone(),
            &[TaggedEntity::new("x y", "X")],
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(out, s);
    }

    #[test]
    fn test_unmodifiable_flag_applied() {
        let out = driver().mark_unmodifiable(true).tag_sentence(
            sentence("a b c"),
            &[TaggedEntity::new("a b", "X")],
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert!(out.terms()[0].is_unmodifiable());
        assert!(!out.terms()[1].is_unmodifiable());
    }

    #[test]
    fn test_seek_strategy_changes_outcome() {
        let entities = [TaggedEntity::new("a a b", "X")];

        let restart = driver().tag_sentence(
            sentence("a a a b"),
            &entities,
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(restart, sentence("a a a b"));

        let backtrack = driver().with_seek(SeekStrategy::Backtrack).tag_sentence(
            sentence("a a a b"),
            &entities,
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(texts(&backtrack), ["a", "a a b"]);
        assert!(backtrack.terms()[1].has_tag(&Tag::new("NE", "X")));
    }

    #[test]
    fn test_union_policy_through_driver() {
        let out = driver()
            .with_merge_policy(MergePolicy::Union)
            .tag_sentence(
                sentence("New York City hall"),
                &[
                    TaggedEntity::new("New York", "LOC"),
                    TaggedEntity::new("New York City", "CITY"),
                ],
                &WhitespaceTokenizer::new(),
                &ExactMatcher,
            );
        assert_eq!(texts(&out), ["New York City", "hall"]);
        assert_eq!(
            out.terms()[0].tags(),
            &[Tag::new("NE", "LOC"), Tag::new("NE", "CITY")]
        );
    }

    #[test]
    fn test_closure_tagger_batch() {
        let dictionary = |s: &Sentence| {
            if s.text().contains("York") {
                vec![TaggedEntity::new("New York", "LOC")]
            } else {
                Vec::new()
            }
        };
        let sentences = vec![sentence("New York is big"), sentence("nothing here")];
        assert_eq!(Tagger::name(&dictionary), "closure");
        let out = driver().tag_sentences(
            sentences,
            &dictionary,
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(texts(&out[0]), ["New York", "is", "big"]);
        assert_eq!(texts(&out[1]), ["nothing", "here"]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dictionary = |s: &Sentence| {
            s.terms()
                .iter()
                .filter(|t| t.text() == "a")
                .map(|_| TaggedEntity::new("a b", "X"))
                .collect::<Vec<_>>()
        };
        let corpus: Vec<Sentence> = (0..16)
            .map(|i| sentence(if i % 2 == 0 { "a b c" } else { "c b a" }))
            .collect();

        let seq = driver().tag_sentences(
            corpus.clone(),
            &dictionary,
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        let par = driver().tag_sentences_par(
            corpus,
            &dictionary,
            &WhitespaceTokenizer::new(),
            &ExactMatcher,
        );
        assert_eq!(seq, par);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let driver = SentenceTagger::new("NE")
            .mark_unmodifiable(true)
            .with_merge_policy(MergePolicy::Union)
            .with_seek(SeekStrategy::Backtrack);
        let json = serde_json::to_string(&driver).unwrap();
        let back: SentenceTagger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, driver);
    }
}
