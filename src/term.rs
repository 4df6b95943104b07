//! Core document value types: words, tags, terms, sentences.
//!
//! A [`Sentence`] is an ordered run of [`Term`]s; a term is a non-empty run of
//! [`Word`]s plus the [`Tag`]s assigned to it. These are value types: a term
//! is replaced, never mutated, whenever its words or tags change. The rewrite
//! step relies on that property: an unchanged term can be moved into a new
//! sentence as-is, while any changed term is a fresh value.
//!
//! Equality is tuned for alignment work:
//!
//! - Two [`Word`]s are equal when their texts are equal; the trailing
//!   whitespace is carried for surface reconstruction only.
//! - Two [`Term`]s are equal when their surface text, words, tags, and
//!   unmodifiable flag are equal. The surface text participates because
//!   word equality ignores whitespace: terms that differ only in inner
//!   whitespace are distinct values. "Same text" (the grouping key, see
//!   [`Term::text`]) is a weaker relation that ignores tags.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Error, Result};

// =============================================================================
// Word
// =============================================================================

/// An atomic token: its text plus the whitespace that followed it in the
/// source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    text: String,
    whitespace: String,
}

impl Word {
    /// Create a word with an explicit whitespace suffix.
    #[must_use]
    pub fn new(text: impl Into<String>, whitespace: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            whitespace: whitespace.into(),
        }
    }

    /// Create a word followed by a single space.
    ///
    /// The common case for hand-built sentences and tests.
    #[must_use]
    pub fn spaced(text: impl Into<String>) -> Self {
        Self::new(text, " ")
    }

    /// The token text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The whitespace that followed this word in the source.
    #[must_use]
    pub fn whitespace(&self) -> &str {
        &self.whitespace
    }
}

// Equality by text only; whitespace is reconstruction data, not identity.
impl PartialEq for Word {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Word {}

impl Hash for Word {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

// =============================================================================
// Tag
// =============================================================================

/// A (type, value) annotation attached to a term.
///
/// The type names the tag set a value belongs to (for example a
/// part-of-speech set or a named-entity set); the value is the label inside
/// that set. Equality covers both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    ty: String,
    value: String,
}

impl Tag {
    /// Create a tag from its type and value.
    #[must_use]
    pub fn new(ty: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            value: value.into(),
        }
    }

    /// The tag type (which tag set this tag belongs to).
    #[must_use]
    pub fn ty(&self) -> &str {
        &self.ty
    }

    /// The tag value (the label inside its set).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ty, self.value)
    }
}

// =============================================================================
// Term
// =============================================================================

/// The smallest taggable unit: one or more words plus a set of tags.
///
/// `words` is never empty: [`Term::new`] rejects an empty list and
/// deserialization goes through the same check. The term's surface text is
/// derived once at construction and cached: word texts joined with each
/// word's whitespace suffix, except after the last word.
///
/// The `unmodifiable` flag marks terms that downstream preprocessing should
/// leave alone. It never gates the alignment rewrite itself (a span may split
/// or merge an unmodifiable term); it only propagates into the rewritten
/// result.
#[derive(Debug, Clone, Serialize)]
pub struct Term {
    words: Vec<Word>,
    tags: Vec<Tag>,
    unmodifiable: bool,
    #[serde(skip)]
    text: String,
}

impl Term {
    /// Create a term from words, tags, and the unmodifiable flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTerm`] if `words` is empty.
    pub fn new(words: Vec<Word>, tags: Vec<Tag>, unmodifiable: bool) -> Result<Self> {
        if words.is_empty() {
            return Err(Error::EmptyTerm);
        }
        Ok(Self::from_parts(words, tags, unmodifiable))
    }

    /// Create an untagged single-word term.
    #[must_use]
    pub fn from_word(word: Word) -> Self {
        Self::from_parts(vec![word], Vec::new(), false)
    }

    /// Internal constructor for word lists known to be non-empty.
    pub(crate) fn from_parts(words: Vec<Word>, tags: Vec<Tag>, unmodifiable: bool) -> Self {
        debug_assert!(!words.is_empty(), "term built without words");
        let text = derive_text(&words);
        Self {
            words,
            tags,
            unmodifiable,
            text,
        }
    }

    /// The term's surface text (cached at construction).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The words of this term, in order.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// The tags assigned to this term, in insertion order.
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Whether downstream preprocessing should leave this term alone.
    #[must_use]
    pub fn is_unmodifiable(&self) -> bool {
        self.unmodifiable
    }

    /// Number of words in this term.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Consume the term, yielding its words.
    #[must_use]
    pub fn into_words(self) -> Vec<Word> {
        self.words
    }

    /// Whether this term carries the given tag.
    #[must_use]
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// A copy of this term with `tag` added (no-op if already present)
    /// and the unmodifiable flag OR-ed with `unmodifiable`.
    #[must_use]
    pub fn with_tag(&self, tag: Tag, unmodifiable: bool) -> Self {
        let mut tags = self.tags.clone();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
        Self::from_parts(self.words.clone(), tags, self.unmodifiable || unmodifiable)
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        // Word comparison is text-only, so the cached text is what keeps
        // terms with different inner whitespace apart. Grouping maps key
        // on Term and rely on that distinction.
        self.text == other.text
            && self.words == other.words
            && self.tags == other.tags
            && self.unmodifiable == other.unmodifiable
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
        self.words.hash(state);
        self.tags.hash(state);
        self.unmodifiable.hash(state);
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TermData {
            words: Vec<Word>,
            tags: Vec<Tag>,
            unmodifiable: bool,
        }

        let data = TermData::deserialize(deserializer)?;
        Term::new(data.words, data.tags, data.unmodifiable).map_err(serde::de::Error::custom)
    }
}

fn derive_text(words: &[Word]) -> String {
    let mut text = String::new();
    for (i, word) in words.iter().enumerate() {
        text.push_str(word.text());
        if i + 1 < words.len() {
            text.push_str(word.whitespace());
        }
    }
    text
}

// =============================================================================
// Sentence
// =============================================================================

/// An ordered sequence of terms.
///
/// Rebuilding a sentence from a new term sequence is the unit of mutation the
/// alignment step exposes; the surrounding document tree decides what to do
/// with the rebuilt value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    terms: Vec<Term>,
}

impl Sentence {
    /// Create a sentence from a term sequence.
    #[must_use]
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    /// The terms of this sentence, in order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Consume the sentence, yielding its term sequence.
    #[must_use]
    pub fn into_terms(self) -> Vec<Term> {
        self.terms
    }

    /// Whether the sentence has no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// All words of the sentence, crossing term boundaries in order.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.terms.iter().flat_map(|t| t.words().iter())
    }

    /// Total number of words across all terms.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.terms.iter().map(Term::word_count).sum()
    }

    /// The sentence's surface text: every word followed by its whitespace
    /// suffix, except after the final word.
    #[must_use]
    pub fn text(&self) -> String {
        let words: Vec<&Word> = self.words().collect();
        let mut text = String::new();
        for (i, word) in words.iter().enumerate() {
            text.push_str(word.text());
            if i + 1 < words.len() {
                text.push_str(word.whitespace());
            }
        }
        text
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

// =============================================================================
// Tests
// =============================================================================
