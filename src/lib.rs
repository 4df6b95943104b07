//! # termtag
//!
//! Entity-to-term alignment and tag reconciliation for tokenized documents.
//!
//! External taggers detect entities as raw strings; documents live as trees
//! of sentences, terms, and words. This crate does the part in between:
//!
//! - **Alignment**: locate an entity's word sequence inside a term
//!   sequence ([`find_spans`], [`find_spans_backtracking`]) and rewrite the
//!   terms so entity boundaries coincide with term boundaries
//!   ([`rewrite`]), without losing a word, a whitespace, or an unrelated
//!   tag.
//! - **Reconciliation**: when repeated occurrences of the same text end up
//!   with different tag sets, decide one final set per text under a
//!   [`GroupingPolicy`] ([`group`]).
//!
//! ## Quick Start
//!
//! ```
//! use termtag::{ExactMatcher, SentenceTagger, TaggedEntity, WhitespaceTokenizer};
//!
//! let tokenizer = WhitespaceTokenizer::new();
//! let sentence = tokenizer.sentence("Apple hired staff in New York City");
//!
//! let entities = [
//!     TaggedEntity::new("Apple", "ORG"),
//!     TaggedEntity::new("New York City", "LOC"),
//! ];
//! let driver = SentenceTagger::new("NE");
//! let tagged = driver.tag_sentence(sentence, &entities, &tokenizer, &ExactMatcher);
//!
//! let texts: Vec<&str> = tagged.terms().iter().map(|t| t.text()).collect();
//! assert_eq!(texts, ["Apple", "hired", "staff", "in", "New York City"]);
//! ```
//!
//! ## Tag Reconciliation
//!
//! ```
//! use termtag::{group, GroupingPolicy, Tag, Term, Word};
//!
//! let org = Term::new(vec![Word::spaced("bank")], vec![Tag::new("NE", "ORG")], false)?;
//! let loc = Term::new(vec![Word::spaced("bank")], vec![Tag::new("NE", "LOC")], false)?;
//!
//! // The NE type was assigned twice for "bank", so it conflicts and dies.
//! let mapping = group([org.clone(), loc], GroupingPolicy::DeleteConflicting);
//! assert!(mapping[&org].tags().is_empty());
//! # Ok::<(), termtag::Error>(())
//! ```
//!
//! ## Pieces
//!
//! | Piece | Role |
//! |-------|------|
//! | [`Word`], [`Term`], [`Sentence`] | the immutable document tree |
//! | [`WordMatcher`] | pluggable word equality (exact, case-folded, substring, closures) |
//! | [`find_spans`] | linear occurrence scan with in-place restart |
//! | [`find_spans_backtracking`] | occurrence scan that re-seeks after failed partial matches |
//! | [`rewrite`] | applies spans: add tag, merge terms, split terms |
//! | [`SentenceTagger`] | folds detected entities into a sentence, one at a time |
//! | [`group`] | per-text tag conflict resolution across a chunk |
//!
//! ## Design
//!
//! - **Value types**: terms are replaced, never mutated; an untouched term
//!   moves through a rewrite verbatim.
//! - **Strategy seams**: tokenizer, word matcher, and entity source are
//!   single-method traits, implemented for plain closures.
//! - **Pure core**: no I/O, no shared state; sentences and chunks are the
//!   parallelism grain (rayon batch helpers included).

#![warn(missing_docs)]

mod error;
pub mod grouping;
pub mod matcher;
pub mod rewrite;
pub mod span;
pub mod tagger;
pub mod term;
pub mod tokenize;

pub use error::{Error, Result};
pub use grouping::{apply_grouping, group, group_chunks, GroupingPolicy};
pub use matcher::{CaseInsensitiveMatcher, ExactMatcher, SubstringMatcher, WordMatcher};
pub use rewrite::{find_spans_backtracking, rewrite, rewrite_with, MergePolicy};
pub use span::{find_spans, WordSpan};
pub use tagger::{SeekStrategy, SentenceTagger, TaggedEntity, Tagger};
pub use term::{Sentence, Tag, Term, Word};
pub use tokenize::{Tokenizer, WhitespaceTokenizer};
