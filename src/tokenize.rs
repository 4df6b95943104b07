//! Word splitting for entity text and for hand-built documents.
//!
//! The alignment pipeline consumes documents that are already tokenized;
//! what it needs from a [`Tokenizer`] is only to split *entity* text into
//! words, with the same boundaries the document's own tokenization used
//! (otherwise word-for-word alignment is meaningless). The trait is
//! therefore just `text -> word strings`, and plain closures of that shape
//! are accepted anywhere a tokenizer is.
//!
//! [`WhitespaceTokenizer`] additionally builds whole sentences
//! (single-word terms, whitespace preserved) so callers and tests can
//! construct documents without a full tokenization stack.

use crate::term::{Sentence, Term, Word};

/// Splits text into an ordered sequence of word strings.
pub trait Tokenizer {
    /// Tokenize `text` into words. Deterministic; an empty or blank input
    /// yields an empty list.
    fn tokenize(&self, text: &str) -> Vec<String>;

    /// Short identifier for logs.
    fn name(&self) -> &'static str {
        "tokenizer"
    }
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Tokenizer that splits on whitespace runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    /// Create a whitespace tokenizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build a sentence of untagged single-word terms from `text`.
    ///
    /// Each word keeps the whitespace run that followed it as its suffix,
    /// so the sentence surface text survives tokenization. Leading
    /// whitespace has no word to attach to and is dropped. Word boundaries
    /// agree exactly with [`Tokenizer::tokenize`] on the same input.
    #[must_use]
    pub fn sentence(&self, text: &str) -> Sentence {
        let mut terms: Vec<Term> = Vec::new();
        let mut word = String::new();
        let mut whitespace = String::new();

        for ch in text.chars() {
            if ch.is_whitespace() {
                if !word.is_empty() {
                    whitespace.push(ch);
                }
            } else {
                if !whitespace.is_empty() {
                    let finished = Word::new(
                        std::mem::take(&mut word),
                        std::mem::take(&mut whitespace),
                    );
                    terms.push(Term::from_word(finished));
                }
                word.push(ch);
            }
        }
        if !word.is_empty() {
            terms.push(Term::from_word(Word::new(word, whitespace)));
        }

        Sentence::new(terms)
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.sentence(text)
            .words()
            .map(|w| w.text().to_string())
            .collect()
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}
