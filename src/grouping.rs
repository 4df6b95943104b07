//! Reconciling tag sets across repeated occurrences of the same text.
//!
//! After a corpus is tagged, the same surface text regularly ends up with
//! different tag sets in different places: one "bank" tagged as an
//! organization, another as a location. [`group`] looks at every term of a
//! chunk at once, buckets them by text, and decides one final tag set per
//! distinct text under a [`GroupingPolicy`]:
//!
//! - [`DeleteAll`](GroupingPolicy::DeleteAll) wipes the slate: every
//!   occurrence comes back untagged.
//! - [`KeepAll`](GroupingPolicy::KeepAll) unions every tag seen for the
//!   text, deduplicated in first-seen order.
//! - [`DeleteConflicting`](GroupingPolicy::DeleteConflicting) drops every
//!   tag whose *type* was assigned more than once for the text (whether
//!   with different values or the same value twice) and keeps the rest.
//!
//! The decision is global per chunk: tag-type counts are accumulated over
//! the complete input before any output is produced, so the result for a
//! given text does not depend on the order terms arrive in. The returned
//! mapping sends every distinct input term to its representative; all
//! occurrences of one text map to representatives with one identical tag
//! set.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::term::{Sentence, Tag, Term};

// =============================================================================
// Policy
// =============================================================================

/// What happens to tags when occurrences of one text disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupingPolicy {
    /// Every occurrence ends up untagged.
    DeleteAll,
    /// Every occurrence ends up with the union of all tags seen for its
    /// text, deduplicated in first-seen order.
    #[default]
    KeepAll,
    /// A tag survives only if its type occurs exactly once across all
    /// occurrences of the text, counting every tag token (duplicates
    /// within one term included).
    DeleteConflicting,
}

impl GroupingPolicy {
    /// Canonical name, as accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingPolicy::DeleteAll => "delete-all",
            GroupingPolicy::KeepAll => "keep-all",
            GroupingPolicy::DeleteConflicting => "delete-conflicting",
        }
    }
}

impl fmt::Display for GroupingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "delete-all" | "delete_all" | "deleteall" => Ok(GroupingPolicy::DeleteAll),
            "keep-all" | "keep_all" | "keepall" => Ok(GroupingPolicy::KeepAll),
            "delete-conflicting" | "delete_conflicting" | "deleteconflicting" => {
                Ok(GroupingPolicy::DeleteConflicting)
            }
            _ => Err(Error::unknown_policy(s)),
        }
    }
}

// =============================================================================
// Grouping
// =============================================================================

/// Decide the final tag set per distinct text and map every input term to
/// its representative.
///
/// The representative's words and unmodifiable flag come from the first
/// occurrence of the text; only the tag set is recomputed. Two full passes:
/// occurrences are bucketed completely before any decision is made, which
/// is what makes the outcome independent of input order.
#[must_use]
pub fn group<I>(terms: I, policy: GroupingPolicy) -> HashMap<Term, Term>
where
    I: IntoIterator<Item = Term>,
{
    let mut buckets: HashMap<String, Vec<Term>> = HashMap::new();
    for term in terms {
        buckets.entry(term.text().to_string()).or_default().push(term);
    }

    let mut mapping = HashMap::new();
    for occurrences in buckets.into_values() {
        let tags = merged_tags(&occurrences, policy);
        let first = &occurrences[0];
        let representative =
            Term::from_parts(first.words().to_vec(), tags, first.is_unmodifiable());
        for occurrence in occurrences {
            mapping
                .entry(occurrence)
                .or_insert_with(|| representative.clone());
        }
    }
    mapping
}

/// [`group`] applied to independent chunks across a thread pool.
///
/// Each chunk's decision set is computed from that chunk's complete term
/// multiset alone; the same text may resolve differently in different
/// chunks.
#[must_use]
pub fn group_chunks(
    chunks: Vec<Vec<Term>>,
    policy: GroupingPolicy,
) -> Vec<HashMap<Term, Term>> {
    chunks
        .into_par_iter()
        .map(|chunk| group(chunk, policy))
        .collect()
}

/// Replace every term of `sentence` by its grouped representative.
///
/// Terms absent from the mapping are kept as they are.
#[must_use]
pub fn apply_grouping(sentence: Sentence, mapping: &HashMap<Term, Term>) -> Sentence {
    let terms = sentence
        .into_terms()
        .into_iter()
        .map(|term| mapping.get(&term).cloned().unwrap_or(term))
        .collect();
    Sentence::new(terms)
}

fn merged_tags(occurrences: &[Term], policy: GroupingPolicy) -> Vec<Tag> {
    match policy {
        GroupingPolicy::DeleteAll => Vec::new(),
        GroupingPolicy::KeepAll => {
            let mut tags: Vec<Tag> = Vec::new();
            for term in occurrences {
                for tag in term.tags() {
                    if !tags.contains(tag) {
                        tags.push(tag.clone());
                    }
                }
            }
            tags
        }
        GroupingPolicy::DeleteConflicting => {
            // Count pass over every tag token, then filter. A surviving
            // type has exactly one token, so survivors need no dedup.
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for term in occurrences {
                for tag in term.tags() {
                    *counts.entry(tag.ty()).or_insert(0) += 1;
                }
            }
            let mut tags: Vec<Tag> = Vec::new();
            for term in occurrences {
                for tag in term.tags() {
                    if counts.get(tag.ty()) == Some(&1) {
                        tags.push(tag.clone());
                    }
                }
            }
            tags
        }
    }
}

// =============================================================================
// Tests
// =============================================================================


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::term::Word;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn small_terms() -> impl Strategy<Value = Vec<Term>> {
        prop::collection::vec(
            (
                "[ab]{1,2}",
                prop::collection::vec(("[NC]", "[XY]"), 0..3),
                any::<bool>(),
            ),
            1..10,
        )
        .prop_map(|rows| {
            rows.into_iter()
                .map(|(text, tags, unmodifiable)| {
                    Term::new(
                        vec![Word::spaced(text)],
                        tags.into_iter().map(|(ty, v)| Tag::new(ty, v)).collect(),
                        unmodifiable,
                    )
                    .unwrap()
                })
                .collect()
        })
    }

    fn policies() -> impl Strategy<Value = GroupingPolicy> {
        prop_oneof![
            Just(GroupingPolicy::DeleteAll),
            Just(GroupingPolicy::KeepAll),
            Just(GroupingPolicy::DeleteConflicting),
        ]
    }

    fn tag_set(term: &Term) -> HashSet<Tag> {
        term.tags().iter().cloned().collect()
    }

    proptest! {
        #[test]
        fn tag_sets_independent_of_input_order(
            (original, shuffled) in small_terms()
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
            policy in policies(),
        ) {
            let a = group(original, policy);
            let b = group(shuffled, policy);

            let keys_a: HashSet<&Term> = a.keys().collect();
            let keys_b: HashSet<&Term> = b.keys().collect();
            prop_assert_eq!(&keys_a, &keys_b);

            for (key, rep) in &a {
                prop_assert_eq!(tag_set(rep), tag_set(&b[key]));
            }
        }

        #[test]
        fn same_text_gets_same_tag_set(terms in small_terms(), policy in policies()) {
            let mapping = group(terms, policy);
            let mut by_text: HashMap<&str, HashSet<Tag>> = HashMap::new();
            for (key, rep) in &mapping {
                let set = tag_set(rep);
                let entry = by_text.entry(key.text()).or_insert_with(|| set.clone());
                prop_assert_eq!(&*entry, &set);
            }
        }

        #[test]
        fn keep_all_and_delete_all_idempotent(
            terms in small_terms(),
            delete in any::<bool>(),
        ) {
            let policy = if delete {
                GroupingPolicy::DeleteAll
            } else {
                GroupingPolicy::KeepAll
            };
            let mapping = group(terms.clone(), policy);
            let replaced: Vec<Term> = terms.iter().map(|t| mapping[t].clone()).collect();
            let second = group(replaced.clone(), policy);

            for term in &replaced {
                prop_assert_eq!(tag_set(term), tag_set(&second[term]));
            }
        }
    }
}
