//! # Word value types
//!
//! `WordFreq` is the unit of the ranked output, `WordBank` the set of words
//! that are allowed to be counted and `WordFrequencyMap` the raw counting table.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Raw counting table: lowercase word -> number of occurrences.
pub type WordFrequencyMap = HashMap<String, u64>;

/// Minimum number of characters a word must exceed to enter the bank.
pub const MIN_WORD_LENGTH_EXCLUSIVE: usize = 3;

/// A word together with how often it was seen.
///
/// Ranking only ever looks at `frequency`; two entries with the same count
/// have no defined order relative to each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFreq {
    pub word: String,
    pub frequency: u64,
}

impl WordFreq {
    #[must_use]
    pub fn new(word: impl Into<String>, frequency: u64) -> Self {
        Self {
            word: word.into(),
            frequency,
        }
    }
}

/// Returns true when `word` may be part of a word bank: longer than three
/// characters and made only of alphabetic characters.
#[must_use]
pub fn is_admissible_word(word: &str) -> bool {
    word.chars().count() > MIN_WORD_LENGTH_EXCLUSIVE && word.chars().all(char::is_alphabetic)
}

/// Read-only set of lowercase words that are allowed to be counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordBank {
    words: HashSet<String>,
}

impl WordBank {
    /// Builds a bank from whitespace separated source text, keeping only
    /// admissible words (stored lowercased).
    #[must_use]
    pub fn from_source_text(text: &str) -> Self {
        text.split_whitespace().collect()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for WordBank {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let words = iter
            .into_iter()
            .filter(|w| is_admissible_word(w.as_ref()))
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        Self { words }
    }
}
