//! Shared word frequency table
//!
//! Every article task merges its words into one `FrequencyAggregator`. A merge
//! takes the lock once for the whole word list, so merges from different
//! tasks serialize but never interleave partial updates.

use tokio::sync::Mutex;
use tracing::debug;

use super::word_freq::{WordBank, WordFrequencyMap};

#[derive(Debug, Default)]
pub struct FrequencyAggregator {
    counts: Mutex<WordFrequencyMap>,
}

impl FrequencyAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercases each word and counts it if the bank contains it; other words
    /// are dropped. Returns how many words were counted.
    pub async fn merge<S: AsRef<str>>(&self, words: &[S], bank: &WordBank) -> usize {
        let mut counts = self.counts.lock().await;
        let mut accepted = 0;

        for word in words {
            let normalized = word.as_ref().to_lowercase();
            if bank.contains(&normalized) {
                *counts.entry(normalized).or_insert(0) += 1;
                accepted += 1;
            }
        }

        debug!(
            "Merged {} of {} words ({} distinct in table)",
            accepted,
            words.len(),
            counts.len()
        );
        accepted
    }

    /// Copy of the current table.
    pub async fn snapshot(&self) -> WordFrequencyMap {
        self.counts.lock().await.clone()
    }

    pub async fn distinct_words(&self) -> usize {
        self.counts.lock().await.len()
    }

    /// Consumes the aggregator once no task holds it anymore.
    #[must_use]
    pub fn into_inner(self) -> WordFrequencyMap {
        self.counts.into_inner()
    }
}
