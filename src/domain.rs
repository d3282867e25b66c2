//! Domain module - core word counting logic and value types
//!
//! This module contains the value types shared across the pipeline and the
//! pure algorithms that operate on them:
//! - `word_freq`: ranked entries, the word bank and the frequency table
//! - `top_k`: bounded-capacity selection of the most frequent words
//! - `aggregator`: the shared, lock-protected frequency table
//! - `run_stats`: per-run processed/errored counters and the final summary

pub mod aggregator;
pub mod run_stats;
pub mod top_k;
pub mod word_freq;

pub use aggregator::FrequencyAggregator;
pub use run_stats::{RunCounters, RunSummary};
pub use top_k::{BoundedMinHeap, top_n};
pub use word_freq::{WordBank, WordFreq, WordFrequencyMap, is_admissible_word};
