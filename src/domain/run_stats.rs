//! Run counters and the summary reported at the end of a run

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Processed/errored URL counters shared by all tasks of one run.
///
/// Each task bumps exactly one of the two counters exactly once, so
/// `processed + errored` never exceeds the number of URLs and reaches it once
/// every task has finished.
#[derive(Debug, Default)]
pub struct RunCounters {
    processed: AtomicUsize,
    errored: AtomicUsize,
}

impl RunCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::AcqRel);
    }

    pub fn record_errored(&self) {
        self.errored.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn errored(&self) -> usize {
        self.errored.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn summary(&self, total: usize) -> RunSummary {
        RunSummary {
            total_urls: total,
            processed_urls: self.processed(),
            errored_urls: self.errored(),
        }
    }
}

/// Aggregate outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_urls: usize,
    pub processed_urls: usize,
    pub errored_urls: usize,
}

impl RunSummary {
    /// True once every URL has been accounted for.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.processed_urls + self.errored_urls == self.total_urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let summary = RunCounters::new().summary(0);
        assert_eq!(summary.processed_urls, 0);
        assert_eq!(summary.errored_urls, 0);
        assert!(summary.is_complete());
    }

    #[test]
    fn test_summary_reflects_recorded_outcomes() {
        let counters = RunCounters::new();
        counters.record_processed();
        counters.record_processed();
        counters.record_errored();

        let summary = counters.summary(4);
        assert_eq!(summary.processed_urls, 2);
        assert_eq!(summary.errored_urls, 1);
        assert!(!summary.is_complete());
    }
}
