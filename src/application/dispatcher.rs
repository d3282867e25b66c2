//! Concurrent article dispatch
//!
//! One task per URL. Launches are paced by a token bucket, at most
//! `max_concurrent_requests` tasks are inside fetch/extract/merge at once,
//! and `run` returns only after every launched task has finished.
//!
//! Per-URL failures (fetch, extraction) are logged and counted as errored.
//! A word bank failure is fatal: remaining tasks are aborted and the run
//! returns the error.

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::application::admission::AdmissionGate;
use crate::application::error::PipelineError;
use crate::domain::{FrequencyAggregator, RunCounters, RunSummary, WordFrequencyMap};
use crate::infrastructure::config::MAX_REQUESTS_PER_SECOND;
use crate::infrastructure::{
    AppConfig, ArticleExtractor, ConfigError, ResilientFetcher, WordBankHandle,
};

type LaunchLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchSettings {
    pub max_concurrent_requests: usize,
    pub requests_per_second: f64,
    pub burst_size: u32,
}

impl DispatchSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_concurrent_requests: config.max_concurrent_requests,
            requests_per_second: config.requests_per_second,
            burst_size: config.burst_size,
        }
    }

    /// Token bucket refilling one token every `1 / requests_per_second`
    /// seconds, holding at most `burst_size` tokens. Starts full.
    fn launch_limiter(&self) -> Result<LaunchLimiter, ConfigError> {
        let burst = NonZeroU32::new(self.burst_size).ok_or(ConfigError::Validation {
            field: "burst_size",
            message: "must be greater than 0".to_string(),
        })?;

        let quota = Duration::try_from_secs_f64(1.0 / self.requests_per_second)
            .ok()
            .and_then(Quota::with_period)
            .ok_or_else(|| ConfigError::Validation {
                field: "requests_per_second",
                message: format!(
                    "must be a positive number no greater than {MAX_REQUESTS_PER_SECOND}, got {}",
                    self.requests_per_second
                ),
            })?
            .allow_burst(burst);

        Ok(RateLimiter::direct(quota))
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// Final counts and accounting of one dispatch.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub counts: WordFrequencyMap,
    pub summary: RunSummary,
}

pub struct Dispatcher {
    fetcher: ResilientFetcher,
    extractor: Arc<ArticleExtractor>,
    word_bank: WordBankHandle,
    settings: DispatchSettings,
    gate: AdmissionGate,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        fetcher: ResilientFetcher,
        extractor: Arc<ArticleExtractor>,
        word_bank: WordBankHandle,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            word_bank,
            gate: AdmissionGate::new(settings.max_concurrent_requests),
            settings,
        }
    }

    /// Admission gate shared by every task this dispatcher launches.
    #[must_use]
    pub const fn admission(&self) -> &AdmissionGate {
        &self.gate
    }

    pub async fn run(&self, urls: &[String]) -> Result<DispatchOutcome, PipelineError> {
        if self.settings.max_concurrent_requests == 0 {
            return Err(ConfigError::Validation {
                field: "max_concurrent_requests",
                message: "must be greater than 0".to_string(),
            }
            .into());
        }
        let limiter = self.settings.launch_limiter()?;
        let aggregator = Arc::new(FrequencyAggregator::new());
        let counters = Arc::new(RunCounters::new());
        let mut tasks = JoinSet::new();

        info!(
            "🚀 Dispatching {} URLs (max {} concurrent, {}/s, burst {})",
            urls.len(),
            self.gate.capacity(),
            self.settings.requests_per_second,
            self.settings.burst_size
        );

        for url in urls {
            if let Some(Err(e)) = self.word_bank.try_get() {
                tasks.abort_all();
                return Err(PipelineError::WordBankUnavailable(e));
            }

            limiter.until_ready().await;

            let task = ArticleTask {
                url: url.clone(),
                fetcher: self.fetcher.clone(),
                extractor: Arc::clone(&self.extractor),
                word_bank: self.word_bank.clone(),
                gate: self.gate.clone(),
                aggregator: Arc::clone(&aggregator),
                counters: Arc::clone(&counters),
            };
            let span = info_span!("article", url = %url);
            tasks.spawn(task.run().instrument(span));
        }

        // Completion barrier
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(fatal)) => {
                    error!("❌ Aborting run: {}", fatal);
                    tasks.abort_all();
                    return Err(fatal);
                }
                Err(join_error) => record_join_failure(&join_error, &counters),
            }
        }

        let distinct = aggregator.distinct_words().await;
        let counts = match Arc::try_unwrap(aggregator) {
            Ok(aggregator) => aggregator.into_inner(),
            Err(shared) => shared.snapshot().await,
        };
        let summary = counters.summary(urls.len());

        info!(
            "✅ Dispatch finished: {} processed, {} errored, {} distinct words (peak concurrency {})",
            summary.processed_urls,
            summary.errored_urls,
            distinct,
            self.gate.peak()
        );

        Ok(DispatchOutcome { counts, summary })
    }
}

fn record_join_failure(join_error: &JoinError, counters: &RunCounters) {
    if join_error.is_panic() {
        error!("❌ Article task panicked: {}", join_error);
        counters.record_errored();
    } else {
        debug!("Article task cancelled: {}", join_error);
    }
}

/// Everything one URL needs, owned so the task is `'static`.
struct ArticleTask {
    url: String,
    fetcher: ResilientFetcher,
    extractor: Arc<ArticleExtractor>,
    word_bank: WordBankHandle,
    gate: AdmissionGate,
    aggregator: Arc<FrequencyAggregator>,
    counters: Arc<RunCounters>,
}

impl ArticleTask {
    async fn run(self) -> Result<(), PipelineError> {
        let Ok(_permit) = self.gate.acquire().await else {
            warn!("Admission closed before {} could start", self.url);
            self.counters.record_errored();
            return Ok(());
        };

        info!("Processing URL: {}", self.url);

        let body = match self.fetcher.fetch(&self.url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("⚠️ Failed to fetch {}: {}", self.url, e);
                self.counters.record_errored();
                return Ok(());
            }
        };

        let words = match self.extractor.extract_words(&body) {
            Ok(words) => words,
            Err(e) => {
                warn!("⚠️ Failed to extract article from {}: {}", self.url, e);
                self.counters.record_errored();
                return Ok(());
            }
        };

        let bank = self.word_bank.wait().await?;
        let counted = self.aggregator.merge(&words, &bank).await;
        self.counters.record_processed();

        debug!(
            "Counted {} of {} words from {}",
            counted,
            words.len(),
            self.url
        );
        Ok(())
    }
}
