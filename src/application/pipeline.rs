//! End-to-end run: word bank, URL list, dispatch, ranking

use serde::Serialize;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::application::dispatcher::{DispatchSettings, Dispatcher};
use crate::application::error::PipelineError;
use crate::domain::{RunSummary, WordFreq, top_n};
use crate::infrastructure::{
    AppConfig, ArticleExtractor, FetchPolicy, HttpClientConfig, ResilientFetcher,
    ReqwestTransport, Transport, WordBankLoader, read_url_list,
};

/// Result of one complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub summary: RunSummary,
    pub top_words: Vec<WordFreq>,
}

/// Runs the pipeline over the real HTTP transport.
pub async fn run_pipeline(config: &AppConfig) -> Result<RunReport, PipelineError> {
    let transport = ReqwestTransport::new(&HttpClientConfig::from_app_config(config))?;
    run_pipeline_with_transport(config, Arc::new(transport)).await
}

/// Runs the pipeline over any `Transport`.
///
/// The word bank load starts before the URL list is read so both overlap,
/// and the bank is awaited once more after the completion barrier: a run in
/// which every URL failed still needs a usable bank to succeed.
pub async fn run_pipeline_with_transport(
    config: &AppConfig,
    transport: Arc<dyn Transport>,
) -> Result<RunReport, PipelineError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("run", %run_id);

    async move {
        config.validate()?;
        let extractor = ArticleExtractor::new(&config.container_selector)?;
        let fetcher = ResilientFetcher::new(transport, FetchPolicy::from_app_config(config));
        info!(
            "📋 Extracting '{}' with up to {} retries and {} redirects per URL",
            extractor.selector(),
            fetcher.policy().max_retries,
            fetcher.policy().max_redirects
        );

        let word_bank = WordBankLoader::new(fetcher.clone(), &config.word_bank_url).spawn();
        let urls = read_url_list(&config.url_list_path).await?;

        let dispatcher = Dispatcher::new(
            fetcher,
            Arc::new(extractor),
            word_bank.clone(),
            DispatchSettings::from_app_config(config),
        );
        let outcome = dispatcher.run(&urls).await?;

        word_bank.wait().await?;

        let top_words = top_n(config.top_results, &outcome.counts);
        info!(
            "🏁 Run complete: {} of {} URLs processed, reporting top {} words",
            outcome.summary.processed_urls,
            outcome.summary.total_urls,
            top_words.len()
        );

        Ok::<_, PipelineError>(RunReport {
            run_id,
            summary: outcome.summary,
            top_words,
        })
    }
    .instrument(span)
    .await
}
