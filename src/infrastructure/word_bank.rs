//! Word bank loading and one-time publication
//!
//! The loader fetches a whitespace separated word list, keeps the admissible
//! words and publishes the result exactly once. Any number of tasks can hold
//! a `WordBankHandle`; each `wait()` suspends until the value is published
//! and then shares the same immutable `Arc<WordBank>`.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};

use crate::domain::WordBank;
use crate::infrastructure::fetcher::{FetchError, ResilientFetcher};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WordBankError {
    #[error("Failed to fetch word bank source: {0}")]
    Fetch(#[from] FetchError),

    #[error("Word bank source {url} contained no admissible words")]
    Empty { url: String },

    #[error("Word bank loader stopped before publishing a result")]
    Unavailable,
}

type Published = Option<Result<Arc<WordBank>, WordBankError>>;

/// Write side of the publication; consumed by the single publish.
#[derive(Debug)]
pub struct WordBankPublisher {
    tx: watch::Sender<Published>,
}

impl WordBankPublisher {
    pub fn publish(self, result: Result<Arc<WordBank>, WordBankError>) {
        // Stored even when no handle is listening yet.
        self.tx.send_replace(Some(result));
    }
}

/// Read side of the publication.
#[derive(Debug, Clone)]
pub struct WordBankHandle {
    rx: watch::Receiver<Published>,
}

impl WordBankHandle {
    #[must_use]
    pub fn channel() -> (WordBankPublisher, Self) {
        let (tx, rx) = watch::channel(None);
        (WordBankPublisher { tx }, Self { rx })
    }

    /// Handle whose bank is already published.
    #[must_use]
    pub fn ready(bank: WordBank) -> Self {
        let (publisher, handle) = Self::channel();
        publisher.publish(Ok(Arc::new(bank)));
        handle
    }

    /// Waits until the bank is published. A publisher dropped without
    /// publishing yields `WordBankError::Unavailable`.
    pub async fn wait(&self) -> Result<Arc<WordBank>, WordBankError> {
        let mut rx = self.rx.clone();
        let published = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| WordBankError::Unavailable)?;

        published.clone().unwrap_or(Err(WordBankError::Unavailable))
    }

    /// Published value, if any, without waiting.
    #[must_use]
    pub fn try_get(&self) -> Published {
        self.rx.borrow().clone()
    }
}

/// Fetches and filters the word list.
#[derive(Clone)]
pub struct WordBankLoader {
    fetcher: ResilientFetcher,
    source_url: String,
}

impl WordBankLoader {
    #[must_use]
    pub fn new(fetcher: ResilientFetcher, source_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            source_url: source_url.into(),
        }
    }

    pub async fn load(&self) -> Result<WordBank, WordBankError> {
        info!("📚 Loading word bank from {}", self.source_url);

        let text = self.fetcher.fetch(&self.source_url).await?;
        let bank = WordBank::from_source_text(&text);

        if bank.is_empty() {
            return Err(WordBankError::Empty {
                url: self.source_url.clone(),
            });
        }

        info!("📚 Word bank ready: {} admissible words", bank.len());
        Ok(bank)
    }

    /// Starts loading in the background and returns the handle the result
    /// will be published through.
    #[must_use]
    pub fn spawn(self) -> WordBankHandle {
        let (publisher, handle) = WordBankHandle::channel();

        tokio::spawn(async move {
            let result = self.load().await.map(Arc::new);
            if let Err(e) = &result {
                error!("❌ Word bank unavailable: {}", e);
            }
            publisher.publish(result);
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fetcher::FetchPolicy;
    use crate::infrastructure::http_client::RawResponse;
    use crate::test_utils::ScriptedTransport;
    use std::time::Duration;

    const SOURCE: &str = "http://words.test/words.txt";

    fn loader(transport: ScriptedTransport) -> WordBankLoader {
        let fetcher = ResilientFetcher::new(Arc::new(transport), FetchPolicy::new(1, 1));
        WordBankLoader::new(fetcher, SOURCE)
    }

    #[tokio::test]
    async fn test_load_filters_source_words() {
        let transport = ScriptedTransport::new().respond(
            SOURCE,
            RawResponse::new(200).with_body("apple banana cherry dog elephant 1234 a-b"),
        );

        let bank = loader(transport).load().await.unwrap();

        assert_eq!(bank.len(), 4);
        assert!(bank.contains("elephant"));
        assert!(!bank.contains("dog"));
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let transport = ScriptedTransport::new().respond(SOURCE, RawResponse::new(999));

        let err = loader(transport).load().await.unwrap_err();
        assert!(matches!(err, WordBankError::Fetch(FetchError::Blocked { .. })));
    }

    #[tokio::test]
    async fn test_source_without_admissible_words_is_an_error() {
        let transport =
            ScriptedTransport::new().respond(SOURCE, RawResponse::new(200).with_body("a bb ccc 1234"));

        assert!(matches!(
            loader(transport).load().await,
            Err(WordBankError::Empty { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_waiter_sees_the_same_published_bank() {
        let transport = ScriptedTransport::new()
            .respond(SOURCE, RawResponse::new(200).with_body("apple banana"))
            .with_latency(Duration::from_millis(30));
        let handle = loader(transport).spawn();

        let waiters: Vec<_> = (0..16)
            .map(|_| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.wait().await })
            })
            .collect();

        let banks: Vec<Arc<WordBank>> = futures::future::join_all(waiters)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(banks.len(), 16);
        assert!(banks.iter().all(|bank| Arc::ptr_eq(bank, &banks[0])));
        assert_eq!(banks[0].len(), 2);
    }

    #[tokio::test]
    async fn test_waiters_see_load_failure() {
        let transport = ScriptedTransport::new().respond(SOURCE, RawResponse::new(403));
        let handle = loader(transport).spawn();

        assert!(matches!(handle.wait().await, Err(WordBankError::Fetch(_))));
        // Later waiters get the same outcome.
        assert!(handle.wait().await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_publisher_makes_bank_unavailable() {
        let (publisher, handle) = WordBankHandle::channel();
        assert!(handle.try_get().is_none());
        drop(publisher);

        assert_eq!(handle.wait().await, Err(WordBankError::Unavailable));
    }

    #[tokio::test]
    async fn test_ready_handle_returns_immediately() {
        let handle = WordBankHandle::ready(WordBank::from_source_text("apple"));
        assert!(handle.try_get().is_some());
        assert!(handle.wait().await.unwrap().contains("apple"));
    }
}
