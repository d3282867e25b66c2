//! Resilient fetcher - bounded retries and bounded redirect following
//!
//! One logical "get the page at this URL" is a small state machine with two
//! independent counters:
//! - network errors and `404` responses retry the current URL until
//!   `max_retries` retries have been spent
//! - `3xx` responses move to the `Location` target until `max_redirects` hops
//!   have been followed
//!
//! `200` ends the fetch with the body. `999` (used by some sites to signal
//! scraping defenses) and every other status end it with an error right away.
//! Retries and redirects happen immediately, without backoff.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::{RawResponse, Transport, TransportError};

/// Status code some sites answer with when they detect a scraper.
pub const BLOCKED_STATUS: u16 = 999;

const OK_STATUS: u16 = 200;
const NOT_FOUND_STATUS: u16 = 404;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub max_retries: u32,
    pub max_redirects: u32,
}

impl FetchPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, max_redirects: u32) -> Self {
        Self {
            max_retries,
            max_redirects,
        }
    }

    #[must_use]
    pub const fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.max_retries, config.max_redirects)
    }
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Too many retries for {url} after {attempts} attempts (last error: {last_error})")]
    TooManyRetries {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Too many redirects for {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: u32 },

    #[error("Redirect without Location header from {url}")]
    MissingRedirectTarget { url: String },

    #[error("Invalid redirect target '{target}' from {url}")]
    InvalidRedirectTarget { url: String, target: String },

    #[error("Blocked by the endpoint server with status code 999: {url}")]
    Blocked { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Transport failure for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },
}

/// What the fetch loop does after one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStep {
    /// Try the current URL again.
    Retry,
    /// Continue at the contained (already resolved) URL.
    Redirect(String),
    /// Finished with the response body.
    Done(String),
    /// Finished with an error.
    Failed(FetchError),
}

/// Pure retry/redirect bookkeeping for one fetch.
#[derive(Debug, Clone)]
pub struct FetchStateMachine {
    policy: FetchPolicy,
    url: String,
    retries: u32,
    redirects: u32,
    attempts: u32,
}

impl FetchStateMachine {
    #[must_use]
    pub fn new(url: impl Into<String>, policy: FetchPolicy) -> Self {
        Self {
            policy,
            url: url.into(),
            retries: 0,
            redirects: 0,
            attempts: 0,
        }
    }

    /// URL the next request goes to.
    #[must_use]
    pub fn current_url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub const fn redirects(&self) -> u32 {
        self.redirects
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Feeds the outcome of one request into the machine.
    pub fn step(&mut self, outcome: Result<RawResponse, TransportError>) -> FetchStep {
        self.attempts += 1;

        let response = match outcome {
            Ok(response) => response,
            Err(error) if error.is_retryable() => return self.retry(error.to_string()),
            Err(error) => {
                return FetchStep::Failed(FetchError::Transport {
                    url: self.url.clone(),
                    source: error,
                });
            }
        };

        match response.status {
            BLOCKED_STATUS => FetchStep::Failed(FetchError::Blocked {
                url: self.url.clone(),
            }),
            NOT_FOUND_STATUS => self.retry("HTTP 404 Not Found".to_string()),
            300..=399 => self.redirect(response.location),
            OK_STATUS => FetchStep::Done(response.body),
            status => FetchStep::Failed(FetchError::UnexpectedStatus {
                url: self.url.clone(),
                status,
            }),
        }
    }

    fn retry(&mut self, cause: String) -> FetchStep {
        if self.retries >= self.policy.max_retries {
            return FetchStep::Failed(FetchError::TooManyRetries {
                url: self.url.clone(),
                attempts: self.attempts,
                last_error: cause,
            });
        }
        self.retries += 1;
        FetchStep::Retry
    }

    fn redirect(&mut self, location: Option<String>) -> FetchStep {
        if self.redirects >= self.policy.max_redirects {
            return FetchStep::Failed(FetchError::TooManyRedirects {
                url: self.url.clone(),
                limit: self.policy.max_redirects,
            });
        }

        let Some(target) = location else {
            return FetchStep::Failed(FetchError::MissingRedirectTarget {
                url: self.url.clone(),
            });
        };

        // Relative targets are resolved against the URL that redirected.
        let resolved = match Url::parse(&self.url) {
            Ok(base) => base.join(&target),
            Err(_) => Url::parse(&target),
        };
        let Ok(resolved) = resolved else {
            return FetchStep::Failed(FetchError::InvalidRedirectTarget {
                url: self.url.clone(),
                target,
            });
        };

        self.redirects += 1;
        self.url = resolved.to_string();
        FetchStep::Redirect(self.url.clone())
    }
}

/// Drives a `FetchStateMachine` against a `Transport`.
#[derive(Clone)]
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    policy: FetchPolicy,
}

impl ResilientFetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, policy: FetchPolicy) -> Self {
        Self { transport, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Fetches the body of `url`, retrying and following redirects within
    /// the configured bounds.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut machine = FetchStateMachine::new(url, self.policy);

        loop {
            let outcome = self.transport.get(machine.current_url()).await;
            match machine.step(outcome) {
                FetchStep::Done(body) => {
                    debug!(
                        "Fetched {} in {} attempt(s), {} redirect(s)",
                        url,
                        machine.attempts(),
                        machine.redirects()
                    );
                    return Ok(body);
                }
                FetchStep::Retry => {
                    warn!(
                        "🔄 Retrying {} ({}/{})",
                        machine.current_url(),
                        machine.retries(),
                        self.policy.max_retries
                    );
                }
                FetchStep::Redirect(target) => {
                    debug!("↪️ Redirect {} -> {}", url, target);
                }
                FetchStep::Failed(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedTransport;
    use rstest::rstest;

    const POLICY: FetchPolicy = FetchPolicy::new(3, 5);

    fn ok(body: &str) -> Result<RawResponse, TransportError> {
        Ok(RawResponse::new(200).with_body(body))
    }

    fn status(code: u16) -> Result<RawResponse, TransportError> {
        Ok(RawResponse::new(code))
    }

    fn redirect(to: &str) -> Result<RawResponse, TransportError> {
        Ok(RawResponse::new(301).with_location(to))
    }

    fn network_error() -> Result<RawResponse, TransportError> {
        Err(TransportError::Network("connection reset".to_string()))
    }

    #[test]
    fn test_success_on_first_attempt() {
        let mut machine = FetchStateMachine::new("http://example.com/", POLICY);
        assert_eq!(machine.step(ok("body")), FetchStep::Done("body".to_string()));
        assert_eq!(machine.attempts(), 1);
    }

    #[rstest]
    #[case::not_found(status(404))]
    #[case::network(network_error())]
    fn test_retry_budget_is_max_retries(#[case] failure: Result<RawResponse, TransportError>) {
        let mut machine = FetchStateMachine::new("http://retry.com/", POLICY);

        for _ in 0..POLICY.max_retries {
            assert_eq!(machine.step(failure.clone()), FetchStep::Retry);
        }
        let step = machine.step(failure);

        assert!(matches!(
            step,
            FetchStep::Failed(FetchError::TooManyRetries { attempts: 4, .. })
        ));
        assert_eq!(machine.attempts(), POLICY.max_retries + 1);
    }

    #[test]
    fn test_zero_retries_fails_on_first_error() {
        let mut machine = FetchStateMachine::new("http://retry.com/", FetchPolicy::new(0, 5));
        assert!(matches!(
            machine.step(status(404)),
            FetchStep::Failed(FetchError::TooManyRetries { attempts: 1, .. })
        ));
    }

    #[test]
    fn test_exactly_max_redirects_then_ok_succeeds() {
        let mut machine = FetchStateMachine::new("http://example.com/0", POLICY);

        for hop in 1..=POLICY.max_redirects {
            let target = format!("http://example.com/{hop}");
            assert_eq!(machine.step(redirect(&target)), FetchStep::Redirect(target));
        }
        assert_eq!(machine.step(ok("landed")), FetchStep::Done("landed".to_string()));
        assert_eq!(machine.redirects(), POLICY.max_redirects);
    }

    #[test]
    fn test_one_hop_past_max_redirects_fails() {
        let mut machine = FetchStateMachine::new("http://example.com/0", POLICY);

        for hop in 1..=POLICY.max_redirects {
            machine.step(redirect(&format!("http://example.com/{hop}")));
        }

        assert!(matches!(
            machine.step(redirect("http://example.com/too-far")),
            FetchStep::Failed(FetchError::TooManyRedirects { limit: 5, .. })
        ));
    }

    #[test]
    fn test_counters_are_independent() {
        let mut machine = FetchStateMachine::new("http://example.com/a", FetchPolicy::new(1, 1));

        assert_eq!(machine.step(status(404)), FetchStep::Retry);
        assert!(matches!(machine.step(redirect("/b")), FetchStep::Redirect(_)));
        // The redirect did not refill the retry budget.
        assert!(matches!(
            machine.step(status(404)),
            FetchStep::Failed(FetchError::TooManyRetries { .. })
        ));
    }

    #[test]
    fn test_retry_after_redirect_reuses_redirected_url() {
        let mut machine = FetchStateMachine::new("http://example.com/old", POLICY);
        machine.step(redirect("http://example.com/new"));
        machine.step(network_error());
        assert_eq!(machine.current_url(), "http://example.com/new");
    }

    #[test]
    fn test_relative_redirect_is_resolved() {
        let mut machine = FetchStateMachine::new("http://example.com/articles/1", POLICY);
        assert_eq!(
            machine.step(redirect("/articles/2")),
            FetchStep::Redirect("http://example.com/articles/2".to_string())
        );
    }

    #[rstest]
    #[case::blocked(status(999), "blocked")]
    #[case::server_error(status(500), "unexpected")]
    #[case::no_content(status(204), "unexpected")]
    #[case::missing_location(status(302), "missing")]
    #[case::invalid_request(Err(TransportError::InvalidRequest("bad".into())), "transport")]
    fn test_terminal_failures(
        #[case] outcome: Result<RawResponse, TransportError>,
        #[case] kind: &str,
    ) {
        let mut machine = FetchStateMachine::new("http://example.com/", POLICY);
        let FetchStep::Failed(error) = machine.step(outcome) else {
            panic!("expected a terminal failure");
        };

        let matched = match kind {
            "blocked" => matches!(error, FetchError::Blocked { .. }),
            "unexpected" => matches!(error, FetchError::UnexpectedStatus { .. }),
            "missing" => matches!(error, FetchError::MissingRedirectTarget { .. }),
            "transport" => matches!(error, FetchError::Transport { .. }),
            _ => false,
        };
        assert!(matched, "unexpected error {error:?} for case {kind}");
        assert_eq!(machine.retries(), 0);
    }

    #[tokio::test]
    async fn test_fetcher_returns_body() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("http://example.com/", RawResponse::new(200).with_body("This is the body content")),
        );
        let fetcher = ResilientFetcher::new(transport, POLICY);

        assert_eq!(
            fetcher.fetch("http://example.com/").await.unwrap(),
            "This is the body content"
        );
    }

    #[tokio::test]
    async fn test_fetcher_never_exceeds_retry_bound() {
        let transport = Arc::new(
            ScriptedTransport::new().respond("http://retry.com/", RawResponse::new(404)),
        );
        let fetcher = ResilientFetcher::new(transport.clone(), POLICY);

        let err = fetcher.fetch("http://retry.com/").await.unwrap_err();

        assert!(matches!(err, FetchError::TooManyRetries { .. }));
        assert_eq!(
            transport.call_count("http://retry.com/"),
            (POLICY.max_retries + 1) as usize
        );
    }

    #[tokio::test]
    async fn test_fetcher_recovers_after_transient_errors() {
        let transport = Arc::new(ScriptedTransport::new().route(
            "http://flaky.com/",
            vec![network_error(), status(404), ok("finally")],
        ));
        let fetcher = ResilientFetcher::new(transport.clone(), POLICY);

        assert_eq!(fetcher.fetch("http://flaky.com/").await.unwrap(), "finally");
        assert_eq!(transport.call_count("http://flaky.com/"), 3);
    }

    #[tokio::test]
    async fn test_fetcher_follows_redirect_chain() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("http://a.com/", RawResponse::new(301).with_location("http://b.com/"))
                .respond("http://b.com/", RawResponse::new(307).with_location("/final"))
                .respond("http://b.com/final", RawResponse::new(200).with_body("done")),
        );
        let fetcher = ResilientFetcher::new(transport.clone(), POLICY);

        assert_eq!(fetcher.fetch("http://a.com/").await.unwrap(), "done");
        assert_eq!(
            transport.calls(),
            vec!["http://a.com/", "http://b.com/", "http://b.com/final"]
        );
    }

    #[tokio::test]
    async fn test_fetcher_stops_redirect_loop() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond("http://loop.com/", RawResponse::new(301).with_location("http://loop.com/")),
        );
        let fetcher = ResilientFetcher::new(transport.clone(), POLICY);

        let err = fetcher.fetch("http://loop.com/").await.unwrap_err();
        assert!(matches!(err, FetchError::TooManyRedirects { .. }));
        assert_eq!(transport.calls().len(), (POLICY.max_redirects + 1) as usize);
    }
}
