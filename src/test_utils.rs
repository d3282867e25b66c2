//! Test utilities for article-wordfreq
//!
//! Provides an in-memory `Transport` with scripted responses so the fetcher,
//! the word bank loader and the full pipeline can be exercised without a
//! network.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::infrastructure::http_client::{RawResponse, Transport, TransportError};

type Scripted = Result<RawResponse, TransportError>;

/// Status returned for URLs nobody scripted.
pub const UNROUTED_STATUS: u16 = 500;

/// Transport that plays back per-URL scripts.
///
/// Each URL has a queue of outcomes; the last one repeats forever. Every
/// request is recorded in call order.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a sequence of outcomes for `url`.
    #[must_use]
    pub fn route(self, url: impl Into<String>, outcomes: Vec<Scripted>) -> Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), outcomes.into());
        self
    }

    /// Answers every request for `url` with `response`.
    #[must_use]
    pub fn respond(self, url: impl Into<String>, response: RawResponse) -> Self {
        self.route(url, vec![Ok(response)])
    }

    /// Delays every response, so concurrent requests overlap.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn call_count(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|called| called.as_str() == url)
            .count()
    }

    fn next_outcome(&self, url: &str) -> Scripted {
        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Ok(RawResponse::new(UNROUTED_STATUS))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(RawResponse::new(UNROUTED_STATUS))),
            None => Ok(RawResponse::new(UNROUTED_STATUS)),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<RawResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.next_outcome(url)
    }
}

/// Minimal page with `text` inside a `<div class="{class}">`.
#[must_use]
pub fn article_html(class: &str, text: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>t</title></head><body><nav>Menu Links</nav><div class=\"{class}\"><p>{text}</p></div></body></html>"
    )
}
