//! Stub transport and collectors for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::collectors::{CollectContext, Collector};
use crate::errors::{CollectError, TransportError};
use crate::transport::Transport;

/// A transport serving fixed bodies and counting fetches per URL.
#[derive(Debug, Default)]
pub struct StaticTransport {
    pages: HashMap<String, String>,
    failures: HashMap<String, String>,
    latency: Option<Duration>,
    jitter: Option<Duration>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl StaticTransport {
    /// Creates a transport that serves nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`.
    #[must_use]
    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// Fails every fetch of `url` with `message`.
    #[must_use]
    pub fn with_failure(mut self, url: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(url.into(), message.into());
        self
    }

    /// Delays every fetch.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Adds a random extra delay of up to `max` to every fetch, so tasks
    /// complete out of order.
    #[must_use]
    pub fn with_jitter(mut self, max: Duration) -> Self {
        self.jitter = Some(max);
        self
    }

    /// Number of fetches of `url`.
    #[must_use]
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().get(url).copied().unwrap_or(0)
    }

    /// Number of fetches across all URLs.
    #[must_use]
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }

    /// URLs fetched at least once, sorted.
    #[must_use]
    pub fn fetched_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.fetches.lock().keys().cloned().collect();
        urls.sort();
        urls
    }

    /// Resets the fetch counters.
    pub fn reset(&self) {
        self.fetches.lock().clear();
    }

    fn delay(&self) -> Duration {
        let base = self.latency.unwrap_or_default();
        let extra = self.jitter.map_or(Duration::ZERO, |max| {
            let millis = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
            Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
        });
        base + extra
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        *self.fetches.lock().entry(url.to_string()).or_insert(0) += 1;

        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self.failures.get(url) {
            return Err(TransportError::new(url, message.clone()));
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::new(url, "not found").with_status(404))
    }
}

/// A collector that always fails.
#[derive(Debug, Clone)]
pub struct FailingCollector {
    message: String,
}

impl FailingCollector {
    /// Creates a failing collector.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Collector for FailingCollector {
    fn collect(&self, _ctx: &CollectContext<'_>) -> Result<Value, CollectError> {
        Err(CollectError::new(self.message.clone()))
    }
}
