//! Run-lifetime resource cache.
//!
//! The cache maps a resolved URL to the fetched content and is shared by
//! every item of a run. [`ResourceLoader`] sits in front of it and makes
//! concurrent requests for the same URL share a single fetch.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::errors::TransportError;
use crate::events::EventSink;
use crate::transport::Transport;

/// Storage for fetched resources.
pub trait ResourceCache: Send + Sync {
    /// Gets the content stored for `url`.
    fn get(&self, url: &str) -> Option<Arc<str>>;

    /// Stores the content for `url`. Writing a key twice keeps either value.
    fn put(&self, url: &str, content: Arc<str>);

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Returns true if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory cache; entries never expire.
#[derive(Debug, Default)]
pub struct InMemoryResourceCache {
    entries: DashMap<String, Arc<str>>,
}

impl InMemoryResourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached URLs, in no particular order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl ResourceCache for InMemoryResourceCache {
    fn get(&self, url: &str) -> Option<Arc<str>> {
        self.entries.get(url).map(|e| Arc::clone(e.value()))
    }

    fn put(&self, url: &str, content: Arc<str>) {
        self.entries.entry(url.to_string()).or_insert(content);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Where a loaded resource came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Served from the cache.
    Cache,
    /// Fetched by this call.
    Fetched,
    /// Fetched by a concurrent call for the same URL.
    Shared,
}

/// Resolves resource URLs through the cache, fetching on a miss.
pub struct ResourceLoader {
    transport: Arc<dyn Transport>,
    cache: Arc<dyn ResourceCache>,
    in_flight: DashMap<String, Arc<OnceCell<Arc<str>>>>,
    event_sink: Arc<dyn EventSink>,
}

impl ResourceLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: Arc<dyn ResourceCache>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            transport,
            cache,
            in_flight: DashMap::new(),
            event_sink,
        }
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn ResourceCache> {
        &self.cache
    }

    /// Loads `url`.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the fetch fails. Failures are not
    /// cached; the next call fetches again.
    pub async fn load(&self, url: &str) -> Result<Arc<str>, TransportError> {
        self.load_with_source(url).await.map(|(content, _)| content)
    }

    /// Loads `url` and reports where the content came from.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_with_source(&self, url: &str) -> Result<(Arc<str>, LoadSource), TransportError> {
        if let Some(content) = self.cache.get(url) {
            self.note_cache_hit(url);
            return Ok((content, LoadSource::Cache));
        }

        let cell = Arc::clone(
            self.in_flight
                .entry(url.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );

        let fetched_here = AtomicBool::new(false);
        let result = cell
            .get_or_try_init(|| async {
                let (content, fetched) = self.fetch_into_cache(url).await?;
                fetched_here.store(fetched, Ordering::Relaxed);
                Ok::<_, TransportError>(content)
            })
            .await
            .map(Arc::clone);

        self.in_flight
            .remove_if(url, |_, current| Arc::ptr_eq(current, &cell));

        let content = result?;
        if fetched_here.load(Ordering::Relaxed) {
            Ok((content, LoadSource::Fetched))
        } else {
            self.note_cache_hit(url);
            Ok((content, LoadSource::Shared))
        }
    }

    /// Fetches `url` unless a concurrent caller stored it in the meantime.
    /// The flag is true if this call hit the transport.
    async fn fetch_into_cache(&self, url: &str) -> Result<(Arc<str>, bool), TransportError> {
        if let Some(content) = self.cache.get(url) {
            return Ok((content, false));
        }

        debug!(url, "Cache miss, fetching resource");
        let content: Arc<str> = self.transport.fetch(url).await?.into();
        self.cache.put(url, Arc::clone(&content));
        self.event_sink.try_emit(
            "resource.fetched",
            Some(serde_json::json!({ "url": url, "bytes": content.len() })),
        );
        Ok((content, true))
    }

    fn note_cache_hit(&self, url: &str) {
        debug!(url, "Resource cache hit");
        self.event_sink
            .try_emit("resource.cache_hit", Some(serde_json::json!({ "url": url })));
    }
}

impl std::fmt::Debug for ResourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceLoader")
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}
