//! Compiling schemas and running collections.

use chrono::{DateTime, Utc};
use futures::future::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::ItemEvaluator;
use crate::cache::{InMemoryResourceCache, ResourceCache, ResourceLoader};
use crate::config::FailureMode;
use crate::document;
use crate::errors::{ConfigurationError, ScrapeflowError};
use crate::events::{EventSink, NoOpEventSink};
use crate::graph::{DependencyGraph, DependencyGraphBuilder};
use crate::item::Item;
use crate::observability::SpanTimer;
use crate::schema::{IndexedSchema, Schema, SchemaIndexer, SchemaValidator};
use crate::transport::Transport;

/// A schema that passed indexing, graph building and validation.
#[derive(Debug, Clone)]
pub struct Collection {
    schema: Arc<IndexedSchema>,
    graph: Arc<DependencyGraph>,
}

impl Collection {
    /// Indexes, orders and validates `schema`. Nothing is fetched.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` or `CyclicDependencyError`.
    pub fn compile(schema: Schema) -> Result<Self, ScrapeflowError> {
        let schema = SchemaIndexer::index(schema)?;
        let graph = DependencyGraphBuilder::build(&schema)?;
        SchemaValidator::validate(&schema)?;

        Ok(Self {
            schema: Arc::new(schema),
            graph: Arc::new(graph),
        })
    }

    /// The indexed schema.
    #[must_use]
    pub fn schema(&self) -> &IndexedSchema {
        &self.schema
    }

    /// The dependency graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}

/// Live counters of a run.
#[derive(Debug, Default)]
pub struct RunProgress {
    total: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// A point-in-time copy of [`RunProgress`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    /// Items found in the listing (after `max_items`).
    pub total: usize,
    /// Items extracted.
    pub completed: usize,
    /// Items that failed.
    pub failed: usize,
    /// Items still running.
    pub pending: usize,
}

impl RunProgress {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
    }

    fn record_success(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn record_failure(&self) -> usize {
        self.failed.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current counters.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let total = self.total.load(Ordering::SeqCst);
        let completed = self.completed.load(Ordering::SeqCst);
        let failed = self.failed.load(Ordering::SeqCst);
        ProgressSnapshot {
            total,
            completed,
            failed,
            pending: total.saturating_sub(completed + failed),
        }
    }
}

/// What happened to one anchor.
#[derive(Debug, Clone)]
pub struct ItemOutcome {
    /// Position of the anchor in the listing.
    pub index: usize,
    /// The item, or the error that aborted it.
    pub result: Result<Item, ScrapeflowError>,
}

impl ItemOutcome {
    /// Returns true if the item was extracted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The extracted item.
    #[must_use]
    pub fn item(&self) -> Option<&Item> {
        self.result.as_ref().ok()
    }

    /// The error, if the item failed.
    #[must_use]
    pub fn error(&self) -> Option<&ScrapeflowError> {
        self.result.as_ref().err()
    }
}

/// Report of a finished run. Outcomes are in listing order.
#[derive(Debug, Clone)]
pub struct CollectionResult {
    /// Unique id of the run.
    pub run_id: Uuid,
    /// The root listing URL.
    pub url: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Wall time in milliseconds.
    pub duration_ms: f64,
    /// One outcome per anchor.
    pub outcomes: Vec<ItemOutcome>,
    /// Final counters.
    pub progress: ProgressSnapshot,
}

impl CollectionResult {
    /// Successfully extracted items, in listing order.
    #[must_use]
    pub fn items(&self) -> Vec<&Item> {
        self.outcomes.iter().filter_map(ItemOutcome::item).collect()
    }

    /// Consumes the report, keeping the extracted items.
    #[must_use]
    pub fn into_items(self) -> Vec<Item> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| outcome.result.ok())
            .collect()
    }

    /// Outcomes of failed items.
    #[must_use]
    pub fn failures(&self) -> Vec<&ItemOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    /// Returns true if every item was extracted.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(ItemOutcome::is_success)
    }

    /// JSON summary of the run.
    #[must_use]
    pub fn to_dict(&self) -> serde_json::Value {
        let outcomes: Vec<serde_json::Value> = self
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(item) => serde_json::json!({
                    "index": outcome.index,
                    "status": "ok",
                    "item": item.to_json(),
                }),
                Err(err) => serde_json::json!({
                    "index": outcome.index,
                    "status": "failed",
                    "error_type": err.kind(),
                    "error": err.to_string(),
                }),
            })
            .collect();

        serde_json::json!({
            "run_id": self.run_id.to_string(),
            "url": self.url,
            "started_at": self.started_at.to_rfc3339(),
            "finished_at": self.finished_at.to_rfc3339(),
            "duration_ms": self.duration_ms,
            "progress": self.progress,
            "outcomes": outcomes,
        })
    }
}

/// Fetches the root listing and evaluates every item concurrently.
pub struct CollectionRunner {
    collection: Collection,
    transport: Arc<dyn Transport>,
    cache: Option<Arc<dyn ResourceCache>>,
    event_sink: Arc<dyn EventSink>,
    progress: Arc<RunProgress>,
}

impl CollectionRunner {
    /// Creates a runner. Each run gets a fresh in-memory cache unless one is
    /// set with [`with_cache`](Self::with_cache).
    #[must_use]
    pub fn new(collection: Collection, transport: Arc<dyn Transport>) -> Self {
        Self {
            collection,
            transport,
            cache: None,
            event_sink: Arc::new(NoOpEventSink),
            progress: Arc::new(RunProgress::new()),
        }
    }

    /// Shares `cache` across runs.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResourceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Counters of the current or last run.
    #[must_use]
    pub fn progress(&self) -> Arc<RunProgress> {
        Arc::clone(&self.progress)
    }

    /// The compiled collection.
    #[must_use]
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Runs the collection.
    ///
    /// # Errors
    ///
    /// Fails if the root listing cannot be fetched. With
    /// [`FailureMode::FailFast`], also fails with the first item error.
    /// Otherwise item errors are reported in the outcomes.
    pub async fn run(&self) -> Result<CollectionResult, ScrapeflowError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let timer = SpanTimer::start("collection.run");
        let schema = &self.collection.schema;
        let config = &schema.config;

        self.event_sink.try_emit(
            "collection.started",
            Some(serde_json::json!({ "run_id": run_id.to_string(), "url": config.url })),
        );

        info!(url = %config.url, %run_id, "Fetching root listing");
        let listing = self.transport.fetch(&config.url).await?;

        let mut anchors = document::find_anchors(Arc::from(listing), &schema.item_selector)
            .map_err(|reason| {
                ConfigurationError::invalid_selector("item", &schema.item_selector, &reason)
            })?;
        if let Some(max_items) = config.max_items {
            anchors.truncate(max_items);
        }
        let total = anchors.len();
        info!(items = total, "Listing loaded");
        self.event_sink.try_emit(
            "collection.listing_loaded",
            Some(serde_json::json!({ "run_id": run_id.to_string(), "items": total })),
        );

        let cache = self
            .cache
            .clone()
            .unwrap_or_else(|| Arc::new(InMemoryResourceCache::new()));
        let loader = Arc::new(ResourceLoader::new(
            Arc::clone(&self.transport),
            cache,
            Arc::clone(&self.event_sink),
        ));
        let evaluator = Arc::new(ItemEvaluator::new(
            Arc::clone(&self.collection.schema),
            Arc::clone(&self.collection.graph),
            loader,
        ));
        self.progress.start(total);

        let mut tasks = FuturesUnordered::new();
        let mut abort_handles = Vec::with_capacity(total);
        for (index, anchor) in anchors.into_iter().enumerate() {
            let evaluator = Arc::clone(&evaluator);
            let sink = Arc::clone(&self.event_sink);
            let handle = tokio::spawn(async move {
                sink.try_emit("item.started", Some(serde_json::json!({ "index": index })));
                evaluator.evaluate(&anchor).await
            });
            abort_handles.push(handle.abort_handle());
            tasks.push(handle.map(move |joined| (index, joined)));
        }

        let mut slots: Vec<Option<ItemOutcome>> = (0..total).map(|_| None).collect();
        while let Some((index, joined)) = tasks.next().await {
            // A panicking collector or handler fails its own item only.
            let result = joined.unwrap_or_else(|e| {
                Err(ScrapeflowError::Internal(format!("Item task failed: {e}")))
            });

            match &result {
                Ok(_) => {
                    let completed = self.progress.record_success();
                    info!("Completed {completed}/{total}");
                    self.event_sink
                        .try_emit("item.completed", Some(serde_json::json!({ "index": index })));
                }
                Err(err) => {
                    self.progress.record_failure();
                    warn!(index, error = %err, "Item failed");
                    self.event_sink.try_emit(
                        "item.failed",
                        Some(serde_json::json!({
                            "index": index,
                            "error_type": err.kind(),
                            "error": err.to_string(),
                        })),
                    );

                    if config.failure_mode == FailureMode::FailFast {
                        for handle in &abort_handles {
                            handle.abort();
                        }
                        return Err(err.clone());
                    }
                }
            }

            slots[index] = Some(ItemOutcome { index, result });
        }

        let outcomes: Vec<ItemOutcome> = slots.into_iter().flatten().collect();
        let progress = self.progress.snapshot();
        let duration_ms = timer.finish();

        self.event_sink.try_emit(
            "collection.completed",
            Some(serde_json::json!({
                "run_id": run_id.to_string(),
                "completed": progress.completed,
                "failed": progress.failed,
                "duration_ms": duration_ms,
            })),
        );

        Ok(CollectionResult {
            run_id,
            url: config.url.clone(),
            started_at,
            finished_at: Utc::now(),
            duration_ms,
            outcomes,
            progress,
        })
    }
}

impl std::fmt::Debug for CollectionRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionRunner")
            .field("collection", &self.collection)
            .field("progress", &self.progress.snapshot())
            .finish_non_exhaustive()
    }
}

/// Compiles `schema`, runs it once and returns the extracted items in
/// listing order. Failed items are left out; use [`CollectionRunner`] for
/// per-item outcomes.
///
/// # Errors
///
/// Returns schema errors, a root listing failure, or with
/// [`FailureMode::FailFast`] the first item error.
pub async fn collect(schema: Schema, transport: Arc<dyn Transport>) -> Result<Vec<Item>, ScrapeflowError> {
    let collection = Collection::compile(schema)?;
    let result = CollectionRunner::new(collection, transport).run().await?;
    Ok(result.into_items())
}
