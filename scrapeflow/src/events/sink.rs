//! Event sink trait and implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, Level};

/// Trait for event sinks that can receive events.
///
/// Sinks receive the run and item lifecycle events of a collection run.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    ///
    /// # Arguments
    ///
    /// * `event_type` - The type of event (e.g., "item.completed")
    /// * `data` - Optional event data
    async fn emit(&self, event_type: &str, data: Option<Value>);

    /// Tries to emit an event without blocking.
    ///
    /// Implementations must not panic; delivery failures are dropped.
    fn try_emit(&self, event_type: &str, data: Option<Value>);
}

/// A no-op event sink that discards all events.
///
/// Used by runners that were not given a sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event_type: &str, data: Option<&Value>) {
        if self.level == Level::DEBUG {
            debug!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        } else {
            info!(event_type = %event_type, event_data = ?data, "Event: {}", event_type);
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.log_event(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.log_event(event_type, data.as_ref());
    }
}

/// An event captured by [`CollectingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Event name, e.g. `item.completed`.
    pub event_type: String,
    /// Payload as emitted.
    pub data: Option<Value>,
    /// When the sink received the event.
    pub recorded_at: DateTime<Utc>,
}

impl RecordedEvent {
    /// Reads `key` from an object payload.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }
}

/// Records every event in emission order. Meant for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.read().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Forgets every recorded event.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Event names in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.event_type.clone()).collect()
    }

    /// Events whose name starts with `prefix`, e.g. `item.` or `resource.fetched`.
    #[must_use]
    pub fn events_of_type(&self, prefix: &str) -> Vec<RecordedEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// How many events start with `prefix`.
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type.starts_with(prefix))
            .count()
    }

    fn record(&self, event_type: &str, data: Option<Value>) {
        self.events.write().push(RecordedEvent {
            event_type: event_type.to_string(),
            data,
            recorded_at: Utc::now(),
        });
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data);
    }
}
