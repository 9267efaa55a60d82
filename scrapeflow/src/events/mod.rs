//! Event sink system for observability.
//!
//! Runners report their progress through an injected [`EventSink`]. Event
//! names used by the engine:
//!
//! - `collection.started`, `collection.listing_loaded`, `collection.completed`
//! - `item.started`, `item.completed`, `item.failed`
//! - `resource.cache_hit`, `resource.fetched`

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};
