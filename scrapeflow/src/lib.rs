//! # Scrapeflow
//!
//! Dependency-ordered extraction of structured records from linked
//! documents.
//!
//! A schema declares:
//!
//! - **Resources**: named URL templates such as `https://example.com/title/:id`
//! - **Fields**: values read through a selector and a collector, either from
//!   the item anchor or from a resource
//! - **Computed values**: pure functions of other fields and computed values
//!
//! Fields and resource arguments reference other values as `$name` or
//! `${name}`. The schema is indexed, ordered and validated before anything
//! is fetched; each item of the root listing is then evaluated concurrently,
//! sharing one resource cache per run.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use scrapeflow::prelude::*;
//!
//! let schema = Schema::new(
//!     "https://example.com/chart",
//!     ItemSchema::new(".chart tbody tr")
//!         .resource("itemPage", "https://example.com/:id")
//!         .fields(|r| {
//!             Ok(vec![
//!                 FieldSpec::new("link", ".titleColumn a", collectors::attr("href")),
//!                 FieldSpec::new("description", ".summary_text", collectors::text_trimmed())
//!                     .from_resource(r.resource("itemPage", ["$id"])?),
//!             ])
//!         })
//!         .computed(ComputedSpec::new("id", ["link"], extract_id)),
//! );
//!
//! let collection = Collection::compile(schema)?;
//! let result = CollectionRunner::new(collection, transport).run().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cache;
pub mod collectors;
pub mod config;
pub mod document;
pub mod errors;
pub mod events;
pub mod graph;
pub mod item;
pub mod observability;
pub mod runner;
pub mod schema;
pub mod template;
pub mod testing;
pub mod transport;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{InMemoryResourceCache, ResourceCache, ResourceLoader};
    pub use crate::collectors::{
        self, AttrCollector, CollectContext, Collector, FnCollector, TextCollector,
    };
    pub use crate::config::{CollectionConfig, FailureMode, FetchConfig};
    pub use crate::errors::{
        CollectError, ConfigurationError, ContractErrorInfo, CyclicDependencyError,
        ExtractionError, ScrapeflowError, TransportError,
    };
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent,
    };
    pub use crate::graph::{DependencyGraph, DependencyGraphBuilder, DependencyNode, NodeKind};
    pub use crate::item::Item;
    pub use crate::observability::{init_tracing, LogFormat, SpanTimer};
    pub use crate::runner::{
        collect, Collection, CollectionResult, CollectionRunner, ItemEvaluator, ItemOutcome,
    };
    pub use crate::schema::{
        ComputedInputs, ComputedSpec, FieldSpec, ItemSchema, ResourceArgs, ResourceTable, Schema,
    };
    #[cfg(feature = "http")]
    pub use crate::transport::HttpTransport;
    pub use crate::transport::Transport;
}
