//! Declarative extraction schemas.
//!
//! This module provides:
//! - The caller-facing [`Schema`] / [`ItemSchema`] input
//! - Resource, field and computed specifications
//! - The [`SchemaIndexer`] that normalizes a schema
//! - The [`SchemaValidator`] that rejects inconsistent schemas before any I/O

mod computed;
mod field;
mod indexer;
mod resource;
mod validation;

pub use computed::{ComputedHandler, ComputedInputs, ComputedSpec};
pub use field::{FieldSpec, FilterFn};
pub use indexer::{IndexedSchema, SchemaIndexer};
pub use resource::{
    ResourceArgs, ResourceDefinition, ResourceParam, ResourceRef, ResourceSpec, ResourceTable,
};
pub use validation::SchemaValidator;

use crate::config::CollectionConfig;
use crate::errors::ConfigurationError;

/// Produces the field specifications once resources are indexed. The
/// [`ResourceTable`] is how fields bind to resources.
pub type FieldFactory =
    Box<dyn FnOnce(&ResourceTable) -> Result<Vec<FieldSpec>, ConfigurationError> + Send>;

/// What to extract for every item of the listing.
pub struct ItemSchema {
    /// Selector locating the item anchors in the root listing.
    pub selector: String,
    /// Field factory.
    pub fields: FieldFactory,
    /// Computed values in declaration order.
    pub computed: Vec<ComputedSpec>,
    /// Resources in declaration order.
    pub resources: Vec<ResourceDefinition>,
}

impl ItemSchema {
    /// Creates an item schema without fields, computed values or resources.
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            fields: Box::new(|_| Ok(Vec::new())),
            computed: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Declares a resource.
    #[must_use]
    pub fn resource(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.resources.push(ResourceDefinition::new(name, url));
        self
    }

    /// Sets the field factory.
    #[must_use]
    pub fn fields<F>(mut self, factory: F) -> Self
    where
        F: FnOnce(&ResourceTable) -> Result<Vec<FieldSpec>, ConfigurationError> + Send + 'static,
    {
        self.fields = Box::new(factory);
        self
    }

    /// Declares a computed value.
    #[must_use]
    pub fn computed(mut self, spec: ComputedSpec) -> Self {
        self.computed.push(spec);
        self
    }
}

impl std::fmt::Debug for ItemSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemSchema")
            .field("selector", &self.selector)
            .field("computed", &self.computed)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

/// A complete extraction schema: where the listing lives and what to take
/// from each of its items.
#[derive(Debug)]
pub struct Schema {
    /// Run configuration; `config.url` is the root listing.
    pub config: CollectionConfig,
    /// Per-item extraction.
    pub item: ItemSchema,
}

impl Schema {
    /// Creates a schema for the listing at `url` with default settings.
    #[must_use]
    pub fn new(url: impl Into<String>, item: ItemSchema) -> Self {
        Self {
            config: CollectionConfig::new(url),
            item,
        }
    }

    /// Replaces the run configuration.
    #[must_use]
    pub fn with_config(mut self, config: CollectionConfig) -> Self {
        self.config = config;
        self
    }

    /// The root listing URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.config.url
    }
}
