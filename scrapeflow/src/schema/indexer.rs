//! Normalizes a caller schema into indexed specifications.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::{ComputedSpec, FieldSpec, ResourceTable, Schema};
use crate::config::CollectionConfig;
use crate::errors::ConfigurationError;
use crate::item::Item;

/// A schema after indexing: specs by name plus the empty item template.
#[derive(Debug, Clone)]
pub struct IndexedSchema {
    /// Run configuration.
    pub config: CollectionConfig,
    /// Selector locating the item anchors.
    pub item_selector: String,
    /// Indexed resources.
    pub resources: ResourceTable,
    fields: Vec<FieldSpec>,
    field_index: HashMap<String, usize>,
    computed: Vec<ComputedSpec>,
    computed_index: HashMap<String, usize>,
    template: Item,
}

impl IndexedSchema {
    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.field_index.get(name).map(|&i| &self.fields[i])
    }

    /// Computed values in declaration order.
    #[must_use]
    pub fn computed(&self) -> &[ComputedSpec] {
        &self.computed
    }

    /// Looks up a computed value.
    #[must_use]
    pub fn computed_spec(&self, name: &str) -> Option<&ComputedSpec> {
        self.computed_index.get(name).map(|&i| &self.computed[i])
    }

    /// Returns true if `name` is a field or computed value.
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.field_index.contains_key(name) || self.computed_index.contains_key(name)
    }

    /// A fresh item with every slot unset.
    #[must_use]
    pub fn new_item(&self) -> Item {
        self.template.clone()
    }
}

/// Turns a [`Schema`] into an [`IndexedSchema`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaIndexer;

impl SchemaIndexer {
    /// Indexes resources, then fields (through the schema's factory), then
    /// computed values.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed templates, unknown resource
    /// references, bad resource arguments and duplicate names.
    pub fn index(schema: Schema) -> Result<IndexedSchema, ConfigurationError> {
        let Schema { config, item } = schema;
        let mut seen: HashSet<String> = HashSet::new();

        debug!(count = item.resources.len(), "Indexing resources");
        let resources = ResourceTable::from_definitions(&item.resources)?;
        for spec in resources.iter() {
            seen.insert(spec.name.clone());
        }

        debug!("Indexing fields");
        let fields = (item.fields)(&resources)?;
        let mut field_index = HashMap::new();
        for (i, field) in fields.iter().enumerate() {
            if !seen.insert(field.name.clone()) {
                return Err(ConfigurationError::duplicate_name(&field.name));
            }
            field_index.insert(field.name.clone(), i);
        }

        debug!(count = item.computed.len(), "Indexing computed");
        let mut computed_index = HashMap::new();
        for (i, computed) in item.computed.iter().enumerate() {
            if !seen.insert(computed.name.clone()) {
                return Err(ConfigurationError::duplicate_name(&computed.name));
            }
            computed_index.insert(computed.name.clone(), i);
        }

        let template = Item::template(
            fields.iter().map(|f| f.name.as_str()),
            item.computed.iter().map(|c| c.name.as_str()),
        );

        Ok(IndexedSchema {
            config,
            item_selector: item.selector,
            resources,
            fields,
            field_index,
            computed: item.computed,
            computed_index,
            template,
        })
    }
}
