//! Field specifications.

use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

use super::ResourceRef;
use crate::collectors::Collector;
use crate::errors::CollectError;

/// Post-processing applied to a collected value.
pub type FilterFn = Arc<dyn Fn(Value) -> Result<Value, CollectError> + Send + Sync>;

/// A value extracted from a document through a selector and a collector.
#[derive(Clone)]
pub struct FieldSpec {
    /// Unique name of the field.
    pub name: String,
    /// Selector applied to the scope; may contain `$variables`. An empty
    /// selector targets the scope element itself.
    pub selector: String,
    /// Resource the field is read from instead of the item anchor.
    pub source: Option<ResourceRef>,
    /// Turns the matched elements into a value.
    pub collector: Arc<dyn Collector>,
    /// Optional post-processing of the collected value.
    pub filter: Option<FilterFn>,
}

impl FieldSpec {
    /// Creates a field read from the item anchor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        selector: impl Into<String>,
        collector: Arc<dyn Collector>,
    ) -> Self {
        Self {
            name: name.into(),
            selector: selector.into(),
            source: None,
            collector,
            filter: None,
        }
    }

    /// Reads the field from a resource document.
    #[must_use]
    pub fn from_resource(mut self, source: ResourceRef) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the filter.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Value) -> Result<Value, CollectError> + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Returns true if the field is read from a resource.
    #[must_use]
    pub fn is_sourced(&self) -> bool {
        self.source.is_some()
    }
}

impl Debug for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("selector", &self.selector)
            .field("source", &self.source)
            .field("collector", &self.collector)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors;
    use std::collections::BTreeMap;

    #[test]
    fn test_field_builder() {
        let source = ResourceRef {
            name: "itemPage".to_string(),
            args: BTreeMap::from([("id".to_string(), "$id".to_string())]),
        };
        let field = FieldSpec::new("description", ".summary_text", collectors::text_trimmed())
            .from_resource(source.clone())
            .with_filter(|v| Ok(v));

        assert!(field.is_sourced());
        assert_eq!(field.source, Some(source));
        assert!(field.filter.is_some());
        assert!(format!("{field:?}").contains("description"));
    }
}
