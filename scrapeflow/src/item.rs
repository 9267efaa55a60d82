//! The working set of one extracted record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::ExtractionError;

/// One record: field and computed values by name.
///
/// Every declared name has a slot from the start; `None` marks a value that
/// has not been produced yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Field values.
    pub fields: BTreeMap<String, Option<Value>>,
    /// Computed values.
    pub computed: BTreeMap<String, Option<Value>>,
}

impl Item {
    /// Creates an item with an unset slot for every name.
    #[must_use]
    pub fn template<'a>(
        field_names: impl IntoIterator<Item = &'a str>,
        computed_names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            fields: field_names.into_iter().map(|n| (n.to_string(), None)).collect(),
            computed: computed_names.into_iter().map(|n| (n.to_string(), None)).collect(),
        }
    }

    /// Gets a field value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).and_then(Option::as_ref)
    }

    /// Gets a computed value.
    #[must_use]
    pub fn computed(&self, name: &str) -> Option<&Value> {
        self.computed.get(name).and_then(Option::as_ref)
    }

    /// Gets a value by name, looking at fields first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).or_else(|| self.computed(name))
    }

    /// Resolves a variable: the field namespace first, then computed.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownVariable` if neither namespace declares the name
    /// and with `UnsetValue` if the value has not been produced yet.
    pub fn resolve(&self, name: &str) -> Result<&Value, ExtractionError> {
        let slot = self
            .fields
            .get(name)
            .or_else(|| self.computed.get(name))
            .ok_or_else(|| ExtractionError::unknown_variable(name))?;

        slot.as_ref().ok_or_else(|| ExtractionError::UnsetValue {
            name: name.to_string(),
        })
    }

    /// Stores a field value.
    ///
    /// # Errors
    ///
    /// Returns an error if the field was not declared.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), ExtractionError> {
        let slot = self.fields.get_mut(name).ok_or_else(|| ExtractionError::MissingSpec {
            kind: "field".to_string(),
            name: name.to_string(),
        })?;
        *slot = Some(value);
        Ok(())
    }

    /// Stores a computed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the computed value was not declared.
    pub fn set_computed(&mut self, name: &str, value: Value) -> Result<(), ExtractionError> {
        let slot = self.computed.get_mut(name).ok_or_else(|| ExtractionError::MissingSpec {
            kind: "computed".to_string(),
            name: name.to_string(),
        })?;
        *slot = Some(value);
        Ok(())
    }

    /// Returns true once every slot holds a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fields.values().chain(self.computed.values()).all(Option::is_some)
    }

    /// Flat JSON object of all values; computed entries win on name clashes.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        for (name, value) in self.fields.iter().chain(self.computed.iter()) {
            map.insert(name.clone(), value.clone().unwrap_or(Value::Null));
        }
        Value::Object(map)
    }
}
