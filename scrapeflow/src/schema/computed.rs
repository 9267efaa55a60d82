//! Computed value specifications.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::errors::CollectError;

/// The named values a computed handler receives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedInputs {
    values: BTreeMap<String, Value>,
}

impl ComputedInputs {
    /// Creates an empty input set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Gets an input by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Gets a string input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is missing or not a string.
    pub fn str(&self, name: &str) -> Result<&str, CollectError> {
        match self.values.get(name) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(CollectError::new(format!(
                "input \"{name}\" is not a string: {other}"
            ))),
            None => Err(CollectError::new(format!("input \"{name}\" is missing"))),
        }
    }

    /// Number of inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A pure function from named inputs to a value.
pub trait ComputedHandler: Send + Sync {
    /// Computes the value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be derived from the inputs.
    fn handle(&self, inputs: &ComputedInputs) -> Result<Value, CollectError>;
}

impl<F> ComputedHandler for F
where
    F: Fn(&ComputedInputs) -> Result<Value, CollectError> + Send + Sync,
{
    fn handle(&self, inputs: &ComputedInputs) -> Result<Value, CollectError> {
        self(inputs)
    }
}

/// A value derived from other fields and computed values.
#[derive(Clone)]
pub struct ComputedSpec {
    /// Unique name of the computed value.
    pub name: String,
    /// Names whose values are passed to the handler, in order.
    pub depends_on: Vec<String>,
    /// The derivation.
    pub handler: Arc<dyn ComputedHandler>,
}

impl ComputedSpec {
    /// Creates a computed specification from a closure.
    pub fn new<I, S, F>(name: impl Into<String>, depends_on: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&ComputedInputs) -> Result<Value, CollectError> + Send + Sync + 'static,
    {
        Self::with_handler(name, depends_on, Arc::new(handler))
    }

    /// Creates a computed specification from a handler object.
    pub fn with_handler<I, S>(
        name: impl Into<String>,
        depends_on: I,
        handler: Arc<dyn ComputedHandler>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            depends_on: depends_on.into_iter().map(Into::into).collect(),
            handler,
        }
    }
}

impl Debug for ComputedSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputedSpec")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_handler() {
        let spec = ComputedSpec::new("shout", ["title"], |inputs| {
            Ok(Value::String(inputs.str("title")?.to_uppercase()))
        });

        let mut inputs = ComputedInputs::new();
        inputs.insert("title", Value::String("heat".into()));

        assert_eq!(spec.depends_on, vec!["title"]);
        assert_eq!(spec.handler.handle(&inputs).unwrap(), Value::String("HEAT".into()));
    }

    #[test]
    fn test_inputs_str_errors() {
        let mut inputs = ComputedInputs::new();
        inputs.insert("rank", Value::from(3));

        assert!(inputs.str("rank").is_err());
        assert!(inputs.str("missing").is_err());
        assert_eq!(inputs.len(), 1);
    }
}
