//! The `text` collector.

use serde_json::Value;

use super::{CollectContext, Collector};
use crate::errors::CollectError;

/// Concatenates the text of every matched element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCollector {
    trim: bool,
}

impl TextCollector {
    /// Creates an untrimmed text collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strips leading and trailing whitespace from the result.
    #[must_use]
    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }
}

impl Collector for TextCollector {
    fn collect(&self, ctx: &CollectContext<'_>) -> Result<Value, CollectError> {
        let collected: String = ctx
            .targets
            .iter()
            .flat_map(|target| target.text())
            .collect();

        if self.trim {
            Ok(Value::String(collected.trim().to_string()))
        } else {
            Ok(Value::String(collected))
        }
    }
}
