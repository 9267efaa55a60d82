//! The `attribute` collector.

use serde_json::Value;
use url::Url;

use super::{CollectContext, Collector};
use crate::errors::CollectError;

/// Reads an attribute of the first matched element.
///
/// `href` values are resolved against the collection URL unless
/// [`keep_relative`](Self::keep_relative) is set; any other attribute is
/// resolved only when [`force_absolute`](Self::force_absolute) is set. A
/// missing attribute collects `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrCollector {
    attribute: String,
    extend_links: bool,
    force_link_extension: bool,
}

impl AttrCollector {
    /// Creates a collector for `attribute`.
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            extend_links: true,
            force_link_extension: false,
        }
    }

    /// Leaves `href` values exactly as written.
    #[must_use]
    pub fn keep_relative(mut self) -> Self {
        self.extend_links = false;
        self
    }

    /// Resolves the attribute to an absolute URL whatever its name.
    #[must_use]
    pub fn force_absolute(mut self) -> Self {
        self.force_link_extension = true;
        self
    }

    fn resolves_links(&self) -> bool {
        (self.attribute == "href" && self.extend_links) || self.force_link_extension
    }
}

impl Collector for AttrCollector {
    fn collect(&self, ctx: &CollectContext<'_>) -> Result<Value, CollectError> {
        let Some(raw) = ctx
            .first_target()
            .and_then(|target| target.value().attr(&self.attribute))
        else {
            return Ok(Value::Null);
        };

        if !self.resolves_links() {
            return Ok(Value::String(raw.to_string()));
        }

        let base = Url::parse(&ctx.config.url)
            .map_err(|e| CollectError::new(format!("invalid base URL {}: {e}", ctx.config.url)))?;
        let absolute = base
            .join(raw)
            .map_err(|e| CollectError::new(format!("cannot resolve \"{raw}\": {e}")))?;

        Ok(Value::String(absolute.to_string()))
    }
}
