//! Collectors turn the elements matched by a field's selector into a value.
//!
//! This module provides:
//! - The [`Collector`] trait and the [`CollectContext`] it receives
//! - [`FnCollector`] for closures
//! - The reference `text` and `attribute` collectors

mod attr;
mod text;

pub use attr::AttrCollector;
pub use text::TextCollector;

use scraper::{ElementRef, Html};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

use crate::config::CollectionConfig;
use crate::errors::CollectError;

/// Everything a collector may look at.
#[derive(Debug, Clone, Copy)]
pub struct CollectContext<'a> {
    /// Run configuration; `config.url` is the base for relative links.
    pub config: &'a CollectionConfig,
    /// The document the field is extracted from.
    pub document: &'a Html,
    /// The element the selector was applied to (the item anchor, or the
    /// `body` of a fetched resource).
    pub scope: ElementRef<'a>,
    /// Elements matched by the selector, in document order.
    pub targets: &'a [ElementRef<'a>],
}

impl<'a> CollectContext<'a> {
    /// The first matched element, if any.
    #[must_use]
    pub fn first_target(&self) -> Option<ElementRef<'a>> {
        self.targets.first().copied()
    }
}

/// Trait for pluggable collectors.
///
/// Collection is synchronous; collectors must not block on I/O.
pub trait Collector: Send + Sync + Debug {
    /// Produces the field value from the matched elements.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be produced.
    fn collect(&self, ctx: &CollectContext<'_>) -> Result<Value, CollectError>;
}

/// A closure-based collector.
pub struct FnCollector<F>
where
    F: Fn(&CollectContext<'_>) -> Result<Value, CollectError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnCollector<F>
where
    F: Fn(&CollectContext<'_>) -> Result<Value, CollectError> + Send + Sync,
{
    /// Creates a new closure-based collector.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnCollector<F>
where
    F: Fn(&CollectContext<'_>) -> Result<Value, CollectError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCollector")
            .field("name", &self.name)
            .finish()
    }
}

impl<F> Collector for FnCollector<F>
where
    F: Fn(&CollectContext<'_>) -> Result<Value, CollectError> + Send + Sync,
{
    fn collect(&self, ctx: &CollectContext<'_>) -> Result<Value, CollectError> {
        (self.func)(ctx)
    }
}

/// Text of all matched elements, untrimmed.
#[must_use]
pub fn text() -> Arc<dyn Collector> {
    Arc::new(TextCollector::new())
}

/// Text of all matched elements with surrounding whitespace removed.
#[must_use]
pub fn text_trimmed() -> Arc<dyn Collector> {
    Arc::new(TextCollector::new().trimmed())
}

/// An attribute of the first matched element. `href` values are made
/// absolute against the collection URL.
#[must_use]
pub fn attr(attribute: impl Into<String>) -> Arc<dyn Collector> {
    Arc::new(AttrCollector::new(attribute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    #[test]
    fn test_fn_collector() {
        let config = CollectionConfig::new("https://example.com/");
        let document = Html::parse_document("<ul><li>a</li><li>b</li></ul>");
        let scope = document.root_element();
        let selector = Selector::parse("li").unwrap();
        let targets: Vec<_> = scope.select(&selector).collect();

        let collector = FnCollector::new("count", |ctx| Ok(Value::from(ctx.targets.len())));
        let ctx = CollectContext {
            config: &config,
            document: &document,
            scope,
            targets: &targets,
        };

        assert_eq!(collector.collect(&ctx).unwrap(), Value::from(2));
        assert_eq!(ctx.first_target().unwrap().inner_html(), "a");
        assert!(format!("{collector:?}").contains("count"));
    }
}
