//! Per-item evaluation of the dependency plan.

use scraper::{ElementRef, Html};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::cache::ResourceLoader;
use crate::collectors::CollectContext;
use crate::config::CollectionConfig;
use crate::document::{self, AnchorSnapshot};
use crate::errors::{ExtractionError, ScrapeflowError};
use crate::graph::{DependencyGraph, NodeKind};
use crate::item::Item;
use crate::schema::{ComputedInputs, FieldSpec, IndexedSchema, ResourceRef};
use crate::template;

/// Runs the evaluation plan for one anchor at a time.
///
/// Nodes are evaluated strictly in plan order; the only suspension points
/// are resource fetches. Parsed documents never outlive the synchronous
/// extraction step, so evaluation futures are `Send`.
#[derive(Debug, Clone)]
pub struct ItemEvaluator {
    schema: Arc<IndexedSchema>,
    graph: Arc<DependencyGraph>,
    loader: Arc<ResourceLoader>,
}

impl ItemEvaluator {
    /// Creates an evaluator over shared, read-only specs and a shared loader.
    #[must_use]
    pub fn new(
        schema: Arc<IndexedSchema>,
        graph: Arc<DependencyGraph>,
        loader: Arc<ResourceLoader>,
    ) -> Self {
        Self {
            schema,
            graph,
            loader,
        }
    }

    /// Evaluates every node for `anchor` and returns the populated item.
    ///
    /// # Errors
    ///
    /// Returns the first transport or extraction error; the item is
    /// discarded.
    pub async fn evaluate(&self, anchor: &AnchorSnapshot) -> Result<Item, ScrapeflowError> {
        let mut item = self.schema.new_item();

        for node in self.graph.plan() {
            trace!(kind = %node.kind, name = %node.name, "Evaluating node");
            match node.kind {
                // Fetched on demand by the fields that read them.
                NodeKind::Resource => {}
                NodeKind::Field => self.evaluate_field(&node.name, anchor, &mut item).await?,
                NodeKind::Computed => self.evaluate_computed(&node.name, &mut item)?,
            }
        }

        Ok(item)
    }

    async fn evaluate_field(
        &self,
        name: &str,
        anchor: &AnchorSnapshot,
        item: &mut Item,
    ) -> Result<(), ScrapeflowError> {
        let field = self.schema.field(name).ok_or_else(|| missing_spec("field", name))?;
        let selector = interpolate(&field.selector, item)?;
        let config = &self.schema.config;

        let value = match &field.source {
            Some(source) => {
                let url = self.resource_url(source, item)?;
                let content = self.loader.load(&url).await?;
                let page = document::parse(&content);
                extract(config, field, &page, document::body(&page), &selector)?
            }
            None => {
                let snapshot = anchor.parse();
                extract(config, field, snapshot.html(), snapshot.anchor(), &selector)?
            }
        };

        item.set_field(name, value)?;
        Ok(())
    }

    fn evaluate_computed(&self, name: &str, item: &mut Item) -> Result<(), ScrapeflowError> {
        let spec = self
            .schema
            .computed_spec(name)
            .ok_or_else(|| missing_spec("computed", name))?;

        let mut inputs = ComputedInputs::new();
        for dependency in &spec.depends_on {
            inputs.insert(dependency.clone(), item.resolve(dependency)?.clone());
        }

        let value = spec
            .handler
            .handle(&inputs)
            .map_err(|e| ExtractionError::handler(name, e))?;
        item.set_computed(name, value)?;
        Ok(())
    }

    /// Fills the resource URL from the item's current values. Missing
    /// optional parameters become empty.
    fn resource_url(&self, source: &ResourceRef, item: &Item) -> Result<String, ExtractionError> {
        let resource = self
            .schema
            .resources
            .get(&source.name)
            .ok_or_else(|| missing_spec("resource", &source.name))?;

        let mut args = HashMap::with_capacity(source.args.len());
        for (param, arg) in &source.args {
            args.insert(param.clone(), interpolate(arg, item)?);
        }

        Ok(resource.fill_url(&args))
    }
}

fn missing_spec(kind: &str, name: &str) -> ExtractionError {
    ExtractionError::MissingSpec {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

/// Substitutes `$name` references with the item's values, fields first.
fn interpolate(text: &str, item: &Item) -> Result<String, ExtractionError> {
    template::substitute(text, |name| item.resolve(name).map(template::value_as_text))
}

fn extract(
    config: &CollectionConfig,
    field: &FieldSpec,
    document: &Html,
    scope: ElementRef<'_>,
    selector: &str,
) -> Result<Value, ExtractionError> {
    let targets = document::select_targets(scope, selector).map_err(|reason| {
        ExtractionError::InvalidSelector {
            field: field.name.clone(),
            selector: selector.to_string(),
            reason,
        }
    })?;

    let ctx = CollectContext {
        config,
        document,
        scope,
        targets: &targets,
    };
    let value = field
        .collector
        .collect(&ctx)
        .map_err(|e| ExtractionError::collector(&field.name, e))?;

    match &field.filter {
        Some(filter) => filter(value).map_err(|e| ExtractionError::collector(&field.name, e)),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryResourceCache;
    use crate::collectors;
    use crate::events::NoOpEventSink;
    use crate::graph::DependencyGraphBuilder;
    use crate::schema::{ComputedSpec, ItemSchema, Schema, SchemaIndexer};
    use crate::testing::StaticTransport;
    use serde_json::json;

    fn evaluator(item: ItemSchema, transport: StaticTransport) -> (ItemEvaluator, Arc<StaticTransport>) {
        let schema = Arc::new(SchemaIndexer::index(Schema::new("https://x/chart", item)).unwrap());
        let graph = Arc::new(DependencyGraphBuilder::build(&schema).unwrap());
        let transport = Arc::new(transport);
        let loader = Arc::new(ResourceLoader::new(
            transport.clone(),
            Arc::new(InMemoryResourceCache::new()),
            Arc::new(NoOpEventSink),
        ));
        (ItemEvaluator::new(schema, graph, loader), transport)
    }

    fn anchor(html: &str, selector: &str) -> AnchorSnapshot {
        document::find_anchors(Arc::from(html), selector).unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_arguments_use_values_of_the_same_item() {
        let (evaluator, transport) = evaluator(
            ItemSchema::new("li")
                .resource("search", "https://x/find/:q/:page?")
                .fields(|r| {
                    Ok(vec![
                        FieldSpec::new("slug", "", collectors::attr("data-slug")),
                        FieldSpec::new("hits", ".count", collectors::text_trimmed())
                            .from_resource(r.resource("search", ["${slug}-film"])?),
                    ])
                }),
            StaticTransport::new()
                .with_page("https://x/find/heat-film/", "<span class=\"count\"> 7 </span>"),
        );

        let item = evaluator
            .evaluate(&anchor("<ul><li data-slug=\"heat\">Heat</li></ul>", "li"))
            .await
            .unwrap();

        assert_eq!(item.field("hits"), Some(&json!("7")));
        assert_eq!(transport.fetched_urls(), vec!["https://x/find/heat-film/"]);
    }

    #[tokio::test]
    async fn test_templated_selector() {
        let (evaluator, _) = evaluator(
            ItemSchema::new("tr").fields(|_| {
                Ok(vec![
                    FieldSpec::new("kind", "", collectors::attr("data-kind")),
                    FieldSpec::new("label", ".${kind}_label", collectors::text()),
                ])
            }),
            StaticTransport::new(),
        );

        let html = "<table><tr data-kind=\"movie\"><td class=\"movie_label\">Film</td>\
                    <td class=\"show_label\">Show</td></tr></table>";
        let item = evaluator.evaluate(&anchor(html, "tr")).await.unwrap();

        assert_eq!(item.field("label"), Some(&json!("Film")));
    }

    #[tokio::test]
    async fn test_filter_and_computed() {
        let (evaluator, _) = evaluator(
            ItemSchema::new("li")
                .fields(|_| {
                    Ok(vec![FieldSpec::new("year", ".year", collectors::text_trimmed())
                        .with_filter(|v| {
                            let text = v.as_str().unwrap_or_default().trim_matches(['(', ')']);
                            text.parse::<i64>()
                                .map(Value::from)
                                .map_err(|e| crate::errors::CollectError::new(e.to_string()))
                        })])
                })
                .computed(ComputedSpec::new("decade", ["year"], |inputs| {
                    let year = inputs.get("year").and_then(Value::as_i64).unwrap_or_default();
                    Ok(Value::from(year / 10 * 10))
                })),
            StaticTransport::new(),
        );

        let item = evaluator
            .evaluate(&anchor("<ul><li><span class=\"year\">(1999)</span></li></ul>", "li"))
            .await
            .unwrap();

        assert_eq!(item.field("year"), Some(&json!(1999)));
        assert_eq!(item.computed("decade"), Some(&json!(1990)));
        assert!(item.is_complete());
    }

    #[tokio::test]
    async fn test_transport_failure_fails_the_item() {
        let (evaluator, _) = evaluator(
            ItemSchema::new("li")
                .resource("page", "https://x/:id")
                .fields(|r| {
                    Ok(vec![
                        FieldSpec::new("id", "", collectors::attr("id")),
                        FieldSpec::new("body", "p", collectors::text())
                            .from_resource(r.resource("page", ["$id"])?),
                    ])
                }),
            StaticTransport::new().with_failure("https://x/a1", "connection reset"),
        );

        let err = evaluator
            .evaluate(&anchor("<ul><li id=\"a1\">x</li></ul>", "li"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "TransportError");
    }

    #[test]
    fn test_evaluate_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let (evaluator, _) = evaluator(ItemSchema::new("li"), StaticTransport::new());
        let snapshot = anchor("<ul><li>x</li></ul>", "li");
        let future = evaluator.evaluate(&snapshot);
        assert_send(&future);
    }
}
