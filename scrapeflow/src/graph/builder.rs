//! Builds the evaluation plan of an indexed schema.

use std::collections::HashMap;
use tracing::debug;

use super::{topological_sort, DependencyNode, NodeKind, TopoSort};
use crate::errors::{ConfigurationError, CyclicDependencyError, ScrapeflowError};
use crate::schema::IndexedSchema;
use crate::template;

/// Nodes plus the order in which they are evaluated.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    index: HashMap<String, usize>,
    order: Vec<String>,
}

impl DependencyGraph {
    /// Sorts `nodes`, which must be in declaration order.
    ///
    /// # Errors
    ///
    /// Fails with a `ConfigurationError` on duplicate names or unknown
    /// dependencies, and with a `CyclicDependencyError` if the nodes form a
    /// cycle.
    pub fn from_nodes(nodes: Vec<DependencyNode>) -> Result<Self, ScrapeflowError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.name.clone(), i).is_some() {
                return Err(ConfigurationError::duplicate_name(&node.name).into());
            }
        }

        let mut edges = Vec::new();
        for node in &nodes {
            for dependency in &node.depends_on {
                if !index.contains_key(dependency) {
                    return Err(ConfigurationError::unknown_dependency(&node.name, dependency).into());
                }
                edges.push((node.name.clone(), dependency.clone()));
            }
        }

        let names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();
        let mut order = match topological_sort(&names, &edges) {
            TopoSort::Sorted(order) => order,
            TopoSort::Cycle { node } => return Err(CyclicDependencyError::new(node).into()),
        };
        // Dependents come first out of the sort.
        order.reverse();

        Ok(Self { nodes, index, order })
    }

    /// Nodes in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[DependencyNode] {
        &self.nodes
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&DependencyNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Node names, every one after all of its dependencies.
    #[must_use]
    pub fn evaluation_order(&self) -> &[String] {
        &self.order
    }

    /// Nodes in evaluation order.
    pub fn plan(&self) -> impl Iterator<Item = &DependencyNode> {
        self.order.iter().filter_map(|name| self.node(name))
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Derives dependency edges from an indexed schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyGraphBuilder;

impl DependencyGraphBuilder {
    /// Builds the graph.
    ///
    /// # Errors
    ///
    /// See [`DependencyGraph::from_nodes`].
    pub fn build(schema: &IndexedSchema) -> Result<DependencyGraph, ScrapeflowError> {
        let nodes = Self::nodes(schema);
        debug!(nodes = nodes.len(), "Building dependency graph");
        DependencyGraph::from_nodes(nodes)
    }

    /// The nodes of `schema`: resources, then fields, then computed values.
    ///
    /// A field depends on the variables of its selector and argument
    /// templates plus its source resource. A computed value depends on
    /// exactly what it declares.
    #[must_use]
    pub fn nodes(schema: &IndexedSchema) -> Vec<DependencyNode> {
        let resources = schema
            .resources
            .iter()
            .map(|resource| DependencyNode::new(NodeKind::Resource, &resource.name));

        let fields = schema.fields().iter().map(|field| {
            let mut node = DependencyNode::new(NodeKind::Field, &field.name)
                .with_dependencies(template::extract_variables(&field.selector));
            if let Some(source) = &field.source {
                for arg in source.args.values() {
                    node = node.with_dependencies(template::extract_variables(arg));
                }
                node = node.with_dependency(&source.name);
            }
            node
        });

        let computed = schema.computed().iter().map(|computed| {
            DependencyNode::new(NodeKind::Computed, &computed.name)
                .with_dependencies(computed.depends_on.iter().cloned())
        });

        resources.chain(fields).chain(computed).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors;
    use crate::schema::{ComputedSpec, FieldSpec, ItemSchema, Schema, SchemaIndexer};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn index(item: ItemSchema) -> IndexedSchema {
        SchemaIndexer::index(Schema::new("https://x/", item)).unwrap()
    }

    fn chart() -> IndexedSchema {
        index(
            ItemSchema::new("tr")
                .resource("itemPage", "https://x/:id")
                .fields(|r| {
                    Ok(vec![
                        FieldSpec::new("description", ".summary", collectors::text())
                            .from_resource(r.resource("itemPage", ["$id"])?),
                        FieldSpec::new("link", "a", collectors::attr("href")),
                    ])
                })
                .computed(ComputedSpec::new("id", ["link"], |_| Ok(Value::Null))),
        )
    }

    #[test]
    fn test_field_and_computed_edges() {
        let nodes = DependencyGraphBuilder::nodes(&chart());

        assert_eq!(
            nodes,
            vec![
                DependencyNode::new(NodeKind::Resource, "itemPage"),
                DependencyNode::new(NodeKind::Field, "description")
                    .with_dependencies(["id", "itemPage"]),
                DependencyNode::new(NodeKind::Field, "link"),
                DependencyNode::new(NodeKind::Computed, "id").with_dependency("link"),
            ]
        );
    }

    #[test]
    fn test_every_node_after_its_dependencies() {
        let graph = DependencyGraphBuilder::build(&chart()).unwrap();
        let order = graph.evaluation_order();
        let position = |name: &str| order.iter().position(|n| n == name).unwrap();

        assert_eq!(order.len(), graph.len());
        for node in graph.nodes() {
            for dependency in &node.depends_on {
                assert!(position(dependency) < position(&node.name));
            }
        }
        assert_eq!(order, ["itemPage", "link", "id", "description"]);
    }

    #[test]
    fn test_plan_follows_order() {
        let graph = DependencyGraphBuilder::build(&chart()).unwrap();
        let kinds: Vec<NodeKind> = graph.plan().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Resource, NodeKind::Field, NodeKind::Computed, NodeKind::Field]
        );
    }

    #[test]
    fn test_field_computed_cycle() {
        let schema = index(
            ItemSchema::new("tr")
                .fields(|_| Ok(vec![FieldSpec::new("title", ".t-$slug", collectors::text())]))
                .computed(ComputedSpec::new("slug", ["title"], |_| Ok(Value::Null))),
        );

        let err = DependencyGraphBuilder::build(&schema).unwrap_err();
        match err {
            ScrapeflowError::CyclicDependency(e) => {
                assert!(e.node == "title" || e.node == "slug");
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_dependency() {
        let schema = index(
            ItemSchema::new("tr")
                .fields(|_| Ok(vec![FieldSpec::new("title", ".t-$nope", collectors::text())])),
        );

        let err = DependencyGraphBuilder::build(&schema).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_duplicate_node() {
        let err = DependencyGraph::from_nodes(vec![
            DependencyNode::new(NodeKind::Field, "a"),
            DependencyNode::new(NodeKind::Computed, "a"),
        ])
        .unwrap_err();
        assert!(err.is_schema_error());
    }
}
