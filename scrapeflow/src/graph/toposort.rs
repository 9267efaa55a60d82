//! Depth-first topological sort with cycle reporting.

use std::collections::{HashMap, HashSet};

/// Outcome of a topological sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopoSort {
    /// Every edge's source precedes its target.
    Sorted(Vec<String>),
    /// The graph has a cycle through `node`.
    Cycle {
        /// The node found on the current path a second time.
        node: String,
    },
}

/// Sorts `nodes` so that for every edge `(from, to)`, `from` comes before
/// `to`. Nodes are visited in the order given, which makes the result
/// deterministic.
#[must_use]
pub fn topological_sort(nodes: &[String], edges: &[(String, String)]) -> TopoSort {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for (from, to) in edges {
        adjacency.entry(from.as_str()).or_default().push(to.as_str());
    }

    let mut visited = HashSet::new();
    let mut on_path = HashSet::new();
    let mut post_order = Vec::with_capacity(nodes.len());

    for node in nodes {
        if let Err(node) = visit(node, &adjacency, &mut visited, &mut on_path, &mut post_order) {
            return TopoSort::Cycle { node };
        }
    }

    post_order.reverse();
    TopoSort::Sorted(post_order)
}

fn visit<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    on_path: &mut HashSet<&'a str>,
    post_order: &mut Vec<String>,
) -> Result<(), String> {
    if visited.contains(node) {
        return Ok(());
    }
    if !on_path.insert(node) {
        return Err(node.to_string());
    }

    if let Some(targets) = adjacency.get(node) {
        for &target in targets {
            visit(target, adjacency, visited, on_path, post_order)?;
        }
    }

    on_path.remove(node);
    visited.insert(node);
    post_order.push(node.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn edges(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_sources_precede_targets() {
        let nodes = names(&["description", "id", "link", "itemPage"]);
        let edges = edges(&[
            ("description", "id"),
            ("description", "itemPage"),
            ("id", "link"),
        ]);

        let TopoSort::Sorted(order) = topological_sort(&nodes, &edges) else {
            panic!("expected a sorted order");
        };

        assert_eq!(order.len(), 4);
        for (from, to) in &edges {
            assert!(position(&order, from) < position(&order, to));
        }
    }

    #[test]
    fn test_deterministic() {
        let nodes = names(&["a", "b", "c"]);
        let first = topological_sort(&nodes, &[]);
        let second = topological_sort(&nodes, &[]);
        assert_eq!(first, second);
        assert_eq!(first, TopoSort::Sorted(names(&["c", "b", "a"])));
    }

    #[test]
    fn test_cycle_is_reported() {
        let nodes = names(&["a", "b", "c"]);
        let result = topological_sort(&nodes, &edges(&[("a", "b"), ("b", "a"), ("c", "a")]));
        assert_eq!(result, TopoSort::Cycle { node: "a".to_string() });
    }

    #[test]
    fn test_self_loop() {
        let nodes = names(&["a"]);
        let result = topological_sort(&nodes, &edges(&[("a", "a")]));
        assert_eq!(result, TopoSort::Cycle { node: "a".to_string() });
    }
}
