//! Dependency graph across resources, fields and computed values.
//!
//! This module provides:
//! - [`DependencyNode`] and [`NodeKind`]
//! - A structured topological sort ([`TopoSort`])
//! - The [`DependencyGraphBuilder`] producing the per-item evaluation plan

mod builder;
mod node;
mod toposort;

pub use builder::{DependencyGraph, DependencyGraphBuilder};
pub use node::{DependencyNode, NodeKind};
pub use toposort::{topological_sort, TopoSort};
