//! Graph nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A resource; fetched lazily by the fields that read it.
    Resource,
    /// A field.
    Field,
    /// A computed value.
    Computed,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource => write!(f, "resource"),
            Self::Field => write!(f, "field"),
            Self::Computed => write!(f, "computed"),
        }
    }
}

/// One entry of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Node kind.
    pub kind: NodeKind,
    /// Unique name.
    pub name: String,
    /// Names this node needs, first mention first.
    pub depends_on: Vec<String>,
}

impl DependencyNode {
    /// Creates a node without dependencies.
    #[must_use]
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            depends_on: Vec::new(),
        }
    }

    /// Adds a dependency unless it is already present.
    #[must_use]
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        let dependency = dependency.into();
        if !self.depends_on.contains(&dependency) {
            self.depends_on.push(dependency);
        }
        self
    }

    /// Adds several dependencies.
    #[must_use]
    pub fn with_dependencies<I, S>(self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        dependencies
            .into_iter()
            .fold(self, |node, dep| node.with_dependency(dep))
    }
}
