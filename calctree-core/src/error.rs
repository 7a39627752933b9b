//! Graph errors
//!
//! Structural errors abort a resolution pass. Errors a node records while
//! calculating are not errors of this kind; they live in the node's
//! [`Issues`](crate::calc::Issues) and are read back with
//! [`CalculationTree::errors`](crate::calc::CalculationTree::errors).

use std::fmt::Write;

use thiserror::Error;

use crate::graph::NodeType;

/// Result type used throughout the crate.
pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// A required input that nothing supplied, with the nodes that asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput {
    pub node_type: NodeType,
    pub dependents: Vec<NodeType>,
}

/// Errors produced while discovering, ordering, or resolving a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A type showed up again on the current discovery path.
    #[error("the graph contains a cycle and cannot be topologically sorted: {}", render_path(.path))]
    Cycle { path: Vec<NodeType> },

    /// A type was used as a calculation node but cannot act as one.
    #[error("invalid node type '{node}': {reason}")]
    InvalidNodeType { node: NodeType, reason: String },

    /// One or more external dependencies were not supplied.
    #[error("the graph for '{root}' is missing the following external dependencies:\n{}", render_missing(.missing))]
    MissingLeaf {
        root: NodeType,
        missing: Vec<MissingInput>,
    },

    /// A node could not be built from the values available to it.
    #[error("cannot construct '{node}': {reason}")]
    Construction { node: NodeType, reason: String },

    /// A node's value was read before the node was executed.
    #[error("node '{node}' has not resolved yet")]
    NotResolved { node: NodeType },

    /// A lookup asked for a node that has no instance in this graph.
    #[error("node '{requested}' is outside of the graph; present nodes: [{}]", render_list(.present))]
    NodeOutsideOfGraph {
        requested: NodeType,
        present: Vec<NodeType>,
    },

    /// A lookup asked for a supplied value that was never bound.
    #[error("external dependency '{requested}' is outside of the graph; bound dependencies: [{}]", render_list(.present))]
    ExternalDependencyOutsideOfGraph {
        requested: NodeType,
        present: Vec<NodeType>,
    },

    /// A node's calculation chose to fail the whole pass.
    #[error("node '{node}' aborted the resolution pass: {reason}")]
    Aborted { node: NodeType, reason: String },

    /// The pass was cancelled between two node executions.
    #[error("resolution cancelled after {completed} of {total} nodes")]
    Cancelled { completed: usize, total: usize },
}

impl GraphError {
    /// Whether the error says the graph definition itself is broken.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GraphError::Cycle { .. }
                | GraphError::InvalidNodeType { .. }
                | GraphError::MissingLeaf { .. }
                | GraphError::Construction { .. }
        )
    }

    pub(crate) fn construction(node: NodeType, reason: impl Into<String>) -> Self {
        GraphError::Construction {
            node,
            reason: reason.into(),
        }
    }
}

fn render_path(path: &[NodeType]) -> String {
    path.iter()
        .map(|node| node.name())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn render_list(nodes: &[NodeType]) -> String {
    nodes
        .iter()
        .map(|node| node.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_missing(missing: &[MissingInput]) -> String {
    let mut out = String::new();
    for input in missing {
        let _ = writeln!(out, "{} is a dependency in:", input.node_type);
        for dependent in &input.dependents {
            let _ = writeln!(out, "\t{dependent}");
        }
    }
    out
}
