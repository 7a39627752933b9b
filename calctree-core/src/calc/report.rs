//! Serializable snapshot of a tree's graph and its latest pass.

use serde::Serialize;

use super::tree::PassStage;
use crate::graph::NodeKind;

/// One descriptor and, when a pass committed, the state of its instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeReport {
    pub name: String,
    pub kind: NodeKind,

    /// Longest distance from a node with no dependencies.
    pub depth: usize,

    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,

    /// False for leaves and for every node when no pass has committed.
    pub resolved: bool,
    pub errors: Vec<String>,
}

/// Snapshot of a [`CalculationTree`](super::CalculationTree).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphReport {
    pub root: String,
    pub stage: PassStage,

    /// Nodes in execution order.
    pub nodes: Vec<NodeReport>,

    pub unused_inputs: Vec<String>,
}

impl GraphReport {
    pub fn node(&self, name: &str) -> Option<&NodeReport> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
