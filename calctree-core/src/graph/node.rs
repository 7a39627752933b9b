//! Graph Node Descriptors
//!
//! This module defines the structural record kept for every type in a
//! discovered graph. Descriptors live in a dense arena and refer to each
//! other by [`NodeIndex`]; they never hold instances or values.

use indexmap::IndexSet;
use serde::Serialize;
use smallvec::SmallVec;

use super::NodeType;
use crate::calc::Blueprint;

/// Position of a descriptor in its graph's arena.
///
/// Indices are assigned in discovery order and are only meaningful for the
/// graph that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Get the raw arena position.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// How a descriptor's value comes into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Supplied by the caller before the pass starts.
    Leaf,
    /// Built and executed by the engine.
    Computed,
}

/// One positional parameter of a calculation's dependency signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    /// The descriptor that supplies this parameter.
    pub index: NodeIndex,

    /// Whether the parameter may be left empty when nothing supplies it.
    pub optional: bool,
}

/// The structural record for one type in a dependency graph.
#[derive(Debug, Clone)]
pub struct Descriptor {
    index: NodeIndex,
    node_type: NodeType,
    kind: NodeKind,

    /// Present for every type declared as a calculation, including one that
    /// is classified as a leaf because its signature is empty.
    blueprint: Option<Blueprint>,

    /// The dependency signature in declaration order. May name the same
    /// descriptor more than once.
    parameters: SmallVec<[Parameter; 4]>,

    /// Distinct descriptors this one needs (parents in the DAG).
    dependencies: IndexSet<NodeIndex>,

    /// Distinct descriptors that need this one (children in the DAG).
    /// Derived from `dependencies` once discovery finishes.
    dependents: IndexSet<NodeIndex>,
}

impl Descriptor {
    /// Create a descriptor for a type supplied from outside the graph.
    pub(crate) fn leaf(index: NodeIndex, node_type: NodeType) -> Self {
        Self {
            index,
            node_type,
            kind: NodeKind::Leaf,
            blueprint: None,
            parameters: SmallVec::new(),
            dependencies: IndexSet::new(),
            dependents: IndexSet::new(),
        }
    }

    /// Create a descriptor for a type the engine builds itself.
    pub(crate) fn computed(index: NodeIndex, node_type: NodeType, blueprint: Blueprint) -> Self {
        Self {
            kind: NodeKind::Computed,
            blueprint: Some(blueprint),
            ..Self::leaf(index, node_type)
        }
    }

    /// Create a leaf for a calculation type whose instance the caller supplies.
    pub(crate) fn supplied_calculation(index: NodeIndex, node_type: NodeType, blueprint: Blueprint) -> Self {
        Self {
            blueprint: Some(blueprint),
            ..Self::leaf(index, node_type)
        }
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// True if the value must be supplied by the caller.
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// True for a leaf whose supplied value is a calculation the engine
    /// still executes, so dependents read it as a node.
    pub fn is_supplied_calculation(&self) -> bool {
        self.is_leaf() && self.blueprint.is_some()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub(crate) fn blueprint(&self) -> Option<&Blueprint> {
        self.blueprint.as_ref()
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn dependencies(&self) -> &IndexSet<NodeIndex> {
        &self.dependencies
    }

    pub fn dependents(&self) -> &IndexSet<NodeIndex> {
        &self.dependents
    }

    /// Number of distinct dependencies.
    pub fn in_degree(&self) -> usize {
        self.dependencies.len()
    }

    /// True if some parameter of this descriptor needs `dependency` to be present.
    pub fn requires(&self, dependency: NodeIndex) -> bool {
        self.parameters
            .iter()
            .any(|param| param.index == dependency && !param.optional)
    }

    /// Append a signature parameter and record the dependency it implies.
    pub(crate) fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
        self.dependencies.insert(parameter.index);
    }

    pub(crate) fn add_dependent(&mut self, dependent: NodeIndex) {
        self.dependents.insert(dependent);
    }
}
