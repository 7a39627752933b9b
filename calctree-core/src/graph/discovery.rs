//! Graph Discovery
//!
//! Turns a root calculation type into the full set of descriptors it
//! transitively depends on.
//!
//! # Algorithm
//!
//! Depth-first over dependency signatures, memoized by identity:
//!
//! 1. A type already discovered, and not on the current path, is returned as
//!    is. This collapses diamonds: a type needed by two nodes is discovered
//!    once.
//! 2. The type is pushed onto the [`CycleTracker`]. A type already on the
//!    path fails with [`GraphError::Cycle`](crate::error::GraphError::Cycle).
//! 3. A type declared with [`Dependency::leaf`] is a leaf.
//! 4. A calculation whose signature is empty is a leaf under
//!    [`ZeroDependencyPolicy::Leaf`] (its blueprint is kept so a supplied
//!    instance can still be executed), and a computed node with no parameters
//!    under [`ZeroDependencyPolicy::Computed`].
//! 5. Otherwise the descriptor is memoized before recursing into each
//!    parameter, so later branches that reach it find it.
//! 6. The type is popped on every exit path.
//!
//! Dependents are not maintained during the walk. They are derived from the
//! finished dependency sets in one pass at the end.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::cycle::CycleTracker;
use super::node::{Descriptor, NodeIndex, Parameter};
use super::NodeType;
use crate::calc::Dependency;
use crate::config::{TreeConfig, ZeroDependencyPolicy};
use crate::error::Result;

/// Every descriptor reachable from one root, in discovery order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    descriptors: Vec<Descriptor>,

    /// Identity to arena position, for external lookups.
    lookup: IndexMap<NodeType, NodeIndex>,

    root: NodeIndex,
}

impl DependencyGraph {
    /// Discover the graph needed to build `root`.
    pub fn discover(root: Dependency, config: &TreeConfig) -> Result<Self> {
        Discovery::new(config.zero_dependency_policy).run(root)
    }

    pub fn root(&self) -> &Descriptor {
        self.descriptor(self.root)
    }

    pub fn root_index(&self) -> NodeIndex {
        self.root
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Look up a descriptor by index.
    ///
    /// Panics if the index came from a different graph and is out of range.
    pub fn descriptor(&self, index: NodeIndex) -> &Descriptor {
        &self.descriptors[index.index()]
    }

    pub fn descriptor_of(&self, node_type: NodeType) -> Option<&Descriptor> {
        self.index_of(node_type).map(|index| self.descriptor(index))
    }

    pub fn index_of(&self, node_type: NodeType) -> Option<NodeIndex> {
        self.lookup.get(&node_type).copied()
    }

    pub fn contains(&self, node_type: NodeType) -> bool {
        self.lookup.contains_key(&node_type)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Descriptor> {
        self.descriptors.iter()
    }

    /// All identities in the graph, in discovery order.
    pub fn node_types(&self) -> impl Iterator<Item = NodeType> + '_ {
        self.lookup.keys().copied()
    }

    /// Descriptors whose values are supplied from outside.
    pub fn leaves(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.descriptors.iter().filter(|descriptor| descriptor.is_leaf())
    }

    /// Descriptors the engine builds.
    pub fn computed(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.descriptors.iter().filter(|descriptor| !descriptor.is_leaf())
    }

    /// True if at least one dependent needs `index` through a non-optional parameter.
    pub fn is_required(&self, index: NodeIndex) -> bool {
        self.descriptor(index)
            .dependents()
            .iter()
            .any(|&dependent| self.descriptor(dependent).requires(index))
    }
}

impl<'g> IntoIterator for &'g DependencyGraph {
    type Item = &'g Descriptor;
    type IntoIter = std::slice::Iter<'g, Descriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

/// State of one discovery walk.
struct Discovery {
    policy: ZeroDependencyPolicy,
    tracker: CycleTracker<NodeType>,
    descriptors: Vec<Descriptor>,
    lookup: IndexMap<NodeType, NodeIndex>,
}

impl Discovery {
    fn new(policy: ZeroDependencyPolicy) -> Self {
        Self {
            policy,
            tracker: CycleTracker::new(),
            descriptors: Vec::new(),
            lookup: IndexMap::new(),
        }
    }

    fn run(mut self, root: Dependency) -> Result<DependencyGraph> {
        let root_index = self.visit(&root)?;
        debug_assert!(self.tracker.is_empty());

        self.link_dependents();
        debug!(
            root = %root.node_type().short_name(),
            nodes = self.descriptors.len(),
            "dependency graph discovered"
        );

        Ok(DependencyGraph {
            descriptors: self.descriptors,
            lookup: self.lookup,
            root: root_index,
        })
    }

    fn visit(&mut self, dependency: &Dependency) -> Result<NodeIndex> {
        let node_type = dependency.node_type();
        if let Some(&index) = self.lookup.get(&node_type) {
            if !self.tracker.contains(&node_type) {
                return Ok(index);
            }
        }

        self.tracker.visit(node_type)?;
        let result = self.expand(dependency);
        self.tracker.unvisit(node_type);
        result
    }

    fn expand(&mut self, dependency: &Dependency) -> Result<NodeIndex> {
        let node_type = dependency.node_type();
        let Some(blueprint) = dependency.blueprint().copied() else {
            return Ok(self.insert_leaf(Descriptor::leaf(self.next_index(), node_type), "declared as an input"));
        };

        let signature = blueprint.signature();
        if signature.is_empty() && self.policy == ZeroDependencyPolicy::Leaf {
            let descriptor = Descriptor::supplied_calculation(self.next_index(), node_type, blueprint);
            return Ok(self.insert_leaf(descriptor, "empty dependency signature"));
        }

        let index = self.next_index();
        self.insert(Descriptor::computed(index, node_type, blueprint));

        for parameter in &signature {
            let child = self.visit(parameter)?;
            self.descriptors[index.index()].add_parameter(Parameter {
                index: child,
                optional: parameter.is_optional(),
            });
        }

        trace!(node = %node_type.short_name(), parameters = signature.len(), "computed node discovered");
        Ok(index)
    }

    fn next_index(&self) -> NodeIndex {
        NodeIndex::new(self.descriptors.len())
    }

    fn insert_leaf(&mut self, descriptor: Descriptor, reason: &'static str) -> NodeIndex {
        let index = descriptor.index();
        trace!(node = %descriptor.node_type().short_name(), reason, "leaf discovered");
        self.insert(descriptor);
        index
    }

    fn insert(&mut self, descriptor: Descriptor) {
        self.lookup.insert(descriptor.node_type(), descriptor.index());
        self.descriptors.push(descriptor);
    }

    fn link_dependents(&mut self) {
        for position in 0..self.descriptors.len() {
            let dependent = NodeIndex::new(position);
            let dependencies: SmallVec<[NodeIndex; 8]> =
                self.descriptors[position].dependencies().iter().copied().collect();
            for dependency in dependencies {
                self.descriptors[dependency.index()].add_dependent(dependent);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::testing::{Bottom, Constant, Left, Ping, Price, Right, Seed, SelfLoop, Top, Total};
    use crate::testing::{BasePrice, Quantity};

    fn discover<T: crate::calc::Calculation>(policy: ZeroDependencyPolicy) -> Result<DependencyGraph> {
        let config = TreeConfig::default().with_zero_dependency_policy(policy);
        DependencyGraph::discover(Dependency::node::<T>(), &config)
    }

    #[test]
    fn discovers_transitive_dependencies() {
        let graph = discover::<Total>(ZeroDependencyPolicy::Leaf).unwrap();

        assert_eq!(graph.len(), 4);
        assert_eq!(graph.root().node_type(), NodeType::of::<Total>());
        assert_eq!(graph.root_index().index(), 0);
        assert!(graph.contains(NodeType::of::<Price>()));
        assert!(graph.descriptor_of(NodeType::of::<BasePrice>()).unwrap().is_leaf());
        assert!(graph.descriptor_of(NodeType::of::<Quantity>()).unwrap().is_leaf());
        assert!(!graph.descriptor_of(NodeType::of::<Price>()).unwrap().is_leaf());
        assert!(!graph.descriptor_of(NodeType::of::<Quantity>()).unwrap().is_supplied_calculation());
    }

    #[test]
    fn diamond_is_discovered_once() {
        let graph = discover::<Top>(ZeroDependencyPolicy::Leaf).unwrap();

        // Top, Left, Bottom, Seed, Right
        assert_eq!(graph.len(), 5);
        let bottom = graph.descriptor_of(NodeType::of::<Bottom>()).unwrap();
        let dependents: Vec<_> = bottom
            .dependents()
            .iter()
            .map(|&index| graph.descriptor(index).node_type())
            .collect();
        assert_eq!(dependents, vec![NodeType::of::<Left>(), NodeType::of::<Right>()]);
        assert!(graph.is_required(bottom.index()));
    }

    #[test]
    fn dependencies_and_dependents_are_duals() {
        let graph = discover::<Top>(ZeroDependencyPolicy::Leaf).unwrap();

        for descriptor in &graph {
            for &dependency in descriptor.dependencies() {
                assert!(graph.descriptor(dependency).dependents().contains(&descriptor.index()));
            }
            for &dependent in descriptor.dependents() {
                assert!(graph.descriptor(dependent).dependencies().contains(&descriptor.index()));
            }
        }
    }

    #[test]
    fn two_node_cycle_is_reported_with_both_types() {
        let err = discover::<Ping>(ZeroDependencyPolicy::Leaf).unwrap_err();
        let GraphError::Cycle { path } = &err else {
            panic!("expected a cycle, got {err:?}");
        };

        assert_eq!(path.first(), Some(&NodeType::of::<Ping>()));
        assert_eq!(path.last(), Some(&NodeType::of::<Ping>()));
        assert!(path.contains(&NodeType::of::<crate::testing::Pong>()));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = discover::<SelfLoop>(ZeroDependencyPolicy::Leaf).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cycle {
                path: vec![NodeType::of::<SelfLoop>(), NodeType::of::<SelfLoop>()]
            }
        );
    }

    #[test]
    fn empty_signature_follows_policy() {
        let as_leaf = discover::<Constant>(ZeroDependencyPolicy::Leaf).unwrap();
        assert!(as_leaf.root().is_leaf());
        assert!(as_leaf.root().is_supplied_calculation());

        let as_computed = discover::<Constant>(ZeroDependencyPolicy::Computed).unwrap();
        assert!(!as_computed.root().is_leaf());
        assert!(!as_computed.root().is_supplied_calculation());
        assert!(as_computed.root().parameters().is_empty());
    }

    #[test]
    fn leaf_lookup_lists_seed_once() {
        let graph = discover::<Top>(ZeroDependencyPolicy::Leaf).unwrap();
        let leaves: Vec<_> = graph.leaves().map(Descriptor::node_type).collect();
        assert_eq!(leaves, vec![NodeType::of::<Seed>()]);
        assert_eq!(graph.computed().count(), 4);
    }
}
