//! Calculation Tree
//!
//! The orchestrator. A [`CalculationTree`] discovers the graph of its root
//! type once, then runs resolution passes over it.
//!
//! # Resolution pass
//!
//! 1. Bind the supplied inputs to leaf descriptors (exact type first, then
//!    declared assignability). Missing required leaves fail the pass.
//! 2. Order every descriptor topologically.
//! 3. Walk the order. Leaves already hold their value; every other
//!    descriptor is instantiated from the instances and values of its
//!    parameters, then executed.
//! 4. Read the root's value.
//!
//! A pass is assembled off to the side and only committed to the tree when
//! every step succeeded. A failed pass leaves the tree with no instances, so
//! lookups never observe a half-built graph. A new pass always replaces the
//! previous one.
//!
//! # Stages
//!
//! ```text
//! Constructed -> LeavesBound -> Sorted -> Executing -> Resolved
//!       \             \            \          \
//!        `-------------`------------`----------`--> Failed
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use super::args::{Args, Param, Slot};
use super::contract::{Calculation, Dependency};
use super::inputs::{Inputs, SharedValue};
use super::node::{ErasedNode, Node};
use super::report::{GraphReport, NodeReport};
use crate::config::TreeConfig;
use crate::error::{GraphError, Result};
use crate::graph::{DependencyGraph, ExecutionOrder, NodeIndex, NodeType, Scheduler};

/// Where a tree is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStage {
    /// Graph discovered, no pass started or the current one just began.
    Constructed,
    LeavesBound,
    Sorted,
    /// Instantiating and executing; `completed` descriptors are done.
    Executing { completed: usize },
    Resolved,
    Failed,
}

impl PassStage {
    pub fn is_resolved(&self) -> bool {
        matches!(self, PassStage::Resolved)
    }
}

/// Instances and values of one resolution pass.
struct Pass {
    /// Per descriptor index: the built node or the bound input.
    slots: Vec<Option<Slot>>,

    /// Every supplied value under its own type, bound or not.
    supplied: IndexMap<NodeType, SharedValue>,

    unnecessary: Vec<NodeType>,
    order: ExecutionOrder,
}

impl Pass {
    /// Instantiate the descriptor at `index` from the slots of its parameters.
    ///
    /// Returns `None` for leaves, which have nothing to build. A supplied
    /// calculation instance is wrapped in a node instead and returned for
    /// execution like any other.
    fn build(&mut self, graph: &DependencyGraph, index: NodeIndex) -> Result<Option<Arc<dyn ErasedNode>>> {
        let descriptor = graph.descriptor(index);
        if descriptor.is_leaf() {
            return self.adopt(graph, index);
        }
        let Some(blueprint) = descriptor.blueprint() else {
            return Ok(None);
        };
        let owner = descriptor.node_type();

        let params = descriptor
            .parameters()
            .iter()
            .map(|parameter| {
                let node_type = graph.descriptor(parameter.index).node_type();
                let slot = self.slots[parameter.index.index()].clone();
                if slot.is_none() && !parameter.optional {
                    return Err(GraphError::construction(
                        owner,
                        format!("the graph holds no instance of {node_type}"),
                    ));
                }
                Ok(Param {
                    node_type,
                    optional: parameter.optional,
                    slot,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut args = Args::new(owner, &params);
        let node = blueprint.instantiate(&mut args)?;
        if args.remaining() > 0 {
            return Err(GraphError::construction(
                owner,
                format!(
                    "factory read {} of {} declared parameters",
                    params.len() - args.remaining(),
                    params.len()
                ),
            ));
        }
        if node.node_type() != owner {
            return Err(GraphError::InvalidNodeType {
                node: owner,
                reason: format!("blueprint produced an instance of {}", node.node_type()),
            });
        }

        self.slots[index.index()] = Some(Slot::Node(node.clone()));
        Ok(Some(node))
    }

    fn adopt(&mut self, graph: &DependencyGraph, index: NodeIndex) -> Result<Option<Arc<dyn ErasedNode>>> {
        let descriptor = graph.descriptor(index);
        let (Some(blueprint), Some(Slot::Leaf(value))) = (descriptor.blueprint(), &self.slots[index.index()]) else {
            return Ok(None);
        };

        let node = blueprint
            .adopt(value.clone())
            .ok_or_else(|| GraphError::InvalidNodeType {
                node: descriptor.node_type(),
                reason: "the supplied value is not an instance of the calculation".to_owned(),
            })?;
        debug!(node = %descriptor.node_type().short_name(), "supplied calculation adopted");

        self.slots[index.index()] = Some(Slot::Node(node.clone()));
        Ok(Some(node))
    }

    fn node(&self, index: NodeIndex) -> Option<&Arc<dyn ErasedNode>> {
        match &self.slots[index.index()] {
            Some(Slot::Node(node)) => Some(node),
            _ => None,
        }
    }

    fn input(&self, index: NodeIndex) -> Option<&SharedValue> {
        match &self.slots[index.index()] {
            Some(Slot::Leaf(value)) => Some(value),
            _ => None,
        }
    }
}

fn downcast<T: Calculation>(node: &Arc<dyn ErasedNode>) -> Result<Arc<Node<T>>> {
    node.clone()
        .into_any()
        .downcast::<Node<T>>()
        .map_err(|_| GraphError::InvalidNodeType {
            node: NodeType::of::<T>(),
            reason: format!("the instance is a {}", node.node_type()),
        })
}

/// Builds and resolves the dependency graph of the calculation `R`.
///
/// # Example
///
/// ```rust,ignore
/// let mut tree = CalculationTree::<Total>::new()?;
/// let total = tree.resolve(Inputs::new().with(BasePrice(10.0)).with(Quantity(3)))?;
/// assert_eq!(total, 30.0);
///
/// let price = tree.get::<Price>()?;
/// assert_eq!(price.value()?, 10.0);
/// ```
pub struct CalculationTree<R: Calculation> {
    graph: DependencyGraph,
    config: TreeConfig,
    stage: PassStage,
    pass: Option<Pass>,
    _root: PhantomData<fn() -> R>,
}

impl<R: Calculation> CalculationTree<R> {
    /// Discover the graph of `R` with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Result<Self> {
        let graph = DependencyGraph::discover(Dependency::node::<R>(), &config)?;
        if graph.root().is_leaf() {
            return Err(GraphError::InvalidNodeType {
                node: NodeType::of::<R>(),
                reason: "the root has an empty dependency signature and would be treated as an input; \
                         use ZeroDependencyPolicy::Computed to calculate it"
                    .to_owned(),
            });
        }

        debug!(
            root = %NodeType::of::<R>().short_name(),
            nodes = graph.len(),
            leaves = graph.leaves().count(),
            "calculation tree constructed"
        );

        Ok(Self {
            graph,
            config,
            stage: PassStage::Constructed,
            pass: None,
            _root: PhantomData,
        })
    }

    /// Build a tree for `R`, resolve it once, and hand back the root node.
    pub fn evaluate(inputs: Inputs) -> Result<Arc<Node<R>>> {
        let mut tree = Self::new()?;
        tree.resolve(inputs)?;
        tree.root()
    }

    /// Asynchronous form of [`CalculationTree::evaluate`].
    pub async fn evaluate_async(inputs: Inputs) -> Result<Arc<Node<R>>> {
        let mut tree = Self::new()?;
        tree.resolve_async(inputs).await?;
        tree.root()
    }

    /// Run a resolution pass and return the root's value.
    #[instrument(skip_all, fields(root = %NodeType::of::<R>().short_name()))]
    pub fn resolve(&mut self, inputs: Inputs) -> Result<R::Output> {
        let mut pass = self.prepare(inputs)?;

        for position in 0..pass.order.len() {
            self.stage = PassStage::Executing { completed: position };
            let index = pass.order.as_slice()[position];
            if let Some(node) = pass.build(&self.graph, index).map_err(|err| self.fail(err))? {
                node.execute().map_err(|err| self.fail(err))?;
                trace!(node = %node.node_type().short_name(), "node resolved");
            }
        }

        self.commit(pass)
    }

    /// Run a resolution pass with asynchronous node execution.
    ///
    /// Nodes still execute one at a time, in the same order as
    /// [`CalculationTree::resolve`].
    pub async fn resolve_async(&mut self, inputs: Inputs) -> Result<R::Output> {
        self.resolve_inner(inputs, None).await
    }

    /// Like [`CalculationTree::resolve_async`], checking `token` before each
    /// node. A cancelled pass fails with [`GraphError::Cancelled`].
    pub async fn resolve_with_cancellation(
        &mut self,
        inputs: Inputs,
        token: &CancellationToken,
    ) -> Result<R::Output> {
        self.resolve_inner(inputs, Some(token)).await
    }

    #[instrument(skip_all, fields(root = %NodeType::of::<R>().short_name()))]
    async fn resolve_inner(&mut self, inputs: Inputs, cancel: Option<&CancellationToken>) -> Result<R::Output> {
        let mut pass = self.prepare(inputs)?;
        let total = pass.order.len();

        for position in 0..total {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                info!(completed = position, total, "resolution pass cancelled");
                return Err(self.fail(GraphError::Cancelled {
                    completed: position,
                    total,
                }));
            }

            self.stage = PassStage::Executing { completed: position };
            let index = pass.order.as_slice()[position];
            if let Some(node) = pass.build(&self.graph, index).map_err(|err| self.fail(err))? {
                node.execute_async().await.map_err(|err| self.fail(err))?;
                trace!(node = %node.node_type().short_name(), "node resolved");
            }
        }

        self.commit(pass)
    }

    fn prepare(&mut self, inputs: Inputs) -> Result<Pass> {
        self.pass = None;
        self.stage = PassStage::Constructed;
        info!(nodes = self.graph.len(), inputs = inputs.len(), "resolution pass started");

        let bindings = inputs.bind(&self.graph).map_err(|err| self.fail(err))?;
        self.stage = PassStage::LeavesBound;

        if !bindings.unnecessary.is_empty() {
            if self.config.warn_on_unused_inputs {
                warn!(unused = ?bindings.unnecessary, "inputs supplied that no node requires");
            } else {
                debug!(unused = ?bindings.unnecessary, "inputs supplied that no node requires");
            }
        }

        let order = Scheduler::new(&self.graph).topological_order();
        self.stage = PassStage::Sorted;

        Ok(Pass {
            slots: bindings.values.into_iter().map(|value| value.map(Slot::Leaf)).collect(),
            supplied: bindings.supplied,
            unnecessary: bindings.unnecessary,
            order,
        })
    }

    fn commit(&mut self, pass: Pass) -> Result<R::Output> {
        let root = self.graph.root_index();
        let value = match pass.node(root) {
            Some(node) => downcast::<R>(node).and_then(|node| node.value()),
            None => Err(GraphError::NotResolved {
                node: NodeType::of::<R>(),
            }),
        };
        let value = value.map_err(|err| self.fail(err))?;

        self.stage = PassStage::Resolved;
        self.pass = Some(pass);
        info!("resolution pass complete");
        Ok(value)
    }

    fn fail(&mut self, err: GraphError) -> GraphError {
        self.stage = PassStage::Failed;
        self.pass = None;
        warn!(error = %err, "resolution pass failed");
        err
    }

    /// The instance of `T` built by the latest pass.
    ///
    /// Two lookups of the same type return the same instance.
    pub fn get<T: Calculation>(&self) -> Result<Arc<Node<T>>> {
        let requested = NodeType::of::<T>();
        let slot = self
            .pass
            .as_ref()
            .zip(self.graph.index_of(requested))
            .and_then(|(pass, index)| pass.slots[index.index()].as_ref());

        match slot {
            Some(Slot::Node(node)) => downcast::<T>(node),
            Some(Slot::Leaf(_)) => Err(GraphError::InvalidNodeType {
                node: requested,
                reason: "bound to a supplied value rather than calculated; \
                         read it with get_external_dependency"
                    .to_owned(),
            }),
            None => Err(GraphError::NodeOutsideOfGraph {
                requested,
                present: self.present_nodes(),
            }),
        }
    }

    /// The supplied value of type `V` from the latest pass.
    ///
    /// Finds values bound to a leaf of type `V`, including ones converted
    /// from another supplied type, and values supplied but not needed.
    pub fn get_external_dependency<V>(&self) -> Result<&V>
    where
        V: Send + Sync + 'static,
    {
        let requested = NodeType::of::<V>();
        let value = self.pass.as_ref().and_then(|pass| {
            self.graph
                .index_of(requested)
                .and_then(|index| pass.input(index))
                .or_else(|| pass.supplied.get(&requested))
        });

        value
            .and_then(|value| value.downcast_ref::<V>())
            .ok_or_else(|| GraphError::ExternalDependencyOutsideOfGraph {
                requested,
                present: self.present_inputs(),
            })
    }

    /// The root instance built by the latest pass.
    pub fn root(&self) -> Result<Arc<Node<R>>> {
        self.get::<R>()
    }

    /// The root's value from the latest pass.
    pub fn value(&self) -> Result<R::Output> {
        self.root()?.value()
    }

    /// Issues recorded by every node of the latest pass.
    pub fn errors(&self) -> IndexSet<String> {
        self.nodes().flat_map(|node| node.errors()).collect()
    }

    /// Supplied types the latest pass did not need.
    pub fn unnecessary_external_dependencies(&self) -> Vec<NodeType> {
        self.pass
            .as_ref()
            .map(|pass| pass.unnecessary.clone())
            .unwrap_or_default()
    }

    /// Every identity in the graph.
    pub fn node_types(&self) -> Vec<NodeType> {
        self.graph.node_types().collect()
    }

    /// Identities the caller is expected to supply.
    pub fn leaf_types(&self) -> Vec<NodeType> {
        self.graph.leaves().map(|leaf| leaf.node_type()).collect()
    }

    pub fn stage(&self) -> PassStage {
        self.stage
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Execution order of the latest committed pass.
    pub fn execution_order(&self) -> Option<&ExecutionOrder> {
        self.pass.as_ref().map(|pass| &pass.order)
    }

    /// Snapshot of the graph and the latest committed pass.
    pub fn report(&self) -> GraphReport {
        let scheduler = Scheduler::new(&self.graph);
        let depths = scheduler.depths();
        let name = |index: &NodeIndex| self.graph.descriptor(*index).node_type().name().to_owned();

        let nodes = scheduler
            .topological_order()
            .iter()
            .map(|index| {
                let descriptor = self.graph.descriptor(index);
                let instance = self.pass.as_ref().and_then(|pass| pass.node(index));
                NodeReport {
                    name: descriptor.node_type().name().to_owned(),
                    kind: descriptor.kind(),
                    depth: depths[index.index()],
                    dependencies: descriptor.dependencies().iter().map(name).collect(),
                    dependents: descriptor.dependents().iter().map(name).collect(),
                    resolved: instance.is_some_and(|node| node.is_resolved()),
                    errors: instance
                        .map(|node| node.errors().into_iter().collect())
                        .unwrap_or_default(),
                }
            })
            .collect();

        GraphReport {
            root: NodeType::of::<R>().name().to_owned(),
            stage: self.stage,
            nodes,
            unused_inputs: self
                .unnecessary_external_dependencies()
                .iter()
                .map(|node_type| node_type.name().to_owned())
                .collect(),
        }
    }

    fn nodes(&self) -> impl Iterator<Item = &Arc<dyn ErasedNode>> + '_ {
        self.pass.iter().flat_map(|pass| pass.slots.iter()).filter_map(|slot| match slot {
            Some(Slot::Node(node)) => Some(node),
            _ => None,
        })
    }

    fn present_nodes(&self) -> Vec<NodeType> {
        self.nodes().map(|node| node.node_type()).collect()
    }

    fn present_inputs(&self) -> Vec<NodeType> {
        let Some(pass) = &self.pass else {
            return Vec::new();
        };
        let bound = self
            .graph
            .leaves()
            .filter(|leaf| pass.input(leaf.index()).is_some())
            .map(|leaf| leaf.node_type());
        bound
            .chain(pass.supplied.keys().copied())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}

impl<R: Calculation> fmt::Debug for CalculationTree<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalculationTree")
            .field("root", &NodeType::of::<R>())
            .field("nodes", &self.graph.len())
            .field("stage", &self.stage)
            .finish()
    }
}
