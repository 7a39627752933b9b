//! Supplied Inputs
//!
//! Values the caller hands to a resolution pass, and the rules that bind
//! them to leaf descriptors.
//!
//! # Binding
//!
//! Binding runs in two passes over the leaves of a graph:
//!
//! 1. Exact: a value whose own type is a leaf of the graph binds to it.
//! 2. Assignable: each leaf still unbound takes the first supplied value
//!    that declared itself convertible into the leaf's type with
//!    [`InputEntry::assignable_to`]. Values are tried in supply order.
//!
//! An exact binding always wins over an assignable one. Leaves that end up
//! unbound are only an error when some dependent requires them through a
//! non-optional parameter.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::{GraphError, MissingInput, Result};
use crate::graph::{DependencyGraph, NodeType};

pub(crate) type SharedValue = Arc<dyn Any + Send + Sync>;

/// Conversion from a supplied value into another leaf type.
#[derive(Clone, Copy)]
struct Coercion {
    target: NodeType,
    convert: fn(&SharedValue) -> Option<SharedValue>,
}

fn coerce<V, E>(value: &SharedValue) -> Option<SharedValue>
where
    V: Clone + Send + Sync + 'static,
    E: From<V> + Send + Sync + 'static,
{
    let value = value.downcast_ref::<V>()?;
    Some(Arc::new(E::from(value.clone())))
}

struct Supplied {
    node_type: NodeType,
    value: SharedValue,
    coercions: SmallVec<[Coercion; 2]>,
}

/// Values supplied to a resolution pass.
///
/// Supplying a second value of the same type replaces the first.
///
/// # Example
///
/// ```rust,ignore
/// let inputs = Inputs::new()
///     .with(Quantity(3))
///     .with_assignable::<_, BasePrice>(Cents(1000));
/// ```
#[derive(Default)]
pub struct Inputs {
    supplied: Vec<Supplied>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value and return the collection.
    pub fn with<V>(mut self, value: V) -> Self
    where
        V: Send + Sync + 'static,
    {
        self.insert(value);
        self
    }

    /// Add a value that may also bind to leaves of type `E`.
    pub fn with_assignable<V, E>(mut self, value: V) -> Self
    where
        V: Clone + Send + Sync + 'static,
        E: From<V> + Send + Sync + 'static,
    {
        self.insert(value).assignable_to::<E>();
        self
    }

    /// Add a value in place.
    pub fn insert<V>(&mut self, value: V) -> InputEntry<'_, V>
    where
        V: Send + Sync + 'static,
    {
        let node_type = NodeType::of::<V>();
        let supplied = Supplied {
            node_type,
            value: Arc::new(value),
            coercions: SmallVec::new(),
        };

        let position = match self.supplied.iter().position(|entry| entry.node_type == node_type) {
            Some(position) => {
                self.supplied[position] = supplied;
                position
            }
            None => {
                self.supplied.push(supplied);
                self.supplied.len() - 1
            }
        };

        InputEntry {
            supplied: &mut self.supplied[position],
            _value: PhantomData,
        }
    }

    pub fn contains(&self, node_type: NodeType) -> bool {
        self.supplied.iter().any(|entry| entry.node_type == node_type)
    }

    pub fn len(&self) -> usize {
        self.supplied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supplied.is_empty()
    }

    /// Types of the supplied values, in supply order.
    pub fn node_types(&self) -> impl Iterator<Item = NodeType> + '_ {
        self.supplied.iter().map(|entry| entry.node_type)
    }

    /// Bind the supplied values to the leaves of `graph`.
    pub(crate) fn bind(self, graph: &DependencyGraph) -> Result<Bindings> {
        let mut values: Vec<Option<SharedValue>> = vec![None; graph.len()];

        for entry in &self.supplied {
            if let Some(descriptor) = graph.descriptor_of(entry.node_type).filter(|d| d.is_leaf()) {
                values[descriptor.index().index()] = Some(entry.value.clone());
                debug!(leaf = %entry.node_type.short_name(), "input bound by type");
            }
        }

        for leaf in graph.leaves() {
            let slot = &mut values[leaf.index().index()];
            if slot.is_some() {
                continue;
            }
            *slot = self.assign(leaf.node_type());
        }

        let missing: Vec<MissingInput> = graph
            .leaves()
            .filter(|leaf| values[leaf.index().index()].is_none() && graph.is_required(leaf.index()))
            .map(|leaf| MissingInput {
                node_type: leaf.node_type(),
                dependents: leaf
                    .dependents()
                    .iter()
                    .map(|&dependent| graph.descriptor(dependent))
                    .filter(|dependent| dependent.requires(leaf.index()))
                    .map(|dependent| dependent.node_type())
                    .collect(),
            })
            .collect();
        if !missing.is_empty() {
            return Err(GraphError::MissingLeaf {
                root: graph.root().node_type(),
                missing,
            });
        }

        let unnecessary = self
            .supplied
            .iter()
            .filter(|entry| !graph.descriptor_of(entry.node_type).is_some_and(|d| d.is_leaf()))
            .map(|entry| entry.node_type)
            .collect();

        Ok(Bindings {
            values,
            supplied: self
                .supplied
                .into_iter()
                .map(|entry| (entry.node_type, entry.value))
                .collect(),
            unnecessary,
        })
    }

    fn assign(&self, target: NodeType) -> Option<SharedValue> {
        self.supplied.iter().find_map(|entry| {
            let coercion = entry.coercions.iter().find(|coercion| coercion.target == target)?;
            let value = (coercion.convert)(&entry.value)?;
            debug!(
                leaf = %target.short_name(),
                source = %entry.node_type.short_name(),
                "input bound by assignment"
            );
            Some(value)
        })
    }
}

impl fmt::Debug for Inputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.node_types()).finish()
    }
}

/// Handle to a value just added to [`Inputs`].
pub struct InputEntry<'a, V> {
    supplied: &'a mut Supplied,
    _value: PhantomData<fn() -> V>,
}

impl<V> InputEntry<'_, V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Let this value bind to leaves of type `E` that no value of type `E`
    /// was supplied for.
    pub fn assignable_to<E>(self) -> Self
    where
        E: From<V> + Send + Sync + 'static,
    {
        let target = NodeType::of::<E>();
        if !self.supplied.coercions.iter().any(|coercion| coercion.target == target) {
            self.supplied.coercions.push(Coercion {
                target,
                convert: coerce::<V, E>,
            });
        }
        self
    }
}

/// Outcome of [`Inputs::bind`].
#[derive(Debug)]
pub(crate) struct Bindings {
    /// Per descriptor index, the value bound to it. Always `None` for
    /// computed descriptors.
    pub(crate) values: Vec<Option<SharedValue>>,

    /// Every supplied value under its own type.
    pub(crate) supplied: IndexMap<NodeType, SharedValue>,

    /// Supplied types that are not leaves of the graph.
    pub(crate) unnecessary: Vec<NodeType>,
}
