//! Construction Arguments
//!
//! [`Args`] hands a factory the values named by its dependency signature, in
//! signature order. Each read names the type it expects; reading a type the
//! signature does not declare at that position is a construction error, so
//! a factory and its signature cannot drift apart unnoticed.

use std::any::Any;
use std::sync::Arc;

use super::contract::Calculation;
use super::node::{ErasedNode, Node};
use crate::error::{GraphError, Result};
use crate::graph::NodeType;

/// A value available to a factory: a built node or a supplied input.
#[derive(Clone)]
pub(crate) enum Slot {
    Node(Arc<dyn ErasedNode>),
    Leaf(Arc<dyn Any + Send + Sync>),
}

/// One resolved signature parameter.
pub(crate) struct Param {
    pub(crate) node_type: NodeType,
    pub(crate) optional: bool,
    pub(crate) slot: Option<Slot>,
}

/// Ordered arguments for [`Calculation::construct`].
pub struct Args<'a> {
    owner: NodeType,
    params: &'a [Param],
    cursor: usize,
}

impl<'a> Args<'a> {
    pub(crate) fn new(owner: NodeType, params: &'a [Param]) -> Self {
        Self {
            owner,
            params,
            cursor: 0,
        }
    }

    /// The type being constructed.
    pub fn owner(&self) -> NodeType {
        self.owner
    }

    /// Number of parameters not read yet.
    pub fn remaining(&self) -> usize {
        self.params.len() - self.cursor
    }

    /// Take the next parameter as a shared node instance.
    pub fn node<T: Calculation>(&mut self) -> Result<Arc<Node<T>>> {
        let owner = self.owner;
        let param = self.next(NodeType::of::<T>())?;
        match &param.slot {
            Some(Slot::Node(node)) => node.clone().into_any().downcast::<Node<T>>().map_err(|_| {
                GraphError::construction(owner, format!("instance for {} has an unexpected type", param.node_type))
            }),
            Some(Slot::Leaf(_)) => Err(GraphError::construction(
                owner,
                format!("{} is declared as a plain input in this graph, read it with `leaf`", param.node_type),
            )),
            None => Err(self.missing(param)),
        }
    }

    /// Take the next parameter as a supplied input value.
    pub fn leaf<V>(&mut self) -> Result<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let param = self.next(NodeType::of::<V>())?;
        match self.read_leaf::<V>(param)? {
            Some(value) => Ok(value.as_ref().clone()),
            None => Err(self.missing(param)),
        }
    }

    /// Take the next parameter as a shared input value, without cloning it.
    pub fn shared_leaf<V>(&mut self) -> Result<Arc<V>>
    where
        V: Send + Sync + 'static,
    {
        let param = self.next(NodeType::of::<V>())?;
        match self.read_leaf::<V>(param)? {
            Some(value) => Ok(value),
            None => Err(self.missing(param)),
        }
    }

    /// Take the next parameter as an input that may be absent.
    ///
    /// Only parameters declared with [`Dependency::optional`](super::Dependency::optional)
    /// may be absent.
    pub fn optional_leaf<V>(&mut self) -> Result<Option<V>>
    where
        V: Clone + Send + Sync + 'static,
    {
        let param = self.next(NodeType::of::<V>())?;
        match self.read_leaf::<V>(param)? {
            Some(value) => Ok(Some(value.as_ref().clone())),
            None if param.optional => Ok(None),
            None => Err(self.missing(param)),
        }
    }

    /// Step over the next parameter without reading it.
    pub fn skip(&mut self) -> Result<()> {
        if self.cursor >= self.params.len() {
            return Err(GraphError::construction(self.owner, "no parameter left to skip"));
        }
        self.cursor += 1;
        Ok(())
    }

    fn next(&mut self, expected: NodeType) -> Result<&'a Param> {
        let params = self.params;
        let position = self.cursor;
        let param = params.get(position).ok_or_else(|| {
            GraphError::construction(
                self.owner,
                format!("read {expected} at position {position}, but the signature declares {} parameters", params.len()),
            )
        })?;
        if param.node_type != expected {
            return Err(GraphError::construction(
                self.owner,
                format!("parameter {position} is declared as {} but was read as {expected}", param.node_type),
            ));
        }
        self.cursor += 1;
        Ok(param)
    }

    fn read_leaf<V>(&self, param: &Param) -> Result<Option<Arc<V>>>
    where
        V: Send + Sync + 'static,
    {
        match &param.slot {
            Some(Slot::Leaf(value)) => value.clone().downcast::<V>().map(Some).map_err(|_| {
                GraphError::construction(self.owner, format!("value bound to {} has an unexpected type", param.node_type))
            }),
            Some(Slot::Node(_)) => Err(GraphError::construction(
                self.owner,
                format!("{} is built as a node in this graph, read it with `node`", param.node_type),
            )),
            None => Ok(None),
        }
    }

    fn missing(&self, param: &Param) -> GraphError {
        GraphError::construction(
            self.owner,
            format!("no value available for required parameter {}", param.node_type),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rate(f64);

    #[derive(Debug, Clone, PartialEq)]
    struct Discount(f64);

    struct Owner;

    fn leaf_param<V: Send + Sync + 'static>(value: Option<V>, optional: bool) -> Param {
        Param {
            node_type: NodeType::of::<V>(),
            optional,
            slot: value.map(|v| Slot::Leaf(Arc::new(v) as Arc<dyn Any + Send + Sync>)),
        }
    }

    #[test]
    fn reads_parameters_in_order() {
        let params = [
            leaf_param(Some(Rate(0.2)), false),
            leaf_param(Some(Discount(5.0)), false),
        ];
        let mut args = Args::new(NodeType::of::<Owner>(), &params);

        assert_eq!(args.remaining(), 2);
        assert_eq!(args.leaf::<Rate>().unwrap(), Rate(0.2));
        assert_eq!(*args.shared_leaf::<Discount>().unwrap(), Discount(5.0));
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn reading_out_of_order_is_a_construction_error() {
        let params = [leaf_param(Some(Rate(0.2)), false)];
        let mut args = Args::new(NodeType::of::<Owner>(), &params);

        let err = args.leaf::<Discount>().unwrap_err();
        assert!(matches!(err, GraphError::Construction { node, .. } if node == NodeType::of::<Owner>()));
    }

    #[test]
    fn optional_parameters_may_be_absent() {
        let params = [leaf_param::<Discount>(None, true)];
        let mut args = Args::new(NodeType::of::<Owner>(), &params);
        assert_eq!(args.optional_leaf::<Discount>().unwrap(), None);
    }

    #[test]
    fn required_parameters_may_not_be_absent() {
        let params = [leaf_param::<Discount>(None, false)];
        let mut args = Args::new(NodeType::of::<Owner>(), &params);
        assert!(args.optional_leaf::<Discount>().is_err());
    }

    #[test]
    fn reading_past_the_signature_fails() {
        let params = [leaf_param(Some(Rate(1.0)), false)];
        let mut args = Args::new(NodeType::of::<Owner>(), &params);
        args.skip().unwrap();
        assert!(args.skip().is_err());
        assert!(args.leaf::<Rate>().is_err());
    }
}
