//! Calculation types shared by the unit tests.

use std::sync::Arc;

use crate::calc::{Args, Calculation, Dependency, Issues, Node};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasePrice(pub f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct Currency(pub &'static str);

/// Whole cents, convertible into a [`BasePrice`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cents(pub u64);

impl From<Cents> for BasePrice {
    fn from(cents: Cents) -> Self {
        BasePrice(cents.0 as f64 / 100.0)
    }
}

pub struct Price {
    pub base: BasePrice,
}

impl Calculation for Price {
    type Output = f64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::leaf::<BasePrice>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { base: args.leaf()? })
    }

    fn calculate(&self, issues: &mut Issues) -> f64 {
        if self.base.0 < 0.0 {
            issues.push("negative base price");
        }
        self.base.0
    }
}

pub struct Total {
    pub price: Arc<Node<Price>>,
    quantity: Quantity,
}

impl Calculation for Total {
    type Output = f64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::node::<Price>(), Dependency::leaf::<Quantity>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self {
            price: args.node()?,
            quantity: args.leaf()?,
        })
    }

    fn calculate(&self, issues: &mut Issues) -> f64 {
        match self.price.value() {
            Ok(price) => price * f64::from(self.quantity.0),
            Err(err) => {
                issues.abort(err.to_string());
                0.0
            }
        }
    }
}

/// Shares `Quantity` with [`Total`]; takes `Currency` only if supplied.
pub struct Shipping {
    quantity: Quantity,
    currency: Option<Currency>,
}

impl Calculation for Shipping {
    type Output = f64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::leaf::<Quantity>(), Dependency::leaf::<Currency>().optional()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self {
            quantity: args.leaf()?,
            currency: args.optional_leaf()?,
        })
    }

    fn calculate(&self, _issues: &mut Issues) -> f64 {
        let rate = match self.currency {
            Some(Currency("EUR")) => 2.0,
            _ => 1.5,
        };
        rate * f64::from(self.quantity.0)
    }
}

/// Requires `Currency`, which [`Shipping`] declares optional.
pub struct Invoice {
    total: Arc<Node<Total>>,
    shipping: Arc<Node<Shipping>>,
    currency: Currency,
}

impl Calculation for Invoice {
    type Output = String;

    fn dependencies() -> Vec<Dependency> {
        vec![
            Dependency::node::<Total>(),
            Dependency::node::<Shipping>(),
            Dependency::leaf::<Currency>(),
        ]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self {
            total: args.node()?,
            shipping: args.node()?,
            currency: args.leaf()?,
        })
    }

    fn calculate(&self, issues: &mut Issues) -> String {
        match (self.total.value(), self.shipping.value()) {
            (Ok(total), Ok(shipping)) => format!("{:.2} {}", total + shipping, self.currency.0),
            (Err(err), _) | (_, Err(err)) => {
                issues.abort(err.to_string());
                String::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed(pub i64);

pub struct Bottom {
    seed: Seed,
}

impl Calculation for Bottom {
    type Output = i64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::leaf::<Seed>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { seed: args.leaf()? })
    }

    fn calculate(&self, _issues: &mut Issues) -> i64 {
        self.seed.0
    }
}

pub struct Left {
    pub bottom: Arc<Node<Bottom>>,
}

impl Calculation for Left {
    type Output = i64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::node::<Bottom>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { bottom: args.node()? })
    }

    fn calculate(&self, _issues: &mut Issues) -> i64 {
        self.bottom.value().unwrap_or_default() + 1
    }
}

pub struct Right {
    pub bottom: Arc<Node<Bottom>>,
}

impl Calculation for Right {
    type Output = i64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::node::<Bottom>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { bottom: args.node()? })
    }

    fn calculate(&self, _issues: &mut Issues) -> i64 {
        self.bottom.value().unwrap_or_default() * 10
    }
}

pub struct Top {
    pub left: Arc<Node<Left>>,
    pub right: Arc<Node<Right>>,
}

impl Calculation for Top {
    type Output = i64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::node::<Left>(), Dependency::node::<Right>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self {
            left: args.node()?,
            right: args.node()?,
        })
    }

    fn calculate(&self, _issues: &mut Issues) -> i64 {
        self.left.value().unwrap_or_default() + self.right.value().unwrap_or_default()
    }
}

pub struct Ping {
    _pong: Arc<Node<Pong>>,
}

impl Calculation for Ping {
    type Output = ();

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::node::<Pong>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { _pong: args.node()? })
    }

    fn calculate(&self, _issues: &mut Issues) {}
}

pub struct Pong {
    _ping: Arc<Node<Ping>>,
}

impl Calculation for Pong {
    type Output = ();

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::node::<Ping>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { _ping: args.node()? })
    }

    fn calculate(&self, _issues: &mut Issues) {}
}

pub struct SelfLoop {
    _inner: Arc<Node<SelfLoop>>,
}

impl Calculation for SelfLoop {
    type Output = ();

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::node::<SelfLoop>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { _inner: args.node()? })
    }

    fn calculate(&self, _issues: &mut Issues) {}
}

/// A calculation with an empty dependency signature.
pub struct Constant;

impl Calculation for Constant {
    type Output = u8;

    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    fn construct(_args: &mut Args<'_>) -> Result<Self> {
        Ok(Self)
    }

    fn calculate(&self, _issues: &mut Issues) -> u8 {
        7
    }
}
