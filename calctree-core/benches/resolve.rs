use std::sync::Arc;

use calctree_core::{Args, Calculation, CalculationTree, Dependency, Inputs, Issues, Node, Result};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

#[derive(Clone)]
struct Seed(u64);

struct Base {
    seed: Seed,
}

impl Calculation for Base {
    type Output = u64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::leaf::<Seed>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { seed: args.leaf()? })
    }

    fn calculate(&self, _issues: &mut Issues) -> u64 {
        self.seed.0
    }
}

/// One arm of the fan; every arm shares the same `Base`.
struct Branch<const I: u64> {
    base: Arc<Node<Base>>,
}

impl<const I: u64> Calculation for Branch<I> {
    type Output = u64;

    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::node::<Base>()]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self { base: args.node()? })
    }

    fn calculate(&self, _issues: &mut Issues) -> u64 {
        self.base.value().unwrap_or_default() * (I + 1)
    }
}

struct Fan {
    branches: [Arc<dyn Fn() -> u64 + Send + Sync>; 8],
}

fn reader<T: Calculation<Output = u64>>(node: Arc<Node<T>>) -> Arc<dyn Fn() -> u64 + Send + Sync> {
    Arc::new(move || node.value().unwrap_or_default())
}

impl Calculation for Fan {
    type Output = u64;

    fn dependencies() -> Vec<Dependency> {
        vec![
            Dependency::node::<Branch<0>>(),
            Dependency::node::<Branch<1>>(),
            Dependency::node::<Branch<2>>(),
            Dependency::node::<Branch<3>>(),
            Dependency::node::<Branch<4>>(),
            Dependency::node::<Branch<5>>(),
            Dependency::node::<Branch<6>>(),
            Dependency::node::<Branch<7>>(),
        ]
    }

    fn construct(args: &mut Args<'_>) -> Result<Self> {
        Ok(Self {
            branches: [
                reader(args.node::<Branch<0>>()?),
                reader(args.node::<Branch<1>>()?),
                reader(args.node::<Branch<2>>()?),
                reader(args.node::<Branch<3>>()?),
                reader(args.node::<Branch<4>>()?),
                reader(args.node::<Branch<5>>()?),
                reader(args.node::<Branch<6>>()?),
                reader(args.node::<Branch<7>>()?),
            ],
        })
    }

    fn calculate(&self, _issues: &mut Issues) -> u64 {
        self.branches.iter().map(|branch| branch()).sum()
    }
}

fn bench_discovery(c: &mut Criterion) {
    c.bench_function("discover_wide_diamond", |b| {
        b.iter(|| black_box(CalculationTree::<Fan>::new().map(|tree| tree.graph().len())))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let mut tree = CalculationTree::<Fan>::new().unwrap();
    c.bench_function("resolve_wide_diamond", |b| {
        b.iter(|| black_box(tree.resolve(Inputs::new().with(Seed(3))).unwrap()))
    });
}

fn bench_resolve_async(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut tree = CalculationTree::<Fan>::new().unwrap();
    c.bench_function("resolve_async_wide_diamond", |b| {
        b.iter(|| black_box(rt.block_on(tree.resolve_async(Inputs::new().with(Seed(3)))).unwrap()))
    });
}

criterion_group!(benches, bench_discovery, bench_resolve, bench_resolve_async);
criterion_main!(benches);
