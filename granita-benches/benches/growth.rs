//! Bound-constrained growth benchmarks.
//!
//! Times full generation runs against bounds sampled from a synthetic
//! probabilistic network, covering candidate drawing, delta pricing, and
//! acceptance bookkeeping together.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use granita_benches::{SyntheticConfig, synthetic_network};
use granita_core::{
    BoundPolicy, BoundedGrowth, GraphletCatalog, GraphletOrder, GrowthParams, SampleParams,
    sample_bounds,
};

const SEED: u64 = 42;
const SAMPLES: usize = 64;

/// `(node_count, edge_count)` pairs to benchmark.
const SIZES: &[(usize, usize)] = &[(30, 60), (60, 120)];

fn growth_benchmarks(c: &mut Criterion) {
    let catalog = GraphletCatalog::new(GraphletOrder::Four);
    let mut group = c.benchmark_group("bounded_growth");
    group.sample_size(20);

    for &(nodes, edges) in SIZES {
        let network = synthetic_network(&SyntheticConfig {
            node_count: nodes,
            edge_count: edges,
            seed: SEED,
        })
        .expect("benchmark configuration is satisfiable");
        let sample_params = SampleParams::new(SAMPLES, BoundPolicy::MinMax)
            .expect("sampling parameters are valid")
            .with_rng_seed(SEED);
        let bounds = sample_bounds(&network, &catalog, &sample_params);
        let params = GrowthParams::new(nodes)
            .expect("node count is valid")
            .with_edge_budget(edges)
            .with_rng_seed(SEED);
        let generator = BoundedGrowth::new(params, &catalog, &bounds)
            .expect("benchmark configuration is valid");

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{nodes}n_{edges}e")),
            &generator,
            |b, generator| {
                b.iter(|| generator.grow());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, growth_benchmarks);
criterion_main!(benches);
