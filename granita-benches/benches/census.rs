//! Graphlet census benchmarks.
//!
//! Measures the full census against the incremental edge delta on seeded
//! random graphs of increasing size. The delta path is the generator's hot
//! loop, so its advantage over a re-census is the number that matters.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use granita_benches::{SyntheticConfig, synthetic_graph};
use granita_core::{GraphletCatalog, GraphletOrder, edge_delta, full_census};

const SEED: u64 = 42;

/// `(node_count, edge_count)` pairs to benchmark.
const SIZES: &[(usize, usize)] = &[(50, 100), (100, 250), (200, 500)];

fn census_benchmarks(c: &mut Criterion) {
    let catalog = GraphletCatalog::new(GraphletOrder::Four);

    let mut group = c.benchmark_group("full_census");
    for &(nodes, edges) in SIZES {
        let graph = synthetic_graph(&SyntheticConfig {
            node_count: nodes,
            edge_count: edges,
            seed: SEED,
        })
        .expect("benchmark configuration is satisfiable");
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{nodes}n_{edges}e")),
            &graph,
            |b, graph| {
                b.iter(|| full_census(graph, &catalog));
            },
        );
    }
    group.finish();

    let mut group = c.benchmark_group("edge_delta");
    for &(nodes, edges) in SIZES {
        let graph = synthetic_graph(&SyntheticConfig {
            node_count: nodes,
            edge_count: edges,
            seed: SEED,
        })
        .expect("benchmark configuration is satisfiable");
        // Price a representative absent edge.
        let (a, b_node) = (0..nodes)
            .flat_map(|a| ((a + 1)..nodes).map(move |b| (a, b)))
            .find(|&(a, b)| !graph.has_edge(a, b))
            .expect("sparse benchmark graphs have absent edges");
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{nodes}n_{edges}e")),
            &graph,
            |bench, graph| {
                bench.iter(|| edge_delta(graph, a, b_node, &catalog));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, census_benchmarks);
criterion_main!(benches);
