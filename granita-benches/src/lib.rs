//! Benchmark support crate for granita.
//!
//! Provides seeded synthetic networks used by the Criterion benchmarks for
//! the two hot pipeline stages: the graphlet census and bound-constrained
//! growth.

use granita_core::{Graph, GraphError, ProbabilisticGraph};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use thiserror::Error;

/// Errors raised while preparing benchmark inputs.
#[derive(Debug, Error, PartialEq)]
pub enum BenchSetupError {
    /// More edges were requested than distinct node pairs exist.
    #[error("{edges} edges do not fit {nodes} nodes")]
    TooManyEdges {
        /// Requested node count.
        nodes: usize,
        /// Requested edge count.
        edges: usize,
    },
    /// Synthetic edge insertion failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Parameters for one synthetic network.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticConfig {
    /// Number of nodes.
    pub node_count: usize,
    /// Number of distinct edges.
    pub edge_count: usize,
    /// Seed for the edge draws.
    pub seed: u64,
}

/// Generates a seeded random simple graph with the requested size.
///
/// # Errors
/// Returns [`BenchSetupError::TooManyEdges`] when the requested density is
/// impossible.
pub fn synthetic_graph(config: &SyntheticConfig) -> Result<Graph, BenchSetupError> {
    let pairs = config.node_count * config.node_count.saturating_sub(1) / 2;
    if config.edge_count > pairs {
        return Err(BenchSetupError::TooManyEdges {
            nodes: config.node_count,
            edges: config.edge_count,
        });
    }
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut graph = Graph::with_node_count(config.node_count);
    while graph.edge_count() < config.edge_count {
        let a = rng.gen_range(0..config.node_count);
        let b = rng.gen_range(0..config.node_count);
        if a != b && !graph.has_edge(a, b) {
            graph.add_edge(a, b)?;
        }
    }
    Ok(graph)
}

/// Generates a seeded random probabilistic network; probabilities are drawn
/// uniformly from `[0.5, 1.0]` so realizations stay reasonably dense.
///
/// # Errors
/// Returns [`BenchSetupError::TooManyEdges`] when the requested density is
/// impossible.
pub fn synthetic_network(config: &SyntheticConfig) -> Result<ProbabilisticGraph, BenchSetupError> {
    let support = synthetic_graph(config)?;
    let mut rng = SmallRng::seed_from_u64(config.seed.wrapping_add(1));
    let mut network = ProbabilisticGraph::with_node_count(config.node_count);
    for (a, b) in support.edges() {
        network.add_edge(a, b, rng.gen_range(0.5..=1.0))?;
    }
    Ok(network)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(20, 40)]
    #[case(50, 100)]
    fn synthetic_graphs_hit_the_requested_size(#[case] nodes: usize, #[case] edges: usize) {
        let graph = synthetic_graph(&SyntheticConfig {
            node_count: nodes,
            edge_count: edges,
            seed: 7,
        })
        .expect("configuration is satisfiable");
        assert_eq!(graph.node_count(), nodes);
        assert_eq!(graph.edge_count(), edges);
    }

    #[test]
    fn synthetic_graphs_are_seed_stable() {
        let config = SyntheticConfig {
            node_count: 30,
            edge_count: 60,
            seed: 99,
        };
        assert_eq!(
            synthetic_graph(&config).expect("satisfiable"),
            synthetic_graph(&config).expect("satisfiable")
        );
    }

    #[test]
    fn impossible_densities_are_rejected() {
        let err = synthetic_graph(&SyntheticConfig {
            node_count: 3,
            edge_count: 10,
            seed: 1,
        })
        .expect_err("too many edges must fail");
        assert_eq!(
            err,
            BenchSetupError::TooManyEdges {
                nodes: 3,
                edges: 10
            }
        );
    }
}
