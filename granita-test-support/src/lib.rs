//! Shared test fixtures and helpers for the granita workspace.
//!
//! Keeps the well-known probabilistic networks used across crate tests in
//! one place, both as in-memory graphs for core-level tests and as file
//! payloads for provider and CLI round-trips.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;

use granita_core::ProbabilisticGraph;

/// The four-node cycle with 0.9-probability edges, as an edge list payload.
///
/// This is the canonical fixture for bound estimation: realizations carry
/// between zero and four open triads and never a triangle.
pub const FOUR_CYCLE_EDGELIST: &str = "n1 n2 0.9\nn2 n3 0.9\nn3 n4 0.9\nn4 n1 0.9\n";

/// A dense five-node network with certain edges, as an edge list payload.
///
/// Every realization is identical, which makes sampled statistics exact and
/// keeps baseline-model targets comfortably above their minimum sizes.
pub const DENSE_CERTAIN_EDGELIST: &str =
    "a b 1.0\nb c 1.0\nc d 1.0\nd e 1.0\ne a 1.0\na c 1.0\nb d 1.0\nc e 1.0\n";

/// Builds the four-node cycle with 0.9-probability edges.
#[must_use]
pub fn four_cycle_network() -> ProbabilisticGraph {
    let mut network = ProbabilisticGraph::with_node_count(4);
    for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
        network
            .add_edge(a, b, 0.9)
            .expect("fixture edges are valid");
    }
    network
}

/// Builds a path on `nodes` nodes whose edges all exist with certainty.
#[must_use]
pub fn certain_path_network(nodes: usize) -> ProbabilisticGraph {
    let mut network = ProbabilisticGraph::with_node_count(nodes);
    for a in 0..nodes.saturating_sub(1) {
        network
            .add_edge(a, a + 1, 1.0)
            .expect("fixture edges are valid");
    }
    network
}

/// Writes a fixture payload into `directory` and returns its path.
///
/// # Panics
/// Panics when the write fails; fixtures live in test-owned temporary
/// directories, so a failure indicates a broken test environment.
#[must_use]
pub fn write_fixture(directory: &Path, name: &str, content: &str) -> PathBuf {
    let path = directory.join(name);
    fs::write(&path, content).expect("fixture write succeeds");
    path
}

/// Installs a compact tracing subscriber for test diagnostics.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::INFO)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn four_cycle_network_matches_its_payload() {
        let network = four_cycle_network();
        assert_eq!(network.node_count(), 4);
        assert_eq!(network.edge_count(), 4);
        assert_eq!(FOUR_CYCLE_EDGELIST.lines().count(), 4);
    }

    #[rstest]
    #[case(1, 0)]
    #[case(2, 1)]
    #[case(6, 5)]
    fn certain_paths_have_one_fewer_edge_than_nodes(#[case] nodes: usize, #[case] edges: usize) {
        let network = certain_path_network(nodes);
        assert_eq!(network.node_count(), nodes);
        assert_eq!(network.edge_count(), edges);
    }

    #[test]
    fn write_fixture_round_trips_content() {
        let directory = tempfile::tempdir().expect("tempdir is available");
        let path = write_fixture(directory.path(), "net.txt", FOUR_CYCLE_EDGELIST);
        let read_back = std::fs::read_to_string(path).expect("file is readable");
        assert_eq!(read_back, FOUR_CYCLE_EDGELIST);
    }

    #[test]
    fn init_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
    }
}
