//! Graph data model for the granita core library.
//!
//! Two representations live here. [`Graph`] is a plain undirected simple
//! graph with stable `usize` node indices and a sorted adjacency list; it is
//! what the census, the generator, and the baseline models operate on.
//! [`ProbabilisticGraph`] annotates each edge with an existence probability
//! and can be realized into a concrete [`Graph`] by independent Bernoulli
//! draws.
//!
//! Both types validate their inputs at the boundary: self-loops, duplicate
//! edges, out-of-range endpoints, and probabilities outside `(0, 1]` are
//! rejected on insertion, so every downstream algorithm only ever sees a
//! well-formed simple graph.

use std::collections::HashSet;

use rand::{Rng, rngs::SmallRng};
use thiserror::Error;

/// An error produced while building or mutating a graph.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
    /// An edge endpoint referred to a node outside the graph.
    #[error("node {node} is out of bounds for a graph of {node_count} nodes")]
    NodeOutOfBounds {
        /// Offending node index.
        node: usize,
        /// Number of nodes in the graph.
        node_count: usize,
    },
    /// Both endpoints of an edge referred to the same node.
    #[error("self-loop on node {node} is not allowed")]
    SelfLoop {
        /// The node carrying the rejected self-loop.
        node: usize,
    },
    /// The edge was already present.
    #[error("edge ({source}, {target}) already exists")]
    DuplicateEdge {
        /// Smaller endpoint of the duplicate edge.
        source: usize,
        /// Larger endpoint of the duplicate edge.
        target: usize,
    },
    /// The edge to remove was not present.
    #[error("edge ({source}, {target}) does not exist")]
    MissingEdge {
        /// Smaller endpoint of the missing edge.
        source: usize,
        /// Larger endpoint of the missing edge.
        target: usize,
    },
    /// An edge probability was outside `(0, 1]`.
    #[error("edge ({source}, {target}) has probability {probability} outside (0, 1]")]
    InvalidProbability {
        /// Smaller endpoint of the offending edge.
        source: usize,
        /// Larger endpoint of the offending edge.
        target: usize,
        /// The rejected probability value.
        probability: f64,
    },
    /// A node label appeared more than once while assembling a network.
    #[error("node label `{label}` was declared twice")]
    DuplicateLabel {
        /// The repeated label.
        label: String,
    },
}

/// Normalizes an unordered node pair so the smaller index comes first.
#[inline]
#[must_use]
pub(crate) const fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a > b { (b, a) } else { (a, b) }
}

/// Undirected simple graph over dense node indices `0..node_count`.
///
/// # Examples
/// ```
/// use granita_core::Graph;
///
/// let mut graph = Graph::with_node_count(3);
/// graph.add_edge(0, 1).expect("edge is valid");
/// graph.add_edge(1, 2).expect("edge is valid");
/// assert_eq!(graph.edge_count(), 2);
/// assert_eq!(graph.degree(1), 2);
/// assert!(graph.has_edge(1, 0));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    adjacency: Vec<Vec<usize>>,
    edge_count: usize,
}

impl Graph {
    /// Creates an edgeless graph on `node_count` nodes.
    #[must_use]
    pub fn with_node_count(node_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); node_count],
            edge_count: 0,
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns whether the graph stores no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edge_count == 0
    }

    /// Returns the degree of `node`, or zero for out-of-range indices.
    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.adjacency.get(node).map_or(0, Vec::len)
    }

    /// Returns the sorted neighbour list of `node`.
    #[must_use]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    /// Returns whether an edge connects `a` and `b`.
    #[must_use]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency
            .get(a)
            .is_some_and(|row| row.binary_search(&b).is_ok())
    }

    fn check_endpoints(&self, a: usize, b: usize) -> Result<(), GraphError> {
        let node_count = self.node_count();
        for node in [a, b] {
            if node >= node_count {
                return Err(GraphError::NodeOutOfBounds { node, node_count });
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop { node: a });
        }
        Ok(())
    }

    /// Adds the edge `(a, b)`.
    ///
    /// # Errors
    /// Returns [`GraphError::NodeOutOfBounds`], [`GraphError::SelfLoop`], or
    /// [`GraphError::DuplicateEdge`] when the edge is not a valid addition.
    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<(), GraphError> {
        self.check_endpoints(a, b)?;
        if self.has_edge(a, b) {
            let (source, target) = ordered(a, b);
            return Err(GraphError::DuplicateEdge { source, target });
        }
        for (from, to) in [(a, b), (b, a)] {
            let row = &mut self.adjacency[from];
            let at = row.binary_search(&to).unwrap_or_else(|insert| insert);
            row.insert(at, to);
        }
        self.edge_count += 1;
        Ok(())
    }

    /// Removes the edge `(a, b)`.
    ///
    /// # Errors
    /// Returns [`GraphError::MissingEdge`] when no such edge exists, and the
    /// endpoint errors from [`Graph::add_edge`] for malformed pairs.
    pub fn remove_edge(&mut self, a: usize, b: usize) -> Result<(), GraphError> {
        self.check_endpoints(a, b)?;
        if !self.has_edge(a, b) {
            let (source, target) = ordered(a, b);
            return Err(GraphError::MissingEdge { source, target });
        }
        for (from, to) in [(a, b), (b, a)] {
            let row = &mut self.adjacency[from];
            if let Ok(at) = row.binary_search(&to) {
                row.remove(at);
            }
        }
        self.edge_count -= 1;
        Ok(())
    }

    /// Returns every edge as an ordered `(smaller, larger)` pair.
    #[must_use]
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for (node, row) in self.adjacency.iter().enumerate() {
            for &other in row {
                if node < other {
                    out.push((node, other));
                }
            }
        }
        out
    }

    /// Returns the degree histogram: entry `d` counts nodes of degree `d`.
    #[must_use]
    pub fn degree_histogram(&self) -> Vec<usize> {
        let max_degree = self.adjacency.iter().map(Vec::len).max().unwrap_or(0);
        let mut histogram = vec![0_usize; max_degree + 1];
        for row in &self.adjacency {
            histogram[row.len()] += 1;
        }
        histogram
    }

    /// Returns the node sets of all connected components, largest first.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<usize>> {
        let node_count = self.node_count();
        let mut visited = vec![false; node_count];
        let mut components = Vec::new();
        for start in 0..node_count {
            if visited[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut stack = vec![start];
            visited[start] = true;
            while let Some(node) = stack.pop() {
                component.push(node);
                for &next in self.neighbors(node) {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }
        components.sort_by_key(|component| std::cmp::Reverse(component.len()));
        components
    }

    /// Returns the induced subgraph of the largest connected component,
    /// reindexed to dense node indices.
    ///
    /// Ties between equally large components break towards the component
    /// containing the smallest node index, so the result is deterministic.
    #[must_use]
    pub fn largest_component(&self) -> Self {
        let components = self.components();
        let Some(largest) = components.first() else {
            return Self::default();
        };
        let mut index = vec![usize::MAX; self.node_count()];
        for (dense, &node) in largest.iter().enumerate() {
            index[node] = dense;
        }
        let mut out = Self::with_node_count(largest.len());
        for &node in largest {
            for &other in self.neighbors(node) {
                if node < other {
                    out.add_edge(index[node], index[other])
                        .expect("component edges are valid by construction");
                }
            }
        }
        out
    }
}

/// One edge of a [`ProbabilisticGraph`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbabilisticEdge {
    source: usize,
    target: usize,
    probability: f64,
}

impl ProbabilisticEdge {
    /// Returns the smaller endpoint.
    #[must_use]
    pub const fn source(&self) -> usize {
        self.source
    }

    /// Returns the larger endpoint.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    /// Returns the existence probability in `(0, 1]`.
    #[must_use]
    pub const fn probability(&self) -> f64 {
        self.probability
    }
}

/// Undirected graph whose edges carry independent existence probabilities.
///
/// # Examples
/// ```
/// use granita_core::ProbabilisticGraph;
///
/// let mut network = ProbabilisticGraph::with_node_count(3);
/// network.add_edge(0, 1, 0.9).expect("probability is valid");
/// network.add_edge(1, 2, 0.4).expect("probability is valid");
/// assert_eq!(network.edge_count(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbabilisticGraph {
    node_count: usize,
    edges: Vec<ProbabilisticEdge>,
    present: HashSet<(usize, usize)>,
}

impl ProbabilisticGraph {
    /// Creates an edgeless probabilistic graph on `node_count` nodes.
    #[must_use]
    pub fn with_node_count(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
            present: HashSet::new(),
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the number of probabilistic edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the probabilistic edge list.
    #[must_use]
    pub fn edges(&self) -> &[ProbabilisticEdge] {
        &self.edges
    }

    /// Adds the edge `(a, b)` with the given existence probability.
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidProbability`] for probabilities outside
    /// `(0, 1]`, plus the endpoint and duplicate errors shared with
    /// [`Graph::add_edge`].
    pub fn add_edge(&mut self, a: usize, b: usize, probability: f64) -> Result<(), GraphError> {
        for node in [a, b] {
            if node >= self.node_count {
                return Err(GraphError::NodeOutOfBounds {
                    node,
                    node_count: self.node_count,
                });
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop { node: a });
        }
        let (source, target) = ordered(a, b);
        if !(probability > 0.0 && probability <= 1.0) {
            return Err(GraphError::InvalidProbability {
                source,
                target,
                probability,
            });
        }
        if !self.present.insert((source, target)) {
            return Err(GraphError::DuplicateEdge { source, target });
        }
        self.edges.push(ProbabilisticEdge {
            source,
            target,
            probability,
        });
        Ok(())
    }

    /// Draws one Bernoulli realization: each edge is kept independently with
    /// its existence probability.
    ///
    /// The realization shares this graph's node indices; isolated nodes stay
    /// in place so repeated draws are comparable.
    #[must_use]
    pub fn realize(&self, rng: &mut SmallRng) -> Graph {
        let mut graph = Graph::with_node_count(self.node_count);
        for edge in &self.edges {
            if rng.gen_bool(edge.probability) {
                graph
                    .add_edge(edge.source, edge.target)
                    .expect("probabilistic edges are validated on insertion");
            }
        }
        graph
    }

    /// Restricts the graph to its largest connected component, reindexing
    /// nodes densely.
    ///
    /// This is the one-off preprocessing step applied to raw source data
    /// before sampling; isolated nodes and minor components are dropped.
    #[must_use]
    pub fn largest_component(&self) -> Self {
        let mut support = Graph::with_node_count(self.node_count);
        for edge in &self.edges {
            support
                .add_edge(edge.source, edge.target)
                .expect("probabilistic edges are validated on insertion");
        }
        let components = support.components();
        let Some(largest) = components.first() else {
            return Self::default();
        };
        let mut index = vec![usize::MAX; self.node_count];
        for (dense, &node) in largest.iter().enumerate() {
            index[node] = dense;
        }
        let mut out = Self::with_node_count(largest.len());
        for edge in &self.edges {
            let source = index[edge.source];
            let target = index[edge.target];
            if source != usize::MAX && target != usize::MAX {
                out.add_edge(source, target, edge.probability)
                    .expect("component edges are valid by construction");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rstest::rstest;

    use super::*;

    #[test]
    fn add_edge_rejects_self_loops_and_duplicates() {
        let mut graph = Graph::with_node_count(3);
        assert_eq!(
            graph.add_edge(1, 1).expect_err("self-loop must fail"),
            GraphError::SelfLoop { node: 1 }
        );
        graph.add_edge(0, 1).expect("edge is valid");
        assert_eq!(
            graph.add_edge(1, 0).expect_err("duplicate must fail"),
            GraphError::DuplicateEdge {
                source: 0,
                target: 1
            }
        );
        assert_eq!(
            graph.add_edge(0, 9).expect_err("out of bounds must fail"),
            GraphError::NodeOutOfBounds {
                node: 9,
                node_count: 3
            }
        );
    }

    #[test]
    fn remove_edge_requires_presence() {
        let mut graph = Graph::with_node_count(3);
        graph.add_edge(0, 2).expect("edge is valid");
        graph.remove_edge(2, 0).expect("edge exists");
        assert_eq!(
            graph.remove_edge(0, 2).expect_err("edge is gone"),
            GraphError::MissingEdge {
                source: 0,
                target: 2
            }
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.5)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn probabilistic_graph_rejects_bad_probabilities(#[case] probability: f64) {
        let mut network = ProbabilisticGraph::with_node_count(2);
        let err = network
            .add_edge(0, 1, probability)
            .expect_err("probability must be rejected");
        assert!(matches!(err, GraphError::InvalidProbability { .. }));
    }

    #[test]
    fn realize_keeps_certain_edges() {
        let mut network = ProbabilisticGraph::with_node_count(3);
        network.add_edge(0, 1, 1.0).expect("probability is valid");
        network.add_edge(1, 2, 1.0).expect("probability is valid");
        let mut rng = SmallRng::seed_from_u64(7);
        let graph = network.realize(&mut rng);
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.has_edge(0, 1) && graph.has_edge(1, 2));
    }

    #[test]
    fn realize_is_deterministic_under_a_fixed_seed() {
        let mut network = ProbabilisticGraph::with_node_count(6);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)] {
            network.add_edge(a, b, 0.5).expect("probability is valid");
        }
        let first = network.realize(&mut SmallRng::seed_from_u64(99));
        let second = network.realize(&mut SmallRng::seed_from_u64(99));
        assert_eq!(first, second);
    }

    #[test]
    fn largest_component_reindexes_densely() {
        let mut graph = Graph::with_node_count(6);
        // Component {0, 2, 4} plus an isolated edge {1, 5}; node 3 isolated.
        graph.add_edge(0, 2).expect("edge is valid");
        graph.add_edge(2, 4).expect("edge is valid");
        graph.add_edge(1, 5).expect("edge is valid");
        let core = graph.largest_component();
        assert_eq!(core.node_count(), 3);
        assert_eq!(core.edge_count(), 2);
        assert!(core.has_edge(0, 1) && core.has_edge(1, 2));
    }

    #[test]
    fn probabilistic_largest_component_drops_minor_components() {
        let mut network = ProbabilisticGraph::with_node_count(7);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            network.add_edge(a, b, 0.9).expect("probability is valid");
        }
        network.add_edge(5, 6, 0.9).expect("probability is valid");
        let core = network.largest_component();
        assert_eq!(core.node_count(), 4);
        assert_eq!(core.edge_count(), 4);
    }

    #[test]
    fn degree_histogram_counts_nodes_per_degree() {
        let mut graph = Graph::with_node_count(4);
        graph.add_edge(0, 1).expect("edge is valid");
        graph.add_edge(0, 2).expect("edge is valid");
        graph.add_edge(0, 3).expect("edge is valid");
        assert_eq!(graph.degree_histogram(), vec![0, 3, 0, 1]);
    }
}
