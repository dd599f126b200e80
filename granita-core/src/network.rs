//! Label-preserving assembly of probabilistic networks.
//!
//! Source files identify nodes by arbitrary labels (GML integer ids, names in
//! an edge list). The core works on dense `usize` indices, so format
//! providers funnel their parsed records through [`NetworkBuilder`], which
//! interns labels in first-seen order and validates edges as they arrive.

use std::collections::HashMap;

use crate::graph::{GraphError, ProbabilisticGraph};

/// A probabilistic graph together with the label table mapping dense node
/// indices back to the identifiers used by the source file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabeledNetwork {
    graph: ProbabilisticGraph,
    labels: Vec<String>,
}

impl LabeledNetwork {
    /// Returns the probabilistic graph.
    #[must_use]
    pub fn graph(&self) -> &ProbabilisticGraph {
        &self.graph
    }

    /// Consumes the network and returns the probabilistic graph.
    #[must_use]
    pub fn into_graph(self) -> ProbabilisticGraph {
        self.graph
    }

    /// Returns the label of a dense node index, if it exists.
    #[must_use]
    pub fn label(&self, node: usize) -> Option<&str> {
        self.labels.get(node).map(String::as_str)
    }

    /// Returns the full label table, indexed by dense node id.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Incremental builder used by format providers.
///
/// # Examples
/// ```
/// use granita_core::NetworkBuilder;
///
/// let mut builder = NetworkBuilder::new();
/// builder.add_edge("alice", "bob", 0.8).expect("edge is valid");
/// builder.add_edge("bob", "carol", 0.5).expect("edge is valid");
/// let network = builder.finish();
/// assert_eq!(network.graph().node_count(), 3);
/// assert_eq!(network.label(0), Some("alice"));
/// ```
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    labels: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<(usize, usize, f64)>,
}

impl NetworkBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `label`, returning its dense node index.
    pub fn add_node(&mut self, label: &str) -> usize {
        if let Some(&node) = self.index.get(label) {
            return node;
        }
        let node = self.labels.len();
        self.labels.push(label.to_owned());
        self.index.insert(label.to_owned(), node);
        node
    }

    /// Declares a node that must not already exist.
    ///
    /// # Errors
    /// Returns [`GraphError::DuplicateLabel`] when `label` was declared
    /// before. Used by formats with explicit node sections (GML).
    pub fn declare_node(&mut self, label: &str) -> Result<usize, GraphError> {
        if self.index.contains_key(label) {
            return Err(GraphError::DuplicateLabel {
                label: label.to_owned(),
            });
        }
        Ok(self.add_node(label))
    }

    /// Records a probabilistic edge between two labelled nodes.
    ///
    /// Unknown labels are interned on the fly, so edge-list formats need no
    /// separate node declarations.
    ///
    /// # Errors
    /// Returns [`GraphError::SelfLoop`] when both labels intern to the same
    /// node. Probability and duplicate validation happen in
    /// [`NetworkBuilder::finish`]'s underlying graph insertions, so this
    /// method also surfaces [`GraphError::InvalidProbability`] and
    /// [`GraphError::DuplicateEdge`] eagerly.
    pub fn add_edge(&mut self, from: &str, to: &str, probability: f64) -> Result<(), GraphError> {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if a == b {
            return Err(GraphError::SelfLoop { node: a });
        }
        if !(probability > 0.0 && probability <= 1.0) {
            let (source, target) = if a > b { (b, a) } else { (a, b) };
            return Err(GraphError::InvalidProbability {
                source,
                target,
                probability,
            });
        }
        if self
            .edges
            .iter()
            .any(|&(x, y, _)| (x, y) == (a, b) || (x, y) == (b, a))
        {
            let (source, target) = if a > b { (b, a) } else { (a, b) };
            return Err(GraphError::DuplicateEdge { source, target });
        }
        self.edges.push((a, b, probability));
        Ok(())
    }

    /// Finalizes the builder into a [`LabeledNetwork`].
    #[must_use]
    pub fn finish(self) -> LabeledNetwork {
        let mut graph = ProbabilisticGraph::with_node_count(self.labels.len());
        for (a, b, probability) in self.edges {
            graph
                .add_edge(a, b, probability)
                .expect("edges were validated as they were recorded");
        }
        LabeledNetwork {
            graph,
            labels: self.labels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_labels_in_first_seen_order() {
        let mut builder = NetworkBuilder::new();
        builder.add_edge("c", "a", 0.5).expect("edge is valid");
        builder.add_edge("a", "b", 0.5).expect("edge is valid");
        let network = builder.finish();
        assert_eq!(network.labels(), ["c", "a", "b"]);
        assert_eq!(network.graph().edge_count(), 2);
    }

    #[test]
    fn rejects_duplicate_edges_across_label_order() {
        let mut builder = NetworkBuilder::new();
        builder.add_edge("a", "b", 0.5).expect("edge is valid");
        let err = builder
            .add_edge("b", "a", 0.7)
            .expect_err("reversed duplicate must fail");
        assert!(matches!(err, GraphError::DuplicateEdge { .. }));
    }

    #[test]
    fn declare_node_rejects_repeats() {
        let mut builder = NetworkBuilder::new();
        builder.declare_node("n0").expect("first declaration");
        let err = builder
            .declare_node("n0")
            .expect_err("second declaration must fail");
        assert!(matches!(err, GraphError::DuplicateLabel { .. }));
    }

    #[test]
    fn rejects_self_loops_by_label() {
        let mut builder = NetworkBuilder::new();
        let err = builder
            .add_edge("a", "a", 0.5)
            .expect_err("self-loop must fail");
        assert!(matches!(err, GraphError::SelfLoop { .. }));
    }
}
