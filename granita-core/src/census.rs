//! Graphlet counting: the full census and the incremental edge delta.
//!
//! The full census enumerates every connected induced subgraph of order three
//! up to the catalog's maximum with a neighbourhood-restricted expansion:
//! each subgraph is anchored on its minimal node and grown only through
//! exclusive neighbours with larger indices, so every subset is visited
//! exactly once and disconnected subsets are never materialized. The delta
//! path recounts only the subgraphs containing both endpoints of a toggled
//! edge; everything not touching the edge is unaffected by construction.

use std::collections::HashSet;

use crate::catalog::{GraphletCatalog, GraphletOrder, extend_code, subgraph_code};
use crate::counts::{CountDelta, CountVector};
use crate::graph::{Graph, GraphError, ordered};

/// Computes the full graphlet count vector of `graph`.
///
/// # Examples
/// ```
/// use granita_core::{Graph, GraphletCatalog, GraphletOrder, full_census};
///
/// let mut graph = Graph::with_node_count(3);
/// graph.add_edge(0, 1).expect("edge is valid");
/// graph.add_edge(1, 2).expect("edge is valid");
/// let catalog = GraphletCatalog::new(GraphletOrder::Three);
/// // One open triad, no triangles.
/// assert_eq!(full_census(&graph, &catalog).as_slice(), &[1, 0]);
/// ```
#[must_use]
pub fn full_census(graph: &Graph, catalog: &GraphletCatalog) -> CountVector {
    let mut counts = CountVector::zeros(catalog);
    let mut sub = Vec::with_capacity(catalog.max_order().get());
    for root in 0..graph.node_count() {
        let ext: Vec<usize> = graph
            .neighbors(root)
            .iter()
            .copied()
            .filter(|&candidate| candidate > root)
            .collect();
        sub.push(root);
        extend(graph, catalog, &mut counts, &mut sub, &ext, root);
        sub.pop();
    }
    counts
}

fn extend(
    graph: &Graph,
    catalog: &GraphletCatalog,
    counts: &mut CountVector,
    sub: &mut Vec<usize>,
    ext: &[usize],
    root: usize,
) {
    if let Ok(order) = GraphletOrder::new(sub.len()) {
        let code = subgraph_code(graph, sub);
        let id = catalog
            .class_of_code(code, order)
            .expect("expansion only reaches connected subgraphs");
        counts.record(id);
    }
    if sub.len() == catalog.max_order().get() {
        return;
    }

    let mut remaining = ext.to_vec();
    while let Some(next) = remaining.pop() {
        let mut frontier = remaining.clone();
        for &candidate in graph.neighbors(next) {
            // Exclusive neighbourhood: only nodes seen for the first time
            // through `next` may extend the subgraph, and only with indices
            // above the anchor so each subset is enumerated once.
            if candidate <= root
                || sub.contains(&candidate)
                || sub.iter().any(|&member| graph.has_edge(member, candidate))
            {
                continue;
            }
            frontier.push(candidate);
        }
        sub.push(next);
        extend(graph, catalog, counts, sub, &frontier, root);
        sub.pop();
    }
}

/// Computes the signed change in graphlet counts caused by toggling the edge
/// `(a, b)`.
///
/// `graph` is the graph *before* the toggle. When the edge is absent the
/// delta describes its addition; when present, its removal. Only connected
/// induced subgraphs containing both endpoints are visited, which is what
/// makes this the cheap path the generator leans on for every candidate.
///
/// # Errors
/// Returns [`GraphError::NodeOutOfBounds`] or [`GraphError::SelfLoop`] for
/// malformed endpoint pairs.
pub fn edge_delta(
    graph: &Graph,
    a: usize,
    b: usize,
    catalog: &GraphletCatalog,
) -> Result<CountDelta, GraphError> {
    let node_count = graph.node_count();
    for node in [a, b] {
        if node >= node_count {
            return Err(GraphError::NodeOutOfBounds { node, node_count });
        }
    }
    if a == b {
        return Err(GraphError::SelfLoop { node: a });
    }

    let max_order = catalog.max_order().get();
    let mut delta = CountDelta::zeros(catalog);
    let mut seen_third: HashSet<usize> = HashSet::new();
    let mut seen_fourth: HashSet<(usize, usize)> = HashSet::new();
    let mut seen_fifth: HashSet<(usize, usize, usize)> = HashSet::new();

    for anchor in [a, b] {
        for &n3 in graph.neighbors(anchor) {
            if n3 == a || n3 == b || !seen_third.insert(n3) {
                continue;
            }
            let code3 = subgraph_code(graph, &[a, b, n3]);
            toggle(&mut delta, catalog, GraphletOrder::Three, code3);
            if max_order < 4 {
                continue;
            }

            for source in [a, b, n3] {
                for &n4 in graph.neighbors(source) {
                    if n4 == a || n4 == b || n4 == n3 || !seen_fourth.insert(ordered(n3, n4)) {
                        continue;
                    }
                    let code4 = extend_code(code3, graph, &[a, b, n3], n4);
                    toggle(&mut delta, catalog, GraphletOrder::Four, code4);
                    if max_order < 5 {
                        continue;
                    }

                    for inner in [a, b, n3, n4] {
                        for &n5 in graph.neighbors(inner) {
                            if n5 == a || n5 == b || n5 == n3 || n5 == n4 {
                                continue;
                            }
                            let mut key = [n3, n4, n5];
                            key.sort_unstable();
                            if !seen_fifth.insert((key[0], key[1], key[2])) {
                                continue;
                            }
                            let code5 = extend_code(code4, graph, &[a, b, n3, n4], n5);
                            toggle(&mut delta, catalog, GraphletOrder::Five, code5);
                        }
                    }
                }
            }
        }
    }

    Ok(delta)
}

/// Records the class change for one subgraph when the `(a, b)` bit flips.
///
/// Bit zero of every code is the toggled edge because the endpoint pair
/// always occupies the first two positions of the node list. A `None` class
/// means the subgraph is disconnected on that side of the toggle and simply
/// contributes nothing.
fn toggle(delta: &mut CountDelta, catalog: &GraphletCatalog, order: GraphletOrder, code: u16) {
    if let Some(id) = catalog.class_of_code(code, order) {
        delta.shift(id, -1);
    }
    if let Some(id) = catalog.class_of_code(code ^ 1, order) {
        delta.shift(id, 1);
    }
}
