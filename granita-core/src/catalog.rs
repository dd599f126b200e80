//! Canonical classification of graphlet isomorphism classes.
//!
//! A graphlet on `k` nodes is stored as an edge bit-code: with the nodes in a
//! fixed local order, bit `j*(j-1)/2 + i` is set iff nodes `i < j` are
//! adjacent. The code depends on the chosen node order, so each isomorphism
//! class is identified by its canonical code, the minimum code over all `k!`
//! relabelings. Orders are capped at five; the catalog precomputes a dense
//! code-to-class table per order (8, 64, and 1024 entries), which is what
//! makes classification during counting an O(1) lookup.
//!
//! The catalog is immutable once built and is shared read-only by the
//! counter, the sampler, and the generator.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use thiserror::Error;

use crate::graph::Graph;

/// Smallest graphlet order handled by the catalog.
pub const MIN_GRAPHLET_ORDER: usize = 3;
/// Largest graphlet order handled by the catalog.
pub const MAX_GRAPHLET_ORDER: usize = 5;

/// An error produced by catalog construction or classification.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The requested order falls outside `3..=5`.
    #[error("graphlet order {got} is outside the supported range 3..=5")]
    UnsupportedOrder {
        /// The rejected order.
        got: usize,
    },
    /// The node set does not induce a connected subgraph.
    #[error("the {order} given nodes do not induce a connected subgraph")]
    DisconnectedSubgraph {
        /// Number of nodes in the rejected subgraph.
        order: usize,
    },
    /// A node index referred outside the host graph.
    #[error("node {node} is out of bounds for the host graph")]
    NodeOutOfBounds {
        /// The offending node index.
        node: usize,
    },
    /// The same node appeared twice in a subgraph description.
    #[error("node {node} appears more than once in the subgraph")]
    DuplicateNode {
        /// The repeated node index.
        node: usize,
    },
}

/// Validated graphlet order; only 3, 4, and 5 are representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphletOrder {
    /// Three-node graphlets (2 classes).
    Three,
    /// Four-node graphlets (6 classes).
    Four,
    /// Five-node graphlets (21 classes).
    Five,
}

impl GraphletOrder {
    /// Validates a raw order value.
    ///
    /// # Errors
    /// Returns [`CatalogError::UnsupportedOrder`] outside `3..=5`.
    ///
    /// # Examples
    /// ```
    /// use granita_core::GraphletOrder;
    ///
    /// assert_eq!(GraphletOrder::new(4).expect("order is valid").get(), 4);
    /// assert!(GraphletOrder::new(6).is_err());
    /// ```
    pub const fn new(order: usize) -> Result<Self, CatalogError> {
        match order {
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            got => Err(CatalogError::UnsupportedOrder { got }),
        }
    }

    /// Returns the order as a plain node count.
    #[must_use]
    pub const fn get(self) -> usize {
        match self {
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    /// Number of node pairs, i.e. bits in this order's edge codes.
    pub(crate) const fn edge_slots(self) -> usize {
        let k = self.get();
        k * (k - 1) / 2
    }

    /// Size of the code space for this order.
    pub(crate) const fn code_space(self) -> usize {
        1 << self.edge_slots()
    }

    /// Iterates every supported order from three up to and including `self`.
    pub(crate) fn up_to(self) -> impl Iterator<Item = Self> {
        [Self::Three, Self::Four, Self::Five]
            .into_iter()
            .filter(move |order| order.get() <= self.get())
    }
}

/// Dense index of a graphlet class within a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    /// Returns the class's position in the catalog's count vectors.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Canonical representative of one graphlet isomorphism class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphletClass {
    id: ClassId,
    order: GraphletOrder,
    canonical_code: u16,
    rank: usize,
}

impl GraphletClass {
    /// Returns the class id used to index count vectors.
    #[must_use]
    pub const fn id(&self) -> ClassId {
        self.id
    }

    /// Returns the graphlet order.
    #[must_use]
    pub const fn order(&self) -> GraphletOrder {
        self.order
    }

    /// Returns the canonical edge bit-code.
    #[must_use]
    pub const fn canonical_code(&self) -> u16 {
        self.canonical_code
    }

    /// Returns the number of edges in the graphlet.
    #[must_use]
    pub const fn edge_count(&self) -> u32 {
        self.canonical_code.count_ones()
    }

    /// Returns a stable display label such as `k4-02`, where the suffix is
    /// the class's rank within its order.
    #[must_use]
    pub fn label(&self) -> String {
        format!("k{}-{:02}", self.order.get(), self.rank)
    }
}

/// Bit position of the pair `(i, j)` with `i < j` in an edge code.
#[inline]
pub(crate) const fn pair_slot(i: usize, j: usize) -> usize {
    j * (j - 1) / 2 + i
}

/// Computes the edge code of the subgraph induced by `nodes`, in list order.
pub(crate) fn subgraph_code(graph: &Graph, nodes: &[usize]) -> u16 {
    let mut code = 0_u16;
    for j in 1..nodes.len() {
        for i in 0..j {
            if graph.has_edge(nodes[i], nodes[j]) {
                code |= 1 << pair_slot(i, j);
            }
        }
    }
    code
}

/// Extends an order-`k` code to order `k + 1` by appending `new_node`.
///
/// The existing nodes must be passed in the same order used to compute
/// `code`; only the bits involving the appended node are added.
pub(crate) fn extend_code(code: u16, graph: &Graph, nodes: &[usize], new_node: usize) -> u16 {
    let mut out = code;
    let k = nodes.len();
    for (i, &node) in nodes.iter().enumerate() {
        if graph.has_edge(node, new_node) {
            out |= 1 << pair_slot(i, k);
        }
    }
    out
}

/// Returns whether `code` describes a connected graph on `order` nodes.
pub(crate) fn is_connected_code(code: u16, order: GraphletOrder) -> bool {
    let k = order.get();
    let mut visited = 1_u8;
    let mut frontier = vec![0_usize];
    while let Some(node) = frontier.pop() {
        for other in 0..k {
            if other == node || visited & (1 << other) != 0 {
                continue;
            }
            let (i, j) = if node < other {
                (node, other)
            } else {
                (other, node)
            };
            if code & (1 << pair_slot(i, j)) != 0 {
                visited |= 1 << other;
                frontier.push(other);
            }
        }
    }
    visited.count_ones() as usize == k
}

/// Returns the canonical (minimal) code over all relabelings.
pub(crate) fn canonical_code(code: u16, order: GraphletOrder) -> u16 {
    let k = order.get();
    let mut best = code;
    for perm in permutations(k) {
        let mut relabeled = 0_u16;
        for j in 1..k {
            for i in 0..j {
                if code & (1 << pair_slot(i, j)) != 0 {
                    let (a, b) = if perm[i] < perm[j] {
                        (perm[i], perm[j])
                    } else {
                        (perm[j], perm[i])
                    };
                    relabeled |= 1 << pair_slot(a, b);
                }
            }
        }
        best = best.min(relabeled);
    }
    best
}

fn permutations(k: usize) -> Vec<Vec<usize>> {
    fn recurse(items: &mut Vec<usize>, at: usize, out: &mut Vec<Vec<usize>>) {
        if at == items.len() {
            out.push(items.clone());
            return;
        }
        for swap in at..items.len() {
            items.swap(at, swap);
            recurse(items, at + 1, out);
            items.swap(at, swap);
        }
    }

    let mut items: Vec<usize> = (0..k).collect();
    let mut out = Vec::new();
    recurse(&mut items, 0, &mut out);
    out
}

/// Immutable catalog of every connected graphlet class up to a maximum order.
///
/// # Examples
/// ```
/// use granita_core::{GraphletCatalog, GraphletOrder};
///
/// let catalog = GraphletCatalog::new(GraphletOrder::Four);
/// // Two classes of order three plus six of order four.
/// assert_eq!(catalog.len(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct GraphletCatalog {
    max_order: GraphletOrder,
    classes: Vec<GraphletClass>,
    ranges: Vec<Range<usize>>,
    tables: Vec<Vec<Option<ClassId>>>,
}

impl GraphletCatalog {
    /// Enumerates and canonically labels all connected graphlet classes for
    /// each order from three up to `max_order`.
    #[must_use]
    pub fn new(max_order: GraphletOrder) -> Self {
        let mut classes = Vec::new();
        let mut ranges = Vec::new();
        let mut tables = Vec::new();

        for order in max_order.up_to() {
            let space = order.code_space();
            let mut canon_of = vec![None::<u16>; space];
            let mut canons = BTreeSet::new();
            for code in 0..space {
                let code = code as u16;
                if is_connected_code(code, order) {
                    let canon = canonical_code(code, order);
                    canon_of[code as usize] = Some(canon);
                    canons.insert(canon);
                }
            }

            let start = classes.len();
            let mut ids = BTreeMap::new();
            for (rank, canon) in canons.into_iter().enumerate() {
                let id = ClassId(classes.len());
                ids.insert(canon, id);
                classes.push(GraphletClass {
                    id,
                    order,
                    canonical_code: canon,
                    rank,
                });
            }
            ranges.push(start..classes.len());

            let table = canon_of
                .into_iter()
                .map(|canon| canon.map(|code| ids[&code]))
                .collect();
            tables.push(table);
        }

        Self {
            max_order,
            classes,
            ranges,
            tables,
        }
    }

    /// Returns the maximum order this catalog covers.
    #[must_use]
    pub const fn max_order(&self) -> GraphletOrder {
        self.max_order
    }

    /// Returns the total number of classes across all covered orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns whether the catalog holds no classes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns every class, ordered by `(order, canonical code)`.
    #[must_use]
    pub fn classes(&self) -> &[GraphletClass] {
        &self.classes
    }

    /// Returns the classes of one order, or an empty slice beyond the
    /// catalog's maximum.
    #[must_use]
    pub fn classes_of_order(&self, order: GraphletOrder) -> &[GraphletClass] {
        let slot = order.get() - MIN_GRAPHLET_ORDER;
        self.ranges
            .get(slot)
            .map_or(&[], |range| &self.classes[range.clone()])
    }

    /// Looks up a class by id.
    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<&GraphletClass> {
        self.classes.get(id.index())
    }

    /// Classifies an arbitrary edge code of the given order.
    ///
    /// Returns `None` for disconnected codes and for orders beyond the
    /// catalog's maximum; connected node sets always classify.
    #[must_use]
    pub fn class_of_code(&self, code: u16, order: GraphletOrder) -> Option<ClassId> {
        let slot = order.get() - MIN_GRAPHLET_ORDER;
        self.tables
            .get(slot)
            .and_then(|table| table.get(code as usize).copied().flatten())
    }

    /// Returns the canonical code of the subgraph induced by `nodes`.
    ///
    /// The result is invariant under any reordering of `nodes` and under any
    /// relabeling of the host graph.
    ///
    /// # Errors
    /// Returns [`CatalogError::UnsupportedOrder`] for node sets outside
    /// `3..=5` nodes, [`CatalogError::DisconnectedSubgraph`] when the induced
    /// subgraph is not connected, and the bounds and duplicate errors for
    /// malformed node lists.
    pub fn canonicalize(&self, graph: &Graph, nodes: &[usize]) -> Result<u16, CatalogError> {
        let order = GraphletOrder::new(nodes.len())?;
        for (at, &node) in nodes.iter().enumerate() {
            if node >= graph.node_count() {
                return Err(CatalogError::NodeOutOfBounds { node });
            }
            if nodes[..at].contains(&node) {
                return Err(CatalogError::DuplicateNode { node });
            }
        }
        let code = subgraph_code(graph, nodes);
        if !is_connected_code(code, order) {
            return Err(CatalogError::DisconnectedSubgraph {
                order: nodes.len(),
            });
        }
        Ok(canonical_code(code, order))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::OnceLock;

    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn five_catalog() -> &'static GraphletCatalog {
        static CATALOG: OnceLock<GraphletCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| GraphletCatalog::new(GraphletOrder::Five))
    }

    #[rstest]
    #[case(GraphletOrder::Three, &[2])]
    #[case(GraphletOrder::Four, &[2, 6])]
    #[case(GraphletOrder::Five, &[2, 6, 21])]
    fn class_counts_match_known_isomorphism_classes(
        #[case] max_order: GraphletOrder,
        #[case] expected: &[usize],
    ) {
        let catalog = GraphletCatalog::new(max_order);
        let counts: Vec<usize> = max_order
            .up_to()
            .map(|order| catalog.classes_of_order(order).len())
            .collect();
        assert_eq!(counts, expected);
        assert_eq!(catalog.len(), expected.iter().sum::<usize>());
    }

    #[test]
    fn order_three_canonical_codes_are_path_and_triangle() {
        let catalog = GraphletCatalog::new(GraphletOrder::Three);
        let codes: Vec<u16> = catalog
            .classes_of_order(GraphletOrder::Three)
            .iter()
            .map(GraphletClass::canonical_code)
            .collect();
        assert_eq!(codes, vec![0b011, 0b111]);
    }

    #[test]
    fn order_four_canonical_codes_are_distinct_and_connected() {
        let catalog = GraphletCatalog::new(GraphletOrder::Four);
        let classes = catalog.classes_of_order(GraphletOrder::Four);
        let codes: HashSet<u16> = classes.iter().map(GraphletClass::canonical_code).collect();
        assert_eq!(codes.len(), 6);
        for class in classes {
            assert!(is_connected_code(class.canonical_code(), GraphletOrder::Four));
            assert_eq!(
                canonical_code(class.canonical_code(), GraphletOrder::Four),
                class.canonical_code(),
                "canonical codes must be fixed points"
            );
        }
    }

    #[test]
    fn rejects_unsupported_orders() {
        assert!(matches!(
            GraphletOrder::new(2),
            Err(CatalogError::UnsupportedOrder { got: 2 })
        ));
        assert!(matches!(
            GraphletOrder::new(6),
            Err(CatalogError::UnsupportedOrder { got: 6 })
        ));
    }

    #[test]
    fn canonicalize_rejects_disconnected_subgraphs() {
        let mut graph = Graph::with_node_count(4);
        graph.add_edge(0, 1).expect("edge is valid");
        graph.add_edge(2, 3).expect("edge is valid");
        let catalog = GraphletCatalog::new(GraphletOrder::Four);
        let err = catalog
            .canonicalize(&graph, &[0, 1, 2, 3])
            .expect_err("disconnected node set must fail");
        assert!(matches!(err, CatalogError::DisconnectedSubgraph { .. }));
    }

    #[test]
    fn canonicalize_rejects_duplicate_nodes() {
        let mut graph = Graph::with_node_count(3);
        graph.add_edge(0, 1).expect("edge is valid");
        graph.add_edge(1, 2).expect("edge is valid");
        let catalog = GraphletCatalog::new(GraphletOrder::Three);
        let err = catalog
            .canonicalize(&graph, &[0, 1, 1])
            .expect_err("duplicate node must fail");
        assert!(matches!(err, CatalogError::DuplicateNode { node: 1 }));
    }

    #[test]
    fn canonicalize_ignores_node_order() {
        let mut graph = Graph::with_node_count(4);
        for (a, b) in [(0, 1), (1, 2), (2, 3)] {
            graph.add_edge(a, b).expect("edge is valid");
        }
        let catalog = GraphletCatalog::new(GraphletOrder::Four);
        let reference = catalog
            .canonicalize(&graph, &[0, 1, 2, 3])
            .expect("path is connected");
        for nodes in [[3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]] {
            let code = catalog
                .canonicalize(&graph, &nodes)
                .expect("path is connected");
            assert_eq!(code, reference);
        }
    }

    proptest! {
        // Relabeling invariance: the canonical code of a random connected
        // code must not depend on how its nodes are labelled.
        #[test]
        fn canonical_code_is_invariant_under_relabeling(raw in 0_u16..1024, seed in any::<u64>()) {
            let order = GraphletOrder::Five;
            prop_assume!(is_connected_code(raw, order));

            // Derive a permutation from the seed.
            let k = order.get();
            let mut perm: Vec<usize> = (0..k).collect();
            let mut state = seed;
            for at in (1..k).rev() {
                state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                let pick = (state >> 33) as usize % (at + 1);
                perm.swap(at, pick);
            }

            let mut relabeled = 0_u16;
            for j in 1..k {
                for i in 0..j {
                    if raw & (1 << pair_slot(i, j)) != 0 {
                        let (a, b) = if perm[i] < perm[j] { (perm[i], perm[j]) } else { (perm[j], perm[i]) };
                        relabeled |= 1 << pair_slot(a, b);
                    }
                }
            }

            prop_assert_eq!(
                canonical_code(raw, order),
                canonical_code(relabeled, order)
            );
        }

        // Injectivity: codes sharing a canonical label must have the same
        // degree multiset, and the table classifies exactly the connected codes.
        #[test]
        fn classification_covers_exactly_the_connected_codes(raw in 0_u16..1024) {
            let order = GraphletOrder::Five;
            let catalog = five_catalog();
            let class = catalog.class_of_code(raw, order);
            prop_assert_eq!(class.is_some(), is_connected_code(raw, order));
            if let Some(id) = class {
                let class = catalog.class(id).expect("class id is valid");
                prop_assert_eq!(class.canonical_code(), canonical_code(raw, order));
            }
        }
    }
}
