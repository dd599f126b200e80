//! Incremental, bound-constrained graph generation.
//!
//! [`BoundedGrowth`] owns the graph under construction and its live count
//! vector. Each step draws a candidate among the currently non-adjacent node
//! pairs, prices it with the incremental counter, and commits it only when no
//! class's count would exceed its upper bound. Lower bounds describe eventual
//! targets, so they are checked solely at termination. Rejection is bounded:
//! an exhausted per-step retry budget counts as a stall, and repeated stalls
//! terminate the run with the partial graph attached rather than erroring.

use std::num::NonZeroUsize;

use rand::{Rng, SeedableRng, rngs::SmallRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, instrument};

use crate::catalog::GraphletCatalog;
use crate::census::edge_delta;
use crate::counts::{CountVector, FrequencyBounds};
use crate::graph::{Graph, ordered};
use crate::seeding::mix_seed;

const DEFAULT_RETRY_LIMIT: usize = 64;
const DEFAULT_STALL_LIMIT: usize = 3;
const REJECTION_TRIES: usize = 32;

/// An error produced while validating generation parameters.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GrowthError {
    /// The target node count must be at least one.
    #[error("target node count must be at least 1 (got {got})")]
    InvalidNodeCount {
        /// The rejected node count.
        got: usize,
    },
    /// The target node count cannot host the catalog's largest graphlets.
    #[error("target node count {node_count} is below the maximum graphlet order {max_order}")]
    NodeCountBelowOrder {
        /// Configured target node count.
        node_count: usize,
        /// Maximum graphlet order of the catalog in use.
        max_order: usize,
    },
    /// The bounds were derived for a different catalog shape.
    #[error("bounds cover {bounds} classes but the catalog defines {catalog}")]
    ClassCountMismatch {
        /// Number of classes in the supplied bounds.
        bounds: usize,
        /// Number of classes in the catalog.
        catalog: usize,
    },
    /// The per-step retry limit must be at least one.
    #[error("retry limit must be at least 1")]
    InvalidRetryLimit,
    /// The consecutive-stall limit must be at least one.
    #[error("stall limit must be at least 1")]
    InvalidStallLimit,
}

/// Why a generation run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Every class count lies within its `[lower, upper]` interval.
    BoundsSatisfied,
    /// The configured edge budget was exhausted before the bounds were met.
    EdgeBudget,
    /// No acceptable candidate was found within the retry and stall budgets.
    Stalled,
}

impl Termination {
    /// Returns a stable machine-readable name for the stop condition.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BoundsSatisfied => "bounds-satisfied",
            Self::EdgeBudget => "edge-budget",
            Self::Stalled => "stalled",
        }
    }
}

/// Validated generation parameters.
///
/// # Examples
/// ```
/// use granita_core::GrowthParams;
///
/// let params = GrowthParams::new(30)
///     .expect("node count is valid")
///     .with_edge_budget(60)
///     .with_rng_seed(7);
/// assert_eq!(params.node_count().get(), 30);
/// assert_eq!(params.edge_budget(), Some(60));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrowthParams {
    node_count: NonZeroUsize,
    edge_budget: Option<usize>,
    retry_limit: usize,
    stall_limit: usize,
    rng_seed: u64,
}

impl GrowthParams {
    /// Creates a parameter set for the given target node count.
    ///
    /// # Errors
    /// Returns [`GrowthError::InvalidNodeCount`] when `node_count` is zero.
    pub fn new(node_count: usize) -> Result<Self, GrowthError> {
        let node_count =
            NonZeroUsize::new(node_count).ok_or(GrowthError::InvalidNodeCount { got: node_count })?;
        Ok(Self {
            node_count,
            edge_budget: None,
            retry_limit: DEFAULT_RETRY_LIMIT,
            stall_limit: DEFAULT_STALL_LIMIT,
            rng_seed: 0x5EED_CAFE,
        })
    }

    /// Caps the number of edges a run may add.
    ///
    /// Without a budget, growth continues until the bounds are satisfied or
    /// the run stalls.
    #[must_use]
    pub const fn with_edge_budget(mut self, edges: usize) -> Self {
        self.edge_budget = Some(edges);
        self
    }

    /// Overrides the number of candidates tried per step.
    #[must_use]
    pub const fn with_retry_limit(mut self, retries: usize) -> Self {
        self.retry_limit = retries;
        self
    }

    /// Overrides the number of consecutive exhausted steps tolerated before
    /// the run is declared stalled.
    #[must_use]
    pub const fn with_stall_limit(mut self, stalls: usize) -> Self {
        self.stall_limit = stalls;
        self
    }

    /// Seeds the candidate draws to make the edge sequence deterministic.
    #[must_use]
    pub const fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Returns the target node count.
    #[must_use]
    pub const fn node_count(&self) -> NonZeroUsize {
        self.node_count
    }

    /// Returns the configured edge budget, if any.
    #[must_use]
    pub const fn edge_budget(&self) -> Option<usize> {
        self.edge_budget
    }

    /// Returns the per-step retry limit.
    #[must_use]
    pub const fn retry_limit(&self) -> usize {
        self.retry_limit
    }

    /// Returns the consecutive-stall limit.
    #[must_use]
    pub const fn stall_limit(&self) -> usize {
        self.stall_limit
    }

    /// Returns the configured base seed.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

/// The result of one generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrownGraph {
    graph: Graph,
    counts: CountVector,
    termination: Termination,
    edges_added: usize,
}

impl GrownGraph {
    /// Returns the generated graph, complete or partial.
    #[must_use]
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns the final graphlet counts, kept in sync during growth.
    #[must_use]
    pub const fn counts(&self) -> &CountVector {
        &self.counts
    }

    /// Returns which stopping condition ended the run.
    #[must_use]
    pub const fn termination(&self) -> Termination {
        self.termination
    }

    /// Returns how many edges the run committed.
    #[must_use]
    pub const fn edges_added(&self) -> usize {
        self.edges_added
    }

    /// Consumes the result, keeping only the graph.
    #[must_use]
    pub fn into_graph(self) -> Graph {
        self.graph
    }
}

/// Bound-constrained incremental generator.
///
/// Shares the catalog and bounds read-only; each run owns its in-progress
/// graph exclusively, so independent runs parallelize freely.
///
/// # Examples
/// ```
/// use granita_core::{
///     BoundedGrowth, FrequencyBounds, GraphletCatalog, GraphletOrder, GrowthParams, Termination,
/// };
///
/// let catalog = GraphletCatalog::new(GraphletOrder::Three);
/// let bounds = FrequencyBounds::from_limits(vec![(1, 4), (0, 1)]).expect("intervals valid");
/// let params = GrowthParams::new(4).expect("node count is valid").with_rng_seed(3);
/// let generator = BoundedGrowth::new(params, &catalog, &bounds).expect("configuration is valid");
/// let grown = generator.grow();
/// assert_eq!(grown.termination(), Termination::BoundsSatisfied);
/// ```
#[derive(Debug)]
pub struct BoundedGrowth<'a> {
    params: GrowthParams,
    catalog: &'a GraphletCatalog,
    bounds: &'a FrequencyBounds,
}

impl<'a> BoundedGrowth<'a> {
    /// Validates the configuration against the catalog and bounds.
    ///
    /// # Errors
    /// Returns [`GrowthError::NodeCountBelowOrder`] when the target graph
    /// cannot host the catalog's largest graphlets,
    /// [`GrowthError::ClassCountMismatch`] when the bounds were derived for a
    /// different catalog, and the limit errors for degenerate retry or stall
    /// budgets.
    pub fn new(
        params: GrowthParams,
        catalog: &'a GraphletCatalog,
        bounds: &'a FrequencyBounds,
    ) -> Result<Self, GrowthError> {
        if params.node_count().get() < catalog.max_order().get() {
            return Err(GrowthError::NodeCountBelowOrder {
                node_count: params.node_count().get(),
                max_order: catalog.max_order().get(),
            });
        }
        if bounds.len() != catalog.len() {
            return Err(GrowthError::ClassCountMismatch {
                bounds: bounds.len(),
                catalog: catalog.len(),
            });
        }
        if params.retry_limit() == 0 {
            return Err(GrowthError::InvalidRetryLimit);
        }
        if params.stall_limit() == 0 {
            return Err(GrowthError::InvalidStallLimit);
        }
        Ok(Self {
            params,
            catalog,
            bounds,
        })
    }

    /// Runs one generation with the configured seed.
    #[must_use]
    pub fn grow(&self) -> GrownGraph {
        self.grow_with_seed(self.params.rng_seed())
    }

    /// Runs one generation with an explicit seed override.
    #[must_use]
    #[instrument(
        name = "core.grow",
        skip(self),
        fields(
            nodes = self.params.node_count().get(),
            budget = self.params.edge_budget(),
            seed,
        ),
    )]
    pub fn grow_with_seed(&self, seed: u64) -> GrownGraph {
        let node_count = self.params.node_count().get();
        let total_pairs = node_count * (node_count - 1) / 2;
        let budget = self
            .params
            .edge_budget()
            .map_or(total_pairs, |edges| edges.min(total_pairs));
        let unbudgeted = self.params.edge_budget().is_none();

        let mut rng = SmallRng::seed_from_u64(seed);
        let mut graph = Graph::with_node_count(node_count);
        let mut counts = CountVector::zeros(self.catalog);
        let mut edges_added = 0_usize;
        let mut consecutive_stalls = 0_usize;

        let termination = 'grow: loop {
            // Lower bounds describe eventual targets, so the closed check
            // runs only between committed steps, never against candidates.
            if unbudgeted && self.bounds.contains(&counts) {
                break Termination::BoundsSatisfied;
            }
            if edges_added >= budget {
                break if self.bounds.contains(&counts) {
                    Termination::BoundsSatisfied
                } else {
                    Termination::EdgeBudget
                };
            }

            let mut accepted = false;
            for _ in 0..self.params.retry_limit() {
                let Some((a, b)) = draw_candidate(&mut rng, &graph) else {
                    break 'grow Termination::Stalled;
                };
                let delta = edge_delta(&graph, a, b, self.catalog)
                    .expect("candidate endpoints are drawn from the graph");
                let next_counts = counts
                    .applying(&delta)
                    .expect("deltas are computed against the live counts");
                if self.bounds.within_upper(&next_counts) {
                    graph
                        .add_edge(a, b)
                        .expect("candidates are drawn among absent edges");
                    counts = next_counts;
                    edges_added += 1;
                    accepted = true;
                    break;
                }
            }

            if accepted {
                consecutive_stalls = 0;
            } else {
                consecutive_stalls += 1;
                if consecutive_stalls >= self.params.stall_limit() {
                    break Termination::Stalled;
                }
            }
        };

        info!(
            edges = edges_added,
            termination = termination.as_str(),
            "generation finished"
        );

        GrownGraph {
            graph,
            counts,
            termination,
            edges_added,
        }
    }

    /// Produces `graphs` independent runs with per-run derived seeds.
    ///
    /// Runs share only the read-only bounds and catalog; with the `parallel`
    /// feature they execute on the Rayon pool. The result order matches the
    /// run index, and each run is identical to calling
    /// [`BoundedGrowth::grow_with_seed`] with the same derived seed.
    #[must_use]
    pub fn generate_many(&self, graphs: usize) -> Vec<GrownGraph> {
        let seeds: Vec<u64> = (0..graphs)
            .map(|run| mix_seed(self.params.rng_seed(), run))
            .collect();

        #[cfg(feature = "parallel")]
        {
            seeds
                .into_par_iter()
                .map(|seed| self.grow_with_seed(seed))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            seeds
                .into_iter()
                .map(|seed| self.grow_with_seed(seed))
                .collect()
        }
    }
}

/// Draws a uniformly random currently-non-adjacent node pair.
///
/// Rejection sampling handles the sparse regime; once the graph gets dense
/// enough for repeated collisions, the draw falls back to indexing uniformly
/// into the enumerated open pairs so the distribution stays uniform.
fn draw_candidate(rng: &mut SmallRng, graph: &Graph) -> Option<(usize, usize)> {
    let node_count = graph.node_count();
    if node_count < 2 {
        return None;
    }
    let total_pairs = node_count * (node_count - 1) / 2;
    let open_pairs = total_pairs - graph.edge_count();
    if open_pairs == 0 {
        return None;
    }

    for _ in 0..REJECTION_TRIES {
        let a = rng.gen_range(0..node_count);
        let b = rng.gen_range(0..node_count);
        if a != b && !graph.has_edge(a, b) {
            return Some(ordered(a, b));
        }
    }

    let mut remaining = rng.gen_range(0..open_pairs);
    for a in 0..node_count {
        for b in (a + 1)..node_count {
            if !graph.has_edge(a, b) {
                if remaining == 0 {
                    return Some((a, b));
                }
                remaining -= 1;
            }
        }
    }
    None
}
