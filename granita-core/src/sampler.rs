//! Monte Carlo estimation of graphlet frequency bounds.
//!
//! The sampler draws S independent Bernoulli realizations of a probabilistic
//! graph, restricts each to its largest connected component, runs the full
//! census on it, and turns the resulting per-class count distributions into
//! `[lower, upper]` bounds under a configurable policy. Realizations are
//! mutually independent, so with the `parallel` feature they fan out over a
//! Rayon pool; per-realization seeds are derived up front, which keeps the
//! outcome identical regardless of scheduling.

use std::num::NonZeroUsize;

use rand::{SeedableRng, rngs::SmallRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, instrument};

use crate::catalog::GraphletCatalog;
use crate::census::full_census;
use crate::counts::{ClassBounds, CountVector, FrequencyBounds};
use crate::graph::ProbabilisticGraph;
use crate::seeding::mix_seed;

/// An error produced while validating sampling parameters.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SampleError {
    /// The sample count must be at least one.
    #[error("sample count must be at least 1 (got {got})")]
    ZeroSamples {
        /// The rejected sample count.
        got: usize,
    },
    /// A percentile pair was outside `[0, 1]` or inverted.
    #[error("percentile trim ({lower}, {upper}) must satisfy 0 <= lower <= upper <= 1")]
    InvalidPercentile {
        /// Lower percentile supplied.
        lower: f64,
        /// Upper percentile supplied.
        upper: f64,
    },
}

/// Rule converting an empirical count distribution into per-class bounds.
///
/// The choice is a tunable: `MinMax` reproduces the observed envelope
/// exactly, while a percentile trim tolerates sampling noise at small S.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundPolicy {
    /// Use the minimum and maximum observed counts.
    MinMax,
    /// Clip to the given lower and upper percentiles (nearest rank).
    Percentile {
        /// Lower percentile in `[0, 1]`.
        lower: f64,
        /// Upper percentile in `[0, 1]`.
        upper: f64,
    },
}

impl BoundPolicy {
    fn validate(self) -> Result<Self, SampleError> {
        match self {
            Self::MinMax => Ok(self),
            Self::Percentile { lower, upper } => {
                let ordered = lower <= upper;
                let in_range = (0.0..=1.0).contains(&lower) && (0.0..=1.0).contains(&upper);
                if ordered && in_range {
                    Ok(self)
                } else {
                    Err(SampleError::InvalidPercentile { lower, upper })
                }
            }
        }
    }

    /// Derives one class's bounds from its sorted count samples.
    fn derive(self, sorted: &[u64]) -> ClassBounds {
        let last = sorted.len() - 1;
        let (low_at, high_at) = match self {
            Self::MinMax => (0, last),
            Self::Percentile { lower, upper } => (
                percentile_rank(lower, sorted.len()),
                percentile_rank(upper, sorted.len()),
            ),
        };
        ClassBounds::new(sorted[low_at], sorted[high_at])
    }
}

fn percentile_rank(quantile: f64, samples: usize) -> usize {
    let last = (samples - 1) as f64;
    (quantile * last).round() as usize
}

/// Validated sampling configuration.
///
/// # Examples
/// ```
/// use granita_core::{BoundPolicy, SampleParams};
///
/// let params = SampleParams::new(500, BoundPolicy::MinMax)
///     .expect("parameters are valid")
///     .with_rng_seed(11);
/// assert_eq!(params.samples().get(), 500);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SampleParams {
    samples: NonZeroUsize,
    policy: BoundPolicy,
    rng_seed: u64,
}

impl SampleParams {
    /// Creates a parameter set for S samples under the given bound policy.
    ///
    /// # Errors
    /// Returns [`SampleError::ZeroSamples`] for a zero sample count and
    /// [`SampleError::InvalidPercentile`] for malformed percentile trims.
    pub fn new(samples: usize, policy: BoundPolicy) -> Result<Self, SampleError> {
        let samples =
            NonZeroUsize::new(samples).ok_or(SampleError::ZeroSamples { got: samples })?;
        Ok(Self {
            samples,
            policy: policy.validate()?,
            rng_seed: 0x5EED_CAFE,
        })
    }

    /// Seeds the realization draws to make bounds reproducible.
    #[must_use]
    pub const fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Returns the configured sample count.
    #[must_use]
    pub const fn samples(&self) -> NonZeroUsize {
        self.samples
    }

    /// Returns the configured bound policy.
    #[must_use]
    pub const fn policy(&self) -> BoundPolicy {
        self.policy
    }

    /// Returns the configured base seed.
    #[must_use]
    pub const fn rng_seed(&self) -> u64 {
        self.rng_seed
    }
}

/// Aggregate statistics across all realizations.
///
/// These feed the baseline models: the swap model needs the expected degree
/// histogram and class counts, the attachment model the expected node and
/// edge totals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphStatistics {
    mean_node_count: f64,
    std_node_count: f64,
    mean_edge_count: f64,
    std_edge_count: f64,
    mean_degree_histogram: Vec<f64>,
    mean_class_counts: Vec<f64>,
    std_class_counts: Vec<f64>,
}

impl GraphStatistics {
    /// Mean node count of the realizations' largest components.
    #[must_use]
    pub const fn mean_node_count(&self) -> f64 {
        self.mean_node_count
    }

    /// Standard deviation of the node count.
    #[must_use]
    pub const fn std_node_count(&self) -> f64 {
        self.std_node_count
    }

    /// Mean edge count of the realizations' largest components.
    #[must_use]
    pub const fn mean_edge_count(&self) -> f64 {
        self.mean_edge_count
    }

    /// Standard deviation of the edge count.
    #[must_use]
    pub const fn std_edge_count(&self) -> f64 {
        self.std_edge_count
    }

    /// Mean degree histogram; entry `d` is the expected number of nodes of
    /// degree `d`.
    #[must_use]
    pub fn mean_degree_histogram(&self) -> &[f64] {
        &self.mean_degree_histogram
    }

    /// Mean per-class graphlet counts, catalog order.
    #[must_use]
    pub fn mean_class_counts(&self) -> &[f64] {
        &self.mean_class_counts
    }

    /// Standard deviation of the per-class graphlet counts.
    #[must_use]
    pub fn std_class_counts(&self) -> &[f64] {
        &self.std_class_counts
    }
}

/// Bounds plus summary statistics from one sampling run.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleOutcome {
    bounds: FrequencyBounds,
    statistics: GraphStatistics,
}

impl SampleOutcome {
    /// Returns the derived frequency bounds.
    #[must_use]
    pub const fn bounds(&self) -> &FrequencyBounds {
        &self.bounds
    }

    /// Returns the aggregate realization statistics.
    #[must_use]
    pub const fn statistics(&self) -> &GraphStatistics {
        &self.statistics
    }

    /// Splits the outcome into bounds and statistics.
    #[must_use]
    pub fn into_parts(self) -> (FrequencyBounds, GraphStatistics) {
        (self.bounds, self.statistics)
    }
}

struct RealizationSummary {
    node_count: usize,
    edge_count: usize,
    degree_histogram: Vec<usize>,
    counts: CountVector,
}

fn summarize(source: &ProbabilisticGraph, catalog: &GraphletCatalog, seed: u64) -> RealizationSummary {
    let mut rng = SmallRng::seed_from_u64(seed);
    let realization = source.realize(&mut rng).largest_component();
    let counts = full_census(&realization, catalog);
    RealizationSummary {
        node_count: realization.node_count(),
        edge_count: realization.edge_count(),
        degree_histogram: realization.degree_histogram(),
        counts,
    }
}

fn collect_summaries(
    source: &ProbabilisticGraph,
    catalog: &GraphletCatalog,
    params: &SampleParams,
) -> Vec<RealizationSummary> {
    let seeds: Vec<u64> = (0..params.samples().get())
        .map(|index| mix_seed(params.rng_seed(), index))
        .collect();

    #[cfg(feature = "parallel")]
    {
        seeds
            .into_par_iter()
            .map(|seed| summarize(source, catalog, seed))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        seeds
            .into_iter()
            .map(|seed| summarize(source, catalog, seed))
            .collect()
    }
}

/// Runs the sampler, returning bounds and aggregate statistics.
///
/// # Examples
/// ```
/// use granita_core::{
///     BoundPolicy, GraphletCatalog, GraphletOrder, ProbabilisticGraph, SampleParams, sample,
/// };
///
/// let mut network = ProbabilisticGraph::with_node_count(3);
/// network.add_edge(0, 1, 1.0).expect("probability is valid");
/// network.add_edge(1, 2, 1.0).expect("probability is valid");
/// let catalog = GraphletCatalog::new(GraphletOrder::Three);
/// let params = SampleParams::new(10, BoundPolicy::MinMax).expect("parameters are valid");
/// let outcome = sample(&network, &catalog, &params);
/// // Certain edges always realize one open triad and no triangle.
/// let bounds = outcome.bounds();
/// assert_eq!(bounds.as_slice()[0].lower(), 1);
/// assert_eq!(bounds.as_slice()[0].upper(), 1);
/// assert_eq!(bounds.as_slice()[1].upper(), 0);
/// ```
#[must_use]
#[instrument(
    name = "core.sample",
    skip(source, catalog, params),
    fields(
        samples = params.samples().get(),
        edges = source.edge_count(),
        max_order = catalog.max_order().get(),
    ),
)]
pub fn sample(
    source: &ProbabilisticGraph,
    catalog: &GraphletCatalog,
    params: &SampleParams,
) -> SampleOutcome {
    let summaries = collect_summaries(source, catalog, params);
    let outcome = aggregate(&summaries, catalog, params.policy());
    info!(
        classes = outcome.bounds.len(),
        mean_nodes = outcome.statistics.mean_node_count(),
        mean_edges = outcome.statistics.mean_edge_count(),
        "sampling finished"
    );
    outcome
}

/// Runs the sampler and returns only the frequency bounds.
#[must_use]
pub fn sample_bounds(
    source: &ProbabilisticGraph,
    catalog: &GraphletCatalog,
    params: &SampleParams,
) -> FrequencyBounds {
    let (bounds, _) = sample(source, catalog, params).into_parts();
    bounds
}

fn aggregate(
    summaries: &[RealizationSummary],
    catalog: &GraphletCatalog,
    policy: BoundPolicy,
) -> SampleOutcome {
    let samples = summaries.len() as f64;

    let mut bounds = Vec::with_capacity(catalog.len());
    let mut mean_class_counts = Vec::with_capacity(catalog.len());
    let mut std_class_counts = Vec::with_capacity(catalog.len());
    let mut column = Vec::with_capacity(summaries.len());
    for class in 0..catalog.len() {
        column.clear();
        column.extend(
            summaries
                .iter()
                .map(|summary| summary.counts.as_slice()[class]),
        );
        let (mean, std) = mean_and_std(column.iter().map(|&count| count as f64));
        mean_class_counts.push(mean);
        std_class_counts.push(std);
        column.sort_unstable();
        bounds.push(policy.derive(&column));
    }

    let (mean_node_count, std_node_count) =
        mean_and_std(summaries.iter().map(|summary| summary.node_count as f64));
    let (mean_edge_count, std_edge_count) =
        mean_and_std(summaries.iter().map(|summary| summary.edge_count as f64));

    let histogram_len = summaries
        .iter()
        .map(|summary| summary.degree_histogram.len())
        .max()
        .unwrap_or(0);
    let mut mean_degree_histogram = vec![0.0_f64; histogram_len];
    for summary in summaries {
        for (degree, &nodes) in summary.degree_histogram.iter().enumerate() {
            mean_degree_histogram[degree] += nodes as f64;
        }
    }
    for entry in &mut mean_degree_histogram {
        *entry /= samples;
    }

    SampleOutcome {
        bounds: FrequencyBounds::from_class_bounds(bounds),
        statistics: GraphStatistics {
            mean_node_count,
            std_node_count,
            mean_edge_count,
            std_edge_count,
            mean_degree_histogram,
            mean_class_counts,
            std_class_counts,
        },
    }
}

fn mean_and_std(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut total = 0.0_f64;
    let mut total_sq = 0.0_f64;
    let mut samples = 0.0_f64;
    for value in values {
        total += value;
        total_sq += value * value;
        samples += 1.0;
    }
    if samples == 0.0 {
        return (0.0, 0.0);
    }
    let mean = total / samples;
    let variance = (total_sq / samples - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::catalog::GraphletOrder;

    fn four_cycle() -> ProbabilisticGraph {
        let mut network = ProbabilisticGraph::with_node_count(4);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
            network.add_edge(a, b, 0.9).expect("probability is valid");
        }
        network
    }

    #[test]
    fn rejects_zero_samples() {
        let err = SampleParams::new(0, BoundPolicy::MinMax).expect_err("zero samples must fail");
        assert_eq!(err, SampleError::ZeroSamples { got: 0 });
    }

    #[rstest]
    #[case(-0.1, 0.9)]
    #[case(0.1, 1.5)]
    #[case(0.8, 0.2)]
    fn rejects_malformed_percentiles(#[case] lower: f64, #[case] upper: f64) {
        let err = SampleParams::new(10, BoundPolicy::Percentile { lower, upper })
            .expect_err("percentile must fail");
        assert!(matches!(err, SampleError::InvalidPercentile { .. }));
    }

    #[test]
    fn bounds_are_ordered_for_every_class() {
        let catalog = GraphletCatalog::new(GraphletOrder::Four);
        let params = SampleParams::new(64, BoundPolicy::MinMax)
            .expect("parameters are valid")
            .with_rng_seed(5);
        let bounds = sample_bounds(&four_cycle(), &catalog, &params);
        assert_eq!(bounds.len(), catalog.len());
        for interval in bounds.as_slice() {
            assert!(interval.lower() <= interval.upper());
        }
    }

    #[test]
    fn identical_seeds_reproduce_identical_bounds() {
        let catalog = GraphletCatalog::new(GraphletOrder::Four);
        let params = SampleParams::new(50, BoundPolicy::MinMax)
            .expect("parameters are valid")
            .with_rng_seed(123);
        let first = sample(&four_cycle(), &catalog, &params);
        let second = sample(&four_cycle(), &catalog, &params);
        assert_eq!(first, second);
    }

    #[test]
    fn wider_percentile_trims_weakly_widen_bounds() {
        let catalog = GraphletCatalog::new(GraphletOrder::Three);
        let narrow = SampleParams::new(200, BoundPolicy::Percentile { lower: 0.2, upper: 0.8 })
            .expect("parameters are valid")
            .with_rng_seed(9);
        let wide = SampleParams::new(200, BoundPolicy::Percentile { lower: 0.05, upper: 0.95 })
            .expect("parameters are valid")
            .with_rng_seed(9);
        let network = four_cycle();
        let narrow_bounds = sample_bounds(&network, &catalog, &narrow);
        let wide_bounds = sample_bounds(&network, &catalog, &wide);
        for (tight, loose) in narrow_bounds.as_slice().iter().zip(wide_bounds.as_slice()) {
            assert!(loose.lower() <= tight.lower());
            assert!(tight.upper() <= loose.upper());
        }
    }

    #[test]
    fn four_cycle_bounds_cover_the_expected_envelope() {
        let catalog = GraphletCatalog::new(GraphletOrder::Three);
        let params = SampleParams::new(1000, BoundPolicy::MinMax)
            .expect("parameters are valid")
            .with_rng_seed(2024);
        let bounds = sample_bounds(&four_cycle(), &catalog, &params);
        let path = bounds.as_slice()[0];
        let triangle = bounds.as_slice()[1];
        // Realizations of a four-cycle hold between zero and four open
        // triads; the full cycle (probability ~0.66 per draw) contributes
        // the upper end. Triangles cannot occur at all.
        assert!(path.lower() <= 2);
        assert_eq!(path.upper(), 4);
        assert_eq!(triangle.upper(), 0);
    }

    #[test]
    fn statistics_track_certain_realizations_exactly() {
        let mut network = ProbabilisticGraph::with_node_count(3);
        network.add_edge(0, 1, 1.0).expect("probability is valid");
        network.add_edge(1, 2, 1.0).expect("probability is valid");
        let catalog = GraphletCatalog::new(GraphletOrder::Three);
        let params = SampleParams::new(25, BoundPolicy::MinMax).expect("parameters are valid");
        let outcome = sample(&network, &catalog, &params);
        let statistics = outcome.statistics();
        assert!((statistics.mean_node_count() - 3.0).abs() < f64::EPSILON);
        assert!((statistics.mean_edge_count() - 2.0).abs() < f64::EPSILON);
        assert!(statistics.std_node_count() < f64::EPSILON);
        assert_eq!(statistics.mean_degree_histogram(), &[0.0, 2.0, 1.0]);
    }
}
