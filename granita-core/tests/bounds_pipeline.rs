//! End-to-end tests over the shared fixture networks.
//!
//! Exercises the full sampling-to-bounds-to-generation pipeline the way a
//! driver would: estimate bounds from a probabilistic source, then grow
//! graphs under them and check the terminal guarantees.

use granita_core::{
    BoundPolicy, BoundedGrowth, FrequencyBounds, GraphletCatalog, GraphletOrder, GrowthParams,
    SampleParams, Termination, full_census, sample, sample_and_grow, sample_bounds,
};
use granita_test_support::{certain_path_network, four_cycle_network, init_test_logging};

#[test]
fn four_cycle_bounds_cover_the_documented_envelope() {
    init_test_logging();
    let catalog = GraphletCatalog::new(GraphletOrder::Three);
    let params = SampleParams::new(1000, BoundPolicy::MinMax)
        .expect("parameters are valid")
        .with_rng_seed(404);
    let bounds = sample_bounds(&four_cycle_network(), &catalog, &params);

    let path = bounds.as_slice()[0];
    let triangle = bounds.as_slice()[1];
    assert!(path.lower() <= 2, "sparse realizations reach low triad counts");
    assert_eq!(path.upper(), 4, "the full cycle carries four open triads");
    assert_eq!(triangle.lower(), 0);
    assert!(triangle.upper() <= 1, "no realization can close a triangle");
}

#[test]
fn generation_under_four_cycle_bounds_never_closes_two_triangles() {
    init_test_logging();
    let catalog = GraphletCatalog::new(GraphletOrder::Three);
    let bounds = FrequencyBounds::from_limits(vec![(1, 4), (0, 1)]).expect("intervals valid");
    for seed in 0..10 {
        let params = GrowthParams::new(4)
            .expect("node count is valid")
            .with_rng_seed(seed);
        let generator =
            BoundedGrowth::new(params, &catalog, &bounds).expect("configuration is valid");
        let grown = generator.grow();
        assert_eq!(grown.termination(), Termination::BoundsSatisfied);
        let census = full_census(grown.graph(), &catalog);
        assert!(
            census.as_slice()[1] <= 1,
            "seed {seed} exceeded the triangle budget"
        );
    }
}

#[test]
fn certain_networks_sample_to_exact_bounds() {
    init_test_logging();
    let catalog = GraphletCatalog::new(GraphletOrder::Four);
    let params = SampleParams::new(40, BoundPolicy::MinMax).expect("parameters are valid");
    let outcome = sample(&certain_path_network(5), &catalog, &params);
    for interval in outcome.bounds().as_slice() {
        assert_eq!(
            interval.lower(),
            interval.upper(),
            "certain edges leave no sampling variance"
        );
    }
    // A five-node path holds three open triads and two four-paths.
    assert_eq!(outcome.bounds().as_slice()[0].lower(), 3);
    let statistics = outcome.statistics();
    assert!((statistics.mean_node_count() - 5.0).abs() < f64::EPSILON);
    assert!((statistics.mean_edge_count() - 4.0).abs() < f64::EPSILON);
}

#[test]
fn pipeline_reproduces_itself_under_a_fixed_seed() {
    init_test_logging();
    let catalog = GraphletCatalog::new(GraphletOrder::Three);
    let params = SampleParams::new(150, BoundPolicy::MinMax)
        .expect("parameters are valid")
        .with_rng_seed(9000);
    let network = four_cycle_network();
    let first = sample_and_grow(&network, &catalog, &params, 2).expect("pipeline succeeds");
    let second = sample_and_grow(&network, &catalog, &params, 2).expect("pipeline succeeds");
    assert_eq!(first, second);
    for run in &first {
        let census = full_census(run.graph(), &catalog);
        assert_eq!(census.as_slice()[1], 0, "no run may fabricate a triangle");
    }
}
