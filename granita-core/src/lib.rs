//! Granita core library.
//!
//! Generates synthetic graphs whose graphlet frequencies stay within bounds
//! estimated from a probabilistic source network. The pipeline has four
//! stages: the [`GraphletCatalog`] canonically labels every connected
//! graphlet class up to order five, the census ([`full_census`] /
//! [`edge_delta`]) counts induced occurrences, the sampler ([`sample`])
//! turns Bernoulli realizations of the source into per-class
//! [`FrequencyBounds`], and [`BoundedGrowth`] adds edges one at a time while
//! the incremental counter keeps every class within its upper bound.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod catalog;
mod census;
mod counts;
mod error;
mod generator;
mod graph;
mod model;
mod network;
mod pipeline;
mod sampler;
mod seeding;

pub use crate::{
    catalog::{
        CatalogError, ClassId, GraphletCatalog, GraphletClass, GraphletOrder, MAX_GRAPHLET_ORDER,
        MIN_GRAPHLET_ORDER,
    },
    census::{edge_delta, full_census},
    counts::{BoundsError, ClassBounds, CountDelta, CountVector, FrequencyBounds},
    error::{GranitaError, GranitaErrorCode, Result},
    generator::{BoundedGrowth, GrownGraph, GrowthError, GrowthParams, Termination},
    graph::{Graph, GraphError, ProbabilisticEdge, ProbabilisticGraph},
    model::{DegreeSwap, GraphModel, ModelError, PreferentialAttachment},
    network::{LabeledNetwork, NetworkBuilder},
    pipeline::sample_and_grow,
    sampler::{
        BoundPolicy, GraphStatistics, SampleError, SampleOutcome, SampleParams, sample,
        sample_bounds,
    },
};
