//! Command-line interface orchestration for granita.
//!
//! Offers two commands: `sample` estimates per-class graphlet frequency
//! bounds from a probabilistic network file, and `generate` additionally
//! grows graphs under those bounds (or under one of the baseline models)
//! and optionally writes them out as edge lists.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use granita_core::{
    BoundPolicy, BoundedGrowth, DegreeSwap, Graph, GraphModel, GraphletCatalog, GraphletOrder,
    GranitaError, GrowthParams, PreferentialAttachment, ProbabilisticGraph, SampleOutcome,
    SampleParams, sample,
};
use granita_providers_edgelist::{EdgeListError, EdgeListProvider};
use granita_providers_gml::{GmlError, GmlProvider};
use thiserror::Error;
use tracing::info;

const DEFAULT_SAMPLES: usize = 500;
const DEFAULT_MAX_ORDER: usize = 5;
const DEFAULT_SEED: u64 = 42;

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "granita",
    about = "Sample a probabilistic network and generate graphlet-bounded graphs."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Estimate graphlet frequency bounds from a probabilistic network.
    Sample(SampleCommand),
    /// Estimate bounds, then generate graphs under them.
    Generate(GenerateCommand),
}

/// Input selection shared by every command.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Path to the probabilistic network file.
    pub input: PathBuf,

    /// Input format; inferred from the file extension when omitted.
    #[arg(long, value_enum)]
    pub format: Option<SourceFormat>,
}

/// Supported input formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceFormat {
    /// Whitespace-separated `source target probability` lines.
    Edgelist,
    /// GML with per-edge `probability` attributes.
    Gml,
}

/// Sampling configuration shared by every command.
#[derive(Debug, Args, Clone)]
pub struct SamplingArgs {
    /// Number of Bernoulli realizations to draw.
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    pub samples: usize,

    /// Maximum graphlet order taken into account (3, 4, or 5).
    #[arg(long = "max-order", default_value_t = DEFAULT_MAX_ORDER)]
    pub max_order: usize,

    /// Bound derivation policy.
    #[arg(long, value_enum, default_value_t = PolicyArg::MinMax)]
    pub policy: PolicyArg,

    /// Lower percentile used by the percentile policy.
    #[arg(long, default_value_t = 0.025)]
    pub lower: f64,

    /// Upper percentile used by the percentile policy.
    #[arg(long, default_value_t = 0.975)]
    pub upper: f64,

    /// Seed for the realization and generation draws.
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
}

/// Supported bound policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Use the observed minimum and maximum counts.
    MinMax,
    /// Clip to the configured percentiles.
    Percentile,
}

/// Options accepted by the `sample` command.
#[derive(Debug, Args, Clone)]
pub struct SampleCommand {
    /// Input selection.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Sampling configuration.
    #[command(flatten)]
    pub sampling: SamplingArgs,
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Input selection.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Sampling configuration.
    #[command(flatten)]
    pub sampling: SamplingArgs,

    /// Number of graphs to generate.
    #[arg(long, default_value_t = 1)]
    pub graphs: usize,

    /// Target node count; defaults to the sampled expectation.
    #[arg(long)]
    pub nodes: Option<usize>,

    /// Edge budget per run; defaults to the sampled expectation.
    #[arg(long = "edge-budget")]
    pub edge_budget: Option<usize>,

    /// Candidates tried per growth step.
    #[arg(long = "retry-limit", default_value_t = 64)]
    pub retry_limit: usize,

    /// Consecutive exhausted steps tolerated before the run stalls.
    #[arg(long = "stall-limit", default_value_t = 3)]
    pub stall_limit: usize,

    /// Generation strategy.
    #[arg(long, value_enum, default_value_t = ModelArg::Bounded)]
    pub model: ModelArg,

    /// Directory receiving one edge list per generated graph.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Supported generation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelArg {
    /// Bound-constrained incremental growth.
    Bounded,
    /// Degree-preserving swaps annealed toward the sampled counts.
    Swap,
    /// Preferential attachment sized from the sampled totals.
    Ba,
}

impl ModelArg {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Bounded => "bounded",
            Self::Swap => "swap",
            Self::Ba => "ba",
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while writing an output.
    #[error("failed to write `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// Edge-list ingestion failed.
    #[error(transparent)]
    EdgeList(#[from] EdgeListError),
    /// GML ingestion failed.
    #[error(transparent)]
    Gml(#[from] GmlError),
    /// Core sampling or generation failed.
    #[error(transparent)]
    Core(#[from] GranitaError),
    /// The preprocessed network retained no edges to sample.
    #[error("`{path}` contains no usable edges after preprocessing")]
    EmptyNetwork {
        /// Path of the offending input.
        path: PathBuf,
    },
}

/// One per-class line of a sampling summary.
#[derive(Debug, Clone)]
pub struct BoundLine {
    /// Stable class label such as `k4-02`.
    pub label: String,
    /// Graphlet order of the class.
    pub order: usize,
    /// Derived lower bound.
    pub lower: u64,
    /// Derived upper bound.
    pub upper: u64,
}

/// Summary of a `sample` run.
#[derive(Debug, Clone)]
pub struct SampleSummary {
    /// Display name of the input network.
    pub source: String,
    /// Number of realizations drawn.
    pub samples: usize,
    /// Mean node count across realizations.
    pub mean_nodes: f64,
    /// Mean edge count across realizations.
    pub mean_edges: f64,
    /// Per-class bounds in catalog order.
    pub bounds: Vec<BoundLine>,
}

/// One generated graph in a generation summary.
#[derive(Debug, Clone)]
pub struct GraphLine {
    /// Zero-based run index.
    pub index: usize,
    /// Node count of the generated graph.
    pub nodes: usize,
    /// Edge count of the generated graph.
    pub edges: usize,
    /// Stop condition for bound-constrained runs.
    pub termination: Option<&'static str>,
    /// Where the edge list was written, when an output directory was given.
    pub path: Option<PathBuf>,
}

/// Summary of a `generate` run.
#[derive(Debug, Clone)]
pub struct GenerateSummary {
    /// Display name of the input network.
    pub source: String,
    /// Strategy used to generate the graphs.
    pub model: &'static str,
    /// Per-graph results in run order.
    pub graphs: Vec<GraphLine>,
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Clone)]
pub enum RunSummary {
    /// Output of the `sample` command.
    Sample(SampleSummary),
    /// Output of the `generate` command.
    Generate(GenerateSummary),
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when ingestion, sampling, or generation fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use granita_cli::cli::{Cli, run_cli, RunSummary};
/// # use clap::Parser;
/// # use tempfile::NamedTempFile;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let file = NamedTempFile::new()?;
/// std::fs::write(file.path(), "a b 0.9\nb c 0.9\nc a 0.9\n")?;
/// let cli = Cli::parse_from([
///     "granita",
///     "sample",
///     file.path().to_str().expect("path is UTF-8"),
///     "--samples",
///     "20",
///     "--max-order",
///     "3",
/// ]);
/// let RunSummary::Sample(summary) = run_cli(cli)? else {
///     panic!("sample command yields a sample summary");
/// };
/// assert_eq!(summary.bounds.len(), 2);
/// # Ok(())
/// # }
/// ```
pub fn run_cli(cli: Cli) -> Result<RunSummary, CliError> {
    match cli.command {
        Command::Sample(command) => run_sample(command).map(RunSummary::Sample),
        Command::Generate(command) => run_generate(command).map(RunSummary::Generate),
    }
}

struct PreparedInput {
    name: String,
    network: ProbabilisticGraph,
    catalog: GraphletCatalog,
    params: SampleParams,
}

fn prepare(source: &SourceArgs, sampling: &SamplingArgs) -> Result<PreparedInput, CliError> {
    let network = load_network(source)?.largest_component();
    if network.edge_count() == 0 {
        return Err(CliError::EmptyNetwork {
            path: source.input.clone(),
        });
    }

    let order = GraphletOrder::new(sampling.max_order).map_err(GranitaError::from)?;
    let catalog = GraphletCatalog::new(order);

    let policy = match sampling.policy {
        PolicyArg::MinMax => BoundPolicy::MinMax,
        PolicyArg::Percentile => BoundPolicy::Percentile {
            lower: sampling.lower,
            upper: sampling.upper,
        },
    };
    let params = SampleParams::new(sampling.samples, policy)
        .map_err(GranitaError::from)?
        .with_rng_seed(sampling.seed);

    Ok(PreparedInput {
        name: derive_source_name(&source.input),
        network,
        catalog,
        params,
    })
}

fn load_network(source: &SourceArgs) -> Result<ProbabilisticGraph, CliError> {
    let format = source.format.unwrap_or_else(|| infer_format(&source.input));
    let network = match format {
        SourceFormat::Edgelist => EdgeListProvider::from_path(&source.input)?,
        SourceFormat::Gml => GmlProvider::from_path(&source.input)?,
    };
    Ok(network.into_graph())
}

fn infer_format(path: &Path) -> SourceFormat {
    let is_gml = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("gml"));
    if is_gml {
        SourceFormat::Gml
    } else {
        SourceFormat::Edgelist
    }
}

fn derive_source_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|value| value.to_str())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| "network".to_owned())
}

fn run_sample(command: SampleCommand) -> Result<SampleSummary, CliError> {
    let prepared = prepare(&command.source, &command.sampling)?;
    let outcome = sample(&prepared.network, &prepared.catalog, &prepared.params);
    Ok(summarize_sample(&prepared, &outcome))
}

fn summarize_sample(prepared: &PreparedInput, outcome: &SampleOutcome) -> SampleSummary {
    let bounds = prepared
        .catalog
        .classes()
        .iter()
        .zip(outcome.bounds().as_slice())
        .map(|(class, interval)| BoundLine {
            label: class.label(),
            order: class.order().get(),
            lower: interval.lower(),
            upper: interval.upper(),
        })
        .collect();
    SampleSummary {
        source: prepared.name.clone(),
        samples: prepared.params.samples().get(),
        mean_nodes: outcome.statistics().mean_node_count(),
        mean_edges: outcome.statistics().mean_edge_count(),
        bounds,
    }
}

fn run_generate(command: GenerateCommand) -> Result<GenerateSummary, CliError> {
    let prepared = prepare(&command.source, &command.sampling)?;
    let outcome = sample(&prepared.network, &prepared.catalog, &prepared.params);
    let statistics = outcome.statistics();

    let node_count = command
        .nodes
        .unwrap_or_else(|| statistics.mean_node_count().round() as usize);
    let edge_budget = command
        .edge_budget
        .unwrap_or_else(|| statistics.mean_edge_count().round() as usize);

    let mut generated: Vec<(Graph, Option<&'static str>)> = Vec::with_capacity(command.graphs);
    match command.model {
        ModelArg::Bounded => {
            let params = GrowthParams::new(node_count)
                .map_err(GranitaError::from)?
                .with_edge_budget(edge_budget)
                .with_retry_limit(command.retry_limit)
                .with_stall_limit(command.stall_limit)
                .with_rng_seed(command.sampling.seed);
            let generator = BoundedGrowth::new(params, &prepared.catalog, outcome.bounds())
                .map_err(GranitaError::from)?;
            for grown in generator.generate_many(command.graphs) {
                let termination = grown.termination().as_str();
                generated.push((grown.into_graph(), Some(termination)));
            }
        }
        ModelArg::Swap => {
            let model = DegreeSwap::new(&prepared.catalog, statistics.clone())
                .map_err(GranitaError::from)?;
            for run in 0..command.graphs {
                let seed = command.sampling.seed.wrapping_add(run as u64);
                let graph = model.generate(seed).map_err(GranitaError::from)?;
                generated.push((graph, None));
            }
        }
        ModelArg::Ba => {
            let model =
                PreferentialAttachment::from_statistics(statistics).map_err(GranitaError::from)?;
            for run in 0..command.graphs {
                let seed = command.sampling.seed.wrapping_add(run as u64);
                let graph = model.generate(seed).map_err(GranitaError::from)?;
                generated.push((graph, None));
            }
        }
    }

    let model = command.model.as_str();
    let mut graphs = Vec::with_capacity(generated.len());
    for (index, (graph, termination)) in generated.into_iter().enumerate() {
        let path = command
            .out
            .as_deref()
            .map(|directory| write_edge_list(directory, model, index, &graph))
            .transpose()?;
        info!(
            index,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            termination,
            "graph generated"
        );
        graphs.push(GraphLine {
            index,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            termination,
            path,
        });
    }

    Ok(GenerateSummary {
        source: prepared.name,
        model,
        graphs,
    })
}

fn write_edge_list(
    directory: &Path,
    model: &str,
    index: usize,
    graph: &Graph,
) -> Result<PathBuf, CliError> {
    let wrap = |source: io::Error, path: &Path| CliError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(directory).map_err(|source| wrap(source, directory))?;
    let path = directory.join(format!("{model}_graph{index}.txt"));
    let file = File::create(&path).map_err(|source| wrap(source, &path))?;
    let mut writer = BufWriter::new(file);
    for (a, b) in graph.edges() {
        writeln!(writer, "{a} {b}").map_err(|source| wrap(source, &path))?;
    }
    writer.flush().map_err(|source| wrap(source, &path))?;
    Ok(path)
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &RunSummary, writer: &mut impl Write) -> io::Result<()> {
    match summary {
        RunSummary::Sample(summary) => {
            writeln!(
                writer,
                "network {}: {} samples, mean nodes {:.2}, mean edges {:.2}",
                summary.source, summary.samples, summary.mean_nodes, summary.mean_edges
            )?;
            writeln!(writer, "class\torder\tlower\tupper")?;
            for line in &summary.bounds {
                writeln!(
                    writer,
                    "{}\t{}\t{}\t{}",
                    line.label, line.order, line.lower, line.upper
                )?;
            }
        }
        RunSummary::Generate(summary) => {
            writeln!(
                writer,
                "network {}: generated {} graph(s) with model {}",
                summary.source,
                summary.graphs.len(),
                summary.model
            )?;
            for line in &summary.graphs {
                write!(
                    writer,
                    "graph {}: {} nodes, {} edges",
                    line.index, line.nodes, line.edges
                )?;
                if let Some(termination) = line.termination {
                    write!(writer, ", {termination}")?;
                }
                if let Some(path) = &line.path {
                    write!(writer, ", written to {}", path.display())?;
                }
                writeln!(writer)?;
            }
        }
    }
    Ok(())
}
