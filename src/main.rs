#![allow(clippy::cognitive_complexity, clippy::cast_precision_loss)]
#![warn(clippy::unwrap_in_result, clippy::unwrap_used)]
#![warn(
    rust_2018_idioms,
    rust_2021_compatibility,
    arithmetic_overflow,
    nonstandard_style,
    clippy::disallowed_types,
    clippy::nursery,
    // clippy::pedantic
)]
use std::{
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};

use clap::{CommandFactory, Parser, Subcommand};
use color_eyre::eyre::{bail, Result};
use human_repr::{HumanCount, HumanDuration};
use roadnav::{
    common::RoadnavError,
    event::Progress,
    graph::{MemoryGraph, NodeId, RoadGraph},
    metric::MetricConfig,
    route::{DepthLimits, Endpoint, ModeConfig, Route, RouteMode, Target},
    vehicle::{VehicleKind, VehicleProfile},
};
use serde::{Deserialize, Serialize};
use shadow_rs::shadow;
use strum::IntoEnumIterator;
use tracing::*;
use tracing_subscriber::{
    fmt::{self, format::Writer, time::FormatTime},
    prelude::*,
    EnvFilter,
};

shadow!(build);

/// Vehicle of a job, either a preset name or a complete profile
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
enum VehicleSpec {
    Preset(VehicleKind),
    Profile(VehicleProfile),
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self::Preset(VehicleKind::default())
    }
}

impl VehicleSpec {
    fn resolve(self) -> VehicleProfile {
        match self {
            Self::Preset(kind) => VehicleProfile::preset(kind),
            Self::Profile(profile) => profile,
        }
    }
}

/// Routing request read from a TOML file
#[derive(Deserialize, Serialize, Debug)]
#[serde(deny_unknown_fields)]
struct Job {
    network: PathBuf,
    start: Endpoint,
    targets: Vec<Endpoint>,
    #[serde(default)]
    mode: ModeConfig,
    #[serde(default)]
    vehicle: VehicleSpec,
    #[serde(default)]
    metric: MetricConfig,
    #[serde(default)]
    avoid: Vec<i64>,
    #[serde(default)]
    json: bool,
    #[serde(default)]
    quiet: bool,
}

impl Job {
    fn run(self, progress_interval: Duration) -> Result<Option<Route>> {
        let graph = MemoryGraph::load(&self.network)?;
        let vehicle = self
            .avoid
            .iter()
            .fold(self.vehicle.resolve(), |v, &n| v.avoiding(NodeId(n)));
        let Endpoint::Node(start) = self.start else {
            bail!(RoadnavError::InvalidArgument(format!(
                "start must be a node, got {}",
                self.start
            )));
        };
        let target = Target::from_endpoints(&self.targets)?;
        let mut router = self.mode.build(self.metric.build(&vehicle));
        router.add_progress_listener(progress_logger(progress_interval));
        info!(
            "[{}] routing {} from n{start} to {target:?} ({})",
            router.name(),
            vehicle.name,
            self.mode
        );
        let t_start = Instant::now();
        let route = router.route(&graph, &target, NodeId(start), &vehicle)?;
        let dt = t_start.elapsed();
        match &route {
            Some(route) if self.json => {
                println!("{}", serde_json::to_string_pretty(route)?);
            }
            Some(route) => {
                let cost = route.cost(&graph, router.metric());
                print_route(&graph, dt, route, cost, self.quiet);
            }
            None => warn!("No route found after {}", dt.human_duration()),
        }
        Ok(route)
    }
}

#[derive(Subcommand, Debug, Deserialize, Serialize, Clone)]
enum Mode {
    /// Iteratively deepened depth-first search (slow, exponential on dense
    /// networks)
    #[clap(visible_aliases(["dfs"]))]
    DepthFirst {
        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Depth-first search trying the candidate closest to the target first
    #[clap(visible_aliases(["ddfs"]))]
    DirectedDepthFirst {
        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Dijkstra expanding the node closest to the target first (greedy, not
    /// guaranteed to find the cheapest route)
    Dijkstra,
    /// Reverse Dijkstra from all targets, ends at the cheapest one
    #[clap(visible_aliases(["multi"]))]
    MultiDijkstra,
    /// A* search honoring turn restrictions
    #[clap(visible_aliases(["astar"]))]
    AStar,
}

#[derive(clap::Args, Debug, Deserialize, Serialize, Clone)]
struct LimitArgs {
    /// Depth bound of the first round, doubled after every round
    #[arg(long, default_value_t = DepthLimits::default().initial_depth)]
    initial_depth: usize,
    /// Largest depth bound to try
    #[arg(long, default_value_t = DepthLimits::default().max_depth)]
    max_depth: usize,
    /// Give up after examining this many steps
    #[arg(long, default_value_t = DepthLimits::default().max_iterations)]
    max_iterations: usize,
}

impl From<LimitArgs> for DepthLimits {
    fn from(args: LimitArgs) -> Self {
        Self {
            initial_depth: args.initial_depth,
            max_depth: args.max_depth,
            max_iterations: args.max_iterations,
        }
    }
}

impl From<Mode> for ModeConfig {
    fn from(val: Mode) -> Self {
        match val {
            Mode::DepthFirst { limits } => {
                Self::DepthFirst { limits: limits.into() }
            }
            Mode::DirectedDepthFirst { limits } => {
                Self::DirectedDepthFirst { limits: limits.into() }
            }
            Mode::Dijkstra => Self::Dijkstra,
            Mode::MultiDijkstra => Self::MultiDijkstra,
            Mode::AStar => Self::AStar,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Compute a route
    Route {
        /// Road network (JSON)
        #[arg(short, long)]
        network: PathBuf,
        /// Vehicle preset
        #[arg(short, long, default_value_t = VehicleKind::Car)]
        vehicle: VehicleKind,
        /// Optimize for travel time instead of distance
        #[arg(short, long)]
        travel_time: bool,
        /// Seconds added for every change of way (travel time only)
        #[arg(long, default_value_t = 0.0)]
        turn_penalty: f64,
        /// Node ids to route around
        #[arg(short, long)]
        avoid: Vec<i64>,
        /// Print the route as JSON
        #[arg(short, long)]
        json: bool,
        /// Only print the summary
        #[arg(short, long)]
        quiet: bool,
        /// Routing algorithm to use
        #[command(subcommand)]
        mode: Mode,
        /// Start node id followed by target node ids or "w" prefixed way ids
        #[clap(global = true)]
        hops: Vec<Endpoint>,
    },
    /// Run a TOML job file
    Job { path: PathBuf },
    /// List routing algorithms
    Modes,
    /// Print size of a road network
    Info { network: PathBuf },
}

fn long_version() -> String {
    use std::fmt::Write;
    let mut ret = version();
    ret.push('\n');
    if !build::TAG.is_empty() {
        writeln!(&mut ret, "tag: {}", build::TAG)
            .unwrap_or_else(|_| unreachable!());
    }
    writeln!(&mut ret, "rustc {},{}", build::RUST_VERSION, build::RUST_CHANNEL)
        .unwrap_or_else(|_| unreachable!());
    ret
}

fn version() -> String {
    format!(
        "v{} ({} {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BUILD_TIME
    )
}

#[derive(Parser, Debug)]
#[command(author, about, long_about = None, version = version(), long_version = long_version())]
struct Cli {
    /// Minimum time between printing progress updates
    #[arg(short, long, default_value_t = 0.5)]
    progress_interval: f64,
    /// Command to run
    #[command(subcommand)]
    cmd: Option<Command>,
}

/// Timestamps relative to program start
struct RelativeTime {
    epoch: Instant,
}

impl Default for RelativeTime {
    fn default() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl FormatTime for RelativeTime {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        write!(w, "{}", self.epoch.elapsed().human_duration())
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .event_format(fmt::format().with_ansi(yansi::is_enabled()))
                .with_timer(RelativeTime::default())
                .compact(),
        )
        .with(
            EnvFilter::try_from_env("ROADNAV_LOG")
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Log progress, at most once per `interval`
fn progress_logger(
    interval: Duration,
) -> Box<dyn Fn(&Progress) + Send + Sync> {
    let last: Mutex<Option<Instant>> = Mutex::new(None);
    Box::new(move |progress| {
        let Ok(mut last) = last.lock() else {
            return;
        };
        if last.is_some_and(|t| t.elapsed() < interval) {
            return;
        }
        *last = Some(Instant::now());
        info!("{progress}");
    })
}

fn print_route(
    graph: &dyn RoadGraph,
    dt: Duration,
    route: &Route,
    cost: f64,
    quiet: bool,
) {
    use yansi::Paint;
    info!(
        "Route computed in {}: {} steps, {}, cost {cost:.02}",
        dt.human_duration(),
        route.len().human_count_bare(),
        route.length(graph).human_count("m"),
    );
    if quiet {
        return;
    }
    println!("{}", route.start().bold());
    for (n, step) in route.steps().iter().enumerate() {
        let way = graph.way_by_id(step.way());
        let name = way
            .and_then(|w| w.tag("name").or_else(|| w.tag("ref")))
            .unwrap_or("unnamed");
        let class = way.and_then(|w| w.tag("highway")).unwrap_or("road");
        println!(
            " {n:>3}  {} {} ({}) {}",
            step.way().cyan(),
            name.bold(),
            class.dim(),
            step.length(graph).human_count("m"),
        );
        println!("      -> {}", step.end().bold());
    }
}

fn run() -> Result<()> {
    let args = Cli::parse();
    init_tracing();
    let progress_interval = Duration::from_secs_f64(args.progress_interval);
    let Some(cmd) = args.cmd else {
        Cli::command().print_long_help()?;
        return Ok(());
    };
    match cmd {
        Command::Route {
            network,
            vehicle,
            travel_time,
            turn_penalty,
            avoid,
            json,
            quiet,
            mode,
            hops,
        } => {
            let Some((&start, targets)) = hops.split_first() else {
                bail!("Need a start and at least one target");
            };
            let job = Job {
                network,
                start,
                targets: targets.to_vec(),
                mode: mode.into(),
                vehicle: VehicleSpec::Preset(vehicle),
                metric: if travel_time {
                    MetricConfig::TravelTime { turn_penalty }
                } else {
                    MetricConfig::Distance
                },
                avoid,
                json,
                quiet,
            };
            job.run(progress_interval)?;
        }
        Command::Job { path } => {
            let job: Job = toml::from_str(&fs_err::read_to_string(path)?)?;
            job.run(progress_interval)?;
        }
        Command::Modes => {
            for mode in RouteMode::iter() {
                println!("{mode}");
            }
        }
        Command::Info { network } => {
            let graph = MemoryGraph::load(network)?;
            info!(
                "{} nodes, {} ways, {} relations",
                graph.num_nodes().human_count_bare(),
                graph.num_ways().human_count_bare(),
                graph.num_relations().human_count_bare()
            );
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    use yansi::Condition;
    color_eyre::install()?;
    yansi::whenever(Condition::DEFAULT);
    run()
}
