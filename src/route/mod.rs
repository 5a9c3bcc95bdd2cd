//! Route computation using various graph search algorithms
use std::time::Instant;

use human_repr::{HumanCount, HumanDuration};
use itertools::Itertools;
use parse_display::{Display, FromStr};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    common::{dist, RoadnavError, RoadnavResult},
    event::{Progress, ProgressListener},
    graph::{Node, NodeId, RoadGraph, WayId},
    metric::{DistanceMetric, Metric},
    vehicle::Vehicle,
};

mod algorithms;
mod mode;
mod ordering;
mod restriction;
mod step;

pub use algorithms::{
    AStarRouter, DepthFirstRouter, DijkstraRouter, DirectedDepthFirstRouter,
    MultiDijkstraRouter,
};
pub use mode::*;
pub use ordering::{CandidateScore, DirectedOrder, ExpansionOrder, GraphOrder};
pub use restriction::{is_allowed_turn, RestrictionKind, TurnRestriction};
pub use step::{Route, RoutingStep, StepKey};

#[cfg(test)]
pub(crate) mod fixtures;

/// What a search is allowed to end at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Node(NodeId),
    /// Any node of the way
    Way(WayId),
    /// Any of the nodes
    Nodes(Vec<NodeId>),
}

impl Target {
    /// Acceptable end nodes, in a stable order
    pub fn resolve(&self, graph: &dyn RoadGraph) -> RoadnavResult<Vec<Node>> {
        let ids = match self {
            Self::Node(id) => vec![*id],
            Self::Nodes(ids) => ids.iter().copied().unique().collect(),
            Self::Way(way) => graph
                .way_by_id(*way)
                .ok_or_else(|| {
                    RoadnavError::InvalidArgument(format!(
                        "target way {way} not found"
                    ))
                })?
                .nodes
                .iter()
                .copied()
                .unique()
                .collect(),
        };
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            match graph.node_by_id(id) {
                Some(node) => nodes.push(node),
                None if matches!(self, Self::Node(_)) => {
                    return Err(RoadnavError::InvalidArgument(format!(
                        "target node {id} not found"
                    )));
                }
                None => warn!("Ignoring unknown target node {id}"),
            }
        }
        if nodes.is_empty() {
            return Err(RoadnavError::InvalidArgument(format!(
                "target {self:?} has no known nodes"
            )));
        }
        Ok(nodes)
    }

    pub fn from_endpoints(endpoints: &[Endpoint]) -> RoadnavResult<Self> {
        match endpoints {
            [] => Err(RoadnavError::InvalidArgument("no target given".into())),
            [Endpoint::Node(id)] => Ok(Self::Node(NodeId(*id))),
            [Endpoint::Way(id)] => Ok(Self::Way(WayId(*id))),
            many => many
                .iter()
                .map(|ep| match ep {
                    Endpoint::Node(id) => Ok(NodeId(*id)),
                    Endpoint::Way(id) => Err(RoadnavError::InvalidArgument(
                        format!("way w{id} can't be part of a multi-target"),
                    )),
                })
                .collect::<RoadnavResult<Vec<_>>>()
                .map(Self::Nodes),
        }
    }
}

/// Node or way reference as written by users, `123` or `w45`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, FromStr, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Endpoint {
    #[display("w{0}")]
    Way(i64),
    #[display("{0}")]
    Node(i64),
}

impl TryFrom<String> for Endpoint {
    type Error = parse_display::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}

impl From<Endpoint> for String {
    fn from(value: Endpoint) -> Self {
        value.to_string()
    }
}

/// Configuration shared by every router: the metric and registered progress
/// listeners
pub struct RouterBase {
    metric: Box<dyn Metric>,
    listeners: Vec<ProgressListener>,
}

impl RouterBase {
    pub fn new(metric: Box<dyn Metric>) -> Self {
        Self { metric, listeners: Vec::new() }
    }
}

impl Default for RouterBase {
    fn default() -> Self {
        Self::new(Box::new(DistanceMetric))
    }
}

impl std::fmt::Debug for RouterBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterBase")
            .field("metric", &self.metric)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Public surface implemented by every routing algorithm
///
/// A router only holds configuration, all search state lives in a
/// [`SearchContext`] created per call.
pub trait Router {
    fn name(&self) -> String;

    fn base(&self) -> &RouterBase;

    fn base_mut(&mut self) -> &mut RouterBase;

    /// Compute a route from `start` to `target`, `Ok(None)` if no route
    /// exists
    fn route(
        &self,
        graph: &dyn RoadGraph,
        target: &Target,
        start: NodeId,
        vehicle: &dyn Vehicle,
    ) -> RoadnavResult<Option<Route>>;

    fn route_to_way(
        &self,
        graph: &dyn RoadGraph,
        target: WayId,
        start: NodeId,
        vehicle: &dyn Vehicle,
    ) -> RoadnavResult<Option<Route>> {
        self.route(graph, &Target::Way(target), start, vehicle)
    }

    fn route_to_node(
        &self,
        graph: &dyn RoadGraph,
        target: NodeId,
        start: NodeId,
        vehicle: &dyn Vehicle,
    ) -> RoadnavResult<Option<Route>> {
        self.route(graph, &Target::Node(target), start, vehicle)
    }

    fn route_to_any(
        &self,
        graph: &dyn RoadGraph,
        targets: &[NodeId],
        start: NodeId,
        vehicle: &dyn Vehicle,
    ) -> RoadnavResult<Option<Route>> {
        self.route(graph, &Target::Nodes(targets.to_vec()), start, vehicle)
    }

    fn add_progress_listener(&mut self, listener: ProgressListener) {
        self.base_mut().listeners.push(listener);
    }

    fn metric(&self) -> &dyn Metric {
        self.base().metric.as_ref()
    }

    fn set_metric(&mut self, metric: Box<dyn Metric>) {
        self.base_mut().metric = metric;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Hops leaving a node
    Forward,
    /// Hops arriving at a node
    Backward,
}

/// Per-call search state shared by all algorithms
pub struct SearchContext<'a> {
    pub(crate) graph: &'a dyn RoadGraph,
    pub(crate) vehicle: &'a dyn Vehicle,
    pub(crate) metric: &'a dyn Metric,
    listeners: &'a [ProgressListener],
    pub(crate) start: Node,
    pub(crate) targets: Vec<Node>,
    target_ids: FxHashSet<NodeId>,
    total: f64,
    best_remaining: f64,
}

impl<'a> SearchContext<'a> {
    pub(crate) fn new(
        base: &'a RouterBase,
        graph: &'a dyn RoadGraph,
        vehicle: &'a dyn Vehicle,
        target: &Target,
        start: NodeId,
    ) -> RoadnavResult<Self> {
        let start = graph.node_by_id(start).ok_or_else(|| {
            RoadnavError::InvalidArgument(format!(
                "start node {start} not found"
            ))
        })?;
        let targets = target.resolve(graph)?;
        let target_ids = targets.iter().map(|n| n.id).collect();
        let mut ctx = Self {
            graph,
            vehicle,
            metric: base.metric.as_ref(),
            listeners: &base.listeners,
            start,
            targets,
            target_ids,
            total: 0.0,
            best_remaining: f64::INFINITY,
        };
        ctx.total = ctx.distance_to_target(&start);
        Ok(ctx)
    }

    pub fn graph(&self) -> &'a dyn RoadGraph {
        self.graph
    }

    pub fn metric(&self) -> &'a dyn Metric {
        self.metric
    }

    pub fn is_target(&self, node: NodeId) -> bool {
        self.target_ids.contains(&node)
    }

    /// Straight-line distance from `node` to the closest target
    pub fn distance_to_target(&self, node: &Node) -> f64 {
        self.targets
            .iter()
            .map(|t| dist(node, t))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn distance_to_start(&self, node: &Node) -> f64 {
        dist(node, &self.start)
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<Node> {
        self.graph.node_by_id(id)
    }

    /// Cost of a single hop under the router metric
    pub(crate) fn hop_cost(&self, hop: &StepKey) -> f64 {
        self.metric.cost(self.graph, &RoutingStep::from(*hop))
    }

    /// Turn cost between two consecutive hops meeting at `prev.end`
    pub(crate) fn turn_cost(&self, prev: &StepKey, next: &StepKey) -> f64 {
        self.metric.turn_cost(
            self.graph,
            prev.end,
            &RoutingStep::from(*prev),
            &RoutingStep::from(*next),
        )
    }

    /// Notify listeners once a node closer than any before is reached
    pub(crate) fn report(&mut self, node: NodeId, remaining: f64) {
        if self.listeners.is_empty() || remaining >= self.best_remaining {
            return;
        }
        self.best_remaining = remaining;
        let progress = Progress {
            covered: (self.total - remaining).max(0.0),
            total: self.total,
            node,
        };
        for listener in self.listeners {
            listener(&progress);
        }
    }

    /// Legal hops leaving (`Forward`) or arriving at (`Backward`) `node`,
    /// a node whose expansion fails has no edges
    pub(crate) fn expand(
        &self,
        node: NodeId,
        direction: Direction,
    ) -> Vec<StepKey> {
        self.adjacent_hops(node, direction).unwrap_or_else(|e| {
            warn!("Failed to expand {node}, treating it as a dead end: {e}");
            Vec::new()
        })
    }

    fn adjacent_hops(
        &self,
        node: NodeId,
        direction: Direction,
    ) -> RoadnavResult<Vec<StepKey>> {
        let mut hops = Vec::new();
        for way in self.graph.ways_incident_to(node) {
            if !self.vehicle.is_allowed_way(self.graph, way) {
                continue;
            }
            let n = way.nodes.len();
            if n < 2 {
                return Err(RoadnavError::MalformedWay {
                    way: way.id,
                    reason: format!("{n} node(s)"),
                });
            }
            let oneway = self.vehicle.is_oneway(self.graph, way);
            let reverse_oneway = self.vehicle.is_reverse_oneway(self.graph, way);
            let closed = way.is_closed();
            let last = n - 1;
            for i in way.positions_of(node) {
                let succ = if i < last {
                    Some(i + 1)
                } else {
                    closed.then_some(1)
                };
                let pred = if i > 0 {
                    Some(i - 1)
                } else {
                    closed.then_some(last - 1)
                };
                // (neighbour index, hop follows node-list order)
                let options = match direction {
                    Direction::Forward => [(succ, true), (pred, false)],
                    Direction::Backward => [(pred, true), (succ, false)],
                };
                for (idx, along) in options {
                    let Some(idx) = idx else {
                        continue;
                    };
                    if (along && reverse_oneway) || (!along && oneway) {
                        continue;
                    }
                    let other = way.nodes[idx];
                    if other == node {
                        continue;
                    }
                    let hop = match direction {
                        Direction::Forward => StepKey::new(node, way.id, other),
                        Direction::Backward => StepKey::new(other, way.id, node),
                    };
                    if hops.contains(&hop) {
                        continue;
                    }
                    let Some(other_node) = self.graph.node_by_id(other) else {
                        warn!(
                            "Way {} references unknown node {other}, skipping",
                            way.id
                        );
                        continue;
                    };
                    if !self.vehicle.is_allowed_node(self.graph, &other_node) {
                        continue;
                    }
                    hops.push(hop);
                }
            }
        }
        debug_assert!(hops.iter().all(|h| h.start != h.end));
        Ok(hops)
    }

    pub(crate) fn finish(
        &self,
        name: &str,
        t_start: Instant,
        visited: usize,
        found: bool,
    ) {
        debug!(
            "{name}: {} from {} after {} steps in {}",
            if found { "route found" } else { "no route" },
            self.start.id,
            visited.human_count_bare(),
            t_start.elapsed().human_duration()
        );
    }
}

#[cfg(test)]
mod test {
    use color_eyre::Result;

    use super::*;
    use crate::{
        graph::{MemoryGraph, Way},
        route::fixtures,
        vehicle::VehicleProfile,
    };

    fn ctx<'a>(
        base: &'a RouterBase,
        graph: &'a MemoryGraph,
        vehicle: &'a VehicleProfile,
    ) -> Result<SearchContext<'a>> {
        Ok(SearchContext::new(
            base,
            graph,
            vehicle,
            &Target::Node(NodeId(3)),
            NodeId(1),
        )?)
    }

    #[test]
    fn test_expand_respects_oneway() -> Result<()> {
        let graph = fixtures::cycle_with_oneway();
        let base = RouterBase::default();
        let vehicle = VehicleProfile::any();
        let ctx = ctx(&base, &graph, &vehicle)?;
        // way 12 runs N2 -> N1 only
        let fwd = ctx.expand(NodeId(1), Direction::Forward);
        assert_eq!(fwd, vec![StepKey::new(NodeId(1), WayId(41), NodeId(4))]);
        let bwd = ctx.expand(NodeId(1), Direction::Backward);
        assert_eq!(bwd, vec![
            StepKey::new(NodeId(2), WayId(12), NodeId(1)),
            StepKey::new(NodeId(4), WayId(41), NodeId(1)),
        ]);
        Ok(())
    }

    #[test]
    fn test_expand_roundabout_wraps() -> Result<()> {
        let graph = fixtures::roundabout();
        let base = RouterBase::default();
        let vehicle = VehicleProfile::car();
        let ctx = ctx(&base, &graph, &vehicle)?;
        // closed oneway ring 1 -> 2 -> 3 -> 1
        assert_eq!(ctx.expand(NodeId(1), Direction::Forward), vec![
            StepKey::new(NodeId(1), WayId(100), NodeId(2))
        ]);
        assert_eq!(ctx.expand(NodeId(1), Direction::Backward), vec![
            StepKey::new(NodeId(3), WayId(100), NodeId(1))
        ]);
        Ok(())
    }

    #[test]
    fn test_expand_malformed_way_is_dead_end() -> Result<()> {
        let mut graph = fixtures::cycle();
        graph.add_way(Way::new(99, &[1]));
        let base = RouterBase::default();
        let vehicle = VehicleProfile::any();
        let ctx = ctx(&base, &graph, &vehicle)?;
        assert!(ctx.expand(NodeId(1), Direction::Forward).is_empty());
        assert_eq!(ctx.expand(NodeId(2), Direction::Forward).len(), 2);
        Ok(())
    }

    #[test]
    fn test_expand_skips_dangling_nodes() -> Result<()> {
        let mut graph = fixtures::cycle();
        graph.add_way(Way::new(99, &[1, 1000]));
        let base = RouterBase::default();
        let vehicle = VehicleProfile::any();
        let ctx = ctx(&base, &graph, &vehicle)?;
        assert_eq!(ctx.expand(NodeId(1), Direction::Forward).len(), 2);
        Ok(())
    }

    #[test]
    fn test_invalid_arguments() {
        let graph = fixtures::cycle();
        let base = RouterBase::default();
        let vehicle = VehicleProfile::any();
        let res = SearchContext::new(
            &base,
            &graph,
            &vehicle,
            &Target::Node(NodeId(3)),
            NodeId(42),
        );
        assert!(matches!(res, Err(RoadnavError::InvalidArgument(_))));
        let res = SearchContext::new(
            &base,
            &graph,
            &vehicle,
            &Target::Way(WayId(42)),
            NodeId(1),
        );
        assert!(matches!(res, Err(RoadnavError::InvalidArgument(_))));
        let res = SearchContext::new(
            &base,
            &graph,
            &vehicle,
            &Target::Nodes(vec![NodeId(42), NodeId(43)]),
            NodeId(1),
        );
        assert!(matches!(res, Err(RoadnavError::InvalidArgument(_))));
    }

    #[test]
    fn test_endpoints() -> Result<()> {
        let eps: Vec<Endpoint> =
            ["w12", "3"].iter().map(|s| s.parse()).collect::<Result<_, _>>()?;
        assert_eq!(eps, vec![Endpoint::Way(12), Endpoint::Node(3)]);
        assert_eq!(Endpoint::Way(5).to_string(), "w5");
        assert_eq!(
            Target::from_endpoints(&[Endpoint::Node(1), Endpoint::Node(2)])?,
            Target::Nodes(vec![NodeId(1), NodeId(2)])
        );
        assert!(Target::from_endpoints(&eps).is_err());
        assert!(Target::from_endpoints(&[]).is_err());
        let eps: Vec<Endpoint> = serde_json::from_str(r#"["w7", " 8"]"#)?;
        assert_eq!(eps, vec![Endpoint::Way(7), Endpoint::Node(8)]);
        assert_eq!(serde_json::to_string(&eps)?, r#"["w7","8"]"#);
        Ok(())
    }

    #[test]
    fn test_progress_reports_only_improvements() -> Result<()> {
        use std::sync::{Arc, Mutex};
        let graph = fixtures::cycle();
        let mut base = RouterBase::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        base.listeners.push(Box::new(move |p: &Progress| {
            if let Ok(mut v) = sink.lock() {
                v.push(p.covered);
            }
        }));
        let vehicle = VehicleProfile::any();
        let mut ctx = ctx(&base, &graph, &vehicle)?;
        ctx.report(NodeId(2), 100.0);
        ctx.report(NodeId(4), 150.0);
        ctx.report(NodeId(3), 0.0);
        let seen = seen.lock().map_err(|e| color_eyre::eyre::eyre!("{e}"))?;
        assert_eq!(seen.len(), 2);
        assert!(seen[1] > seen[0]);
        Ok(())
    }
}
