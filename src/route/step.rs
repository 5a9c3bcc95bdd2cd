//! Steps, routes and route reconstruction
use std::{fmt::Debug, hash::Hash};

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    common::{dist, RoadnavError, RoadnavResult},
    graph::{NodeId, RoadGraph, WayId},
    metric::Metric,
};

/// Identity of a single hop for search bookkeeping
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub struct StepKey {
    pub start: NodeId,
    pub way: WayId,
    pub end: NodeId,
}

impl StepKey {
    pub const fn new(start: NodeId, way: WayId, end: NodeId) -> Self {
        Self { start, way, end }
    }

    pub const fn reversed(&self) -> Self {
        Self { start: self.end, way: self.way, end: self.start }
    }

    pub fn is_reverse_of(&self, other: &Self) -> bool {
        self.reversed() == *other
    }
}

impl std::fmt::Display for StepKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.start, self.way, self.end)
    }
}

/// Directed traversal of (part of) a way
///
/// `nodes` holds every node passed in travel order, the first one is the
/// start and the last one the end of the step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingStep {
    way: WayId,
    nodes: Vec<NodeId>,
}

impl RoutingStep {
    pub fn new(start: NodeId, way: WayId, end: NodeId) -> Self {
        Self { way, nodes: vec![start, end] }
    }

    pub fn start(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn end(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    pub const fn way(&self) -> WayId {
        self.way
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn key(&self) -> StepKey {
        StepKey::new(self.start(), self.way, self.end())
    }

    /// Number of single-hop traversals collapsed into this step
    pub fn hops(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Straight-line length of the step in meters, dangling nodes are
    /// skipped
    pub fn length(&self, graph: &dyn RoadGraph) -> f64 {
        self.nodes
            .iter()
            .filter_map(|&id| graph.node_by_id(id))
            .tuple_windows()
            .map(|(a, b)| dist(&a, &b))
            .sum()
    }
}

impl From<StepKey> for RoutingStep {
    fn from(key: StepKey) -> Self {
        Self::new(key.start, key.way, key.end)
    }
}

/// Step under construction, only exists while a route is assembled
#[derive(Debug)]
struct StepBuilder {
    way: WayId,
    nodes: Vec<NodeId>,
}

impl StepBuilder {
    fn new(hop: &StepKey) -> Self {
        Self { way: hop.way, nodes: vec![hop.start, hop.end] }
    }

    /// Extend the step by `hop` if it continues along the same way without
    /// turning back or closing on itself
    fn try_merge(&mut self, hop: &StepKey) -> bool {
        let n = self.nodes.len();
        if hop.way != self.way || hop.start != self.nodes[n - 1] {
            return false;
        }
        if hop.end == self.nodes[n - 2] || hop.end == self.nodes[0] {
            return false;
        }
        self.nodes.push(hop.end);
        true
    }

    fn freeze(self) -> RoutingStep {
        RoutingStep { way: self.way, nodes: self.nodes }
    }
}

/// Ordered sequence of steps from a start node to a target node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    start: NodeId,
    steps: Vec<RoutingStep>,
}

impl Route {
    pub const fn start(&self) -> NodeId {
        self.start
    }

    pub fn steps(&self) -> &[RoutingStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn end(&self) -> NodeId {
        self.steps.last().map_or(self.start, RoutingStep::end)
    }

    /// Every node visited, in travel order
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes = vec![self.start];
        for step in &self.steps {
            nodes.extend_from_slice(&step.nodes()[1..]);
        }
        nodes
    }

    pub fn ways(&self) -> Vec<WayId> {
        self.steps.iter().map(RoutingStep::way).collect()
    }

    /// Single-hop keys of the route, in travel order
    pub fn hops(&self) -> Vec<StepKey> {
        self.steps
            .iter()
            .flat_map(|step| {
                step.nodes()
                    .iter()
                    .tuple_windows()
                    .map(|(&a, &b)| StepKey::new(a, step.way(), b))
            })
            .collect()
    }

    pub fn length(&self, graph: &dyn RoadGraph) -> f64 {
        self.steps.iter().map(|s| s.length(graph)).sum()
    }

    /// Cost of the route under `metric`, including turn costs between
    /// consecutive steps
    pub fn cost(&self, graph: &dyn RoadGraph, metric: &dyn Metric) -> f64 {
        let hops: Vec<RoutingStep> =
            self.hops().into_iter().map(RoutingStep::from).collect();
        let mut total: f64 = hops.iter().map(|h| metric.cost(graph, h)).sum();
        for (prev, next) in hops.iter().tuple_windows() {
            total += metric.turn_cost(graph, prev.end(), prev, next);
        }
        total
    }

    /// Check chain continuity and the absence of loops
    pub fn validate(&self) -> RoadnavResult<()> {
        assemble(self.start, self.hops()).map(|_| ())
    }
}

/// Build a route out of single hops in travel order, merging consecutive
/// hops along the same way into one step
pub(crate) fn assemble(
    start: NodeId,
    hops: Vec<StepKey>,
) -> RoadnavResult<Route> {
    let mut seen = FxHashSet::default();
    let mut steps = Vec::new();
    let mut current: Option<StepBuilder> = None;
    let mut at = start;
    let mut prev: Option<StepKey> = None;
    for hop in hops {
        if hop.start != at {
            return Err(inconsistency(format!(
                "route chain broken: expected step from {at}, got {hop}"
            )));
        }
        if prev.is_some_and(|p| p.is_reverse_of(&hop)) {
            return Err(inconsistency(format!(
                "route turns back on {hop}"
            )));
        }
        if !seen.insert(hop) {
            return Err(inconsistency(format!(
                "route traverses {hop} twice"
            )));
        }
        at = hop.end;
        prev = Some(hop);
        let merged = current.as_mut().is_some_and(|b| b.try_merge(&hop));
        if !merged {
            steps.extend(current.take().map(StepBuilder::freeze));
            current = Some(StepBuilder::new(&hop));
        }
    }
    steps.extend(current.map(StepBuilder::freeze));
    Ok(Route { start, steps })
}

/// Follow `links` from `terminal` until the chain ends, returning the hops
/// in walk order
pub(crate) fn walk_chain<K, F>(
    links: &FxHashMap<K, StepKey>,
    terminal: K,
    next: F,
) -> RoadnavResult<Vec<StepKey>>
where
    K: Copy + Eq + Hash + Debug,
    F: Fn(&StepKey) -> K,
{
    let mut seen = FxHashSet::default();
    let mut hops = Vec::new();
    let mut current = terminal;
    while let Some(hop) = links.get(&current) {
        if !seen.insert(current) {
            return Err(inconsistency(format!(
                "found loop during path reconstruction at {current:?}"
            )));
        }
        hops.push(*hop);
        current = next(hop);
    }
    Ok(hops)
}

pub(crate) fn inconsistency(msg: String) -> RoadnavError {
    error!("{msg}");
    RoadnavError::Inconsistency(msg)
}
