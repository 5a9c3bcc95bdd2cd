use std::time::Instant;

use human_repr::HumanCount;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::{
    common::RoadnavResult,
    graph::{NodeId, RoadGraph},
    metric::Metric,
    route::{
        step::assemble, DepthLimits, Direction, DirectedOrder, ExpansionOrder,
        GraphOrder, Route, Router, RouterBase, SearchContext, StepKey, Target,
    },
    vehicle::Vehicle,
};

/// Iteratively deepened depth-first search
///
/// Only the current path is remembered, the same node may be explored again
/// on a different branch. The number of paths grows exponentially with the
/// depth bound on well connected graphs, `max_iterations` is the safety net.
pub struct DepthFirstRouter<O: ExpansionOrder = GraphOrder> {
    base: RouterBase,
    order: O,
    limits: DepthLimits,
}

/// Depth-first search trying the candidate closest to the target first
pub type DirectedDepthFirstRouter = DepthFirstRouter<DirectedOrder>;

enum Outcome {
    Found(Vec<StepKey>),
    /// No path within the bound, `truncated` if the bound cut off a branch
    Exhausted { truncated: bool },
    IterationLimit,
}

struct Frame {
    cost: f64,
    candidates: std::vec::IntoIter<StepKey>,
}

impl<O: ExpansionOrder + Default> DepthFirstRouter<O> {
    pub fn new(metric: Box<dyn Metric>) -> Self {
        Self::with_order(metric, O::default())
    }
}

impl<O: ExpansionOrder> DepthFirstRouter<O> {
    pub fn with_order(metric: Box<dyn Metric>, order: O) -> Self {
        Self {
            base: RouterBase::new(metric),
            order,
            limits: DepthLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: DepthLimits) -> Self {
        self.limits = limits;
        self
    }

    pub const fn limits(&self) -> DepthLimits {
        self.limits
    }

    fn frame(&self, ctx: &SearchContext<'_>, node: NodeId, cost: f64) -> Frame {
        let mut candidates = ctx.expand(node, Direction::Forward);
        self.order.arrange(ctx, cost, &mut candidates);
        Frame { cost, candidates: candidates.into_iter() }
    }

    /// One round of depth-first search, paths are at most `bound` hops long
    fn search_bounded(
        &self,
        ctx: &mut SearchContext<'_>,
        bound: usize,
        iterations: &mut usize,
    ) -> Outcome {
        let start = ctx.start.id;
        if ctx.is_target(start) {
            return Outcome::Found(Vec::new());
        }
        let mut truncated = false;
        let mut path: Vec<StepKey> = Vec::new();
        let mut on_path: FxHashSet<NodeId> = FxHashSet::default();
        on_path.insert(start);
        let mut stack = vec![self.frame(ctx, start, 0.0)];
        while let Some(top) = stack.last_mut() {
            let Some(hop) = top.candidates.next() else {
                stack.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(&done.end);
                }
                continue;
            };
            if on_path.contains(&hop.end) {
                continue;
            }
            if path.last().is_some_and(|prev| prev.is_reverse_of(&hop)) {
                continue;
            }
            *iterations += 1;
            if *iterations > self.limits.max_iterations {
                return Outcome::IterationLimit;
            }
            let mut cost = top.cost + ctx.hop_cost(&hop);
            if let Some(prev) = path.last() {
                cost += ctx.turn_cost(prev, &hop);
            }
            if ctx.is_target(hop.end) {
                path.push(hop);
                return Outcome::Found(path);
            }
            if path.len() + 1 >= bound {
                truncated = true;
                continue;
            }
            if let Some(node) = ctx.node(hop.end) {
                let remaining = ctx.distance_to_target(&node);
                ctx.report(hop.end, remaining);
            }
            path.push(hop);
            on_path.insert(hop.end);
            let frame = self.frame(ctx, hop.end, cost);
            stack.push(frame);
        }
        Outcome::Exhausted { truncated }
    }
}

impl<O: ExpansionOrder> Router for DepthFirstRouter<O> {
    fn name(&self) -> String {
        self.order.name().to_owned()
    }

    fn base(&self) -> &RouterBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RouterBase {
        &mut self.base
    }

    fn route(
        &self,
        graph: &dyn RoadGraph,
        target: &Target,
        start: NodeId,
        vehicle: &dyn Vehicle,
    ) -> RoadnavResult<Option<Route>> {
        let t_start = Instant::now();
        let mut ctx = SearchContext::new(&self.base, graph, vehicle, target, start)?;
        let name = self.name();
        let max_depth = self.limits.max_depth.max(1);
        let mut bound = self.limits.initial_depth.clamp(1, max_depth);
        let mut iterations = 0;
        let hops = loop {
            debug!("{name}: searching with depth bound {bound}");
            match self.search_bounded(&mut ctx, bound, &mut iterations) {
                Outcome::Found(hops) => break Some(hops),
                Outcome::Exhausted { truncated: false } => break None,
                Outcome::Exhausted { truncated: true } if bound >= max_depth => {
                    warn!("{name}: no route within {max_depth} hops, giving up");
                    break None;
                }
                Outcome::Exhausted { truncated: true } => {
                    bound = bound.saturating_mul(2).min(max_depth);
                }
                Outcome::IterationLimit => {
                    warn!(
                        "{name}: giving up after {} iterations",
                        iterations.human_count_bare()
                    );
                    break None;
                }
            }
        };
        ctx.finish(&name, t_start, iterations, hops.is_some());
        hops.map(|hops| assemble(start, hops)).transpose()
    }
}
