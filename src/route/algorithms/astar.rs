use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::{
    common::{MinFHeap, RoadnavResult},
    graph::{NodeId, RoadGraph, WayId},
    metric::Metric,
    route::{
        is_allowed_turn,
        ordering::stable_hash,
        step::{assemble, walk_chain},
        Direction, Route, Router, RouterBase, SearchContext, StepKey, Target,
    },
    vehicle::Vehicle,
};

/// Way of the seed steps, never a real way and exempt from turn checks
const DUMMY_WAY: WayId = WayId(i64::MIN);
/// End node of the seed steps
const DUMMY_NODE: NodeId = NodeId(i64::MIN);

/// A*-Search over steps instead of nodes, honoring turn restrictions
///
/// Searches backwards from the targets so the way a step continues onto is
/// known when the step is expanded, which is what turn restrictions are
/// evaluated against.
///
/// `g(step)` is the cost from the start of `step` to the closest target,
/// `h(step)` the metric's lower bound for the straight-line distance from the
/// start of `step` to the starting point. The queue may hold stale entries
/// for a step, they are skipped once the step is closed.
pub struct AStarRouter {
    base: RouterBase,
}

impl AStarRouter {
    pub fn new(metric: Box<dyn Metric>) -> Self {
        Self { base: RouterBase::new(metric) }
    }

    fn heuristic(ctx: &SearchContext<'_>, node: NodeId) -> f64 {
        ctx.node(node).map_or(f64::INFINITY, |n| {
            ctx.metric().lower_bound(ctx.distance_to_start(&n))
        })
    }

    /// Steps that may be driven right before `step`
    fn predecessors(ctx: &SearchContext<'_>, step: &StepKey) -> Vec<StepKey> {
        let seed = step.way == DUMMY_WAY;
        ctx.expand(step.start, Direction::Backward)
            .into_iter()
            .filter(|hop| {
                seed || (!hop.is_reverse_of(step)
                    && is_allowed_turn(ctx.graph(), hop.way, step.start, step.way))
            })
            .collect()
    }
}

impl Router for AStarRouter {
    fn name(&self) -> String {
        "A*".to_owned()
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
        let mut g: FxHashMap<StepKey, f64> = FxHashMap::default();
        // step driven right after a step on the best known continuation
        let mut next_of: FxHashMap<StepKey, StepKey> = FxHashMap::default();
        let mut closed: FxHashSet<StepKey> = FxHashSet::default();
        let mut queue: MinFHeap<(u64, StepKey)> = MinFHeap::new();
        for t in &ctx.targets {
            let seed = StepKey::new(t.id, DUMMY_WAY, DUMMY_NODE);
            g.insert(seed, 0.0);
            queue.push(Self::heuristic(&ctx, t.id), (stable_hash(&seed), seed));
        }
        let mut found = None;
        while let Some((f, (_, step))) = queue.pop() {
            if !closed.insert(step) {
                continue;
            }
            trace!("closing {step} at f = {f:.1}");
            if step.start == start {
                found = Some(step);
                break;
            }
            if let Some(node) = ctx.node(step.start) {
                let remaining = ctx.distance_to_start(&node);
                ctx.report(step.start, remaining);
            }
            let cost = g.get(&step).copied().unwrap_or_default();
            let seed = step.way == DUMMY_WAY;
            for hop in Self::predecessors(&ctx, &step) {
                if closed.contains(&hop) {
                    continue;
                }
                let mut new_cost = cost + ctx.hop_cost(&hop);
                if !seed {
                    new_cost += ctx.turn_cost(&hop, &step);
                }
                if g.get(&hop).is_some_and(|&c| c <= new_cost) {
                    continue;
                }
                g.insert(hop, new_cost);
                if seed {
                    next_of.remove(&hop);
                } else {
                    next_of.insert(hop, step);
                }
                let h = Self::heuristic(&ctx, hop.start);
                queue.push(new_cost + h, (stable_hash(&hop), hop));
            }
        }
        ctx.finish(&self.name(), t_start, closed.len(), found.is_some());
        let Some(first) = found else {
            return Ok(None);
        };
        if first.way == DUMMY_WAY {
            return assemble(start, Vec::new()).map(Some);
        }
        let mut hops = vec![first];
        hops.extend(walk_chain(&next_of, first, |hop| *hop)?);
        assemble(start, hops).map(Some)
    }
}
