use std::{collections::BTreeSet, time::Instant};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    common::{RoadnavResult, F64},
    graph::{NodeId, RoadGraph},
    metric::Metric,
    route::{
        ordering::FrontierKey,
        step::{assemble, walk_chain},
        Direction, Route, Router, RouterBase, SearchContext, StepKey, Target,
    },
    vehicle::Vehicle,
};

/// Single target search relaxing costs from the start
///
/// The frontier is ordered by straight-line distance to the target, not by
/// cost from the start, so the search is greedy and the route it returns is
/// not guaranteed to be the cheapest one. Use [`super::MultiDijkstraRouter`]
/// or [`super::AStarRouter`] for cost-optimal routes.
pub struct DijkstraRouter {
    base: RouterBase,
}

impl DijkstraRouter {
    pub fn new(metric: Box<dyn Metric>) -> Self {
        Self { base: RouterBase::new(metric) }
    }

    fn frontier_key(ctx: &SearchContext<'_>, node: NodeId) -> FrontierKey {
        let d = ctx
            .node(node)
            .map_or(f64::INFINITY, |n| ctx.distance_to_target(&n));
        (F64(d), node)
    }
}

impl Router for DijkstraRouter {
    fn name(&self) -> String {
        "Dijkstra".to_owned()
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
        let mut best_cost: FxHashMap<NodeId, f64> = FxHashMap::default();
        let mut best_step: FxHashMap<NodeId, StepKey> = FxHashMap::default();
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut frontier: BTreeSet<FrontierKey> = BTreeSet::new();
        best_cost.insert(start, 0.0);
        frontier.insert(Self::frontier_key(&ctx, start));
        let mut found = None;
        while let Some((F64(remaining), node)) = frontier.pop_first() {
            if !visited.insert(node) {
                continue;
            }
            if ctx.is_target(node) {
                found = Some(node);
                break;
            }
            ctx.report(node, remaining);
            let cost = best_cost.get(&node).copied().unwrap_or_default();
            let prev = best_step.get(&node).copied();
            for hop in ctx.expand(node, Direction::Forward) {
                if visited.contains(&hop.end) {
                    continue;
                }
                if prev.is_some_and(|p| p.is_reverse_of(&hop)) {
                    continue;
                }
                let mut new_cost = cost + ctx.hop_cost(&hop);
                if let Some(prev) = &prev {
                    new_cost += ctx.turn_cost(prev, &hop);
                }
                if best_cost.get(&hop.end).is_some_and(|&c| c <= new_cost) {
                    continue;
                }
                best_cost.insert(hop.end, new_cost);
                best_step.insert(hop.end, hop);
                frontier.insert(Self::frontier_key(&ctx, hop.end));
            }
        }
        ctx.finish(&self.name(), t_start, visited.len(), found.is_some());
        let Some(end) = found else {
            return Ok(None);
        };
        let mut hops = walk_chain(&best_step, end, |hop| hop.start)?;
        hops.reverse();
        assemble(start, hops).map(Some)
    }
}

#[cfg(test)]
mod test {
    use color_eyre::{eyre::OptionExt, Result};

    use super::*;
    use crate::{
        graph::WayId,
        metric::DistanceMetric,
        route::fixtures,
        vehicle::VehicleProfile,
    };

    fn router() -> DijkstraRouter {
        DijkstraRouter::new(Box::new(DistanceMetric))
    }

    #[test]
    fn test_cycle_two_steps() -> Result<()> {
        let graph = fixtures::cycle();
        let route = router()
            .route_to_node(&graph, NodeId(3), NodeId(1), &VehicleProfile::any())?
            .ok_or_eyre("no route")?;
        assert_eq!(route.ways(), vec![WayId(12), WayId(23)]);
        route.validate()?;
        Ok(())
    }

    #[test]
    fn test_oneway_detour() -> Result<()> {
        let graph = fixtures::cycle_with_oneway();
        let route = router()
            .route_to_node(&graph, NodeId(3), NodeId(1), &VehicleProfile::any())?
            .ok_or_eyre("no route")?;
        assert_eq!(route.ways(), vec![WayId(41), WayId(34)]);
        // the other way round w12 is usable
        let route = router()
            .route_to_node(&graph, NodeId(1), NodeId(3), &VehicleProfile::any())?
            .ok_or_eyre("no route")?;
        assert_eq!(route.ways(), vec![WayId(23), WayId(12)]);
        Ok(())
    }

    #[test]
    fn test_ignores_turn_restrictions() -> Result<()> {
        let graph = fixtures::cycle_no_right_turn();
        let route = router()
            .route_to_node(&graph, NodeId(3), NodeId(1), &VehicleProfile::any())?
            .ok_or_eyre("no route")?;
        assert_eq!(route.ways(), vec![WayId(12), WayId(23)]);
        Ok(())
    }

    #[test]
    fn test_roundabout_direction() -> Result<()> {
        let graph = fixtures::roundabout();
        let car = VehicleProfile::car();
        // leaving N3 the ring only continues to N1
        let route = router()
            .route_to_node(&graph, NodeId(10), NodeId(30), &car)?
            .ok_or_eyre("no route")?;
        assert_eq!(route.nodes(), vec![
            NodeId(30),
            NodeId(3),
            NodeId(1),
            NodeId(2),
            NodeId(10)
        ]);
        // N3 -> N1 -> N2 along the ring is merged into one step
        assert_eq!(route.len(), 3);
        assert_eq!(route.steps()[1].nodes(), &[NodeId(3), NodeId(1), NodeId(2)]);
        Ok(())
    }

    #[test]
    fn test_deterministic() -> Result<()> {
        let graph = fixtures::random_grid(6, 3);
        let any = VehicleProfile::any();
        let a = router().route_to_node(&graph, NodeId(36), NodeId(1), &any)?;
        let b = router().route_to_node(&graph, NodeId(36), NodeId(1), &any)?;
        assert_eq!(a, b);
        Ok(())
    }
}
