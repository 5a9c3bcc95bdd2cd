use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    common::{MinFHeap, RoadnavResult},
    graph::{NodeId, RoadGraph},
    metric::Metric,
    route::{
        step::{assemble, walk_chain},
        Direction, Route, Router, RouterBase, SearchContext, StepKey, Target,
    },
    vehicle::Vehicle,
};

/// Reverse Dijkstra growing from every target at once until it reaches the
/// start, the route ends at the cheapest reachable target
pub struct MultiDijkstraRouter {
    base: RouterBase,
}

impl MultiDijkstraRouter {
    pub fn new(metric: Box<dyn Metric>) -> Self {
        Self { base: RouterBase::new(metric) }
    }
}

impl Router for MultiDijkstraRouter {
    fn name(&self) -> String {
        "Multi-target Dijkstra".to_owned()
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
        // cost from a node to the closest target
        let mut best_cost: FxHashMap<NodeId, f64> = FxHashMap::default();
        // first hop of the best known continuation from a node
        let mut best_step: FxHashMap<NodeId, StepKey> = FxHashMap::default();
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut queue: MinFHeap<NodeId> = MinFHeap::new();
        for t in &ctx.targets {
            best_cost.insert(t.id, 0.0);
            queue.push(0.0, t.id);
        }
        let mut found = false;
        while let Some((cost, node)) = queue.pop() {
            if !visited.insert(node) {
                continue;
            }
            if node == start {
                found = true;
                break;
            }
            if let Some(n) = ctx.node(node) {
                let remaining = ctx.distance_to_start(&n);
                ctx.report(node, remaining);
            }
            let next = best_step.get(&node).copied();
            for hop in ctx.expand(node, Direction::Backward) {
                if visited.contains(&hop.start) {
                    continue;
                }
                if next.is_some_and(|n| n.is_reverse_of(&hop)) {
                    continue;
                }
                let mut new_cost = cost + ctx.hop_cost(&hop);
                if let Some(next) = &next {
                    new_cost += ctx.turn_cost(&hop, next);
                }
                if best_cost.get(&hop.start).is_some_and(|&c| c <= new_cost) {
                    continue;
                }
                best_cost.insert(hop.start, new_cost);
                best_step.insert(hop.start, hop);
                queue.push(new_cost, hop.start);
            }
        }
        ctx.finish(&self.name(), t_start, visited.len(), found);
        if !found {
            return Ok(None);
        }
        let hops = walk_chain(&best_step, start, |hop| hop.end)?;
        assemble(start, hops).map(Some)
    }
}

#[cfg(test)]
mod test {
    use color_eyre::{eyre::OptionExt, Result};

    use super::*;
    use crate::{
        graph::{MemoryGraph, Node, Way, WayId},
        metric::DistanceMetric,
        route::fixtures,
        vehicle::VehicleProfile,
    };

    fn router() -> MultiDijkstraRouter {
        MultiDijkstraRouter::new(Box::new(DistanceMetric))
    }

    /// `A - S - B` on a line, `B` is twice as far from `S` as `A`
    fn line() -> MemoryGraph {
        let mut graph = MemoryGraph::new();
        graph
            .add_node(Node::new(1, 0.0, -0.01))
            .add_node(Node::new(2, 0.0, 0.0))
            .add_node(Node::new(3, 0.0, 0.02))
            .add_way(Way::new(1, &[1, 2]))
            .add_way(Way::new(2, &[2, 3]));
        graph
    }

    #[test]
    fn test_cheapest_target_wins() -> Result<()> {
        let graph = line();
        let any = VehicleProfile::any();
        let route = router()
            .route_to_any(&graph, &[NodeId(3), NodeId(1)], NodeId(2), &any)?
            .ok_or_eyre("no route")?;
        assert_eq!(route.end(), NodeId(1));
        Ok(())
    }

    #[test]
    fn test_only_reachable_target() -> Result<()> {
        let mut graph = line();
        graph.add_way(Way::new(1, &[1, 2]).with_tag("oneway", "yes"));
        let any = VehicleProfile::any();
        let route = router()
            .route_to_any(&graph, &[NodeId(3), NodeId(1)], NodeId(2), &any)?
            .ok_or_eyre("no route")?;
        assert_eq!(route.end(), NodeId(3));
        assert_eq!(route.ways(), vec![WayId(2)]);
        let none = router().route_to_node(&graph, NodeId(1), NodeId(3), &any)?;
        assert!(none.is_none());
        Ok(())
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
        Ok(())
    }

    #[test]
    fn test_route_to_way() -> Result<()> {
        let graph = fixtures::cycle();
        let route = router()
            .route_to_way(&graph, WayId(34), NodeId(1), &VehicleProfile::any())?
            .ok_or_eyre("no route")?;
        // N4 is closer than N3
        assert_eq!(route.end(), NodeId(4));
        assert_eq!(route.ways(), vec![WayId(41)]);
        Ok(())
    }

    #[test]
    fn test_start_is_target() -> Result<()> {
        let graph = fixtures::cycle();
        let route = router()
            .route_to_any(&graph, &[NodeId(1), NodeId(3)], NodeId(1), &VehicleProfile::any())?
            .ok_or_eyre("no route")?;
        assert!(route.is_empty());
        Ok(())
    }
}
