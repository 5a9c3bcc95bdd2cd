//! Frontier and candidate orderings shared by the routers
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::{
    common::F64,
    graph::{NodeId, WayId},
    route::{SearchContext, StepKey},
};

/// Sort key of a depth-first candidate, compared field by field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CandidateScore {
    /// Cost so far plus the straight-line distance from the candidate end to
    /// the target, in metric units
    pub estimate: F64,
    pub way: WayId,
    pub end_distance: F64,
    pub end: NodeId,
}

impl CandidateScore {
    pub fn new(ctx: &SearchContext<'_>, cost_so_far: f64, hop: &StepKey) -> Self {
        let end_distance = ctx
            .node(hop.end)
            .map_or(f64::INFINITY, |node| ctx.distance_to_target(&node));
        Self {
            estimate: F64(
                cost_so_far
                    + ctx.hop_cost(hop)
                    + ctx.metric().lower_bound(end_distance),
            ),
            way: hop.way,
            end_distance: F64(end_distance),
            end: hop.end,
        }
    }
}

/// Order in which a depth-first search tries the candidates of a node
pub trait ExpansionOrder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Reorder `candidates` in place, the first one is tried first
    fn arrange(
        &self,
        ctx: &SearchContext<'_>,
        cost_so_far: f64,
        candidates: &mut Vec<StepKey>,
    );
}

/// Candidates in the order the graph yields them
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphOrder;

impl ExpansionOrder for GraphOrder {
    fn name(&self) -> &'static str {
        "Depth-first"
    }

    fn arrange(&self, _: &SearchContext<'_>, _: f64, _: &mut Vec<StepKey>) {}
}

/// Most promising candidate first, see [`CandidateScore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectedOrder;

impl ExpansionOrder for DirectedOrder {
    fn name(&self) -> &'static str {
        "Directed depth-first"
    }

    fn arrange(
        &self,
        ctx: &SearchContext<'_>,
        cost_so_far: f64,
        candidates: &mut Vec<StepKey>,
    ) {
        candidates
            .sort_by_cached_key(|hop| CandidateScore::new(ctx, cost_so_far, hop));
    }
}

/// Greedy frontier key: straight-line distance to the target, then node id
pub(crate) type FrontierKey = (F64, NodeId);

/// Deterministic hash of a step key, breaks ties between equal priorities
pub(crate) fn stable_hash(key: &StepKey) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod test {
    use color_eyre::Result;

    use super::*;
    use crate::{
        route::{fixtures, RouterBase, Target},
        vehicle::VehicleProfile,
    };

    #[test]
    fn test_directed_order_prefers_target_side() -> Result<()> {
        let graph = fixtures::cycle();
        let base = RouterBase::default();
        let vehicle = VehicleProfile::any();
        let ctx = SearchContext::new(
            &base,
            &graph,
            &vehicle,
            &Target::Node(NodeId(3)),
            NodeId(1),
        )?;
        let mut candidates = vec![
            StepKey::new(NodeId(1), WayId(41), NodeId(4)),
            StepKey::new(NodeId(1), WayId(12), NodeId(2)),
        ];
        GraphOrder.arrange(&ctx, 0.0, &mut candidates);
        assert_eq!(candidates[0].end, NodeId(4));
        DirectedOrder.arrange(&ctx, 0.0, &mut candidates);
        assert_eq!(candidates[0].end, NodeId(2));
        Ok(())
    }

    #[test]
    fn test_score_tie_breaks_on_way() {
        let a = CandidateScore {
            estimate: F64(1.0),
            way: WayId(2),
            end_distance: F64(0.0),
            end: NodeId(1),
        };
        let b = CandidateScore { way: WayId(1), end_distance: F64(5.0), ..a };
        assert!(b < a);
    }

    #[test]
    fn test_stable_hash_is_deterministic() {
        let key = StepKey::new(NodeId(1), WayId(2), NodeId(3));
        let same = StepKey::new(NodeId(1), WayId(2), NodeId(3));
        assert_eq!(stable_hash(&key), stable_hash(&same));
        assert_ne!(stable_hash(&key), stable_hash(&key.reversed()));
    }
}
