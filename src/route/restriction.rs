//! Turn restriction discovery and legality
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

use crate::graph::{MemberKind, NodeId, RelationId, Relation, RoadGraph, WayId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RestrictionKind {
    /// `only_*`: the `to` way is the only legal continuation
    Only,
    /// `no_*`: the `to` way is forbidden
    No,
}

/// Restriction relation reduced to what legality checks need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRestriction {
    pub relation: RelationId,
    pub kind: RestrictionKind,
    pub from: WayId,
    /// `None` applies at every node of `from`
    pub via: Option<NodeId>,
    pub to: WayId,
}

impl TurnRestriction {
    /// Parse a `type=restriction` relation, `None` for anything else or for
    /// restrictions routed through a via way
    pub fn from_relation(relation: &Relation) -> Option<Self> {
        if relation.tag("type").is_some_and(|t| t != "restriction") {
            return None;
        }
        let value = relation.tag("restriction")?;
        let kind = if value.starts_with("only_") {
            RestrictionKind::Only
        } else if value.starts_with("no_") {
            RestrictionKind::No
        } else {
            debug!("{}: unknown restriction {value:?}", relation.id);
            return None;
        };
        let way_member = |role: &str| {
            relation
                .members_with_role(role)
                .filter(|m| m.kind == MemberKind::Way)
                .exactly_one()
                .ok()
                .map(|m| WayId(m.reference))
        };
        let from = way_member("from")?;
        let to = way_member("to")?;
        let via = match relation.members_with_role("via").at_most_one() {
            Ok(None) => None,
            Ok(Some(m)) if m.kind == MemberKind::Node => {
                Some(NodeId(m.reference))
            }
            _ => {
                debug!("{}: unsupported via members", relation.id);
                return None;
            }
        };
        Some(Self { relation: relation.id, kind, from, via, to })
    }

    pub fn applies_at(&self, from: WayId, via: NodeId) -> bool {
        self.from == from && self.via.map_or(true, |v| v == via)
    }

    /// Whether continuing onto `to` is legal under this restriction alone
    pub fn allows(&self, to: WayId) -> bool {
        match self.kind {
            RestrictionKind::Only => to == self.to,
            RestrictionKind::No => to != self.to,
        }
    }
}

/// Restrictions whose `from` way is `from` and whose via node, if any, is
/// `via`
pub(crate) fn restrictions_at(
    graph: &dyn RoadGraph,
    from: WayId,
    via: NodeId,
) -> Vec<TurnRestriction> {
    graph
        .referenced_relation_ids(from)
        .into_iter()
        .filter_map(|id| graph.relation_by_id(id))
        .filter_map(TurnRestriction::from_relation)
        .filter(|r| r.applies_at(from, via))
        .collect()
}

/// Whether the turn `from -> to` at `via` is legal, unrestricted turns are
/// always legal
pub fn is_allowed_turn(
    graph: &dyn RoadGraph,
    from: WayId,
    via: NodeId,
    to: WayId,
) -> bool {
    restrictions_at(graph, from, via)
        .iter()
        .all(|restriction| restriction.allows(to))
}
