//! Read-only road network query surface
//!
//! Routers never materialize a graph, every node and edge is derived on
//! demand from nodes, ways and relations through [`RoadGraph`].
use std::fmt::Display;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

mod memory;
pub use memory::MemoryGraph;

macro_rules! id_type {
    ($name:ident, $prefix:literal) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            Default,
            Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

id_type!(NodeId, "n");
id_type!(WayId, "w");
id_type!(RelationId, "r");

/// A point of the road network
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    pub const fn new(id: i64, lat: f64, lon: f64) -> Self {
        Self { id: NodeId(id), lat, lon }
    }
}

pub type Tags = FxHashMap<String, String>;

/// Ordered sequence of node references making up a road
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    pub id: WayId,
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub tags: Tags,
}

impl Way {
    pub fn new(id: i64, nodes: &[i64]) -> Self {
        Self {
            id: WayId(id),
            nodes: nodes.iter().copied().map(NodeId).collect(),
            tags: Tags::default(),
        }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Way whose node list ends where it starts (roundabouts, loops)
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 2 && self.nodes.first() == self.nodes.last()
    }

    /// Every index at which `node` occurs in the node list
    pub fn positions_of(&self, node: NodeId) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(move |(i, n)| (*n == node).then_some(i))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub kind: MemberKind,
    #[serde(rename = "ref")]
    pub reference: i64,
    #[serde(default)]
    pub role: String,
}

impl Member {
    pub fn way(id: i64, role: &str) -> Self {
        Self { kind: MemberKind::Way, reference: id, role: role.to_owned() }
    }

    pub fn node(id: i64, role: &str) -> Self {
        Self { kind: MemberKind::Node, reference: id, role: role.to_owned() }
    }
}

/// Tagged group of members, turn restrictions are the only kind routers
/// look at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub members: Vec<Member>,
    #[serde(default)]
    pub tags: Tags,
}

impl Relation {
    pub fn new(id: i64, members: Vec<Member>) -> Self {
        Self { id: RelationId(id), members, tags: Tags::default() }
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn members_with_role<'a>(
        &'a self,
        role: &'a str,
    ) -> impl Iterator<Item = &'a Member> + 'a {
        self.members.iter().filter(move |m| m.role == role)
    }
}

/// Graph query surface consumed by the routers
pub trait RoadGraph {
    fn node_by_id(&self, id: NodeId) -> Option<Node>;

    fn way_by_id(&self, id: WayId) -> Option<&Way>;

    /// Ways referencing `node`, in a stable order
    fn ways_incident_to(&self, node: NodeId) -> Vec<&Way>;

    fn relation_by_id(&self, id: RelationId) -> Option<&Relation>;

    /// Relations that list `way` as one of their members
    fn referenced_relation_ids(&self, way: WayId) -> Vec<RelationId>;

    /// Resolved nodes of `way`, `None` for dangling references
    fn nodes_of(&self, way: &Way) -> Vec<Option<Node>> {
        way.nodes.iter().map(|&id| self.node_by_id(id)).collect()
    }
}
