use std::path::Path;

use fs_err::File;
use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    MemberKind, Node, NodeId, Relation, RelationId, RoadGraph, Way, WayId,
};
use crate::common::RoadnavResult;

/// On-disk layout of a [`MemoryGraph`]
#[derive(Debug, Default, Serialize, Deserialize)]
struct NetworkFile {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    ways: Vec<Way>,
    #[serde(default)]
    relations: Vec<Relation>,
}

/// In-memory road network with the node -> ways and way -> relations
/// indexes the routers query
#[derive(Debug, Default, Clone)]
pub struct MemoryGraph {
    nodes: FxHashMap<NodeId, Node>,
    ways: FxHashMap<WayId, Way>,
    relations: FxHashMap<RelationId, Relation>,
    node_ways: FxHashMap<NodeId, Vec<WayId>>,
    way_relations: FxHashMap<WayId, Vec<RelationId>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> &mut Self {
        self.nodes.insert(node.id, node);
        self
    }

    pub fn add_way(&mut self, way: Way) -> &mut Self {
        if let Some(old) = self.ways.remove(&way.id) {
            for ids in self.node_ways.values_mut() {
                ids.retain(|&id| id != old.id);
            }
        }
        for &node in &way.nodes {
            let ids = self.node_ways.entry(node).or_default();
            if !ids.contains(&way.id) {
                ids.push(way.id);
            }
        }
        self.ways.insert(way.id, way);
        self
    }

    pub fn add_relation(&mut self, relation: Relation) -> &mut Self {
        for member in &relation.members {
            if member.kind != MemberKind::Way {
                continue;
            }
            let ids =
                self.way_relations.entry(WayId(member.reference)).or_default();
            if !ids.contains(&relation.id) {
                ids.push(relation.id);
            }
        }
        self.relations.insert(relation.id, relation);
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_ways(&self) -> usize {
        self.ways.len()
    }

    pub fn num_relations(&self) -> usize {
        self.relations.len()
    }

    pub fn from_json(data: &str) -> RoadnavResult<Self> {
        let file: NetworkFile = serde_json::from_str(data)?;
        Ok(Self::from(file))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> RoadnavResult<Self> {
        let reader = std::io::BufReader::new(File::open(path.as_ref())?);
        let file: NetworkFile = serde_json::from_reader(reader)?;
        let graph = Self::from(file);
        debug!(
            "Loaded {} nodes, {} ways, {} relations from {}",
            graph.num_nodes(),
            graph.num_ways(),
            graph.num_relations(),
            path.as_ref().display()
        );
        Ok(graph)
    }

    pub fn to_json(&self) -> RoadnavResult<String> {
        let file = NetworkFile {
            nodes: self.nodes.values().copied().sorted_by_key(|n| n.id).collect(),
            ways: self.ways.values().cloned().sorted_by_key(|w| w.id).collect(),
            relations: self
                .relations
                .values()
                .cloned()
                .sorted_by_key(|r| r.id)
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }
}

impl From<NetworkFile> for MemoryGraph {
    fn from(file: NetworkFile) -> Self {
        let mut graph = Self::new();
        for node in file.nodes {
            graph.add_node(node);
        }
        for way in file.ways {
            if way.nodes.len() < 2 {
                warn!("Way {} has less than two nodes", way.id);
            }
            graph.add_way(way);
        }
        for relation in file.relations {
            graph.add_relation(relation);
        }
        graph
    }
}

impl RoadGraph for MemoryGraph {
    fn node_by_id(&self, id: NodeId) -> Option<Node> {
        self.nodes.get(&id).copied()
    }

    fn way_by_id(&self, id: WayId) -> Option<&Way> {
        self.ways.get(&id)
    }

    fn ways_incident_to(&self, node: NodeId) -> Vec<&Way> {
        self.node_ways
            .get(&node)
            .map(|ids| ids.iter().filter_map(|id| self.ways.get(id)).collect())
            .unwrap_or_default()
    }

    fn relation_by_id(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    fn referenced_relation_ids(&self, way: WayId) -> Vec<RelationId> {
        self.way_relations.get(&way).cloned().unwrap_or_default()
    }
}
