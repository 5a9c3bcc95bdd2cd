//! Vehicle selector policies deciding which nodes and ways are usable and in
//! which direction
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::graph::{Node, NodeId, RoadGraph, Way};

/// Selector policy consumed by the routers
pub trait Vehicle {
    fn is_allowed_node(&self, graph: &dyn RoadGraph, node: &Node) -> bool;

    fn is_allowed_way(&self, graph: &dyn RoadGraph, way: &Way) -> bool;

    /// Way may only be driven in node-list order
    fn is_oneway(&self, graph: &dyn RoadGraph, way: &Way) -> bool;

    /// Way may only be driven against node-list order
    fn is_reverse_oneway(&self, graph: &dyn RoadGraph, way: &Way) -> bool;
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleKind {
    #[default]
    Car,
    Bicycle,
    Foot,
    /// Every way is usable, oneway tags still apply
    Any,
}

const DENIED: &[&str] = &["no", "private"];

/// Tag driven vehicle policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub name: String,
    /// Usable `highway` values and their speed in km/h
    pub highways: FxHashMap<String, f64>,
    /// Speed used for ways without a known `highway` tag, `None` disallows
    /// them
    #[serde(default)]
    pub fallback_speed: Option<f64>,
    /// Access tags checked in order, first one present decides
    #[serde(default)]
    pub access_keys: Vec<String>,
    #[serde(default = "default_true")]
    pub respect_oneway: bool,
    /// Tag overriding `oneway` for this vehicle (e.g. `oneway:bicycle`)
    #[serde(default)]
    pub oneway_key: Option<String>,
    /// Highways that are oneway even without a `oneway` tag
    #[serde(default)]
    pub implied_oneway: Vec<String>,
    #[serde(default)]
    pub avoid_nodes: FxHashSet<NodeId>,
}

const fn default_true() -> bool {
    true
}

fn speeds(table: &[(&str, f64)]) -> FxHashMap<String, f64> {
    table.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
}

fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|&k| k.to_owned()).collect()
}

impl VehicleProfile {
    pub fn preset(kind: VehicleKind) -> Self {
        match kind {
            VehicleKind::Car => Self::car(),
            VehicleKind::Bicycle => Self::bicycle(),
            VehicleKind::Foot => Self::foot(),
            VehicleKind::Any => Self::any(),
        }
    }

    pub fn car() -> Self {
        Self {
            name: "car".to_owned(),
            highways: speeds(&[
                ("motorway", 110.0),
                ("motorway_link", 60.0),
                ("trunk", 90.0),
                ("trunk_link", 50.0),
                ("primary", 70.0),
                ("primary_link", 40.0),
                ("secondary", 60.0),
                ("secondary_link", 40.0),
                ("tertiary", 50.0),
                ("tertiary_link", 30.0),
                ("unclassified", 50.0),
                ("residential", 30.0),
                ("service", 20.0),
                ("living_street", 10.0),
            ]),
            fallback_speed: None,
            access_keys: keys(&["motor_vehicle", "vehicle", "access"]),
            respect_oneway: true,
            oneway_key: None,
            implied_oneway: keys(&["motorway", "motorway_link"]),
            avoid_nodes: FxHashSet::default(),
        }
    }

    pub fn bicycle() -> Self {
        Self {
            name: "bicycle".to_owned(),
            highways: speeds(&[
                ("primary", 18.0),
                ("secondary", 18.0),
                ("tertiary", 18.0),
                ("unclassified", 16.0),
                ("residential", 16.0),
                ("service", 14.0),
                ("living_street", 12.0),
                ("track", 12.0),
                ("cycleway", 20.0),
                ("path", 12.0),
            ]),
            fallback_speed: None,
            access_keys: keys(&["bicycle", "vehicle", "access"]),
            respect_oneway: true,
            oneway_key: Some("oneway:bicycle".to_owned()),
            implied_oneway: Vec::new(),
            avoid_nodes: FxHashSet::default(),
        }
    }

    pub fn foot() -> Self {
        Self {
            name: "foot".to_owned(),
            highways: speeds(&[
                ("primary", 5.0),
                ("secondary", 5.0),
                ("tertiary", 5.0),
                ("unclassified", 5.0),
                ("residential", 5.0),
                ("service", 5.0),
                ("living_street", 5.0),
                ("pedestrian", 5.0),
                ("track", 5.0),
                ("footway", 5.0),
                ("path", 5.0),
                ("steps", 2.0),
            ]),
            fallback_speed: None,
            access_keys: keys(&["foot", "access"]),
            respect_oneway: false,
            oneway_key: None,
            implied_oneway: Vec::new(),
            avoid_nodes: FxHashSet::default(),
        }
    }

    pub fn any() -> Self {
        Self {
            name: "any".to_owned(),
            highways: FxHashMap::default(),
            fallback_speed: Some(50.0),
            access_keys: Vec::new(),
            respect_oneway: true,
            oneway_key: None,
            implied_oneway: Vec::new(),
            avoid_nodes: FxHashSet::default(),
        }
    }

    pub fn avoiding(mut self, node: NodeId) -> Self {
        self.avoid_nodes.insert(node);
        self
    }

    /// Speed in km/h on `way`, `None` if the way is not usable
    pub fn speed(&self, way: &Way) -> Option<f64> {
        way.tag("highway")
            .and_then(|hw| self.highways.get(hw).copied())
            .or(self.fallback_speed)
    }

    fn oneway_tag<'w>(&self, way: &'w Way) -> Option<&'w str> {
        if !self.respect_oneway {
            return None;
        }
        if let Some(value) =
            self.oneway_key.as_deref().and_then(|key| way.tag(key))
        {
            return Some(value);
        }
        way.tag("oneway")
    }
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self::car()
    }
}

impl Vehicle for VehicleProfile {
    fn is_allowed_node(&self, _graph: &dyn RoadGraph, node: &Node) -> bool {
        !self.avoid_nodes.contains(&node.id)
    }

    fn is_allowed_way(&self, _graph: &dyn RoadGraph, way: &Way) -> bool {
        if self.speed(way).is_none() {
            return false;
        }
        self.access_keys
            .iter()
            .find_map(|key| way.tag(key))
            .map_or(true, |access| !DENIED.contains(&access))
    }

    fn is_oneway(&self, _graph: &dyn RoadGraph, way: &Way) -> bool {
        match self.oneway_tag(way) {
            Some("yes" | "1" | "true") => true,
            Some("no" | "0" | "false" | "-1" | "reverse") => false,
            _ => {
                self.respect_oneway
                    && (way.tag("junction") == Some("roundabout")
                        || way.tag("highway").is_some_and(|hw| {
                            self.implied_oneway.iter().any(|o| o == hw)
                        }))
            }
        }
    }

    fn is_reverse_oneway(&self, _graph: &dyn RoadGraph, way: &Way) -> bool {
        matches!(self.oneway_tag(way), Some("-1" | "reverse"))
    }
}
