//! Cost metrics turning a step into a scalar cost
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    graph::{NodeId, RoadGraph},
    route::RoutingStep,
    vehicle::VehicleProfile,
};

/// Cost metric consumed by the routers, costs are never negative
pub trait Metric: Send + Sync {
    fn name(&self) -> String;

    fn cost(&self, graph: &dyn RoadGraph, step: &RoutingStep) -> f64;

    /// Lowest possible cost of covering `meters` of straight-line distance,
    /// used as search heuristic
    fn lower_bound(&self, meters: f64) -> f64 {
        meters
    }

    /// Turn dependent cost of continuing from `prev` onto `next` at `via`
    fn turn_cost(
        &self,
        _graph: &dyn RoadGraph,
        _via: NodeId,
        _prev: &RoutingStep,
        _next: &RoutingStep,
    ) -> f64 {
        0.0
    }
}

impl std::fmt::Debug for dyn Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Metric({})", self.name())
    }
}

/// Length of a step in meters
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceMetric;

impl Metric for DistanceMetric {
    fn name(&self) -> String {
        "distance".to_owned()
    }

    fn cost(&self, graph: &dyn RoadGraph, step: &RoutingStep) -> f64 {
        step.length(graph)
    }
}

/// Travel time of a step in seconds, with a fixed penalty for changing ways
#[derive(Debug, Clone)]
pub struct TravelTimeMetric {
    speeds: FxHashMap<String, f64>,
    fallback_speed: f64,
    turn_penalty: f64,
}

impl TravelTimeMetric {
    pub fn new(
        speeds: FxHashMap<String, f64>,
        fallback_speed: f64,
        turn_penalty: f64,
    ) -> Self {
        Self { speeds, fallback_speed, turn_penalty }
    }

    pub fn for_vehicle(vehicle: &VehicleProfile, turn_penalty: f64) -> Self {
        let fallback = vehicle
            .fallback_speed
            .or_else(|| {
                vehicle.highways.values().copied().reduce(f64::min)
            })
            .unwrap_or(5.0);
        Self::new(vehicle.highways.clone(), fallback, turn_penalty)
    }

    /// Speed in m/s on the way of `step`
    fn speed(&self, graph: &dyn RoadGraph, step: &RoutingStep) -> f64 {
        let kmh = graph
            .way_by_id(step.way())
            .and_then(|way| way.tag("highway"))
            .and_then(|hw| self.speeds.get(hw).copied())
            .unwrap_or(self.fallback_speed);
        kmh.max(1.0) / 3.6
    }
}

impl Metric for TravelTimeMetric {
    fn name(&self) -> String {
        "travel_time".to_owned()
    }

    fn cost(&self, graph: &dyn RoadGraph, step: &RoutingStep) -> f64 {
        step.length(graph) / self.speed(graph, step)
    }

    fn lower_bound(&self, meters: f64) -> f64 {
        let top = self
            .speeds
            .values()
            .copied()
            .fold(self.fallback_speed, f64::max);
        meters / (top.max(1.0) / 3.6)
    }

    fn turn_cost(
        &self,
        _graph: &dyn RoadGraph,
        _via: NodeId,
        prev: &RoutingStep,
        next: &RoutingStep,
    ) -> f64 {
        if prev.way() == next.way() {
            0.0
        } else {
            self.turn_penalty
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "metric", deny_unknown_fields)]
pub enum MetricConfig {
    #[default]
    Distance,
    #[serde(alias = "time")]
    TravelTime {
        /// Seconds added whenever the route changes ways
        #[serde(default)]
        turn_penalty: f64,
    },
}

impl MetricConfig {
    pub fn build(&self, vehicle: &VehicleProfile) -> Box<dyn Metric> {
        match self {
            Self::Distance => Box::new(DistanceMetric),
            Self::TravelTime { turn_penalty } => {
                Box::new(TravelTimeMetric::for_vehicle(vehicle, *turn_penalty))
            }
        }
    }
}
