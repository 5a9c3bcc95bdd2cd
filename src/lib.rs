#![allow(clippy::cognitive_complexity, clippy::cast_precision_loss)]
#![deny(clippy::unwrap_in_result, clippy::unwrap_used, clippy::expect_used)]
#![warn(
    rust_2018_idioms,
    rust_2021_compatibility,
    arithmetic_overflow,
    nonstandard_style,
    clippy::disallowed_types,
    clippy::nursery,
    // clippy::pedantic
)]
//! Path finding over road networks whose graph is derived on demand from
//! nodes, ways and turn restriction relations.
//!
//! ```no_run
//! use roadnav::{
//!     graph::{MemoryGraph, NodeId},
//!     metric::DistanceMetric,
//!     route::{AStarRouter, Router},
//!     vehicle::VehicleProfile,
//! };
//!
//! # fn main() -> roadnav::common::RoadnavResult<()> {
//! let graph = MemoryGraph::load("network.json")?;
//! let router = AStarRouter::new(Box::new(DistanceMetric));
//! let route = router.route_to_node(&graph, NodeId(42), NodeId(1), &VehicleProfile::car())?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod event;
pub mod graph;
pub mod metric;
pub mod route;
pub mod vehicle;

pub use common::{RoadnavError, RoadnavResult};
pub use route::{ModeConfig, Route, Router, Target};
