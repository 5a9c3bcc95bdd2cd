//! # Common utility types and functions
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    fmt::Display,
    ops::Deref,
};

use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{Node, WayId};

/// Mean earth radius in meters
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Roadnav error type
#[derive(Error, Debug)]
pub enum RoadnavError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed way {way}: {reason}")]
    MalformedWay { way: WayId, reason: String },

    #[error("internal consistency violation: {0}")]
    Inconsistency(String),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error("{0:#}")]
    Other(#[from] eyre::Report),
}

impl std::convert::From<String> for RoadnavError {
    fn from(s: String) -> Self {
        Self::InvalidArgument(s)
    }
}

pub type RoadnavResult<T> = Result<T, RoadnavError>;

/// f64 compare wrapper, NaN sorts last
pub fn fcmp(a: f64, b: f64) -> Ordering {
    match (a, b) {
        (x, y) if x.is_nan() && y.is_nan() => Ordering::Equal,
        (x, _) if x.is_nan() => Ordering::Greater,
        (_, y) if y.is_nan() => Ordering::Less,
        (..) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// f64 wrapper type implementing `Eq` and `Ord`
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct F64(pub f64);

impl Display for F64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for F64 {
    fn eq(&self, other: &Self) -> bool {
        fcmp(self.0, other.0) == Ordering::Equal
    }
}

impl Eq for F64 {}

impl PartialOrd for F64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for F64 {
    fn cmp(&self, other: &Self) -> Ordering {
        fcmp(self.0, other.0)
    }
}

impl Deref for F64 {
    type Target = f64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Min-heap priority queue using f64 as priority
pub struct MinFHeap<T: Ord>(BinaryHeap<(Reverse<F64>, Reverse<T>)>);

impl<T: Ord> MinFHeap<T> {
    /// Create new, empty priority queue
    pub const fn new() -> Self {
        Self(BinaryHeap::new())
    }

    /// push value `item` with priority `w` into queue
    pub fn push(&mut self, w: f64, item: T) {
        self.0.push((Reverse(F64(w)), Reverse(item)));
    }

    /// Remove and return smallest item and priority, ties go to the
    /// smallest item
    pub fn pop(&mut self) -> Option<(f64, T)> {
        self.0.pop().map(|(Reverse(F64(w)), Reverse(item))| (w, item))
    }
}

impl<T: Ord> Default for MinFHeap<T> {
    fn default() -> Self {
        Self(BinaryHeap::new())
    }
}

/// Great-circle distance in meters between two coordinates
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Straight-line distance between two nodes in meters
pub fn dist(a: &Node, b: &Node) -> f64 {
    haversine(a.lat, a.lon, b.lat, b.lon)
}
