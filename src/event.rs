use std::fmt::Display;

use human_repr::HumanCount;
use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// Progress of a running search, pushed to listeners and never stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Straight-line distance covered towards the target in meters
    pub covered: f64,
    /// Straight-line distance between the first explored node and the
    /// target in meters
    pub total: f64,
    pub node: NodeId,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total <= 0.0 {
            return 100.0;
        }
        (self.covered * 100.0 / self.total).clamp(0.0, 100.0)
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { covered, total, node } = self;
        let prc = self.percent();
        let covered = covered.human_count("m");
        let total = total.human_count("m");
        write!(f, "[{prc:.02}%] {covered:.02} / {total:.02} | at {node}")
    }
}

/// Progress sink, invoked synchronously on the searching thread
pub type ProgressListener = Box<dyn Fn(&Progress) + Send + Sync>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_percent() {
        let p = Progress { covered: 250.0, total: 1000.0, node: NodeId(1) };
        assert_eq!(p.percent(), 25.0);
        let p = Progress { covered: 0.0, total: 0.0, node: NodeId(1) };
        assert_eq!(p.percent(), 100.0);
        assert!(format!("{p}").contains("n1"));
    }
}
