use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants, EnumIter, VariantNames};

use crate::{
    metric::Metric,
    route::{
        AStarRouter, DepthFirstRouter, DijkstraRouter, DirectedDepthFirstRouter,
        GraphOrder, MultiDijkstraRouter, Router,
    },
};

const fn default_initial_depth() -> usize {
    2
}

const fn default_max_depth() -> usize {
    4096
}

const fn default_max_iterations() -> usize {
    1_000_000
}

/// Bounds of an iteratively deepened depth-first search
#[derive(Debug, Deserialize, Serialize, Copy, Clone, PartialEq, Eq)]
pub struct DepthLimits {
    /// Depth bound (in hops) of the first round, doubled every round
    #[serde(default = "default_initial_depth")]
    pub initial_depth: usize,
    /// Largest depth bound tried before giving up
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Hard cap on hops examined over all rounds of one call
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for DepthLimits {
    fn default() -> Self {
        Self {
            initial_depth: default_initial_depth(),
            max_depth: default_max_depth(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl std::fmt::Display for DepthLimits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "depth {}..{}, at most {} iterations",
            self.initial_depth, self.max_depth, self.max_iterations
        )
    }
}

#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    Copy,
    Clone,
    PartialEq,
    Eq,
    EnumDiscriminants,
)]
#[strum_discriminants(name(RouteMode))]
#[strum_discriminants(derive(EnumIter, VariantNames, Display))]
#[strum_discriminants(strum(serialize_all = "title_case"))]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ModeConfig {
    #[serde(alias = "dfs")]
    #[strum_discriminants(strum(serialize = "Depth-first Search"))]
    DepthFirst {
        #[serde(flatten)]
        limits: DepthLimits,
    },

    #[serde(alias = "directed_dfs", alias = "ddfs")]
    #[strum_discriminants(strum(serialize = "Directed Depth-first Search"))]
    DirectedDepthFirst {
        #[serde(flatten)]
        limits: DepthLimits,
    },

    #[strum_discriminants(strum(serialize = "Dijkstra's Algorithm"))]
    Dijkstra,

    #[serde(alias = "multi")]
    #[strum_discriminants(strum(serialize = "Multi-target reverse Dijkstra"))]
    MultiDijkstra,

    #[default]
    #[serde(alias = "astar", alias = "a-star")]
    #[strum_discriminants(strum(serialize = "Turn-restricted A*-Search"))]
    AStar,
}

impl ModeConfig {
    /// Construct the router this mode describes
    pub fn build(&self, metric: Box<dyn Metric>) -> Box<dyn Router> {
        match *self {
            Self::DepthFirst { limits } => Box::new(
                DepthFirstRouter::<GraphOrder>::new(metric).with_limits(limits),
            ),
            Self::DirectedDepthFirst { limits } => Box::new(
                DirectedDepthFirstRouter::new(metric).with_limits(limits),
            ),
            Self::Dijkstra => Box::new(DijkstraRouter::new(metric)),
            Self::MultiDijkstra => Box::new(MultiDijkstraRouter::new(metric)),
            Self::AStar => Box::new(AStarRouter::new(metric)),
        }
    }
}

impl std::fmt::Display for ModeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DepthFirst { limits } => {
                write!(f, "Depth-first search, {limits}")
            }
            Self::DirectedDepthFirst { limits } => {
                write!(f, "Directed depth-first search, {limits}")
            }
            Self::Dijkstra => {
                write!(f, "Dijkstra (closest to target first)")
            }
            Self::MultiDijkstra => {
                write!(f, "Reverse Dijkstra from every target")
            }
            Self::AStar => write!(f, "A*-Search honoring turn restrictions"),
        }
    }
}

#[cfg(test)]
mod test {
    use color_eyre::Result;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::metric::DistanceMetric;

    #[test]
    fn test_parse_modes() -> Result<()> {
        let mode: ModeConfig = toml::from_str("mode = \"dfs\"\nmax_depth = 64")?;
        assert_eq!(mode, ModeConfig::DepthFirst {
            limits: DepthLimits { max_depth: 64, ..Default::default() }
        });
        let mode: ModeConfig = toml::from_str("mode = \"a-star\"")?;
        assert_eq!(mode, ModeConfig::AStar);
        let mode: ModeConfig = serde_json::from_str(r#"{"mode": "multi"}"#)?;
        assert_eq!(mode, ModeConfig::MultiDijkstra);
        assert!(toml::from_str::<ModeConfig>("mode = \"beam\"").is_err());
        Ok(())
    }

    #[test]
    fn test_build_names() {
        for (mode, name) in [
            (ModeConfig::AStar, "A*"),
            (ModeConfig::Dijkstra, "Dijkstra"),
            (ModeConfig::MultiDijkstra, "Multi-target Dijkstra"),
            (
                ModeConfig::DepthFirst { limits: DepthLimits::default() },
                "Depth-first",
            ),
            (
                ModeConfig::DirectedDepthFirst { limits: DepthLimits::default() },
                "Directed depth-first",
            ),
        ] {
            assert_eq!(mode.build(Box::new(DistanceMetric)).name(), name);
        }
        assert_eq!(RouteMode::iter().count(), 5);
        assert_eq!(RouteMode::AStar.to_string(), "Turn-restricted A*-Search");
    }
}
