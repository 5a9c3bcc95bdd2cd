mod astar;
mod dfs;
mod dijkstra;
mod multi_dijkstra;

pub use astar::AStarRouter;
pub use dfs::{DepthFirstRouter, DirectedDepthFirstRouter};
pub use dijkstra::DijkstraRouter;
pub use multi_dijkstra::MultiDijkstraRouter;
