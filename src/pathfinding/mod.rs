//! Route finding: A* over a cached navigation graph, plus wander steps

pub mod astar;
pub mod graph;
pub mod wander;

pub use astar::{path_cost, solve_path, PathFinder};
pub use graph::{PathEdge, PathGraph};
pub use wander::{follow_step, wander_step, WanderQuery};
