//! A* pathfinding over the tile graph
//!
//! Costs come from the graph edges; the heuristic is straight-line distance,
//! which never overestimates since every passable tile costs at least 1.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use tracing::trace;

use super::graph::PathGraph;
use crate::core::types::TileCoord;
use crate::world::grid::TileGrid;

/// Node in the A* open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    index: usize,
    f_cost: OrderedFloat<f32>, // g_cost + heuristic
    seq: u64,                  // insertion order, earlier wins ties
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest weighted path from `start` to `goal`, both inclusive.
///
/// Returns an empty path if either end is off the graph or the goal cannot
/// be reached.
pub fn solve_path(graph: &PathGraph, start: TileCoord, goal: TileCoord) -> Vec<TileCoord> {
    let (Some(start_i), Some(goal_i)) = (graph.index(start), graph.index(goal)) else {
        return Vec::new();
    };
    if start_i == goal_i {
        return vec![start];
    }

    let n = graph.node_count();
    let mut g_scores = vec![f32::INFINITY; n];
    let mut came_from: Vec<Option<usize>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut open_set = BinaryHeap::new();
    let mut seq = 0u64;

    g_scores[start_i] = 0.0;
    open_set.push(PathNode {
        index: start_i,
        f_cost: OrderedFloat(start.distance(&goal)),
        seq,
    });

    while let Some(current) = open_set.pop() {
        if current.index == goal_i {
            return reconstruct_path(graph, &came_from, goal_i);
        }
        if closed[current.index] {
            continue;
        }
        closed[current.index] = true;

        let current_g = g_scores[current.index];
        for edge in graph.edges(current.index) {
            if closed[edge.to] {
                continue;
            }
            let tentative_g = current_g + edge.cost;
            if tentative_g < g_scores[edge.to] {
                came_from[edge.to] = Some(current.index);
                g_scores[edge.to] = tentative_g;

                seq += 1;
                let f_cost = tentative_g + graph.coord(edge.to).distance(&goal);
                open_set.push(PathNode {
                    index: edge.to,
                    f_cost: OrderedFloat(f_cost),
                    seq,
                });
            }
        }
    }

    trace!(?start, ?goal, "No path");
    Vec::new()
}

/// Reconstruct path from came_from links
fn reconstruct_path(graph: &PathGraph, came_from: &[Option<usize>], goal: usize) -> Vec<TileCoord> {
    let mut path = vec![graph.coord(goal)];
    let mut current = goal;
    while let Some(prev) = came_from[current] {
        path.push(graph.coord(prev));
        current = prev;
    }
    path.reverse();
    path
}

/// Sum of edge costs along a path; infinite if any step is not an edge
pub fn path_cost(graph: &PathGraph, path: &[TileCoord]) -> f32 {
    path.windows(2)
        .map(|pair| {
            let (Some(a), Some(b)) = (graph.index(pair[0]), graph.index(pair[1])) else {
                return f32::INFINITY;
            };
            graph
                .edges(a)
                .iter()
                .find(|e| e.to == b)
                .map_or(f32::INFINITY, |e| e.cost)
        })
        .sum()
}

/// Lazily built graph plus the solver.
///
/// The graph is dropped on [`invalidate`](Self::invalidate) and rebuilt in
/// full on the next request.
#[derive(Debug, Default)]
pub struct PathFinder {
    graph: Option<PathGraph>,
    rebuilds: u32,
}

impl PathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.graph = None;
    }

    pub fn is_built(&self) -> bool {
        self.graph.is_some()
    }

    /// How many times the graph has been built
    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    pub fn graph(&mut self, grid: &TileGrid) -> &PathGraph {
        if self.graph.is_none() {
            self.rebuilds += 1;
        }
        self.graph.get_or_insert_with(|| PathGraph::build(grid))
    }

    pub fn solve(&mut self, grid: &TileGrid, start: TileCoord, goal: TileCoord) -> Vec<TileCoord> {
        solve_path(self.graph(grid), start, goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::TileType;

    fn open(w: u32, h: u32) -> TileGrid {
        TileGrid::filled(w, h, TileType::Ground)
    }

    #[test]
    fn test_pathfind_straight_line() {
        let graph = PathGraph::build(&open(10, 10));
        let start = TileCoord::new(0, 0);
        let goal = TileCoord::new(5, 0);

        let path = solve_path(&graph, start, goal);

        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn test_pathfind_diagonal_is_chebyshev() {
        let graph = PathGraph::build(&open(10, 10));
        let path = solve_path(&graph, TileCoord::new(0, 0), TileCoord::new(4, 4));
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn test_start_equals_goal() {
        let graph = PathGraph::build(&open(3, 3));
        let c = TileCoord::new(1, 1);
        assert_eq!(solve_path(&graph, c, c), vec![c]);
    }

    #[test]
    fn test_pathfind_around_water() {
        let mut grid = open(10, 10);
        for y in 0..3 {
            grid.get_mut(TileCoord::new(5, y)).unwrap().set_type(TileType::Water);
        }
        let graph = PathGraph::build(&grid);
        let path = solve_path(&graph, TileCoord::new(0, 0), TileCoord::new(9, 0));

        assert!(!path.is_empty());
        assert!(path.iter().all(|c| !grid.is_water(*c)), "walking round is cheaper than swimming");
    }

    #[test]
    fn test_pathfind_no_path() {
        let mut grid = open(7, 7);
        let start = TileCoord::new(3, 3);
        for n in grid.neighbours8(start).collect::<Vec<_>>() {
            grid.get_mut(n).unwrap().set_type(TileType::Empty);
        }
        let graph = PathGraph::build(&grid);
        assert!(solve_path(&graph, start, TileCoord::new(0, 0)).is_empty());
    }

    #[test]
    fn test_off_grid_goal_is_empty() {
        let graph = PathGraph::build(&open(3, 3));
        assert!(solve_path(&graph, TileCoord::new(0, 0), TileCoord::new(5, 5)).is_empty());
    }

    #[test]
    fn test_path_cost_matches_edges() {
        let graph = PathGraph::build(&open(5, 5));
        let path = solve_path(&graph, TileCoord::new(0, 0), TileCoord::new(2, 0));
        assert_eq!(path_cost(&graph, &path), 2.0);
        assert!(path_cost(&graph, &[TileCoord::new(0, 0), TileCoord::new(3, 3)]).is_infinite());
    }

    #[test]
    fn test_path_finder_rebuilds_after_invalidate() {
        let mut grid = open(5, 1);
        let mut finder = PathFinder::new();
        assert!(!finder.solve(&grid, TileCoord::new(0, 0), TileCoord::new(4, 0)).is_empty());
        assert_eq!(finder.rebuilds(), 1);

        grid.get_mut(TileCoord::new(2, 0)).unwrap().set_type(TileType::Empty);
        // Stale graph still routes through the wall
        assert!(!finder.solve(&grid, TileCoord::new(0, 0), TileCoord::new(4, 0)).is_empty());

        finder.invalidate();
        assert!(finder.solve(&grid, TileCoord::new(0, 0), TileCoord::new(4, 0)).is_empty());
        assert_eq!(finder.rebuilds(), 2);
    }
}
