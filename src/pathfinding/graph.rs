//! Navigation graph derived from the tile grid

use tracing::debug;

use crate::core::types::TileCoord;
use crate::world::grid::{TileGrid, ALL_DIRECTIONS};

/// Directed edge into a neighbouring tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathEdge {
    pub to: usize,
    /// Destination movement cost times step length (1 or sqrt 2)
    pub cost: f32,
}

/// One node per tile, indexed like the grid.
///
/// Built from a snapshot of movement costs. Any terrain change makes it
/// stale and it must be rebuilt from scratch.
#[derive(Debug, Clone)]
pub struct PathGraph {
    width: u32,
    height: u32,
    edges: Vec<Vec<PathEdge>>,
}

impl PathGraph {
    pub fn build(grid: &TileGrid) -> Self {
        let mut edges = Vec::with_capacity(grid.len());
        let mut edge_count = 0;

        for index in 0..grid.len() {
            let from = grid.coord_of(index);
            let mut out = Vec::with_capacity(8);

            for &(dx, dy) in ALL_DIRECTIONS.iter() {
                let to = from.offset(dx, dy);
                let Some(to_index) = grid.index(to) else {
                    continue;
                };
                let cost = grid.by_index(to_index).movement_cost();
                if cost <= 0.0 {
                    continue;
                }

                let diagonal = dx != 0 && dy != 0;
                if diagonal && clips_corner(grid, from, dx, dy) {
                    continue;
                }

                let step = if diagonal { std::f32::consts::SQRT_2 } else { 1.0 };
                out.push(PathEdge { to: to_index, cost: cost * step });
            }

            edge_count += out.len();
            edges.push(out);
        }

        debug!(nodes = edges.len(), edges = edge_count, "Built path graph");

        Self {
            width: grid.width(),
            height: grid.height(),
            edges,
        }
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self, index: usize) -> &[PathEdge] {
        &self.edges[index]
    }

    pub fn index(&self, coord: TileCoord) -> Option<usize> {
        if coord.x < 0 || coord.y < 0 || coord.x >= self.width as i32 || coord.y >= self.height as i32 {
            return None;
        }
        Some(coord.y as usize * self.width as usize + coord.x as usize)
    }

    pub fn coord(&self, index: usize) -> TileCoord {
        let w = self.width as usize;
        TileCoord::new((index % w) as i32, (index / w) as i32)
    }

    /// Is there a direct edge from `a` to `b`?
    pub fn is_adjacent(&self, a: TileCoord, b: TileCoord) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(ai), Some(bi)) => self.edges[ai].iter().any(|e| e.to == bi),
            _ => false,
        }
    }
}

/// A diagonal step is blocked if either orthogonal tile it passes between
/// is impassable
fn clips_corner(grid: &TileGrid, from: TileCoord, dx: i32, dy: i32) -> bool {
    grid.movement_cost(from.offset(dx, 0)) <= 0.0 || grid.movement_cost(from.offset(0, dy)) <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::TileType;

    #[test]
    fn test_open_grid_edge_counts() {
        let grid = TileGrid::filled(3, 3, TileType::Ground);
        let graph = PathGraph::build(&grid);
        let centre = graph.index(TileCoord::new(1, 1)).unwrap();
        let corner = graph.index(TileCoord::new(0, 0)).unwrap();
        assert_eq!(graph.edges(centre).len(), 8);
        assert_eq!(graph.edges(corner).len(), 3);
    }

    #[test]
    fn test_no_edges_into_impassable() {
        let mut grid = TileGrid::filled(3, 3, TileType::Ground);
        grid.get_mut(TileCoord::new(1, 1)).unwrap().set_type(TileType::Empty);
        let graph = PathGraph::build(&grid);
        assert!(!graph.is_adjacent(TileCoord::new(0, 1), TileCoord::new(1, 1)));
    }

    #[test]
    fn test_diagonal_corner_clipping_rejected() {
        let mut grid = TileGrid::filled(2, 2, TileType::Ground);
        grid.get_mut(TileCoord::new(1, 0)).unwrap().set_type(TileType::Empty);
        let graph = PathGraph::build(&grid);
        assert!(!graph.is_adjacent(TileCoord::new(0, 0), TileCoord::new(1, 1)));
        assert!(graph.is_adjacent(TileCoord::new(0, 0), TileCoord::new(0, 1)));
    }

    #[test]
    fn test_edge_cost_uses_destination() {
        let mut grid = TileGrid::filled(2, 1, TileType::Ground);
        grid.get_mut(TileCoord::new(1, 0)).unwrap().set_type(TileType::Water);
        let graph = PathGraph::build(&grid);
        let from = graph.index(TileCoord::new(0, 0)).unwrap();
        assert_eq!(graph.edges(from)[0].cost, TileType::Water.movement_cost());
    }
}
