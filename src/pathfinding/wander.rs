//! Cheap next-step choice for non goal-directed movement
//!
//! Wandering animals do not run A*; they take one heading-biased random step
//! at a time.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::types::{TileCoord, Vec2};
use crate::world::grid::TileGrid;

/// Inputs for a single wander step
#[derive(Debug, Clone, Copy)]
pub struct WanderQuery {
    pub current: TileCoord,
    pub last: TileCoord,
    /// Loose goal the walk drifts toward, if any
    pub toward: Option<TileCoord>,
    pub forward_chance: f32,
    pub samples: usize,
}

impl WanderQuery {
    /// Direction to bias toward: the goal if there is one, else the last step
    pub fn heading(&self) -> Vec2 {
        if let Some(goal) = self.toward.filter(|g| *g != self.current) {
            return (goal.as_vec2() - self.current.as_vec2()).normalize();
        }
        (self.current.as_vec2() - self.last.as_vec2()).normalize()
    }
}

/// Pick the next tile for a wandering animal.
///
/// Returns the current tile when no walkable neighbour exists.
pub fn wander_step<R: Rng>(grid: &TileGrid, query: &WanderQuery, rng: &mut R) -> TileCoord {
    let (dx, dy) = (query.current.x - query.last.x, query.current.y - query.last.y);
    if (dx, dy) != (0, 0) && dx.abs() <= 1 && dy.abs() <= 1 && rng.gen::<f32>() < query.forward_chance {
        let forward = query.current.offset(dx, dy);
        if grid.is_walkable(forward) {
            return forward;
        }
    }

    let neighbours = grid.walkable_neighbours_including_diagonal(query.current);
    let sampled: Vec<TileCoord> = neighbours
        .choose_multiple(rng, query.samples.min(neighbours.len()))
        .copied()
        .collect();

    best_aligned(query.current, query.heading(), &sampled).unwrap_or(query.current)
}

/// Step for a juvenile trailing its mother: best of the sampled neighbours
/// by alignment with the direction to `target`.
pub fn follow_step<R: Rng>(
    grid: &TileGrid,
    current: TileCoord,
    target: TileCoord,
    samples: usize,
    rng: &mut R,
) -> TileCoord {
    if current == target {
        return current;
    }
    let neighbours = grid.walkable_neighbours_including_diagonal(current);
    let sampled: Vec<TileCoord> = neighbours
        .choose_multiple(rng, samples.min(neighbours.len()))
        .copied()
        .collect();
    let heading = (target.as_vec2() - current.as_vec2()).normalize();
    best_aligned(current, heading, &sampled).unwrap_or(current)
}

/// Candidate whose step direction has the highest dot product with the
/// heading; first wins ties. With no heading every dot is zero, so this is
/// just the first (already shuffled) candidate.
fn best_aligned(current: TileCoord, heading: Vec2, candidates: &[TileCoord]) -> Option<TileCoord> {
    let mut best: Option<(TileCoord, f32)> = None;
    for &c in candidates {
        let dir = (c.as_vec2() - current.as_vec2()).normalize();
        let score = dir.dot(&heading);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((c, score));
        }
    }
    best.map(|(c, _)| c)
}
