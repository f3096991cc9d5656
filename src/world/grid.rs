//! Fixed-size tile arena with spatial queries
//!
//! Tiles are stored row-major and addressed by index; the grid is never
//! resized after construction, so indices stay valid for the world's life.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::types::TileCoord;
use crate::world::tile::{Tile, TileType};

/// Orthogonal offsets: north, east, south, west
pub const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// All eight neighbour offsets, orthogonals first
pub const ALL_DIRECTIONS: [(i32, i32); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    pub fn new(width: u32, height: u32) -> Self {
        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                tiles.push(Tile::new(TileCoord::new(x, y)));
            }
        }
        Self { width, height, tiles }
    }

    /// Grid with every tile set to one type
    pub fn filled(width: u32, height: u32, tile_type: TileType) -> Self {
        let mut grid = Self::new(width, height);
        for tile in &mut grid.tiles {
            tile.set_type(tile_type);
        }
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    #[inline]
    pub fn in_bounds(&self, coord: TileCoord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width as i32 && coord.y < self.height as i32
    }

    #[inline]
    pub fn index(&self, coord: TileCoord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * self.width as usize + coord.x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn coord_of(&self, index: usize) -> TileCoord {
        let w = self.width as usize;
        TileCoord::new((index % w) as i32, (index / w) as i32)
    }

    #[inline]
    pub fn get(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).map(|i| &self.tiles[i])
    }

    #[inline]
    pub fn get_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index(coord).map(move |i| &mut self.tiles[i])
    }

    pub fn by_index(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn tile_type(&self, coord: TileCoord) -> Option<TileType> {
        self.get(coord).map(|t| t.tile_type())
    }

    /// Movement cost, zero for out-of-bounds coordinates
    pub fn movement_cost(&self, coord: TileCoord) -> f32 {
        self.get(coord).map_or(0.0, |t| t.movement_cost())
    }

    pub fn is_walkable(&self, coord: TileCoord) -> bool {
        self.get(coord).is_some_and(|t| t.is_walkable())
    }

    pub fn is_water(&self, coord: TileCoord) -> bool {
        self.tile_type(coord) == Some(TileType::Water)
    }

    /// In-bounds orthogonal neighbours
    pub fn neighbours4(&self, coord: TileCoord) -> impl Iterator<Item = TileCoord> + '_ {
        ORTHOGONAL
            .iter()
            .map(move |&(dx, dy)| coord.offset(dx, dy))
            .filter(move |c| self.in_bounds(*c))
    }

    /// In-bounds neighbours including diagonals
    pub fn neighbours8(&self, coord: TileCoord) -> impl Iterator<Item = TileCoord> + '_ {
        ALL_DIRECTIONS
            .iter()
            .map(move |&(dx, dy)| coord.offset(dx, dy))
            .filter(move |c| self.in_bounds(*c))
    }

    pub fn walkable_neighbours_including_diagonal(&self, coord: TileCoord) -> Vec<TileCoord> {
        self.neighbours8(coord).filter(|c| self.is_walkable(*c)).collect()
    }

    /// In-bounds tiles within a Euclidean radius, row-major order
    pub fn tiles_in_radius(&self, center: TileCoord, radius: i32) -> Vec<TileCoord> {
        let r2 = radius * radius;
        let mut out = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let c = center.offset(dx, dy);
                if self.in_bounds(c) {
                    out.push(c);
                }
            }
        }
        out
    }

    /// Closest tile within the radius matching the predicate.
    ///
    /// Ties go to the first tile in row-major order.
    pub fn nearest_in_radius<F>(&self, center: TileCoord, radius: i32, mut pred: F) -> Option<TileCoord>
    where
        F: FnMut(&Tile) -> bool,
    {
        let mut best: Option<(i32, TileCoord)> = None;
        for c in self.tiles_in_radius(center, radius) {
            let Some(tile) = self.get(c) else {
                continue;
            };
            if !pred(tile) {
                continue;
            }
            let d2 = (c.x - center.x).pow(2) + (c.y - center.y).pow(2);
            if best.map_or(true, |(bd, _)| d2 < bd) {
                best = Some((d2, c));
            }
        }
        best.map(|(_, c)| c)
    }

    pub fn random_non_water_tile_in_radius<R: Rng>(
        &self,
        center: TileCoord,
        radius: i32,
        rng: &mut R,
    ) -> Option<TileCoord> {
        let candidates: Vec<TileCoord> = self
            .tiles_in_radius(center, radius)
            .into_iter()
            .filter(|c| self.is_walkable(*c))
            .collect();
        candidates.choose(rng).copied()
    }

    /// Whole-map query used when nothing is in sight
    pub fn nearest_of(center: TileCoord, candidates: &[TileCoord]) -> Option<TileCoord> {
        candidates
            .iter()
            .copied()
            .min_by_key(|c| (c.x - center.x).pow(2) + (c.y - center.y).pow(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_index_round_trip_corners() {
        let grid = TileGrid::new(7, 5);
        let c = TileCoord::new(6, 4);
        let idx = grid.index(c).unwrap();
        assert_eq!(idx, grid.len() - 1);
        assert_eq!(grid.coord_of(idx), c);
        assert_eq!(grid.index(TileCoord::new(7, 0)), None);
        assert_eq!(grid.index(TileCoord::new(0, -1)), None);
    }

    #[test]
    fn test_corner_has_three_neighbours() {
        let grid = TileGrid::new(4, 4);
        assert_eq!(grid.neighbours8(TileCoord::new(0, 0)).count(), 3);
        assert_eq!(grid.neighbours4(TileCoord::new(0, 0)).count(), 2);
        assert_eq!(grid.neighbours8(TileCoord::new(1, 1)).count(), 8);
    }

    #[test]
    fn test_tiles_in_radius_is_circular() {
        let grid = TileGrid::new(20, 20);
        let tiles = grid.tiles_in_radius(TileCoord::new(10, 10), 2);
        // 5x5 square minus the 4 corners at distance sqrt(8)
        assert_eq!(tiles.len(), 21);
        assert!(!tiles.contains(&TileCoord::new(12, 12)));
    }

    #[test]
    fn test_nearest_in_radius_prefers_closest() {
        let mut grid = TileGrid::filled(10, 10, TileType::Ground);
        grid.get_mut(TileCoord::new(8, 5)).unwrap().set_type(TileType::Water);
        grid.get_mut(TileCoord::new(6, 5)).unwrap().set_type(TileType::Water);

        let found = grid.nearest_in_radius(TileCoord::new(5, 5), 4, |t| t.tile_type() == TileType::Water);
        assert_eq!(found, Some(TileCoord::new(6, 5)));

        let none = grid.nearest_in_radius(TileCoord::new(0, 0), 2, |t| t.tile_type() == TileType::Water);
        assert_eq!(none, None);
    }

    #[test]
    fn test_random_non_water_tile_skips_water() {
        let mut grid = TileGrid::filled(5, 5, TileType::Water);
        grid.get_mut(TileCoord::new(3, 2)).unwrap().set_type(TileType::Sand);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for _ in 0..10 {
            let t = grid.random_non_water_tile_in_radius(TileCoord::new(2, 2), 2, &mut rng);
            assert_eq!(t, Some(TileCoord::new(3, 2)));
        }

        let far = grid.random_non_water_tile_in_radius(TileCoord::new(0, 0), 1, &mut rng);
        assert_eq!(far, None);
    }

    #[test]
    fn test_nearest_of() {
        let candidates = [TileCoord::new(9, 9), TileCoord::new(2, 1), TileCoord::new(0, 5)];
        assert_eq!(TileGrid::nearest_of(TileCoord::new(0, 0), &candidates), Some(TileCoord::new(2, 1)));
        assert_eq!(TileGrid::nearest_of(TileCoord::new(0, 0), &[]), None);
    }
}
