//! Vegetation lifecycle: initial seeding, daily spread, consumption
//!
//! The manager tracks which tiles carry food; the food itself lives on the
//! tile. Tracked tiles are kept in insertion order so daily spread rolls are
//! reproducible for a given seed.

use ahash::AHashSet;
use rand::Rng;
use tracing::{debug, trace};

use crate::core::types::TileCoord;
use crate::world::grid::TileGrid;
use crate::world::notify::{Notification, NotificationHub};
use crate::world::tile::Food;

#[derive(Debug, Clone)]
pub struct FoodManager {
    tracked: Vec<TileCoord>,
    tracked_set: AHashSet<TileCoord>,
    initial_nutrition: u32,
}

impl FoodManager {
    pub fn new(initial_nutrition: u32) -> Self {
        Self {
            tracked: Vec::new(),
            tracked_set: AHashSet::new(),
            initial_nutrition,
        }
    }

    pub fn food_tiles(&self) -> &[TileCoord] {
        &self.tracked
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        self.tracked_set.contains(&coord)
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn initial_nutrition(&self) -> u32 {
        self.initial_nutrition
    }

    /// Roll a one-in-`rate` chance on every foodless Ground tile.
    ///
    /// Called once after terrain generation. Returns how many sprouted.
    pub fn sprout_initial_food<R: Rng>(
        &mut self,
        grid: &mut TileGrid,
        rate: u32,
        rng: &mut R,
        hub: &mut NotificationHub,
    ) -> usize {
        let mut sprouted = 0;
        for index in 0..grid.len() {
            let coord = grid.coord_of(index);
            if !grid.by_index(index).can_sprout() {
                continue;
            }
            if rng.gen_range(0..rate.max(1)) == 0 && self.sprout(grid, coord, hub) {
                sprouted += 1;
            }
        }
        debug!(sprouted, "Initial food sprouted");
        sprouted
    }

    /// Daily spread: each food tile rolls a one-in-`rate` chance on each of
    /// its foodless Ground orthogonal neighbours.
    ///
    /// New food is placed immediately but only joins the sweep order after
    /// the sweep, so fresh sprouts cannot spread again the same day.
    pub fn on_new_day<R: Rng>(
        &mut self,
        grid: &mut TileGrid,
        rate: u32,
        rng: &mut R,
        hub: &mut NotificationHub,
    ) -> usize {
        let mut fresh = Vec::new();

        for &source in &self.tracked {
            let neighbours: Vec<TileCoord> = grid.neighbours4(source).collect();
            for coord in neighbours {
                let Some(tile) = grid.get_mut(coord) else {
                    continue;
                };
                if !tile.can_sprout() {
                    continue;
                }
                if rng.gen_range(0..rate.max(1)) != 0 {
                    continue;
                }
                let food = Food::new(self.initial_nutrition);
                if tile.add_food(food) {
                    hub.emit(Notification::FoodSprouted {
                        coord,
                        nutrition: self.initial_nutrition,
                    });
                    fresh.push(coord);
                }
            }
        }

        let spread = fresh.len();
        for coord in fresh {
            self.track(coord);
        }
        debug!(spread, total = self.tracked.len(), "Food spread");
        spread
    }

    /// Sum of remaining nutrition over every tracked tile
    pub fn total_nutrition(&self, grid: &TileGrid) -> u64 {
        self.tracked
            .iter()
            .filter_map(|c| grid.get(*c).and_then(|t| t.food()))
            .map(|f| f.nutrition() as u64)
            .sum()
    }

    /// Place fresh food on a foodless Ground tile
    pub fn sprout(&mut self, grid: &mut TileGrid, coord: TileCoord, hub: &mut NotificationHub) -> bool {
        let Some(tile) = grid.get_mut(coord) else {
            return false;
        };
        if !tile.add_food(Food::new(self.initial_nutrition)) {
            return false;
        }
        self.track(coord);
        hub.emit(Notification::FoodSprouted {
            coord,
            nutrition: self.initial_nutrition,
        });
        true
    }

    /// Eat one unit of nutrition.
    ///
    /// Returns false if the tile had no food. On exhaustion the food is
    /// removed from the tile and from tracking.
    pub fn consume(&mut self, grid: &mut TileGrid, coord: TileCoord, hub: &mut NotificationHub) -> bool {
        let Some(tile) = grid.get_mut(coord) else {
            return false;
        };
        let Some(food) = tile.food_mut() else {
            return false;
        };

        let exhausted = food.consume();
        let nutrition = food.nutrition();
        hub.emit(Notification::FoodChanged { coord, nutrition });

        if exhausted {
            tile.remove_food();
            self.untrack(coord);
            hub.emit(Notification::FoodExhausted { coord });
            trace!(?coord, "Food exhausted");
        }
        true
    }

    /// Destroy food outright (famine, despawn); the same notification as
    /// running out
    pub fn remove(&mut self, grid: &mut TileGrid, coord: TileCoord, hub: &mut NotificationHub) -> bool {
        let removed = grid.get_mut(coord).and_then(|t| t.remove_food()).is_some();
        if removed {
            self.untrack(coord);
            hub.emit(Notification::FoodExhausted { coord });
        }
        removed
    }

    /// Forget food already taken off its tile by a terrain change
    pub fn drown(&mut self, coord: TileCoord, hub: &mut NotificationHub) {
        if self.untrack(coord) {
            hub.emit(Notification::FoodExhausted { coord });
        }
    }

    /// Mark food as targeted; fails if absent or already claimed
    pub fn claim(&self, grid: &mut TileGrid, coord: TileCoord) -> bool {
        match grid.get_mut(coord).and_then(|t| t.food_mut()) {
            Some(food) if !food.is_occupied() => {
                food.set_occupied(true);
                true
            }
            _ => false,
        }
    }

    pub fn release(&self, grid: &mut TileGrid, coord: TileCoord) {
        if let Some(food) = grid.get_mut(coord).and_then(|t| t.food_mut()) {
            food.set_occupied(false);
        }
    }

    fn track(&mut self, coord: TileCoord) {
        if self.tracked_set.insert(coord) {
            self.tracked.push(coord);
        }
    }

    fn untrack(&mut self, coord: TileCoord) -> bool {
        if !self.tracked_set.remove(&coord) {
            return false;
        }
        if let Some(pos) = self.tracked.iter().position(|c| *c == coord) {
            self.tracked.remove(pos);
        }
        true
    }
}
