//! Tiles, terrain types and the food a tile can carry

use serde::{Deserialize, Serialize};

use crate::core::types::TileCoord;

/// Terrain type of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TileType {
    #[default]
    Empty,  // Ungenerated or above the grass line, impassable
    Ground, // Grass, the only type food grows on
    Water,  // Swimmable but costly, drowning risk
    Sand,
    Plant,
}

impl TileType {
    /// Movement cost multiplier; zero means impassable
    pub fn movement_cost(&self) -> f32 {
        match self {
            TileType::Empty => 0.0,
            TileType::Ground => 1.0,
            TileType::Plant => 1.0,
            TileType::Sand => 2.0,
            TileType::Water => 10.0,
        }
    }

    /// Can an animal stand here without swimming?
    pub fn is_walkable(&self) -> bool {
        self.movement_cost() > 0.0 && *self != TileType::Water
    }
}

/// Vegetation on a Ground tile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Food {
    nutrition: u32,
    max_nutrition: u32,
    occupied: bool,
}

impl Food {
    pub fn new(nutrition: u32) -> Self {
        Self {
            nutrition,
            max_nutrition: nutrition,
            occupied: false,
        }
    }

    pub fn nutrition(&self) -> u32 {
        self.nutrition
    }

    pub fn max_nutrition(&self) -> u32 {
        self.max_nutrition
    }

    /// Claimed by an animal on its way to eat it
    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn set_occupied(&mut self, occupied: bool) {
        self.occupied = occupied;
    }

    /// Remove one nutrition unit; returns true once exhausted
    pub fn consume(&mut self) -> bool {
        self.nutrition = self.nutrition.saturating_sub(1);
        self.nutrition == 0
    }

    pub fn is_exhausted(&self) -> bool {
        self.nutrition == 0
    }
}

/// Record of a terrain type change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeChange {
    pub previous: TileType,
    pub drowned: Option<Food>,
}

/// A single grid cell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub coord: TileCoord,
    tile_type: TileType,
    food: Option<Food>,
    /// Visit counter, only read by presentation
    pub heat: u32,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            tile_type: TileType::Empty,
            food: None,
            heat: 0,
        }
    }

    pub fn tile_type(&self) -> TileType {
        self.tile_type
    }

    pub fn movement_cost(&self) -> f32 {
        self.tile_type.movement_cost()
    }

    pub fn is_walkable(&self) -> bool {
        self.tile_type.is_walkable()
    }

    /// Change the terrain type.
    ///
    /// Returns `None` if the type did not change. Leaving Ground destroys
    /// any food on the tile; it is handed back in the change record.
    pub fn set_type(&mut self, tile_type: TileType) -> Option<TypeChange> {
        if self.tile_type == tile_type {
            return None;
        }
        let previous = std::mem::replace(&mut self.tile_type, tile_type);
        let drowned = if tile_type != TileType::Ground { self.food.take() } else { None };
        Some(TypeChange { previous, drowned })
    }

    pub fn food(&self) -> Option<&Food> {
        self.food.as_ref()
    }

    pub fn food_mut(&mut self) -> Option<&mut Food> {
        self.food.as_mut()
    }

    pub fn has_food(&self) -> bool {
        self.food.is_some()
    }

    pub fn is_food_occupied(&self) -> bool {
        self.food.as_ref().is_some_and(|f| f.is_occupied())
    }

    /// Can food sprout here right now?
    pub fn can_sprout(&self) -> bool {
        self.tile_type == TileType::Ground && self.food.is_none()
    }

    /// Place food on the tile; refused unless the tile is foodless Ground
    pub fn add_food(&mut self, food: Food) -> bool {
        if !self.can_sprout() {
            return false;
        }
        self.food = Some(food);
        true
    }

    pub fn remove_food(&mut self) -> Option<Food> {
        self.food.take()
    }
}
