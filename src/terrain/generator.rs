//! Terrain classification
//!
//! Turns a normalized heightmap into tile types using three ascending
//! thresholds. The heightmap is kept so thresholds can be shifted at runtime
//! (floods, droughts, manual water-level changes) and reapplied without
//! resampling noise.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::noise_map::{generate_height_map, HeightMap};
use crate::core::error::{EcoError, Result};
use crate::core::types::TileCoord;
use crate::world::grid::TileGrid;
use crate::world::tile::{Food, TileType};

/// Radial bias applied to the raw noise before normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GenerationMode {
    #[default]
    Default,
    /// Raise the edges so water pools in the middle
    Lake,
    /// Sink the edges so a landmass rises from the sea
    Island,
}

/// Parameters for noise sampling and classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub seed: u32,
    /// Noise zoom; larger values give broader features
    pub scale: f32,
    pub octaves: u32,
    /// Amplitude multiplier per octave
    pub persistence: f32,
    /// Frequency multiplier per octave
    pub lacunarity: f32,
    pub offset: (f32, f32),
    pub water_height: f32,
    pub sand_height: f32,
    pub grass_height: f32,
    pub mode: GenerationMode,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            seed: 207,
            scale: 44.0,
            octaves: 5,
            persistence: 0.229,
            lacunarity: 3.0,
            offset: (0.0, 0.0),
            water_height: 0.32,
            sand_height: 0.37,
            grass_height: 1.0,
            mode: GenerationMode::Default,
        }
    }
}

impl TerrainSettings {
    /// Settings from the short parameter set: a water line and an aridity
    /// in [0, 1] that widens the sand band above it.
    pub fn from_water_and_aridity(seed: u32, water_level: f32, aridity: f32, mode: GenerationMode) -> Self {
        let water_height = water_level.clamp(0.0, 1.0);
        let sand_height = (water_height + 0.05 + aridity.clamp(0.0, 1.0) * 0.3).min(1.0);
        Self {
            seed,
            water_height,
            sand_height,
            grass_height: 1.0,
            mode,
            ..Self::default()
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            water: self.water_height,
            sand: self.sand_height,
            grass: self.grass_height,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.octaves == 0 {
            return Err(EcoError::InvalidConfig("terrain needs at least one octave".into()));
        }
        let t = self.thresholds();
        if !t.is_ordered() {
            return Err(EcoError::InvalidConfig(format!(
                "terrain thresholds must satisfy 0 <= water <= sand <= grass <= 1, got {} / {} / {}",
                t.water, t.sand, t.grass
            )));
        }
        Ok(())
    }
}

/// Upper height bound of each band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub water: f32,
    pub sand: f32,
    pub grass: f32,
}

impl Thresholds {
    pub fn is_ordered(&self) -> bool {
        0.0 <= self.water && self.water <= self.sand && self.sand <= self.grass && self.grass <= 1.0
    }

    /// Clamp into [0, 1] and push upper bands up so the order holds
    pub fn normalized(self) -> Self {
        let water = self.water.clamp(0.0, 1.0);
        let sand = self.sand.clamp(0.0, 1.0).max(water);
        let grass = self.grass.clamp(0.0, 1.0).max(sand);
        Self { water, sand, grass }
    }
}

/// Band a normalized height falls in; anything above grass is Empty
pub fn classify(height: f32, thresholds: &Thresholds) -> TileType {
    if height <= thresholds.water {
        TileType::Water
    } else if height <= thresholds.sand {
        TileType::Sand
    } else if height <= thresholds.grass {
        TileType::Ground
    } else {
        TileType::Empty
    }
}

/// A tile whose type changed while applying terrain
#[derive(Debug, Clone, PartialEq)]
pub struct TileChange {
    pub coord: TileCoord,
    pub from: TileType,
    pub to: TileType,
    /// Food destroyed because the tile stopped being Ground
    pub drowned: Option<Food>,
}

/// Generated terrain: settings, heightmap, live thresholds and tile lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainData {
    settings: TerrainSettings,
    height_map: HeightMap,
    thresholds: Thresholds,
    initial_thresholds: Thresholds,
    water_tiles: Vec<TileCoord>,
    sand_tiles: Vec<TileCoord>,
    grass_tiles: Vec<TileCoord>,
    coast_tiles: Vec<TileCoord>,
    safe_tile: Option<TileCoord>,
}

impl TerrainData {
    /// Sample a new heightmap. Tile lists stay empty until [`apply`](Self::apply).
    pub fn generate(width: u32, height: u32, settings: TerrainSettings) -> Self {
        let height_map = generate_height_map(width, height, &settings);
        info!(
            seed = settings.seed,
            mode = ?settings.mode,
            width,
            height,
            "Generated heightmap"
        );
        Self::from_height_map(settings, height_map)
    }

    pub fn from_height_map(settings: TerrainSettings, height_map: HeightMap) -> Self {
        let thresholds = settings.thresholds().normalized();
        Self {
            settings,
            height_map,
            thresholds,
            initial_thresholds: thresholds,
            water_tiles: Vec::new(),
            sand_tiles: Vec::new(),
            grass_tiles: Vec::new(),
            coast_tiles: Vec::new(),
            safe_tile: None,
        }
    }

    /// Classify every tile with the current thresholds.
    ///
    /// Rebuilds the tile lists and the safe tile and returns the tiles whose
    /// type changed, in row-major order.
    pub fn apply(&mut self, grid: &mut TileGrid) -> Result<Vec<TileChange>> {
        if grid.width() != self.height_map.width() || grid.height() != self.height_map.height() {
            return Err(EcoError::InvalidConfig(format!(
                "heightmap is {}x{} but the grid is {}x{}",
                self.height_map.width(),
                self.height_map.height(),
                grid.width(),
                grid.height()
            )));
        }

        self.water_tiles.clear();
        self.sand_tiles.clear();
        self.grass_tiles.clear();
        self.coast_tiles.clear();

        let mut changes = Vec::new();
        for index in 0..grid.len() {
            let coord = grid.coord_of(index);
            let h = self.height_map.get(coord.x as u32, coord.y as u32);
            let to = classify(h, &self.thresholds);

            if let Some(change) = grid.get_mut(coord).and_then(|t| t.set_type(to)) {
                changes.push(TileChange {
                    coord,
                    from: change.previous,
                    to,
                    drowned: change.drowned,
                });
            }

            match to {
                TileType::Water => self.water_tiles.push(coord),
                TileType::Sand => self.sand_tiles.push(coord),
                TileType::Ground => self.grass_tiles.push(coord),
                _ => {}
            }
        }

        self.coast_tiles = self
            .sand_tiles
            .iter()
            .copied()
            .filter(|c| grid.neighbours4(*c).any(|n| grid.is_water(n)))
            .collect();

        self.safe_tile = self
            .height_map
            .highest_index(|i| grid.by_index(i).is_walkable())
            .map(|i| grid.coord_of(i));

        debug!(
            changed = changes.len(),
            water = self.water_tiles.len(),
            sand = self.sand_tiles.len(),
            grass = self.grass_tiles.len(),
            coast = self.coast_tiles.len(),
            "Applied terrain thresholds"
        );

        Ok(changes)
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    pub fn height_map(&self) -> &HeightMap {
        &self.height_map
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Thresholds as generated, before any runtime shift
    pub fn initial_thresholds(&self) -> Thresholds {
        self.initial_thresholds
    }

    /// Replace the live thresholds; takes effect on the next [`apply`](Self::apply)
    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        self.thresholds = thresholds.normalized();
    }

    pub fn water_tiles(&self) -> &[TileCoord] {
        &self.water_tiles
    }

    pub fn sand_tiles(&self) -> &[TileCoord] {
        &self.sand_tiles
    }

    pub fn grass_tiles(&self) -> &[TileCoord] {
        &self.grass_tiles
    }

    /// Sand tiles with at least one orthogonal water neighbour
    pub fn coast_tiles(&self) -> &[TileCoord] {
        &self.coast_tiles
    }

    /// Highest walkable tile, used for spawning and migrations
    pub fn safe_tile(&self) -> Option<TileCoord> {
        self.safe_tile
    }

    fn percent(&self, count: usize) -> f32 {
        let total = self.height_map.values().len();
        if total == 0 {
            return 0.0;
        }
        count as f32 / total as f32 * 100.0
    }

    pub fn water_percent(&self) -> f32 {
        self.percent(self.water_tiles.len())
    }

    pub fn sand_percent(&self) -> f32 {
        self.percent(self.sand_tiles.len())
    }

    pub fn grass_percent(&self) -> f32 {
        self.percent(self.grass_tiles.len())
    }
}
