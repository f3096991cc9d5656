//! Procedural terrain: fractal heightmap plus threshold classification

pub mod generator;
pub mod noise_map;

pub use generator::{classify, GenerationMode, TerrainData, TerrainSettings, Thresholds, TileChange};
pub use noise_map::HeightMap;
