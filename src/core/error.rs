use thiserror::Error;

use crate::core::types::AnimalId;

#[derive(Error, Debug)]
pub enum EcoError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Tile out of bounds: ({x}, {y})")]
    TileOutOfBounds { x: i32, y: i32 },

    #[error("Animal not found: {0}")]
    AnimalNotFound(AnimalId),

    #[error("Terrain has not been generated yet")]
    TerrainNotGenerated,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EcoError>;
