//! Tile Ecology - predator/prey ecosystem simulation on a tile grid
//!
//! Prey graze on vegetation, predators hunt prey, and both drink, breed, age
//! and die while floods, droughts and other events reshape the world. The
//! [`World`] is the entry point.

pub mod animal;
pub mod core;
pub mod events;
pub mod food;
pub mod pathfinding;
pub mod stats;
pub mod terrain;
pub mod world;

pub use crate::core::config::{SimulationConfig, WorldConfig};
pub use crate::core::error::{EcoError, Result};
pub use crate::core::types::{AnimalId, Sex, Species, TileCoord};
pub use crate::stats::WorldStats;
pub use crate::world::World;
