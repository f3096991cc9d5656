//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other. Construction-time world parameters
//! live in [`WorldConfig`], which can be loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{EcoError, Result};
use crate::terrain::TerrainSettings;

/// Tuning constants for the simulation systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === TIME ===
    /// Length of one simulated day in simulated seconds
    ///
    /// Every per-day rate (hunger, thirst, gestation, aging) is divided by
    /// this, so shortening the day speeds up the whole lifecycle uniformly.
    pub seconds_per_day: f32,

    // === NEEDS ===
    /// Hunger or thirst at or below this makes an animal hungry/thirsty
    pub need_threshold: f32,

    /// Both needs at or above this count as "needs met" for breeding
    pub needs_met_threshold: f32,

    /// Seconds spent eating before the meal completes
    pub eating_seconds: f32,

    /// Seconds spent drinking before thirst is reset
    pub drinking_seconds: f32,

    // === FOOD ===
    /// Nutrition units on a freshly sprouted food
    pub initial_nutrition: u32,

    /// One-in-N chance for each Ground tile to sprout food at world creation
    pub initial_sprout_rate: u32,

    /// One-in-N chance per day for a foodless orthogonal neighbour of a food
    /// tile to sprout
    pub spread_rate: u32,

    // === MOVEMENT ===
    /// Tiles an animal may swim before drowning becomes possible
    pub swim_threshold: f32,

    /// Per-tick drowning chance added for every tile swum past the threshold
    pub drown_chance_per_tile: f32,

    /// Chance that a wandering animal keeps its previous heading
    pub wander_forward_chance: f32,

    /// Neighbours sampled when choosing a heading-biased wander step
    pub wander_samples: usize,

    /// Neighbours sampled when a cub picks a step toward its mother
    pub follow_samples: usize,

    /// Steps taken in the Wandering state before returning to Idle
    pub wander_step_budget: u32,

    /// Radius for the short roam a male takes when no mate is available
    pub mate_search_radius: i32,

    // === EVENTS ===
    /// Chance per day to start an event when none is active
    pub event_chance_per_day: f32,

    /// Inclusive range of event durations in days
    pub event_min_days: u32,
    pub event_max_days: u32,

    /// Lower bound of the rolled severity; the upper bound is 1.0
    pub event_min_severity: f32,

    /// Water threshold rise per unit severity during a flood
    ///
    /// At severity 0.5 the water line rises by 0.1.
    pub flood_water_shift: f32,

    /// Water threshold drop per unit severity during a drought
    pub drought_water_shift: f32,

    /// Sand threshold rise per unit severity during a drought
    pub drought_sand_shift: f32,

    /// Share of tracked food removed over a famine at severity 1.0
    pub famine_food_fraction: f32,

    /// Share of foodless grass tiles planted over a sprout event at severity 1.0
    pub sprout_grass_fraction: f32,

    /// Share of the population killed per day of disease at severity 1.0
    pub disease_fraction: f32,

    /// Migrants arriving per day at severity 1.0
    pub migration_batch: u32,

    // === NOTIFICATIONS ===
    /// Emit an AnimalChanged notification for every animal every tick
    ///
    /// Presentation layers need this; headless runs can switch it off.
    pub emit_animal_changed: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seconds_per_day: 60.0,

            need_threshold: 0.3,
            needs_met_threshold: 0.5,
            eating_seconds: 0.5,
            drinking_seconds: 0.5,

            initial_nutrition: 6,
            initial_sprout_rate: 100,
            spread_rate: 25,

            swim_threshold: 6.0,
            drown_chance_per_tile: 0.02,
            wander_forward_chance: 0.2,
            wander_samples: 3,
            follow_samples: 8,
            wander_step_budget: 8,
            mate_search_radius: 3,

            event_chance_per_day: 0.02,
            event_min_days: 3,
            event_max_days: 6,
            event_min_severity: 0.1,
            flood_water_shift: 0.2,
            drought_water_shift: 0.15,
            drought_sand_shift: 0.1,
            famine_food_fraction: 0.8,
            sprout_grass_fraction: 0.1,
            disease_fraction: 0.05,
            migration_batch: 6,

            emit_animal_changed: true,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert "n per day" into a per-second rate
    pub fn times_a_day(&self, per_day: f32) -> f32 {
        if per_day == 0.0 {
            return 0.0;
        }
        per_day / self.seconds_per_day
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.seconds_per_day <= 0.0 {
            return Err(EcoError::InvalidConfig(format!(
                "seconds_per_day must be positive, got {}",
                self.seconds_per_day
            )));
        }

        if self.need_threshold >= self.needs_met_threshold {
            return Err(EcoError::InvalidConfig(format!(
                "need_threshold ({}) should be < needs_met_threshold ({})",
                self.need_threshold, self.needs_met_threshold
            )));
        }

        if self.initial_sprout_rate == 0 || self.spread_rate == 0 {
            return Err(EcoError::InvalidConfig("sprout rates are one-in-N and must be >= 1".into()));
        }

        if self.event_min_days == 0 || self.event_min_days > self.event_max_days {
            return Err(EcoError::InvalidConfig(format!(
                "event duration range {}..={} is empty",
                self.event_min_days, self.event_max_days
            )));
        }

        if !(0.0..=1.0).contains(&self.event_min_severity) {
            return Err(EcoError::InvalidConfig("event_min_severity must lie in [0, 1]".into()));
        }

        if self.wander_samples == 0 || self.follow_samples == 0 {
            return Err(EcoError::InvalidConfig("neighbour sample counts must be >= 1".into()));
        }

        Ok(())
    }
}

/// Construction-time parameters for a world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: u32,
    pub height: u32,
    pub terrain: TerrainSettings,
    pub prey_count: u32,
    pub predator_count: u32,
    /// Gestation multiplier for prey (lower breeds faster)
    pub prey_breeding_rate: f32,
    /// Gestation multiplier for predators
    pub predator_breeding_rate: f32,
    /// Seed for the simulation RNG (separate from the terrain seed)
    pub rng_seed: u64,
    pub simulation: SimulationConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            terrain: TerrainSettings::default(),
            prey_count: 20,
            predator_count: 2,
            prey_breeding_rate: 1.0,
            predator_breeding_rate: 1.0,
            rng_seed: 207,
            simulation: SimulationConfig::default(),
        }
    }
}

impl WorldConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: WorldConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EcoError::InvalidConfig(format!(
                "world must have a positive size, got {}x{}",
                self.width, self.height
            )));
        }

        if self.prey_breeding_rate <= 0.0 || self.predator_breeding_rate <= 0.0 {
            return Err(EcoError::InvalidConfig("breeding rates must be positive".into()));
        }

        self.terrain.validate()?;
        self.simulation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_times_a_day() {
        let config = SimulationConfig { seconds_per_day: 10.0, ..Default::default() };
        assert_eq!(config.times_a_day(2.0), 0.2);
        assert_eq!(config.times_a_day(0.0), 0.0);
    }

    #[test]
    fn test_rejects_inverted_need_thresholds() {
        let config = SimulationConfig {
            need_threshold: 0.6,
            needs_met_threshold: 0.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EcoError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_empty_world() {
        let config = WorldConfig { width: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            width = 40
            height = 30
            prey_count = 5

            [terrain]
            seed = 99
            water_height = 0.25

            [simulation]
            seconds_per_day = 12.0
        "#;

        let config = WorldConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.width, 40);
        assert_eq!(config.height, 30);
        assert_eq!(config.prey_count, 5);
        assert_eq!(config.predator_count, 2);
        assert_eq!(config.terrain.seed, 99);
        assert_eq!(config.terrain.water_height, 0.25);
        assert_eq!(config.simulation.seconds_per_day, 12.0);
        assert_eq!(config.simulation.spread_rate, 25);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let result = WorldConfig::from_toml_str("width = \"wide\"");
        assert!(matches!(result, Err(EcoError::ConfigParse(_))));
    }
}
