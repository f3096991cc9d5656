//! Per-species parameter table
//!
//! Prey and predators share one state machine; everything that differs
//! between them is data in a [`SpeciesProfile`].

use crate::core::types::Species;

/// Fixed parameters for one species
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesProfile {
    /// Tiles per simulated second
    pub speed: f32,
    /// Radius in tiles for food, water and prey scans
    pub sight_radius: i32,
    /// Hunger lost per simulated day
    pub hunger_per_day: f32,
    /// Thirst lost per simulated day
    pub thirst_per_day: f32,
    /// Days of gestation before the breeding-rate multiplier
    pub gestation_days: f32,
    pub litter_min: u32,
    pub litter_max: u32,
    /// Age in days at which a child becomes an adult
    pub adult_day: u32,
    /// Age in days at which an adult becomes an elder
    pub elder_day: u32,
    /// Elders die each day with probability (age - offset)%
    pub old_age_offset: u32,
    /// Days after breeding before the animal is ready again
    pub breeding_cooldown_days: f32,
    /// Do newborns trail their mother?
    pub young_follow_mother: bool,
}

pub const PREY: SpeciesProfile = SpeciesProfile {
    speed: 2.0,
    sight_radius: 5,
    hunger_per_day: 1.5,
    thirst_per_day: 2.0,
    gestation_days: 3.0,
    litter_min: 1,
    litter_max: 8,
    adult_day: 10,
    elder_day: 40,
    old_age_offset: 35,
    breeding_cooldown_days: 1.0,
    young_follow_mother: false,
};

pub const PREDATOR: SpeciesProfile = SpeciesProfile {
    speed: 3.0,
    sight_radius: 5,
    hunger_per_day: 0.5,
    thirst_per_day: 1.5,
    gestation_days: 5.0,
    litter_min: 2,
    litter_max: 4,
    adult_day: 5,
    elder_day: 20,
    old_age_offset: 15,
    breeding_cooldown_days: 2.0,
    young_follow_mother: true,
};

pub fn profile(species: Species) -> &'static SpeciesProfile {
    match species {
        Species::Prey => &PREY,
        Species::Predator => &PREDATOR,
    }
}

impl SpeciesProfile {
    /// Daily old-age death chance in [0, 1] for an elder of this age
    pub fn old_age_death_chance(&self, age_days: u32) -> f32 {
        (age_days.saturating_sub(self.old_age_offset) as f32 / 100.0).min(1.0)
    }
}
