//! Animals: one record type for both species driven by a shared state machine

pub mod behavior;
pub mod breeding;
pub mod manager;
pub mod movement;
pub mod pregnancy;
pub mod species;

use std::collections::VecDeque;

use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::types::{AnimalId, Sex, Species, TileCoord, Vec2};

pub use breeding::BreedingManager;
pub use manager::{AnimalManager, TickContext};
pub use pregnancy::Pregnancy;
pub use species::SpeciesProfile;

/// State machine discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AnimalState {
    Idle,             // Entry and rest state
    Wandering,        // Nothing to do, drifting toward a random tile
    Hungry,           // Deciding between visible food and a search
    SeekFood,         // Heading toward food beyond sight
    FoundFood,        // Food (or prey) targeted, closing in
    Eating,
    Thirsty,
    SeekWater,
    FoundWater,
    Drinking,
    ReadyToBreed,
    SearchingForMate, // Males polling the opposite pool
    MovingToMate,     // Paired, heading to the rendezvous tile
    Breeding,
    FollowingParent,  // Predator cubs trailing their mother
}

impl AnimalState {
    /// States that may carry a partner link
    pub fn is_courting(&self) -> bool {
        matches!(self, AnimalState::MovingToMate | AnimalState::Breeding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LifeStage {
    Child,
    Adult,
    Elder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeathCause {
    Starvation,
    Dehydration,
    /// Swam too far and went under
    Drowned,
    /// No walkable tile anywhere within reach
    Stranded,
    Eaten,
    OldAge,
    Disease,
}

/// A single animal.
///
/// Tiles are held as coordinates into the world grid and other animals as
/// [`AnimalId`] handles, so nothing here owns shared state.
#[derive(Debug, Clone, Serialize)]
pub struct Animal {
    pub id: AnimalId,
    pub sex: Sex,

    pub current_tile: TileCoord,
    pub next_tile: TileCoord,
    pub destination_tile: TileCoord,
    pub last_tile: TileCoord,
    /// Fraction of the edge from current to next already covered
    pub move_progress: f32,

    /// 1.0 is sated; below zero is fatal
    pub hunger: f32,
    pub thirst: f32,

    pub life_stage: LifeStage,
    pub age_seconds: f32,
    pub time_since_bred: f32,

    pub state: AnimalState,
    pub partner: Option<AnimalId>,
    pub pregnancy: Option<Pregnancy>,
    /// Prey a predator is hunting
    pub target: Option<AnimalId>,
    pub mother: Option<AnimalId>,
    pub is_being_chased: bool,

    /// Tiles swum since last standing on land
    pub swim_distance: f32,

    #[serde(skip)]
    pub(crate) path: VecDeque<TileCoord>,
    pub(crate) action_timer: f32,
    pub(crate) claimed_food: Option<TileCoord>,
    pub(crate) wander_steps: u32,
    pub(crate) dead: bool,
}

impl Animal {
    pub fn new(id: AnimalId, sex: Sex, tile: TileCoord) -> Self {
        Self {
            id,
            sex,
            current_tile: tile,
            next_tile: tile,
            destination_tile: tile,
            last_tile: tile,
            move_progress: 0.0,
            hunger: 1.0,
            thirst: 1.0,
            life_stage: LifeStage::Adult,
            age_seconds: 0.0,
            time_since_bred: 0.0,
            state: AnimalState::Idle,
            partner: None,
            pregnancy: None,
            target: None,
            mother: None,
            is_being_chased: false,
            swim_distance: 0.0,
            path: VecDeque::new(),
            action_timer: 0.0,
            claimed_food: None,
            wander_steps: 0,
            dead: false,
        }
    }

    pub fn species(&self) -> Species {
        self.id.species
    }

    pub fn profile(&self) -> &'static SpeciesProfile {
        species::profile(self.id.species)
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_pregnant(&self) -> bool {
        self.pregnancy.is_some()
    }

    /// Interpolated position between current and next tile
    pub fn position(&self) -> Vec2 {
        self.current_tile.as_vec2().lerp(&self.next_tile.as_vec2(), self.move_progress)
    }

    pub fn age_days(&self, seconds_per_day: f32) -> u32 {
        (self.age_seconds / seconds_per_day) as u32
    }

    pub fn is_hungry(&self, config: &SimulationConfig) -> bool {
        self.hunger <= config.need_threshold
    }

    pub fn is_thirsty(&self, config: &SimulationConfig) -> bool {
        self.thirst <= config.need_threshold
    }

    pub fn needs_met(&self, config: &SimulationConfig) -> bool {
        self.hunger >= config.needs_met_threshold && self.thirst >= config.needs_met_threshold
    }

    /// Adult, fed and watered, rested from the last litter, unpaired
    pub fn is_ready_to_breed(&self, config: &SimulationConfig) -> bool {
        let cooldown = self.profile().breeding_cooldown_days * config.seconds_per_day;
        self.life_stage == LifeStage::Adult
            && self.needs_met(config)
            && self.time_since_bred >= cooldown
            && self.partner.is_none()
            && !self.is_pregnant()
    }

    /// Hard-kill predicate: a need below zero while not fixing it
    pub fn should_die(&self) -> Option<DeathCause> {
        if self.hunger < 0.0 && self.state != AnimalState::Eating {
            return Some(DeathCause::Starvation);
        }
        if self.thirst < 0.0 && self.state != AnimalState::Drinking {
            return Some(DeathCause::Dehydration);
        }
        None
    }

    /// Drain hunger and thirst by the species' daily rates
    pub fn decay_needs(&mut self, dt: f32, config: &SimulationConfig) {
        let profile = self.profile();
        self.hunger = (self.hunger - dt * config.times_a_day(profile.hunger_per_day)).max(-1.0);
        self.thirst = (self.thirst - dt * config.times_a_day(profile.thirst_per_day)).max(-1.0);
    }

    /// Finish the edge in progress, then stand still
    pub fn stop_movement(&mut self) {
        self.destination_tile = self.next_tile;
        self.path.clear();
    }

    pub fn set_destination(&mut self, tile: TileCoord) {
        if self.destination_tile != tile {
            self.destination_tile = tile;
            self.path.clear();
        }
    }

    pub fn at_destination(&self) -> bool {
        self.current_tile == self.destination_tile
    }

    /// Put the animal at the start of a life stage
    pub fn set_life_stage(&mut self, stage: LifeStage, seconds_per_day: f32) {
        let profile = self.profile();
        self.life_stage = stage;
        self.age_seconds = match stage {
            LifeStage::Child => 0.0,
            LifeStage::Adult => profile.adult_day as f32 * seconds_per_day,
            LifeStage::Elder => profile.elder_day as f32 * seconds_per_day,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prey() -> Animal {
        Animal::new(AnimalId::new(Species::Prey, 0), Sex::Female, TileCoord::new(0, 0))
    }

    #[test]
    fn test_should_die_spares_eaters() {
        let mut a = prey();
        a.hunger = -0.01;
        assert_eq!(a.should_die(), Some(DeathCause::Starvation));
        a.state = AnimalState::Eating;
        assert_eq!(a.should_die(), None);
        a.thirst = -0.5;
        assert_eq!(a.should_die(), Some(DeathCause::Dehydration));
    }

    #[test]
    fn test_needs_decay_by_species_rate() {
        let config = SimulationConfig { seconds_per_day: 10.0, ..Default::default() };
        let mut a = prey();
        a.decay_needs(1.0, &config);
        assert!((a.hunger - 0.85).abs() < 1e-6);
        assert!((a.thirst - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_needs_floor_at_minus_one() {
        let config = SimulationConfig::default();
        let mut a = prey();
        a.decay_needs(1.0e6, &config);
        assert_eq!(a.hunger, -1.0);
        assert_eq!(a.thirst, -1.0);
    }

    #[test]
    fn test_breed_readiness() {
        let config = SimulationConfig::default();
        let mut a = prey();
        assert!(!a.is_ready_to_breed(&config), "cooldown not elapsed");

        a.time_since_bred = config.seconds_per_day;
        assert!(a.is_ready_to_breed(&config));

        a.hunger = 0.4;
        assert!(!a.is_ready_to_breed(&config));
        a.hunger = 1.0;
        a.pregnancy = Some(Pregnancy::new(10.0));
        assert!(!a.is_ready_to_breed(&config));
    }

    #[test]
    fn test_set_life_stage_sets_age() {
        let mut a = prey();
        a.set_life_stage(LifeStage::Elder, 60.0);
        assert_eq!(a.age_days(60.0), 40);
        a.set_life_stage(LifeStage::Child, 60.0);
        assert_eq!(a.age_days(60.0), 0);
    }

    #[test]
    fn test_stop_movement_keeps_edge() {
        let mut a = prey();
        a.next_tile = TileCoord::new(1, 0);
        a.destination_tile = TileCoord::new(5, 0);
        a.stop_movement();
        assert_eq!(a.destination_tile, TileCoord::new(1, 0));
    }
}
