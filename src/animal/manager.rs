//! Animal population: spawning, the per-tick update loop and despawning
//!
//! Animals are updated in list order. Deaths during a tick only mark the
//! animal; the list is compacted after the loop so indices stay valid while
//! iterating. Births during a tick are queued and appended afterwards.

use ahash::AHashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use super::breeding::BreedingManager;
use super::movement;
use super::{Animal, AnimalState, DeathCause, LifeStage};
use crate::core::config::SimulationConfig;
use crate::core::types::{AnimalId, Sex, Species, TileCoord};
use crate::food::FoodManager;
use crate::pathfinding::PathFinder;
use crate::terrain::TerrainData;
use crate::world::grid::TileGrid;
use crate::world::notify::{Notification, NotificationHub};

/// Gestation multipliers per species; lower breeds faster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreedingRates {
    pub prey: f32,
    pub predator: f32,
}

impl BreedingRates {
    pub fn for_species(&self, species: Species) -> f32 {
        match species {
            Species::Prey => self.prey,
            Species::Predator => self.predator,
        }
    }
}

impl Default for BreedingRates {
    fn default() -> Self {
        Self { prey: 1.0, predator: 1.0 }
    }
}

/// Everything outside the population that an animal update may touch
pub struct TickContext<'a> {
    pub grid: &'a mut TileGrid,
    pub terrain: Option<&'a TerrainData>,
    pub food: &'a mut FoodManager,
    pub paths: &'a mut PathFinder,
    pub rng: &'a mut ChaCha8Rng,
    pub config: &'a SimulationConfig,
    pub rates: BreedingRates,
    pub hub: &'a mut NotificationHub,
}

/// Two distinct animals mutably at once
pub(crate) fn pair_mut(animals: &mut [Animal], i: usize, j: usize) -> Option<(&mut Animal, &mut Animal)> {
    if i == j || i >= animals.len() || j >= animals.len() {
        return None;
    }
    if i < j {
        let (lo, hi) = animals.split_at_mut(j);
        Some((&mut lo[i], &mut hi[0]))
    } else {
        let (lo, hi) = animals.split_at_mut(i);
        Some((&mut hi[0], &mut lo[j]))
    }
}

#[derive(Debug, Default)]
pub struct AnimalManager {
    pub(crate) animals: Vec<Animal>,
    index: AHashMap<AnimalId, usize>,
    pending: Vec<Animal>,
    next_prey_serial: u32,
    next_predator_serial: u32,
    pub(crate) breeding: BreedingManager,
    ticking: bool,
}

impl AnimalManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn breeding(&self) -> &BreedingManager {
        &self.breeding
    }

    /// Live animals in update order
    pub fn iter(&self) -> impl Iterator<Item = &Animal> {
        self.animals.iter().filter(|a| a.is_alive())
    }

    pub fn prey(&self) -> impl Iterator<Item = &Animal> {
        self.iter().filter(|a| a.species() == Species::Prey)
    }

    pub fn predators(&self) -> impl Iterator<Item = &Animal> {
        self.iter().filter(|a| a.species() == Species::Predator)
    }

    pub fn count(&self, species: Species) -> usize {
        self.iter().filter(|a| a.species() == species).count()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a handle; stale or dead handles give `None`
    pub fn get(&self, id: AnimalId) -> Option<&Animal> {
        self.index
            .get(&id)
            .map(|&i| &self.animals[i])
            .filter(|a| a.is_alive())
    }

    pub fn get_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        let i = *self.index.get(&id)?;
        let animal = &mut self.animals[i];
        if animal.is_alive() {
            Some(animal)
        } else {
            None
        }
    }

    pub(crate) fn index_of(&self, id: AnimalId) -> Option<usize> {
        self.index.get(&id).copied().filter(|&i| self.animals[i].is_alive())
    }

    fn next_id(&mut self, species: Species) -> AnimalId {
        let serial = match species {
            Species::Prey => &mut self.next_prey_serial,
            Species::Predator => &mut self.next_predator_serial,
        };
        let id = AnimalId::new(species, *serial);
        *serial += 1;
        id
    }

    /// Create an animal at the start of a life stage.
    ///
    /// Outside a tick the animal is live immediately; during a tick it joins
    /// the population once the tick ends.
    pub fn spawn(
        &mut self,
        species: Species,
        sex: Sex,
        tile: TileCoord,
        stage: LifeStage,
        seconds_per_day: f32,
        hub: &mut NotificationHub,
    ) -> AnimalId {
        let id = self.next_id(species);
        let mut animal = Animal::new(id, sex, tile);
        animal.set_life_stage(stage, seconds_per_day);
        trace!(%id, ?tile, ?stage, "Spawned");

        if self.ticking {
            self.pending.push(animal);
        } else {
            self.insert(animal, hub);
        }
        id
    }

    fn insert(&mut self, animal: Animal, hub: &mut NotificationHub) {
        hub.emit(Notification::AnimalCreated {
            id: animal.id,
            coord: animal.current_tile,
        });
        self.index.insert(animal.id, self.animals.len());
        self.animals.push(animal);
    }

    /// Initial population: adults at one tile with slightly varied needs
    pub fn spawn_animals(
        &mut self,
        prey_count: u32,
        predator_count: u32,
        tile: TileCoord,
        ctx: &mut TickContext,
    ) {
        let counts = [(Species::Prey, prey_count), (Species::Predator, predator_count)];
        for (species, count) in counts {
            for _ in 0..count {
                let sex = if ctx.rng.gen_bool(0.5) { Sex::Male } else { Sex::Female };
                let id = self.spawn(species, sex, tile, LifeStage::Adult, ctx.config.seconds_per_day, ctx.hub);
                let hunger = ctx.rng.gen_range(0.8..=1.0);
                let thirst = ctx.rng.gen_range(0.8..=1.0);
                if let Some(a) = self.get_mut(id) {
                    a.hunger = hunger;
                    a.thirst = thirst;
                }
            }
        }
        debug!(prey_count, predator_count, ?tile, "Spawned initial population");
    }

    /// Advance every live animal by `dt` seconds
    pub fn update(&mut self, dt: f32, ctx: &mut TickContext) {
        self.ticking = true;
        let count = self.animals.len();
        for i in 0..count {
            if !self.animals[i].is_alive() {
                continue;
            }
            self.tick_animal(i, dt, ctx);
        }
        self.ticking = false;

        self.compact();
        for animal in std::mem::take(&mut self.pending) {
            self.insert(animal, ctx.hub);
        }
    }

    fn tick_animal(&mut self, i: usize, dt: f32, ctx: &mut TickContext) {
        if let Some(cause) = self.animals[i].should_die() {
            self.kill_at(i, cause, ctx);
            return;
        }

        {
            let animal = &mut self.animals[i];
            animal.decay_needs(dt, ctx.config);
            animal.age_seconds += dt;
            animal.time_since_bred += dt;
        }

        if let Some(cause) = movement::advance(&mut self.animals[i], ctx, dt) {
            self.kill_at(i, cause, ctx);
            return;
        }

        let due = self.animals[i].pregnancy.as_mut().is_some_and(|p| p.advance(dt));
        if due {
            self.give_birth(i, ctx);
        }

        self.run_state(i, dt, ctx);

        let animal = &self.animals[i];
        if animal.is_alive() && ctx.config.emit_animal_changed {
            ctx.hub.emit(Notification::AnimalChanged {
                id: animal.id,
                coord: animal.current_tile,
                state: animal.state,
            });
        }
    }

    fn give_birth(&mut self, i: usize, ctx: &mut TickContext) {
        let (species, tile, mother_id) = {
            let mother = &mut self.animals[i];
            mother.pregnancy = None;
            mother.time_since_bred = 0.0;
            (mother.species(), mother.current_tile, mother.id)
        };
        let profile = super::species::profile(species);
        let litter = ctx.rng.gen_range(profile.litter_min..=profile.litter_max);

        for _ in 0..litter {
            let sex = if ctx.rng.gen_bool(0.5) { Sex::Male } else { Sex::Female };
            let id = self.spawn(species, sex, tile, LifeStage::Child, ctx.config.seconds_per_day, ctx.hub);
            if profile.young_follow_mother {
                // Spawned mid-tick, so the cub is still in the pending queue
                if let Some(cub) = self.pending.iter_mut().chain(self.animals.iter_mut()).find(|a| a.id == id) {
                    cub.mother = Some(mother_id);
                    cub.state = AnimalState::FollowingParent;
                }
            }
        }
        debug!(mother = %mother_id, litter, "Gave birth");
    }

    /// Kill by handle; false if the handle is stale
    pub fn kill(&mut self, id: AnimalId, cause: DeathCause, ctx: &mut TickContext) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        self.kill_at(i, cause, ctx);
        if !self.ticking {
            self.compact();
        }
        true
    }

    /// Mark dead and unlink from every bookkeeping structure.
    ///
    /// Fires AnimalDestroyed exactly once; the record is removed on the next
    /// compaction.
    pub(crate) fn kill_at(&mut self, i: usize, cause: DeathCause, ctx: &mut TickContext) {
        let (id, sex, tile, claimed, target, partner) = {
            let a = &mut self.animals[i];
            if a.dead {
                return;
            }
            a.dead = true;
            a.pregnancy = None;
            a.path.clear();
            (a.id, a.sex, a.current_tile, a.claimed_food.take(), a.target.take(), a.partner.take())
        };

        if let Some(coord) = claimed {
            ctx.food.release(ctx.grid, coord);
        }
        if let Some(prey) = target.and_then(|t| self.get_mut(t)) {
            prey.is_being_chased = false;
        }
        if let Some(mate) = partner.and_then(|p| self.get_mut(p)) {
            if mate.partner == Some(id) {
                mate.partner = None;
            }
        }
        self.breeding.remove(id, sex);

        ctx.hub.emit(Notification::AnimalDestroyed { id, coord: tile, cause });
        debug!(%id, ?cause, ?tile, "Died");
    }

    /// Drop dead records and reindex; no-op during a tick
    pub fn compact(&mut self) {
        if self.ticking {
            return;
        }
        self.animals.retain(|a| a.is_alive());
        self.index.clear();
        for (i, a) in self.animals.iter().enumerate() {
            self.index.insert(a.id, i);
        }
    }

    /// Daily aging: stage transitions, then the elder death roll
    pub fn age_up(&mut self, ctx: &mut TickContext) {
        let spd = ctx.config.seconds_per_day;
        for i in 0..self.animals.len() {
            if !self.animals[i].is_alive() {
                continue;
            }
            let animal = &mut self.animals[i];
            let profile = animal.profile();
            let days = animal.age_days(spd);
            let stage = animal.life_stage;

            match stage {
                LifeStage::Child if days >= profile.adult_day => {
                    animal.life_stage = LifeStage::Adult;
                    debug!(id = %animal.id, days, "Now an adult");
                }
                LifeStage::Adult if days >= profile.elder_day => {
                    animal.life_stage = LifeStage::Elder;
                    debug!(id = %animal.id, days, "Now an elder");
                }
                LifeStage::Elder => {
                    let chance = profile.old_age_death_chance(days);
                    if ctx.rng.gen::<f32>() < chance {
                        self.kill_at(i, DeathCause::OldAge, ctx);
                    }
                }
                _ => {}
            }
        }
        self.compact();
    }

    /// Nearest prey nobody is chasing, by Manhattan distance
    pub fn closest_prey(&self, from: TileCoord) -> Option<AnimalId> {
        self.prey()
            .filter(|p| !p.is_being_chased)
            .min_by_key(|p| p.current_tile.manhattan(&from))
            .map(|p| p.id)
    }

    /// As [`closest_prey`](Self::closest_prey) but only inside a square of
    /// half-width `radius`
    pub fn closest_prey_in_radius(&self, from: TileCoord, radius: i32) -> Option<AnimalId> {
        self.prey()
            .filter(|p| !p.is_being_chased && p.current_tile.chebyshev(&from) <= radius)
            .min_by_key(|p| p.current_tile.manhattan(&from))
            .map(|p| p.id)
    }

    /// Up to `n` distinct live animals chosen at random
    pub fn random_ids<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<AnimalId> {
        let ids: Vec<AnimalId> = self.iter().map(|a| a.id).collect();
        ids.choose_multiple(rng, n.min(ids.len())).copied().collect()
    }

    /// Forget cached routes, used after terrain changes
    pub fn clear_paths(&mut self) {
        for animal in &mut self.animals {
            animal.path.clear();
        }
    }
}
