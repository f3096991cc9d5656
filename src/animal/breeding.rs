//! Mate matching
//!
//! Four waiting pools partitioned by species and sex. Matching is
//! first-come: the searcher gets whoever has waited longest in the opposite
//! pool, with no distance or fitness ranking.

use tracing::debug;

use super::pregnancy::Pregnancy;
use super::Animal;
use crate::core::types::{AnimalId, Sex, Species};

#[derive(Debug, Clone, Default)]
pub struct BreedingManager {
    female_prey: Vec<AnimalId>,
    male_prey: Vec<AnimalId>,
    female_predators: Vec<AnimalId>,
    male_predators: Vec<AnimalId>,
}

impl BreedingManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn pool(&self, species: Species, sex: Sex) -> &Vec<AnimalId> {
        match (species, sex) {
            (Species::Prey, Sex::Female) => &self.female_prey,
            (Species::Prey, Sex::Male) => &self.male_prey,
            (Species::Predator, Sex::Female) => &self.female_predators,
            (Species::Predator, Sex::Male) => &self.male_predators,
        }
    }

    fn pool_mut(&mut self, species: Species, sex: Sex) -> &mut Vec<AnimalId> {
        match (species, sex) {
            (Species::Prey, Sex::Female) => &mut self.female_prey,
            (Species::Prey, Sex::Male) => &mut self.male_prey,
            (Species::Predator, Sex::Female) => &mut self.female_predators,
            (Species::Predator, Sex::Male) => &mut self.male_predators,
        }
    }

    /// Idempotent
    pub fn add(&mut self, id: AnimalId, sex: Sex) {
        let pool = self.pool_mut(id.species, sex);
        if !pool.contains(&id) {
            pool.push(id);
        }
    }

    /// Idempotent
    pub fn remove(&mut self, id: AnimalId, sex: Sex) {
        self.pool_mut(id.species, sex).retain(|x| *x != id);
    }

    pub fn contains(&self, id: AnimalId, sex: Sex) -> bool {
        self.pool(id.species, sex).contains(&id)
    }

    pub fn pool_len(&self, species: Species, sex: Sex) -> usize {
        self.pool(species, sex).len()
    }

    /// First waiting animal of the opposite sex; both leave their pools
    pub fn find_partner(&mut self, searcher: AnimalId, sex: Sex) -> Option<AnimalId> {
        let opposite = sex.opposite();
        let partner = self
            .pool(searcher.species, opposite)
            .iter()
            .copied()
            .find(|id| *id != searcher)?;
        self.remove(partner, opposite);
        self.remove(searcher, sex);
        Some(partner)
    }

    /// Start the female's pregnancy and reset both cooldowns.
    ///
    /// Returns the mother's id, or `None` if the pair is not one of each sex.
    pub fn breed(&mut self, a: &mut Animal, b: &mut Animal, gestation_seconds: f32) -> Option<AnimalId> {
        let (mother, father) = match (a.sex, b.sex) {
            (Sex::Female, Sex::Male) => (a, b),
            (Sex::Male, Sex::Female) => (b, a),
            _ => return None,
        };

        self.remove(mother.id, mother.sex);
        self.remove(father.id, father.sex);

        mother.pregnancy = Some(Pregnancy::new(gestation_seconds));
        mother.time_since_bred = 0.0;
        father.time_since_bred = 0.0;

        debug!(mother = %mother.id, father = %father.id, "Impregnated");
        Some(mother.id)
    }
}
