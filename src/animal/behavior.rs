//! Per-state handlers for the animal state machine
//!
//! Each handler runs once per tick for the state the animal is in and may
//! switch it to another state. Transitions take effect on the next tick;
//! no handler runs two states in a row.

use tracing::{debug, warn};

use super::manager::{pair_mut, AnimalManager, TickContext};
use super::{AnimalState, DeathCause, LifeStage};
use crate::core::types::{Sex, Species, TileCoord};
use crate::world::grid::TileGrid;
use crate::world::tile::TileType;

impl AnimalManager {
    pub(crate) fn run_state(&mut self, i: usize, dt: f32, ctx: &mut TickContext) {
        let species = self.animals[i].species();
        match (self.animals[i].state, species) {
            (AnimalState::Idle, _) => self.idle(i, ctx),
            (AnimalState::Wandering, _) => self.wandering(i, ctx),
            (AnimalState::Hungry, Species::Prey) => self.prey_hungry(i, ctx),
            (AnimalState::Hungry, Species::Predator) => self.predator_hungry(i, ctx),
            (AnimalState::SeekFood, _) => self.seek_food(i, ctx),
            (AnimalState::FoundFood, Species::Prey) => self.prey_found_food(i, ctx),
            (AnimalState::FoundFood, Species::Predator) => self.predator_found_food(i),
            (AnimalState::Eating, Species::Prey) => self.prey_eating(i, dt, ctx),
            (AnimalState::Eating, Species::Predator) => self.predator_eating(i, dt, ctx),
            (AnimalState::Thirsty, _) => self.thirsty(i, ctx),
            (AnimalState::SeekWater, _) => self.seek_water(i, ctx),
            (AnimalState::FoundWater, _) => self.found_water(i, ctx),
            (AnimalState::Drinking, _) => self.drinking(i, dt, ctx),
            (AnimalState::ReadyToBreed, _) => self.ready_to_breed(i, ctx),
            (AnimalState::SearchingForMate, _) => self.searching_for_mate(i, ctx),
            (AnimalState::MovingToMate, _) => self.moving_to_mate(i, ctx),
            (AnimalState::Breeding, _) => self.breeding_state(i, ctx),
            (AnimalState::FollowingParent, _) => self.following_parent(i, ctx),
        }
    }

    /// Send the animal to `target`, or to a random dry tile within `radius`
    /// when there is none. Dies stranded if no dry tile is in reach.
    fn head_for(
        &mut self,
        i: usize,
        target: Option<TileCoord>,
        radius: i32,
        state: AnimalState,
        ctx: &mut TickContext,
    ) {
        let here = self.animals[i].current_tile;
        let dest = target.or_else(|| ctx.grid.random_non_water_tile_in_radius(here, radius, ctx.rng));
        match dest {
            Some(dest) => {
                let animal = &mut self.animals[i];
                animal.set_destination(dest);
                animal.wander_steps = 0;
                animal.state = state;
            }
            None => self.kill_at(i, DeathCause::Stranded, ctx),
        }
    }

    fn idle(&mut self, i: usize, ctx: &mut TickContext) {
        let cfg = ctx.config;
        let animal = &mut self.animals[i];
        animal.stop_movement();
        let ready = animal.is_ready_to_breed(cfg);
        let (id, sex, sight) = (animal.id, animal.sex, animal.profile().sight_radius);

        if !ready {
            self.breeding.remove(id, sex);
        }

        let animal = &mut self.animals[i];
        if animal.is_thirsty(cfg) {
            animal.state = AnimalState::Thirsty;
        } else if animal.is_hungry(cfg) {
            animal.state = AnimalState::Hungry;
        } else if ready {
            animal.state = AnimalState::ReadyToBreed;
        } else {
            self.head_for(i, None, sight, AnimalState::Wandering, ctx);
        }
    }

    fn wandering(&mut self, i: usize, ctx: &mut TickContext) {
        let cfg = ctx.config;
        let animal = &mut self.animals[i];
        let next = if animal.is_thirsty(cfg) {
            AnimalState::Thirsty
        } else if animal.is_hungry(cfg) {
            AnimalState::Hungry
        } else if animal.at_destination() || animal.wander_steps >= cfg.wander_step_budget {
            AnimalState::Idle
        } else {
            return;
        };
        animal.stop_movement();
        animal.state = next;
    }

    fn prey_hungry(&mut self, i: usize, ctx: &mut TickContext) {
        let animal = &mut self.animals[i];
        animal.stop_movement();
        if let Some(old) = animal.claimed_food.take() {
            ctx.food.release(ctx.grid, old);
        }
        let here = animal.current_tile;
        let sight = animal.profile().sight_radius;

        let visible = ctx
            .grid
            .nearest_in_radius(here, sight, |t| t.has_food() && !t.is_food_occupied());
        if let Some(tile) = visible {
            ctx.food.claim(ctx.grid, tile);
            animal.claimed_food = Some(tile);
            animal.set_destination(tile);
            animal.state = AnimalState::FoundFood;
            return;
        }

        let grid = &*ctx.grid;
        let free: Vec<TileCoord> = ctx
            .food
            .food_tiles()
            .iter()
            .copied()
            .filter(|c| grid.get(*c).is_some_and(|t| !t.is_food_occupied()))
            .collect();
        let target = TileGrid::nearest_of(here, &free);
        self.head_for(i, target, sight, AnimalState::SeekFood, ctx);
    }

    fn predator_hungry(&mut self, i: usize, ctx: &mut TickContext) {
        let animal = &mut self.animals[i];
        animal.stop_movement();
        let stale = animal.target.take();
        let here = animal.current_tile;
        let sight = animal.profile().sight_radius;

        if let Some(prey) = stale.and_then(|t| self.get_mut(t)) {
            prey.is_being_chased = false;
        }

        let Some(prey_id) = self.closest_prey(here) else {
            self.head_for(i, None, sight, AnimalState::SeekFood, ctx);
            return;
        };
        let Some(prey_tile) = self.get_mut(prey_id).map(|p| {
            p.is_being_chased = true;
            p.current_tile
        }) else {
            return;
        };

        let animal = &mut self.animals[i];
        animal.target = Some(prey_id);
        animal.set_destination(prey_tile);
        animal.state = AnimalState::FoundFood;
        debug!(predator = %animal.id, prey = %prey_id, "Hunting");
    }

    fn seek_food(&mut self, i: usize, ctx: &mut TickContext) {
        let animal = &self.animals[i];
        let here = animal.current_tile;
        let sight = animal.profile().sight_radius;

        let spotted = animal.at_destination()
            || match animal.species() {
                Species::Prey => ctx
                    .grid
                    .nearest_in_radius(here, sight, |t| t.has_food() && !t.is_food_occupied())
                    .is_some(),
                Species::Predator => self.closest_prey_in_radius(here, sight).is_some(),
            };

        if spotted {
            let animal = &mut self.animals[i];
            animal.stop_movement();
            animal.state = AnimalState::Hungry;
        }
    }

    fn prey_found_food(&mut self, i: usize, ctx: &mut TickContext) {
        let animal = &mut self.animals[i];
        let still_there = animal
            .claimed_food
            .is_some_and(|c| ctx.grid.get(c).is_some_and(|t| t.has_food()));

        if !still_there {
            animal.claimed_food = None;
            animal.stop_movement();
            animal.state = AnimalState::Hungry;
        } else if animal.at_destination() {
            animal.action_timer = 0.0;
            animal.state = AnimalState::Eating;
        }
    }

    fn predator_found_food(&mut self, i: usize) {
        let target = self.animals[i].target;
        let prey_tile = target.and_then(|t| self.get(t)).map(|p| p.current_tile);

        let animal = &mut self.animals[i];
        let Some(prey_tile) = prey_tile else {
            animal.target = None;
            animal.stop_movement();
            animal.state = AnimalState::Hungry;
            return;
        };

        if animal.current_tile.chebyshev(&prey_tile) <= 1 {
            animal.stop_movement();
            animal.action_timer = 0.0;
            animal.state = AnimalState::Eating;
        } else {
            animal.set_destination(prey_tile);
        }
    }

    fn prey_eating(&mut self, i: usize, dt: f32, ctx: &mut TickContext) {
        let animal = &mut self.animals[i];
        animal.action_timer += dt;
        if animal.action_timer < ctx.config.eating_seconds {
            return;
        }

        if let Some(claimed) = animal.claimed_food.take() {
            ctx.food.release(ctx.grid, claimed);
        }
        let ate = ctx.food.consume(ctx.grid, animal.current_tile, ctx.hub);
        if ate {
            animal.hunger = 1.0;
            animal.state = AnimalState::Idle;
        } else {
            animal.state = AnimalState::Hungry;
        }
    }

    fn predator_eating(&mut self, i: usize, dt: f32, ctx: &mut TickContext) {
        let (timer, target) = {
            let animal = &mut self.animals[i];
            animal.action_timer += dt;
            (animal.action_timer, animal.target)
        };

        let Some(prey) = target.and_then(|t| self.index_of(t)) else {
            let animal = &mut self.animals[i];
            animal.target = None;
            animal.state = AnimalState::Hungry;
            return;
        };
        if timer < ctx.config.eating_seconds {
            return;
        }

        self.kill_at(prey, DeathCause::Eaten, ctx);
        let animal = &mut self.animals[i];
        animal.target = None;
        animal.hunger = 1.0;
        animal.state = AnimalState::Idle;
    }

    fn thirsty(&mut self, i: usize, ctx: &mut TickContext) {
        let animal = &mut self.animals[i];
        animal.stop_movement();
        let here = animal.current_tile;
        let sight = animal.profile().sight_radius;

        let visible = ctx
            .grid
            .nearest_in_radius(here, sight, |t| t.tile_type() == TileType::Water);
        if let Some(water) = visible {
            animal.set_destination(water);
            animal.state = AnimalState::FoundWater;
            return;
        }

        let target = ctx.terrain.and_then(|t| {
            TileGrid::nearest_of(here, t.coast_tiles()).or_else(|| TileGrid::nearest_of(here, t.water_tiles()))
        });
        self.head_for(i, target, sight, AnimalState::SeekWater, ctx);
    }

    fn seek_water(&mut self, i: usize, ctx: &mut TickContext) {
        let animal = &mut self.animals[i];
        let here = animal.current_tile;
        let sight = animal.profile().sight_radius;

        let spotted = animal.at_destination()
            || ctx
                .grid
                .nearest_in_radius(here, sight, |t| t.tile_type() == TileType::Water)
                .is_some();
        if spotted {
            animal.stop_movement();
            animal.state = AnimalState::Thirsty;
        }
    }

    fn found_water(&mut self, i: usize, ctx: &mut TickContext) {
        let animal = &mut self.animals[i];
        if !ctx.grid.is_water(animal.destination_tile) {
            // Dried up on the way
            animal.stop_movement();
            animal.state = AnimalState::Thirsty;
        } else if animal.at_destination() {
            animal.action_timer = 0.0;
            animal.state = AnimalState::Drinking;
        }
    }

    fn drinking(&mut self, i: usize, dt: f32, ctx: &mut TickContext) {
        let animal = &mut self.animals[i];
        animal.action_timer += dt;
        if animal.action_timer >= ctx.config.drinking_seconds {
            animal.thirst = 1.0;
            animal.state = AnimalState::Idle;
        }
    }

    fn ready_to_breed(&mut self, i: usize, ctx: &mut TickContext) {
        let cfg = ctx.config;
        let animal = &mut self.animals[i];
        let (id, sex) = (animal.id, animal.sex);

        if !animal.is_ready_to_breed(cfg) || animal.is_hungry(cfg) || animal.is_thirsty(cfg) {
            self.breeding.remove(id, sex);
            animal.stop_movement();
            animal.state = AnimalState::Idle;
            return;
        }

        self.breeding.add(id, sex);
        match sex {
            Sex::Male => animal.state = AnimalState::SearchingForMate,
            Sex::Female => {
                // Waiting in water risks drowning
                let here = animal.current_tile;
                if ctx.grid.is_water(here) && animal.at_destination() {
                    let sight = animal.profile().sight_radius;
                    if let Some(dry) = ctx.grid.random_non_water_tile_in_radius(here, sight, ctx.rng) {
                        animal.set_destination(dry);
                    }
                }
            }
        }
    }

    fn searching_for_mate(&mut self, i: usize, ctx: &mut TickContext) {
        let cfg = ctx.config;
        let animal = &mut self.animals[i];
        let (id, sex, here) = (animal.id, animal.sex, animal.current_tile);

        if animal.is_hungry(cfg) || animal.is_thirsty(cfg) {
            self.breeding.remove(id, sex);
            animal.stop_movement();
            animal.state = AnimalState::Idle;
            return;
        }

        let Some(partner_id) = self.breeding.find_partner(id, sex) else {
            // Roam a little; Idle puts us back in the pool
            let animal = &mut self.animals[i];
            match ctx.grid.random_non_water_tile_in_radius(here, cfg.mate_search_radius, ctx.rng) {
                Some(dest) => {
                    animal.set_destination(dest);
                    animal.wander_steps = 0;
                    animal.state = AnimalState::Wandering;
                }
                None => {
                    animal.stop_movement();
                    animal.state = AnimalState::Idle;
                }
            }
            return;
        };

        let Some(j) = self.index_of(partner_id) else {
            return;
        };
        if self.animals[j].partner.is_some() {
            return;
        }

        let rendezvous = self.rendezvous(i, j, ctx);
        let Some((male, female)) = pair_mut(&mut self.animals, i, j) else {
            return;
        };
        male.partner = Some(female.id);
        female.partner = Some(male.id);
        for mate in [male, female] {
            mate.stop_movement();
            mate.set_destination(rendezvous);
            mate.state = AnimalState::MovingToMate;
        }
        debug!(a = %id, b = %partner_id, ?rendezvous, "Paired");
    }

    /// Midpoint of the pair, moved onto dry land if it falls in water
    fn rendezvous(&self, i: usize, j: usize, ctx: &TickContext) -> TileCoord {
        let a = self.animals[i].current_tile;
        let b = self.animals[j].current_tile;
        let mid = a.midpoint(&b);
        if ctx.grid.is_walkable(mid) {
            return mid;
        }

        ctx.terrain
            .and_then(|t| TileGrid::nearest_of(mid, t.grass_tiles()))
            .or_else(|| {
                let radius = self.animals[i].profile().sight_radius;
                ctx.grid.nearest_in_radius(mid, radius, |t| t.is_walkable())
            })
            .unwrap_or(b)
    }

    /// Whether the partner link of animal `i` is still mutual and live
    fn partner_index(&self, i: usize) -> Option<usize> {
        let animal = &self.animals[i];
        let j = self.index_of(animal.partner?)?;
        let partner = &self.animals[j];
        (partner.partner == Some(animal.id) && partner.state.is_courting()).then_some(j)
    }

    /// Drop a courtship from either side and send both back to Idle
    fn abort_courtship(&mut self, i: usize) {
        let animal = &mut self.animals[i];
        let id = animal.id;
        let partner = animal.partner.take();
        animal.stop_movement();
        animal.state = AnimalState::Idle;

        if let Some(mate) = partner.and_then(|p| self.get_mut(p)) {
            if mate.partner == Some(id) {
                mate.partner = None;
                if mate.state.is_courting() {
                    mate.stop_movement();
                    mate.state = AnimalState::Idle;
                }
            }
        }
        debug!(%id, "Courtship abandoned");
    }

    fn moving_to_mate(&mut self, i: usize, ctx: &mut TickContext) {
        let cfg = ctx.config;
        let Some(j) = self.partner_index(i) else {
            self.abort_courtship(i);
            return;
        };
        let animal = &self.animals[i];
        if animal.is_hungry(cfg) || animal.is_thirsty(cfg) {
            self.abort_courtship(i);
            return;
        }

        let partner = &self.animals[j];
        let meet = animal.destination_tile;
        if animal.current_tile == meet && partner.current_tile == meet {
            self.animals[i].state = AnimalState::Breeding;
            self.animals[j].state = AnimalState::Breeding;
        } else if animal.at_destination() && partner.at_destination() {
            // One of them could not reach the meeting tile
            self.abort_courtship(i);
        }
    }

    fn breeding_state(&mut self, i: usize, ctx: &mut TickContext) {
        let Some(j) = self.partner_index(i) else {
            self.abort_courtship(i);
            return;
        };

        let species = self.animals[i].species();
        let gestation = self.animals[i].profile().gestation_days
            * ctx.config.seconds_per_day
            * ctx.rates.for_species(species);

        let Some((a, b)) = pair_mut(&mut self.animals, i, j) else {
            return;
        };
        if self.breeding.breed(a, b, gestation).is_none() {
            warn!(a = %a.id, b = %b.id, "Pair cannot breed");
        }
        for mate in [a, b] {
            mate.partner = None;
            mate.stop_movement();
            mate.state = AnimalState::Idle;
        }
    }

    fn following_parent(&mut self, i: usize, ctx: &mut TickContext) {
        let animal = &self.animals[i];
        if animal.life_stage != LifeStage::Child {
            let animal = &mut self.animals[i];
            animal.mother = None;
            animal.state = AnimalState::Idle;
            return;
        }

        let Some(m) = animal.mother.and_then(|id| self.index_of(id)) else {
            let animal = &mut self.animals[i];
            debug!(id = %animal.id, "Orphaned");
            animal.mother = None;
            animal.state = AnimalState::Idle;
            return;
        };
        let (mother_state, mother_dest) = (self.animals[m].state, self.animals[m].destination_tile);

        let animal = &mut self.animals[i];
        match mother_state {
            AnimalState::Eating => animal.hunger = 1.0,
            AnimalState::Drinking => animal.thirst = 1.0,
            _ => {}
        }
        if animal.destination_tile.chebyshev(&mother_dest) > 1 {
            let dest = ctx
                .grid
                .random_non_water_tile_in_radius(mother_dest, 1, ctx.rng)
                .unwrap_or(mother_dest);
            animal.set_destination(dest);
        }
    }
}
