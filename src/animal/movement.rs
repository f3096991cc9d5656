//! Tile-to-tile movement
//!
//! An animal is always on an edge from `current_tile` to `next_tile`
//! (the two are equal when standing). Edges are never abandoned halfway.

use rand::Rng;
use tracing::warn;

use super::manager::TickContext;
use super::{Animal, AnimalState, DeathCause};
use crate::core::types::TileCoord;
use crate::pathfinding::{follow_step, wander_step, WanderQuery};

/// Move the animal along its route for `dt` seconds.
///
/// Returns a death cause if the animal is stuck in water or drowned.
pub fn advance(animal: &mut Animal, ctx: &mut TickContext, dt: f32) -> Option<DeathCause> {
    if animal.at_destination() {
        animal.next_tile = animal.current_tile;
        animal.move_progress = 0.0;
        animal.path.clear();
        return None;
    }

    if animal.next_tile == animal.current_tile {
        let step = choose_step(animal, ctx);
        match step {
            Some(next) if next != animal.current_tile => animal.next_tile = next,
            _ => {
                if is_stranded(animal, ctx) {
                    return Some(DeathCause::Stranded);
                }
                // Nowhere to go; the state machine picks a new goal
                animal.destination_tile = animal.current_tile;
                animal.path.clear();
                return None;
            }
        }
    }

    let next = animal.next_tile;
    let edge = animal.current_tile.distance(&next);
    animal.move_progress += dt * animal.profile().speed / edge;

    if animal.move_progress >= 1.0 {
        animal.last_tile = animal.current_tile;
        animal.current_tile = next;
        animal.move_progress = 0.0;

        if let Some(tile) = ctx.grid.get_mut(next) {
            tile.heat += 1;
        }
        if ctx.grid.is_water(next) {
            animal.swim_distance += edge;
        } else {
            animal.swim_distance = 0.0;
        }
        if animal.state == AnimalState::Wandering {
            animal.wander_steps += 1;
        }
    }

    drown_roll(animal, ctx)
}

fn choose_step(animal: &mut Animal, ctx: &mut TickContext) -> Option<TileCoord> {
    let current = animal.current_tile;
    let goal = animal.destination_tile;

    match animal.state {
        AnimalState::Wandering => {
            let query = WanderQuery {
                current,
                last: animal.last_tile,
                toward: Some(goal),
                forward_chance: ctx.config.wander_forward_chance,
                samples: ctx.config.wander_samples,
            };
            Some(wander_step(ctx.grid, &query, ctx.rng))
        }
        AnimalState::FollowingParent => {
            Some(follow_step(ctx.grid, current, goal, ctx.config.follow_samples, ctx.rng))
        }
        _ => {
            if animal.path.is_empty() {
                let route = ctx.paths.solve(ctx.grid, current, goal);
                if route.is_empty() {
                    warn!(id = %animal.id, from = ?current, to = ?goal, "No path to destination");
                    return None;
                }
                animal.path.extend(route.into_iter().skip(1));
            }
            animal.path.pop_front()
        }
    }
}

/// In water with no walkable tile around
fn is_stranded(animal: &Animal, ctx: &TickContext) -> bool {
    let here = animal.current_tile;
    ctx.grid.is_water(here) && ctx.grid.walkable_neighbours_including_diagonal(here).is_empty()
}

fn drown_roll(animal: &Animal, ctx: &mut TickContext) -> Option<DeathCause> {
    let excess = animal.swim_distance - ctx.config.swim_threshold;
    if excess <= 0.0 {
        return None;
    }
    let chance = (excess * ctx.config.drown_chance_per_tile).min(1.0);
    if ctx.rng.gen::<f32>() < chance {
        Some(DeathCause::Drowned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animal::manager::tests::Fixture;
    use crate::core::types::{AnimalId, Sex, Species};
    use crate::world::tile::TileType;

    fn walker(at: TileCoord) -> Animal {
        Animal::new(AnimalId::new(Species::Prey, 0), Sex::Male, at)
    }

    #[test]
    fn test_reaches_destination_on_path() {
        let mut fx = Fixture::new(8, 8);
        let mut a = walker(TileCoord::new(0, 0));
        a.state = AnimalState::SeekFood;
        a.set_destination(TileCoord::new(4, 0));

        let mut ctx = fx.ctx();
        for _ in 0..100 {
            advance(&mut a, &mut ctx, 0.1);
        }
        assert_eq!(a.current_tile, TileCoord::new(4, 0));
        assert!(a.path.is_empty());
    }

    #[test]
    fn test_tile_heat_increments_on_arrival() {
        let mut fx = Fixture::new(4, 1);
        let mut a = walker(TileCoord::new(0, 0));
        a.state = AnimalState::SeekWater;
        a.set_destination(TileCoord::new(1, 0));
        {
            let mut ctx = fx.ctx();
            // Speed 2, one tile edge: 0.5s
            advance(&mut a, &mut ctx, 0.3);
            advance(&mut a, &mut ctx, 0.3);
        }
        assert_eq!(a.current_tile, TileCoord::new(1, 0));
        assert_eq!(fx.grid.get(TileCoord::new(1, 0)).unwrap().heat, 1);
    }

    #[test]
    fn test_unreachable_destination_resets() {
        let mut fx = Fixture::new(5, 1);
        fx.grid.get_mut(TileCoord::new(2, 0)).unwrap().set_type(TileType::Empty);
        let mut a = walker(TileCoord::new(0, 0));
        a.state = AnimalState::SeekFood;
        a.set_destination(TileCoord::new(4, 0));

        let cause = advance(&mut a, &mut fx.ctx(), 0.1);
        assert_eq!(cause, None);
        assert_eq!(a.destination_tile, a.current_tile);
    }

    #[test]
    fn test_stranded_in_water() {
        let mut fx = Fixture::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                fx.grid.get_mut(TileCoord::new(x, y)).unwrap().set_type(TileType::Empty);
            }
        }
        fx.grid.get_mut(TileCoord::new(1, 1)).unwrap().set_type(TileType::Water);
        let mut a = walker(TileCoord::new(1, 1));
        a.state = AnimalState::Wandering;
        a.destination_tile = TileCoord::new(2, 2);

        assert_eq!(advance(&mut a, &mut fx.ctx(), 0.1), Some(DeathCause::Stranded));
    }

    #[test]
    fn test_long_swim_drowns() {
        let mut fx = Fixture::new(3, 3);
        fx.config.drown_chance_per_tile = 1.0;
        let mut a = walker(TileCoord::new(1, 1));
        a.swim_distance = 8.0;
        a.destination_tile = TileCoord::new(2, 1);
        a.state = AnimalState::SeekWater;

        assert_eq!(advance(&mut a, &mut fx.ctx(), 0.01), Some(DeathCause::Drowned));
    }

    #[test]
    fn test_land_resets_swim_distance() {
        let mut fx = Fixture::new(3, 1);
        fx.grid.get_mut(TileCoord::new(0, 0)).unwrap().set_type(TileType::Water);
        let mut a = walker(TileCoord::new(0, 0));
        a.swim_distance = 3.0;
        a.state = AnimalState::SeekFood;
        a.set_destination(TileCoord::new(1, 0));

        let mut ctx = fx.ctx();
        advance(&mut a, &mut ctx, 1.0);
        assert_eq!(a.current_tile, TileCoord::new(1, 0));
        assert_eq!(a.swim_distance, 0.0);
    }
}
