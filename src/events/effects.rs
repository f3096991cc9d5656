//! Start, per-day and end hooks for each event kind
//!
//! Flood and drought move the terrain thresholds once at start and put them
//! back once at end. The other kinds act a little every day, scaled by
//! severity and spread over the event's duration.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use super::{ActiveEvent, EventKind};
use crate::animal::{DeathCause, LifeStage};
use crate::core::types::{Sex, Species, TileCoord};
use crate::terrain::Thresholds;
use crate::world::World;

pub(crate) fn start(event: &mut ActiveEvent, world: &mut World) {
    let cfg = world.config().simulation.clone();
    match event.kind {
        EventKind::Flood => {
            let rise = cfg.flood_water_shift * event.severity;
            shift_thresholds(event, world, rise, rise);
        }
        EventKind::Drought => {
            let fall = cfg.drought_water_shift * event.severity;
            let dunes = cfg.drought_sand_shift * event.severity;
            shift_thresholds(event, world, -fall, dunes);
        }
        EventKind::Migration => {
            let species = if world.rng_mut().gen_bool(0.5) {
                Species::Prey
            } else {
                Species::Predator
            };
            event.migrants = Some(species);
        }
        EventKind::Famine | EventKind::Sprout | EventKind::Disease => {}
    }
}

pub(crate) fn per_day(event: &ActiveEvent, world: &mut World) {
    match event.kind {
        EventKind::Famine => famine_day(event, world),
        EventKind::Sprout => sprout_day(event, world),
        EventKind::Disease => disease_day(event, world),
        EventKind::Migration => migration_day(event, world),
        EventKind::Flood | EventKind::Drought => {}
    }
}

/// Flood and drought restore the thresholds the terrain was generated with
pub(crate) fn end(event: &ActiveEvent, world: &mut World) {
    if !event.shifted_terrain {
        return;
    }
    let Some(initial) = world.terrain().map(|t| t.initial_thresholds()) else {
        return;
    };
    if let Err(e) = world.set_thresholds(initial) {
        warn!(kind = event.kind.label(), error = %e, "Could not restore terrain");
    }
}

fn shift_thresholds(event: &mut ActiveEvent, world: &mut World, water: f32, sand: f32) {
    let Some(live) = world.terrain().map(|t| t.thresholds()) else {
        warn!(kind = event.kind.label(), "No terrain to shift");
        return;
    };

    let shifted = Thresholds {
        water: live.water + water,
        sand: live.sand + sand,
        grass: live.grass,
    };
    match world.set_thresholds(shifted) {
        Ok(()) => event.shifted_terrain = true,
        Err(e) => warn!(kind = event.kind.label(), error = %e, "Could not shift terrain"),
    }
}

/// Share of `total` to act on today, at least one when anything qualifies
fn daily_count(total: usize, fraction: f32, event: &ActiveEvent, per_duration: bool) -> usize {
    if total == 0 {
        return 0;
    }
    let mut share = total as f32 * fraction * event.severity;
    if per_duration {
        share /= event.duration_days.max(1) as f32;
    }
    (share.ceil() as usize).clamp(1, total)
}

fn famine_day(event: &ActiveEvent, world: &mut World) {
    let fraction = world.config().simulation.famine_food_fraction;
    let tiles = world.food_tiles().to_vec();
    let n = daily_count(tiles.len(), fraction, event, true);

    let doomed: Vec<TileCoord> = tiles.choose_multiple(world.rng_mut(), n).copied().collect();
    let removed = doomed.into_iter().filter(|c| world.remove_food(*c)).count();
    debug!(removed, "Famine withered food");
}

fn sprout_day(event: &ActiveEvent, world: &mut World) {
    let fraction = world.config().simulation.sprout_grass_fraction;
    let bare: Vec<TileCoord> = world
        .grass_tiles()
        .iter()
        .copied()
        .filter(|c| world.grid().get(*c).is_some_and(|t| t.can_sprout()))
        .collect();
    let n = daily_count(bare.len(), fraction, event, true);

    let chosen: Vec<TileCoord> = bare.choose_multiple(world.rng_mut(), n).copied().collect();
    let sprouted = chosen.into_iter().filter(|c| world.sprout_food(*c)).count();
    debug!(sprouted, "Sprout event planted food");
}

fn disease_day(event: &ActiveEvent, world: &mut World) {
    let fraction = world.config().simulation.disease_fraction;
    let n = daily_count(world.animals().len(), fraction, event, false);

    let mut killed = 0;
    for id in world.random_animal_ids(n) {
        if world.kill(id, DeathCause::Disease).is_ok() {
            killed += 1;
        }
    }
    debug!(killed, "Disease took its toll");
}

fn migration_day(event: &ActiveEvent, world: &mut World) {
    let Some(species) = event.migrants else {
        return;
    };
    let Some(tile) = world.terrain().and_then(|t| t.safe_tile()) else {
        warn!("Migration with no safe tile");
        return;
    };
    let batch = world.config().simulation.migration_batch;
    let n = (batch as f32 * event.severity).ceil() as u32;

    for _ in 0..n {
        let rng = world.rng_mut();
        let sex = if rng.gen_bool(0.5) { Sex::Male } else { Sex::Female };
        let stage = if rng.gen_bool(0.5) { LifeStage::Adult } else { LifeStage::Elder };
        world.spawn(species, sex, stage, tile);
    }
    debug!(species = species.label(), arrived = n, ?tile, "Migrants arrived");
}
