//! End-to-end ecosystem scenarios through the public World API

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use tile_ecology::animal::{AnimalState, DeathCause, LifeStage};
use tile_ecology::events::EventKind;
use tile_ecology::terrain::{GenerationMode, Thresholds};
use tile_ecology::world::{Notification, TileType};
use tile_ecology::{AnimalId, Sex, Species, World, WorldConfig};

fn generated(size: u32) -> World {
    let mut world = World::new(size, size).unwrap();
    world.generate_terrain(207, 0.32, 0.0, GenerationMode::Default).unwrap();
    world
}

#[test]
fn test_initial_spawn() {
    let mut world = generated(100);
    world.spawn_animals(20, 2).unwrap();

    assert_eq!(world.prey().count(), 20);
    assert_eq!(world.predators().count(), 2);

    let terrain = world.terrain().unwrap();
    let safe = terrain.safe_tile().unwrap();
    let heights = terrain.height_map();
    let peak = heights.get(safe.x as u32, safe.y as u32);
    for tile in world.grid().tiles().filter(|t| t.is_walkable()) {
        assert!(heights.get(tile.coord.x as u32, tile.coord.y as u32) <= peak);
    }

    for a in world.prey().chain(world.predators()) {
        assert_eq!(a.current_tile, safe);
        assert_eq!(a.life_stage, LifeStage::Adult);
        assert!((0.8..=1.0).contains(&a.hunger));
        assert!((0.8..=1.0).contains(&a.thirst));
    }
}

#[test]
fn test_starvation_death_fires_once() {
    let mut world = generated(20);
    let safe = world.terrain().unwrap().safe_tile().unwrap();
    let id = world.spawn(Species::Prey, Sex::Female, LifeStage::Adult, safe);

    let destroyed = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&destroyed);
    world.subscribe(move |n| {
        if let Notification::AnimalDestroyed { id, cause, .. } = n {
            sink.borrow_mut().push((*id, *cause));
        }
    });

    {
        let a = world.animal_mut(id).unwrap();
        a.hunger = -0.01;
        a.state = AnimalState::Idle;
        assert!(a.should_die().is_some());
    }

    world.update(0.01);
    assert!(world.animal(id).is_err());
    world.update(0.01);
    assert_eq!(*destroyed.borrow(), vec![(id, DeathCause::Starvation)]);
}

#[test]
fn test_food_depletion() {
    let mut config = WorldConfig {
        width: 20,
        height: 20,
        ..WorldConfig::default()
    };
    config.simulation.initial_nutrition = 1;
    let mut world = World::from_config(config).unwrap();
    world.generate_terrain(207, 0.32, 0.0, GenerationMode::Default).unwrap();

    let spot = world.grass_tiles()[0];
    assert!(world.sprout_food(spot));
    world.drain_notifications();

    assert!(world.consume_food(spot));
    let events = world.drain_notifications();
    assert!(events.contains(&Notification::FoodChanged { coord: spot, nutrition: 0 }));
    assert!(events.contains(&Notification::FoodExhausted { coord: spot }));

    let tile = world.tile_at(spot.x, spot.y).unwrap();
    assert!(tile.food().is_none());
    assert!(!tile.is_food_occupied());
    assert!(!world.food_tiles().contains(&spot));
    assert!(!world.food().contains(spot));
}

#[test]
fn test_flood_shifts_and_restores_exactly() {
    let mut world = generated(40);
    let initial = world.terrain().unwrap().initial_thresholds();
    let water_at_generation = world.water_tiles().len();

    // A manual change beforehand must not become the restore point
    world.change_water_level(0.05).unwrap();
    let live = world.terrain().unwrap().thresholds();

    world.force_event(EventKind::Flood, 0.5, 4);
    let flooded = world.terrain().unwrap().thresholds();
    assert_eq!(flooded.water, live.water + 0.1);
    assert!(world.water_tiles().len() >= water_at_generation);

    let spd = world.config().simulation.seconds_per_day;
    for _ in 0..3 {
        world.step(spd);
        assert!(world.events().is_active());
    }
    world.step(spd);
    assert!(!world.events().is_active());

    let restored = world.terrain().unwrap().thresholds();
    assert_eq!(restored.water.to_bits(), initial.water.to_bits());
    assert_eq!(restored.sand.to_bits(), initial.sand.to_bits());
    assert_eq!(restored, initial);
    assert_eq!(world.water_tiles().len(), water_at_generation);
}

#[test]
fn test_flood_ended_early_restores_initial_water() {
    let mut world = generated(30);
    let initial = world.terrain().unwrap().initial_thresholds();

    world.change_water_level(0.05).unwrap();
    world.force_event(EventKind::Flood, 0.5, 1);
    world.end_event();

    let restored = world.terrain().unwrap().thresholds();
    assert_eq!(restored.water.to_bits(), initial.water.to_bits());
}

#[test]
fn test_raising_water_only_creates_water() {
    let mut world = generated(50);
    let before: Vec<TileType> = world.grid().tiles().map(|t| t.tile_type()).collect();

    let t = world.terrain().unwrap().thresholds();
    world
        .set_thresholds(Thresholds { water: t.water + 0.03, ..t })
        .unwrap();

    for (tile, old) in world.grid().tiles().zip(before) {
        if tile.tile_type() != old {
            assert_eq!(tile.tile_type(), TileType::Water);
        }
        if old == TileType::Water {
            assert_eq!(tile.tile_type(), TileType::Water);
        }
    }
}

#[test]
fn test_daily_hooks_without_step_advance_events() {
    let mut world = generated(30);
    world.force_event(EventKind::Famine, 0.5, 3);
    assert_eq!(world.events().active().map(|e| e.remaining_days), Some(3));

    // Driver ticks with update and fires the day hook itself
    let mut remaining = Vec::new();
    for _ in 0..3 {
        world.update(0.1);
        world.events_on_new_day();
        remaining.push(world.events().active().map(|e| e.remaining_days));
    }

    assert_eq!(remaining, vec![Some(2), Some(1), None]);
    assert_eq!(world.day(), 0);
}

#[test]
fn test_world_invariants_over_a_run() {
    let mut world = generated(40);
    world.sprout_initial_food();
    world.spawn_animals(20, 2).unwrap();
    let initial_nutrition = world.config().simulation.initial_nutrition;

    let dt = 0.1;
    let timed_limit = (0.5f32 / dt).ceil() as u32 + 2;
    let mut last_needs: AHashMap<AnimalId, (f32, f32)> = AHashMap::new();
    let mut timed_streak: AHashMap<AnimalId, (AnimalState, u32)> = AHashMap::new();

    for _ in 0..3000 {
        world.step(dt);

        for tile in world.grid().tiles() {
            match tile.food() {
                Some(food) => assert!(food.nutrition() >= 1 && food.nutrition() <= initial_nutrition),
                None => assert!(!tile.is_food_occupied()),
            }
        }
        for c in world.food_tiles() {
            assert_eq!(world.grid().tile_type(*c), Some(TileType::Ground));
        }

        for a in world.prey().chain(world.predators()) {
            if let Some(&(hunger, thirst)) = last_needs.get(&a.id) {
                assert!(a.hunger <= hunger || a.hunger == 1.0, "{} hunger rose", a.id);
                assert!(a.thirst <= thirst || a.thirst == 1.0, "{} thirst rose", a.id);
            }
            last_needs.insert(a.id, (a.hunger, a.thirst));

            if a.is_pregnant() {
                assert_eq!(a.sex, Sex::Female);
            }

            let timed = matches!(a.state, AnimalState::Eating | AnimalState::Drinking | AnimalState::Breeding);
            if timed {
                let entry = timed_streak.entry(a.id).or_insert((a.state, 0));
                if entry.0 != a.state {
                    *entry = (a.state, 0);
                }
                entry.1 += 1;
                assert!(entry.1 <= timed_limit, "{} stuck in {:?}", a.id, a.state);
            } else {
                timed_streak.remove(&a.id);
            }
        }
    }
}

#[test]
fn test_lone_predator_starves() {
    let mut world = generated(20);
    let safe = world.terrain().unwrap().safe_tile().unwrap();
    let id = world.spawn(Species::Predator, Sex::Male, LifeStage::Adult, safe);

    // Water is reachable but there is never anything to hunt
    let ticks_per_day = (world.config().simulation.seconds_per_day / 0.1) as usize;
    let mut alive = true;
    for _ in 0..ticks_per_day * 4 {
        world.update(0.1);
        if world.animal(id).is_err() {
            alive = false;
            break;
        }
    }
    assert!(!alive);
}

#[test]
fn test_predators_hunt_prey() {
    let mut world = generated(30);
    let safe = world.terrain().unwrap().safe_tile().unwrap();
    let hunter = world.spawn(Species::Predator, Sex::Male, LifeStage::Adult, safe);
    world.spawn(Species::Prey, Sex::Female, LifeStage::Adult, safe);
    world.animal_mut(hunter).unwrap().hunger = 0.1;

    let mut eaten = false;
    for _ in 0..600 {
        world.update(0.1);
        eaten |= world.drain_notifications().iter().any(|n| {
            matches!(n, Notification::AnimalDestroyed { cause: DeathCause::Eaten, .. })
        });
        if eaten {
            break;
        }
    }
    assert!(eaten);
    assert_eq!(world.prey().count(), 0);
}
