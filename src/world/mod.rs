//! The simulated world
//!
//! [`World`] owns every piece of simulation state: the tile grid, terrain,
//! food, animals, the active event, the day clock and the RNG. A driver
//! calls [`World::step`] (or [`World::update`] plus the per-day hooks) and
//! reads results through the query methods or the notification hub.

pub mod grid;
pub mod notify;
pub mod tile;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::animal::manager::{BreedingRates, TickContext};
use crate::animal::{Animal, AnimalManager, DeathCause, LifeStage};
use crate::core::calendar::Calendar;
use crate::core::config::WorldConfig;
use crate::core::error::{EcoError, Result};
use crate::core::types::{AnimalId, Sex, Species, TileCoord};
use crate::events::{EventKind, EventManager};
use crate::food::FoodManager;
use crate::pathfinding::PathFinder;
use crate::stats::WorldStats;
use crate::terrain::{GenerationMode, TerrainData, TerrainSettings, Thresholds};

pub use grid::TileGrid;
pub use notify::{Notification, NotificationHub};
pub use tile::{Food, Tile, TileType};

pub struct World {
    config: WorldConfig,
    grid: TileGrid,
    terrain: Option<TerrainData>,
    food: FoodManager,
    animals: AnimalManager,
    events: EventManager,
    paths: PathFinder,
    calendar: Calendar,
    rng: ChaCha8Rng,
    hub: NotificationHub,
}

impl World {
    /// A default-configured world of the given size, terrain not yet generated
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::from_config(WorldConfig {
            width,
            height,
            ..WorldConfig::default()
        })
    }

    pub fn from_config(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        info!(
            width = config.width,
            height = config.height,
            seed = config.rng_seed,
            "Creating world"
        );

        Ok(Self {
            grid: TileGrid::new(config.width, config.height),
            terrain: None,
            food: FoodManager::new(config.simulation.initial_nutrition),
            animals: AnimalManager::new(),
            events: EventManager::new(),
            paths: PathFinder::new(),
            calendar: Calendar::new(config.simulation.seconds_per_day),
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            hub: NotificationHub::new(),
            config,
        })
    }

    /// Borrow the animal list and everything else separately
    fn split(&mut self) -> (&mut AnimalManager, TickContext<'_>) {
        let ctx = TickContext {
            grid: &mut self.grid,
            terrain: self.terrain.as_ref(),
            food: &mut self.food,
            paths: &mut self.paths,
            rng: &mut self.rng,
            config: &self.config.simulation,
            rates: BreedingRates {
                prey: self.config.prey_breeding_rate,
                predator: self.config.predator_breeding_rate,
            },
            hub: &mut self.hub,
        };
        (&mut self.animals, ctx)
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn terrain(&self) -> Option<&TerrainData> {
        self.terrain.as_ref()
    }

    pub fn food(&self) -> &FoodManager {
        &self.food
    }

    pub fn animals(&self) -> &AnimalManager {
        &self.animals
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn day(&self) -> u32 {
        self.calendar.current_day()
    }

    pub(crate) fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn tile_at(&self, x: i32, y: i32) -> Result<&Tile> {
        self.grid
            .get(TileCoord::new(x, y))
            .ok_or(EcoError::TileOutOfBounds { x, y })
    }

    pub fn food_tiles(&self) -> &[TileCoord] {
        self.food.food_tiles()
    }

    pub fn water_tiles(&self) -> &[TileCoord] {
        self.terrain.as_ref().map(|t| t.water_tiles()).unwrap_or(&[])
    }

    pub fn sand_tiles(&self) -> &[TileCoord] {
        self.terrain.as_ref().map(|t| t.sand_tiles()).unwrap_or(&[])
    }

    pub fn grass_tiles(&self) -> &[TileCoord] {
        self.terrain.as_ref().map(|t| t.grass_tiles()).unwrap_or(&[])
    }

    pub fn coastal_tiles(&self) -> &[TileCoord] {
        self.terrain.as_ref().map(|t| t.coast_tiles()).unwrap_or(&[])
    }

    pub fn prey(&self) -> impl Iterator<Item = &Animal> {
        self.animals.prey()
    }

    pub fn predators(&self) -> impl Iterator<Item = &Animal> {
        self.animals.predators()
    }

    pub fn animal(&self, id: AnimalId) -> Result<&Animal> {
        self.animals.get(id).ok_or(EcoError::AnimalNotFound(id))
    }

    pub fn closest_prey(&self, from: TileCoord) -> Option<&Animal> {
        self.animals.closest_prey(from).and_then(|id| self.animals.get(id))
    }

    pub fn total_nutrition(&self) -> u64 {
        self.food.total_nutrition(&self.grid)
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats::collect(self)
    }

    pub(crate) fn random_animal_ids(&mut self, n: usize) -> Vec<AnimalId> {
        self.animals.random_ids(n, &mut self.rng)
    }

    // ---------------------------------------------------------------
    // Terrain
    // ---------------------------------------------------------------

    /// Generate terrain from the main-menu parameters.
    ///
    /// `aridity` in [0, 1] widens the sand band above the water line.
    pub fn generate_terrain(&mut self, seed: u32, water_level: f32, aridity: f32, mode: GenerationMode) -> Result<()> {
        let settings = TerrainSettings {
            offset: self.config.terrain.offset,
            ..TerrainSettings::from_water_and_aridity(seed, water_level, aridity, mode)
        };
        self.generate_terrain_with(settings)
    }

    /// Generate terrain from a full set of noise parameters
    pub fn generate_terrain_with(&mut self, settings: TerrainSettings) -> Result<()> {
        settings.validate()?;
        self.config.terrain = settings.clone();
        self.terrain = Some(TerrainData::generate(self.grid.width(), self.grid.height(), settings));
        self.apply_terrain()
    }

    /// Reclassify with the current thresholds, keeping the heightmap
    pub fn update_terrain(&mut self) -> Result<()> {
        self.apply_terrain()
    }

    /// Raise (or lower, with a negative delta) the water line, moving the
    /// sand line with it
    pub fn change_water_level(&mut self, delta: f32) -> Result<()> {
        let t = self.terrain.as_ref().ok_or(EcoError::TerrainNotGenerated)?.thresholds();
        self.set_thresholds(Thresholds {
            water: t.water + delta,
            sand: t.sand + delta,
            grass: t.grass,
        })
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) -> Result<()> {
        self.terrain
            .as_mut()
            .ok_or(EcoError::TerrainNotGenerated)?
            .set_thresholds(thresholds);
        self.apply_terrain()
    }

    fn apply_terrain(&mut self) -> Result<()> {
        let terrain = self.terrain.as_mut().ok_or(EcoError::TerrainNotGenerated)?;
        let changes = terrain.apply(&mut self.grid)?;

        for change in &changes {
            self.hub.emit(Notification::TileTypeChanged {
                coord: change.coord,
                from: change.from,
                to: change.to,
            });
            if change.drowned.is_some() {
                self.food.drown(change.coord, &mut self.hub);
            }
        }

        self.paths.invalidate();
        self.animals.clear_paths();
        info!(
            changed = changes.len(),
            water = format!("{:.1}%", terrain.water_percent()),
            sand = format!("{:.1}%", terrain.sand_percent()),
            grass = format!("{:.1}%", terrain.grass_percent()),
            "Terrain applied"
        );
        Ok(())
    }

    // ---------------------------------------------------------------
    // Food
    // ---------------------------------------------------------------

    pub fn sprout_initial_food(&mut self) -> usize {
        let rate = self.config.simulation.initial_sprout_rate;
        self.food
            .sprout_initial_food(&mut self.grid, rate, &mut self.rng, &mut self.hub)
    }

    /// Per-day hook: food spreads to neighbouring grass
    pub fn food_on_new_day(&mut self) -> usize {
        let rate = self.config.simulation.spread_rate;
        self.food.on_new_day(&mut self.grid, rate, &mut self.rng, &mut self.hub)
    }

    pub fn sprout_food(&mut self, coord: TileCoord) -> bool {
        self.food.sprout(&mut self.grid, coord, &mut self.hub)
    }

    pub fn remove_food(&mut self, coord: TileCoord) -> bool {
        self.food.remove(&mut self.grid, coord, &mut self.hub)
    }

    /// Eat one unit of the food at `coord`
    pub fn consume_food(&mut self, coord: TileCoord) -> bool {
        self.food.consume(&mut self.grid, coord, &mut self.hub)
    }

    // ---------------------------------------------------------------
    // Animals
    // ---------------------------------------------------------------

    /// Place the starting population on the safe tile
    pub fn spawn_animals(&mut self, prey: u32, predators: u32) -> Result<()> {
        let tile = self
            .terrain
            .as_ref()
            .and_then(|t| t.safe_tile())
            .ok_or(EcoError::TerrainNotGenerated)?;
        let (animals, mut ctx) = self.split();
        animals.spawn_animals(prey, predators, tile, &mut ctx);
        Ok(())
    }

    pub fn spawn(&mut self, species: Species, sex: Sex, stage: LifeStage, tile: TileCoord) -> AnimalId {
        let spd = self.config.simulation.seconds_per_day;
        self.animals.spawn(species, sex, tile, stage, spd, &mut self.hub)
    }

    pub fn kill(&mut self, id: AnimalId, cause: DeathCause) -> Result<()> {
        let (animals, mut ctx) = self.split();
        if animals.kill(id, cause, &mut ctx) {
            Ok(())
        } else {
            Err(EcoError::AnimalNotFound(id))
        }
    }

    /// Mutable access for drivers and tests that need to force state
    pub fn animal_mut(&mut self, id: AnimalId) -> Result<&mut Animal> {
        self.animals.get_mut(id).ok_or(EcoError::AnimalNotFound(id))
    }

    /// Per-day hook: life stages and old-age deaths
    pub fn age_up_animals(&mut self) {
        let (animals, mut ctx) = self.split();
        animals.age_up(&mut ctx);
    }

    // ---------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------

    /// Per-day hook: roll for or advance the world event.
    ///
    /// Each call is one day for the event, whether or not the calendar was
    /// moved by [`step`](Self::step).
    pub fn events_on_new_day(&mut self) {
        let day = self.events.next_day(self.day());
        let mut events = std::mem::take(&mut self.events);
        events.on_new_day(day, self);
        self.events = events;
    }

    pub fn force_event(&mut self, kind: EventKind, severity: f32, duration_days: u32) {
        let mut events = std::mem::take(&mut self.events);
        events.force(kind, severity, duration_days, self);
        self.events = events;
    }

    pub fn end_event(&mut self) {
        let mut events = std::mem::take(&mut self.events);
        events.end_active(self);
        self.events = events;
    }

    // ---------------------------------------------------------------
    // Time
    // ---------------------------------------------------------------

    /// One simulation tick: every live animal advances by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let (animals, mut ctx) = self.split();
        animals.update(dt, &mut ctx);
    }

    /// Tick, then run the per-day hooks for every day boundary crossed.
    ///
    /// Returns the number of days that ended.
    pub fn step(&mut self, dt: f32) -> u32 {
        self.update(dt);
        let days = self.calendar.advance(dt);
        for _ in 0..days {
            self.on_new_day();
        }
        days
    }

    fn on_new_day(&mut self) {
        self.age_up_animals();
        self.food_on_new_day();

        let stats = self.stats();
        info!(
            day = stats.day,
            prey = stats.prey,
            predators = stats.predators,
            food = stats.food_tiles,
            nutrition = stats.total_nutrition,
            "New day"
        );

        self.events_on_new_day();
    }

    // ---------------------------------------------------------------
    // Notifications
    // ---------------------------------------------------------------

    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Notification) + 'static,
    {
        self.hub.subscribe(observer);
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.hub.drain()
    }

    pub fn notifications(&self) -> &NotificationHub {
        &self.hub
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("width", &self.grid.width())
            .field("height", &self.grid.height())
            .field("day", &self.day())
            .field("animals", &self.animals.len())
            .field("food_tiles", &self.food.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pathfinding::path_cost;
    use crate::terrain::HeightMap;

    fn generated(size: u32) -> World {
        let mut world = World::new(size, size).unwrap();
        world.generate_terrain(207, 0.32, 0.0, GenerationMode::Default).unwrap();
        world
    }

    #[test]
    fn test_tile_at_bounds() {
        let world = World::new(4, 3).unwrap();
        assert!(world.tile_at(3, 2).is_ok());
        assert!(matches!(world.tile_at(4, 0), Err(EcoError::TileOutOfBounds { x: 4, y: 0 })));
        assert!(world.tile_at(-1, 0).is_err());
    }

    #[test]
    fn test_commands_need_terrain() {
        let mut world = World::new(10, 10).unwrap();
        assert!(matches!(world.spawn_animals(1, 1), Err(EcoError::TerrainNotGenerated)));
        assert!(matches!(world.change_water_level(0.1), Err(EcoError::TerrainNotGenerated)));
        assert!(world.water_tiles().is_empty());
    }

    #[test]
    fn test_generation_emits_tile_changes() {
        let mut world = World::new(12, 12).unwrap();
        world.generate_terrain(3, 0.3, 0.2, GenerationMode::Island).unwrap();
        let changed = world
            .drain_notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::TileTypeChanged { .. }))
            .count();
        // Every tile starts Empty; only those classified above grass stay that way
        let still_empty = world.grid().tiles().filter(|t| t.tile_type() == TileType::Empty).count();
        assert_eq!(changed + still_empty, 144);
    }

    #[test]
    fn test_rising_water_drowns_food() {
        let mut world = generated(30);
        world.sprout_initial_food();
        for c in world.grass_tiles().to_vec() {
            world.sprout_food(c);
        }
        let before = world.food_tiles().len();

        world.change_water_level(0.2).unwrap();
        assert!(world.food_tiles().len() < before);
        for c in world.food_tiles() {
            assert_eq!(world.grid().tile_type(*c), Some(TileType::Ground));
        }
    }

    #[test]
    fn test_water_change_rebuilds_path_graph() {
        // Ground everywhere except a sand column at x = 3 that rising water floods
        let mut heights = vec![0.6; 21];
        for y in 0..3 {
            heights[y * 7 + 3] = 0.35;
        }
        let map = HeightMap::from_values(7, 3, heights).unwrap();
        let mut world = World::new(7, 3).unwrap();
        world.terrain = Some(TerrainData::from_height_map(TerrainSettings::default(), map));
        world.update_terrain().unwrap();

        let (from, to) = (TileCoord::new(0, 1), TileCoord::new(6, 1));
        let before = world.paths.solve(&world.grid, from, to);
        let cost_before = path_cost(world.paths.graph(&world.grid), &before);
        assert_eq!(world.paths.rebuilds(), 1);

        world.change_water_level(0.05).unwrap();
        assert!(!world.paths.is_built());
        assert_eq!(world.grid.tile_type(TileCoord::new(3, 1)), Some(TileType::Water));

        let after = world.paths.solve(&world.grid, from, to);
        let cost_after = path_cost(world.paths.graph(&world.grid), &after);
        assert_eq!(world.paths.rebuilds(), 2);
        assert_eq!(after.first(), Some(&from));
        assert_eq!(after.last(), Some(&to));
        assert!(cost_after > cost_before, "{cost_after} should exceed {cost_before}");
    }

    #[test]
    fn test_step_fires_day_hooks() {
        let mut world = generated(20);
        let spd = world.config().simulation.seconds_per_day;
        assert_eq!(world.step(spd * 2.5), 2);
        assert_eq!(world.day(), 2);
    }

    #[test]
    fn test_kill_unknown_animal() {
        let mut world = generated(10);
        let ghost = AnimalId::new(Species::Prey, 42);
        assert!(matches!(world.kill(ghost, DeathCause::Disease), Err(EcoError::AnimalNotFound(_))));
    }

    #[test]
    fn test_same_seed_same_history() {
        let run = || {
            let mut world = generated(24);
            world.sprout_initial_food();
            world.spawn_animals(6, 1).unwrap();
            for _ in 0..400 {
                world.step(0.2);
            }
            let snapshot: Vec<_> = world
                .prey()
                .chain(world.predators())
                .map(|a| (a.id, a.current_tile, a.state))
                .collect();
            snapshot
        };
        assert_eq!(run(), run());
    }
}
