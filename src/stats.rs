//! Daily snapshot of population and food

use std::fmt;

use serde::Serialize;

use crate::core::error::Result;
use crate::events::EventKind;
use crate::world::World;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldStats {
    pub day: u32,
    pub prey: usize,
    pub predators: usize,
    pub food_tiles: usize,
    pub total_nutrition: u64,
    pub water_percent: f32,
    pub active_event: Option<EventKind>,
}

impl WorldStats {
    pub fn collect(world: &World) -> Self {
        Self {
            day: world.day(),
            prey: world.prey().count(),
            predators: world.predators().count(),
            food_tiles: world.food_tiles().len(),
            total_nutrition: world.total_nutrition(),
            water_percent: world.terrain().map_or(0.0, |t| t.water_percent()),
            active_event: world.events().active().map(|e| e.kind),
        }
    }

    /// One JSON object, no trailing newline
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for WorldStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day {:>4} | prey {:>4} | predators {:>3} | food {:>5} ({} nutrition) | water {:.1}%",
            self.day, self.prey, self.predators, self.food_tiles, self.total_nutrition, self.water_percent
        )?;
        if let Some(kind) = self.active_event {
            write!(f, " | {}", kind.label())?;
        }
        Ok(())
    }
}
