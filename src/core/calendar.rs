//! Day clock for the simulation
//!
//! Accumulates simulated seconds and reports day boundaries so the world can
//! fire its per-day hooks (aging, food spread, events).

use serde::{Deserialize, Serialize};

/// Calendar tracks simulated seconds with day granularity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    seconds_into_day: f32,
    day: u32,
    seconds_per_day: f32,
}

impl Calendar {
    pub fn new(seconds_per_day: f32) -> Self {
        Self {
            seconds_into_day: 0.0,
            day: 0,
            seconds_per_day,
        }
    }

    /// Advance the clock, returning how many day boundaries were crossed
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.seconds_into_day += dt;
        let mut crossed = 0;
        while self.seconds_into_day >= self.seconds_per_day {
            self.seconds_into_day -= self.seconds_per_day;
            self.day += 1;
            crossed += 1;
        }
        crossed
    }

    pub fn current_day(&self) -> u32 {
        self.day
    }

    pub fn seconds_into_day(&self) -> f32 {
        self.seconds_into_day
    }

    pub fn seconds_per_day(&self) -> f32 {
        self.seconds_per_day
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(60.0)
    }
}
