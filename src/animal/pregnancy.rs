//! Gestation countdown owned by a mother

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pregnancy {
    time_until_birth: f32,
}

impl Pregnancy {
    pub fn new(gestation_seconds: f32) -> Self {
        Self {
            time_until_birth: gestation_seconds,
        }
    }

    pub fn time_until_birth(&self) -> f32 {
        self.time_until_birth
    }

    /// Count down; true once the litter is due
    pub fn advance(&mut self, dt: f32) -> bool {
        self.time_until_birth -= dt;
        self.time_until_birth <= 0.0
    }
}
