//! World events
//!
//! At most one event runs at a time. Each simulated day the manager either
//! rolls to start a new one or advances the active one. What each kind does
//! lives in [`effects`].

pub mod effects;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::core::types::Species;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Flood,
    Drought,
    Famine,
    Sprout,
    Disease,
    Migration,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Flood,
        EventKind::Drought,
        EventKind::Famine,
        EventKind::Sprout,
        EventKind::Disease,
        EventKind::Migration,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Flood => "flood",
            EventKind::Drought => "drought",
            EventKind::Famine => "famine",
            EventKind::Sprout => "sprout",
            EventKind::Disease => "disease",
            EventKind::Migration => "migration",
        }
    }
}

/// The event currently running
#[derive(Debug, Clone, Serialize)]
pub struct ActiveEvent {
    pub kind: EventKind,
    /// In [0, 1]
    pub severity: f32,
    pub duration_days: u32,
    pub remaining_days: u32,
    /// Species arriving each day of a migration
    pub migrants: Option<Species>,
    /// Set once a flood or drought has moved the terrain thresholds
    #[serde(skip)]
    pub(crate) shifted_terrain: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EventManager {
    active: Option<ActiveEvent>,
    last_day: Option<u32>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveEvent> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Day number the next daily hook should run as.
    ///
    /// Normally `today`; when the calendar has not moved past the last day
    /// already handled, the day after that one.
    pub fn next_day(&self, today: u32) -> u32 {
        match self.last_day {
            Some(last) if last >= today => last + 1,
            _ => today,
        }
    }

    /// Daily hook. Calling it again for the same day does nothing.
    pub fn on_new_day(&mut self, day: u32, world: &mut World) {
        if self.last_day == Some(day) {
            return;
        }
        self.last_day = Some(day);

        let Some(mut event) = self.active.take() else {
            self.roll(world);
            return;
        };

        event.remaining_days = event.remaining_days.saturating_sub(1);
        if event.remaining_days == 0 {
            effects::end(&event, world);
            info!(kind = event.kind.label(), day, "Event ended");
        } else {
            effects::per_day(&event, world);
            self.active = Some(event);
        }
    }

    fn roll(&mut self, world: &mut World) {
        let cfg = world.config().simulation.clone();
        let rng = world.rng_mut();
        if rng.gen::<f32>() >= cfg.event_chance_per_day {
            return;
        }
        let Some(&kind) = EventKind::ALL.choose(rng) else {
            return;
        };
        let severity = rng.gen_range(cfg.event_min_severity..=1.0);
        let duration = rng.gen_range(cfg.event_min_days..=cfg.event_max_days);
        self.start(kind, severity, duration, world);
    }

    /// Start `kind` now, ending whatever is running first.
    ///
    /// Counts as today's event roll.
    pub fn force(&mut self, kind: EventKind, severity: f32, duration_days: u32, world: &mut World) {
        self.end_active(world);
        self.last_day = Some(world.day());
        self.start(kind, severity.clamp(0.0, 1.0), duration_days.max(1), world);
    }

    /// End the running event immediately, reverting what it changed
    pub fn end_active(&mut self, world: &mut World) {
        if let Some(event) = self.active.take() {
            effects::end(&event, world);
            info!(kind = event.kind.label(), "Event ended early");
        }
    }

    fn start(&mut self, kind: EventKind, severity: f32, duration_days: u32, world: &mut World) {
        let mut event = ActiveEvent {
            kind,
            severity,
            duration_days,
            remaining_days: duration_days,
            migrants: None,
            shifted_terrain: false,
        };
        effects::start(&mut event, world);
        info!(kind = kind.label(), severity, duration_days, "Event started");
        self.active = Some(event);
    }
}
