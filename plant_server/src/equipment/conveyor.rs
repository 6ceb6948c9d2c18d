//! Conveyor unit model.

use plant_common::config::ConveyorProfile;
use plant_common::snapshot::ConveyorSnapshot;
use plant_common::status::{ControlMode, ConveyorStatus, RunDirection};
use rand::Rng;

/// Belt speed a fresh unit is parameterized with, m/min.
pub const DEFAULT_TARGET_SPEED: f32 = 30.0;

/// State of one conveyor along the line.
///
/// The unit is a plain state machine: control methods record commands,
/// [`tick`](Self::tick) rolls the next state from them. A command is
/// therefore visible in the derived fields only from the following tick,
/// while the command value itself reads back immediately.
#[derive(Debug, Clone)]
pub struct ConveyorUnit {
    ordinal: u8,
    powered: bool,
    automatic: bool,
    direction: RunDirection,
    target_speed: f32,
    status: ConveyorStatus,
    power_kw: f32,
    bottle_count: u32,
    running_hours: f64,
    start_count: u32,
}

impl ConveyorUnit {
    /// Fresh unit, powered down.
    pub fn new(ordinal: u8) -> Self {
        Self {
            ordinal,
            powered: false,
            automatic: true,
            direction: RunDirection::default(),
            target_speed: DEFAULT_TARGET_SPEED,
            status: ConveyorStatus::Off,
            power_kw: 0.0,
            bottle_count: 0,
            running_hours: 0.0,
            start_count: 0,
        }
    }

    // ─── Commands ───────────────────────────────────────────────────

    pub fn set_powered(&mut self, on: bool) {
        if on && !self.powered {
            self.start_count = self.start_count.saturating_add(1);
        }
        self.powered = on;
    }

    pub fn set_automatic(&mut self, automatic: bool) {
        self.automatic = automatic;
    }

    pub fn set_target_speed(&mut self, speed: f32) {
        self.target_speed = speed;
    }

    // ─── Simulation ─────────────────────────────────────────────────

    /// Advance one update cycle.
    ///
    /// Powered-off units report `Off` with zero draw and keep their
    /// bottle counter. Powered units alarm with the profile probability
    /// (zero draw), otherwise run with a uniform draw in the profile's
    /// power band and occasionally count a bottle. `dt_hours` is the
    /// cycle interval, accumulated into `running_hours` while running.
    pub fn tick(&mut self, profile: &ConveyorProfile, dt_hours: f64, rng: &mut impl Rng) {
        if !self.powered {
            self.status = ConveyorStatus::Off;
            self.power_kw = 0.0;
            return;
        }
        if rng.gen_bool(profile.alarm_probability) {
            self.status = ConveyorStatus::Alarm;
            self.power_kw = 0.0;
            return;
        }
        self.status = ConveyorStatus::Running;
        self.power_kw = rng.gen_range(profile.power_min_kw..profile.power_max_kw);
        self.running_hours += dt_hours;
        if rng.gen_bool(profile.bottle_probability) {
            self.bottle_count = self.bottle_count.saturating_add(1);
        }
    }

    // ─── Observations ───────────────────────────────────────────────

    pub fn ordinal(&self) -> u8 {
        self.ordinal
    }

    pub fn powered(&self) -> bool {
        self.powered
    }

    pub fn automatic(&self) -> bool {
        self.automatic
    }

    /// Operating mode implied by the automatic flag.
    pub fn mode(&self) -> ControlMode {
        ControlMode::from_flag(self.automatic)
    }

    pub fn direction(&self) -> RunDirection {
        self.direction
    }

    pub fn target_speed(&self) -> f32 {
        self.target_speed
    }

    pub fn status(&self) -> ConveyorStatus {
        self.status
    }

    pub fn power_kw(&self) -> f32 {
        self.power_kw
    }

    pub fn bottle_count(&self) -> u32 {
        self.bottle_count
    }

    pub fn running_hours(&self) -> f64 {
        self.running_hours
    }

    pub fn start_count(&self) -> u32 {
        self.start_count
    }

    pub fn snapshot(&self) -> ConveyorSnapshot {
        ConveyorSnapshot {
            id: self.ordinal,
            status: self.status,
            power_kw: self.power_kw,
            bottle_count: self.bottle_count,
        }
    }
}
