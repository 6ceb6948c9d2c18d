//! Filler unit model.

use plant_common::config::FillerProfile;
use plant_common::recipe::{RECIPE_NONE, RecipeBook};
use plant_common::snapshot::FillerSnapshot;
use plant_common::status::FillerStatus;
use plant_registry::WriteError;
use rand::Rng;

/// Fill rate a fresh unit is parameterized with, bottles/min.
pub const DEFAULT_FILL_RATE: f32 = 120.0;

/// State of the bottling filler.
///
/// Same command/tick split as the conveyor. On top of it the filler
/// carries a recipe: selection is validated against the catalog, power
/// loss clears it, and a running unit with nothing selected picks one at
/// random (the line never fills unlabeled bottles).
#[derive(Debug, Clone)]
pub struct FillerUnit {
    powered: bool,
    selected_recipe: Option<String>,
    fill_rate: f32,
    status: FillerStatus,
    power_kw: f32,
    bottle_count: u32,
    running_hours: f64,
    start_count: u32,
    catalog: RecipeBook,
}

impl FillerUnit {
    /// Fresh unit, powered down, with the given catalog.
    pub fn new(catalog: RecipeBook) -> Self {
        Self {
            powered: false,
            selected_recipe: None,
            fill_rate: DEFAULT_FILL_RATE,
            status: FillerStatus::Off,
            power_kw: 0.0,
            bottle_count: 0,
            running_hours: 0.0,
            start_count: 0,
            catalog,
        }
    }

    // ─── Commands ───────────────────────────────────────────────────

    pub fn set_powered(&mut self, on: bool) {
        if on && !self.powered {
            self.start_count = self.start_count.saturating_add(1);
        }
        self.powered = on;
    }

    /// Select a recipe by catalog name.
    ///
    /// # Errors
    ///
    /// `UnknownRecipe` when the name is not in the catalog; the sentinel
    /// name counts as unknown.
    pub fn select_recipe(&mut self, name: &str) -> Result<(), WriteError> {
        if !self.catalog.is_known(name) {
            return Err(WriteError::UnknownRecipe {
                name: name.to_string(),
            });
        }
        self.selected_recipe = Some(name.to_string());
        Ok(())
    }

    pub fn set_fill_rate(&mut self, rate: f32) {
        self.fill_rate = rate;
    }

    // ─── Simulation ─────────────────────────────────────────────────

    /// Advance one update cycle.
    ///
    /// Powered-off: `Off`, zero draw, recipe cleared. Powered: alarm with
    /// the profile probability (zero draw); otherwise actively filling
    /// with the run probability (power in the profile band, recipe
    /// auto-assigned when unset, occasional bottle) or standing by at
    /// standby draw.
    pub fn tick(&mut self, profile: &FillerProfile, dt_hours: f64, rng: &mut impl Rng) {
        if !self.powered {
            self.status = FillerStatus::Off;
            self.power_kw = 0.0;
            self.selected_recipe = None;
            return;
        }
        if rng.gen_bool(profile.alarm_probability) {
            self.status = FillerStatus::Alarm;
            self.power_kw = 0.0;
            return;
        }
        if rng.gen_bool(profile.run_probability) {
            self.status = FillerStatus::Running;
            self.power_kw = rng.gen_range(profile.power_min_kw..profile.power_max_kw);
            self.running_hours += dt_hours;
            if self.selected_recipe.is_none() && !self.catalog.is_empty() {
                let pick = rng.gen_range(0..self.catalog.len());
                self.selected_recipe = Some(self.catalog.as_slice()[pick].clone());
            }
            if rng.gen_bool(profile.bottle_probability) {
                self.bottle_count = self.bottle_count.saturating_add(1);
            }
        } else {
            self.status = FillerStatus::Standby;
            self.power_kw = profile.standby_power_kw;
        }
    }

    // ─── Observations ───────────────────────────────────────────────

    pub fn powered(&self) -> bool {
        self.powered
    }

    /// Loaded recipe name, or the sentinel when none is loaded.
    pub fn active_recipe(&self) -> &str {
        self.selected_recipe.as_deref().unwrap_or(RECIPE_NONE)
    }

    pub fn fill_rate(&self) -> f32 {
        self.fill_rate
    }

    pub fn status(&self) -> FillerStatus {
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

    pub fn catalog(&self) -> &RecipeBook {
        &self.catalog
    }

    pub fn snapshot(&self) -> FillerSnapshot {
        FillerSnapshot {
            status: self.status,
            active_recipe: self.active_recipe().to_string(),
            power_kw: self.power_kw,
            bottle_count: self.bottle_count,
        }
    }
}
