//! Prelude module for common re-exports.
//!
//! # Usage
//!
//! ```rust
//! use plant_common::prelude::*;
//! ```

// ─── Values & addressing ────────────────────────────────────────────
pub use crate::role::{UnitId, VarCategory, VarKey, VarRole};
pub use crate::value::{AccessMode, Value, ValueKind};

// ─── Equipment state ────────────────────────────────────────────────
pub use crate::status::{ControlMode, ConveyorStatus, FillerStatus, PlantStatus, RunDirection};

// ─── Recipes ────────────────────────────────────────────────────────
pub use crate::recipe::{RECIPE_NONE, RecipeBook};

// ─── Snapshots ──────────────────────────────────────────────────────
pub use crate::snapshot::{ConveyorSnapshot, FillerSnapshot, PlantOverview};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
