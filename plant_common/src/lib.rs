//! Plant Common Library
//!
//! Shared vocabulary for the bottling-line workspace: typed values, unit
//! and variable roles, equipment state enums, the recipe catalog, snapshot
//! DTOs and configuration loading.
//!
//! # Module Structure
//!
//! - [`value`] - Typed variable values and access modes
//! - [`role`] - Unit/role addressing (`VarKey`) and identifier derivation
//! - [`status`] - Equipment and plant state enums
//! - [`recipe`] - Fixed beverage recipe catalog
//! - [`snapshot`] - Per-unit DTOs and the aggregated plant overview
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use plant_common::prelude::*;
//!
//! let key = VarKey::new(UnitId::Conveyor(3), VarRole::Powered);
//! assert_eq!(key.identifier(), "Conveyor3.Powered");
//! ```

pub mod config;
pub mod prelude;
pub mod recipe;
pub mod role;
pub mod snapshot;
pub mod status;
pub mod value;
