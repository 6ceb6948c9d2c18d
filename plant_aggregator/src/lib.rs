//! # Plant Aggregator
//!
//! Consuming side of the bottling plant. The aggregator starts
//! address-blind, discovers each subsystem's process tree over a
//! [`plant_registry::SubsystemLink`], resolves typed unit/role addresses
//! to registry identifiers, polls both sides on its own cadence and
//! folds the readings into one plant-wide overview per cycle. Plant
//! commands (power, mode, recipes) go back through the same links.
//!
//! ## Modules
//!
//! - [`discovery`]: tree walk building the path index
//! - [`resolver`]: unit/role to identifier resolution with layout fallbacks
//! - [`reader`]: cyclic pollers decoding snapshots
//! - [`aggregate`]: plant status, totals and anomaly detection
//! - [`control`]: batched plant-wide write commands

#![warn(clippy::all)]

pub mod aggregate;
pub mod control;
pub mod discovery;
pub mod error;
pub mod reader;
pub mod resolver;

pub use aggregate::AggregationEngine;
pub use control::PlantController;
pub use discovery::{Discovery, DiscoveryPhase, PathIndex};
pub use error::{ControlError, PollError, ResolveError};
pub use reader::{ConveyorPoller, FillerPoller};
pub use resolver::PathResolver;
