//! # Plant Server
//!
//! Hosting side of the bottling plant: simulated equipment units, the
//! two subsystems (conveyor line and filler) publishing into their
//! registries, typed dispatch of control writes, and the fixed-interval
//! runners driving the update cycles.
//!
//! ## Modules
//!
//! - [`equipment`]: pure unit state machines (no registry access)
//! - [`line`] / [`filler_station`]: subsystem assembly, from registry
//!   population and process tree to tick/republish and control sink
//! - [`dispatch`]: `(VarKey, Value)` → [`ControlCommand`] decoding
//! - [`runner`]: per-subsystem update threads

#![warn(clippy::all)]

pub mod dispatch;
pub mod equipment;
pub mod error;
pub mod filler_station;
pub mod line;
pub mod runner;

pub use dispatch::ControlCommand;
pub use equipment::{ConveyorUnit, FillerUnit};
pub use error::{BuildError, BuildResult};
pub use filler_station::{FILLER_SUBSYSTEM, FillerSubsystem};
pub use line::{ConveyorLineSubsystem, LINE_SUBSYSTEM};
pub use runner::UpdateRunner;
