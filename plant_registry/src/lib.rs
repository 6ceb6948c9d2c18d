//! # Plant Registry
//!
//! Addressable process-state layer for one plant subsystem: a typed
//! variable registry, the process tree spanned over it and the service
//! façade that exposes both to remote consumers.
//!
//! ## Features
//!
//! - **Typed variables**: every variable carries a fixed value kind and
//!   access mode; reads and writes are checked against both.
//! - **Batched snapshots**: the update cycle publishes a whole batch of
//!   values under one writer guard with one shared timestamp, and
//!   batched reads observe a single consistent snapshot.
//! - **Frozen namespace**: the process tree is built once at startup
//!   and browsed lock-free afterwards; variable node ids double as
//!   registry identifiers.
//! - **Write dispatch**: accepted control writes are forwarded to the
//!   owning subsystem through the [`ControlSink`] seam before they are
//!   echoed into the registry.
//! - **Pluggable transport**: consumers program against
//!   [`SubsystemLink`]; [`LoopbackLink`] binds it in-process.
//!
//! ## Quick Start
//!
//! ```
//! use plant_common::prelude::*;
//! use plant_registry::{VariableRegistry, VariableSpec};
//!
//! fn main() -> plant_registry::RegistryResult<()> {
//!     let registry = VariableRegistry::new();
//!     let key = VarKey::new(UnitId::Conveyor(1), VarRole::PowerDraw);
//!     let handle = registry.register(
//!         VariableSpec::for_role(key, "ConveyorLine/Conveyor1/Parameters/PowerDraw".into()),
//!         Value::Float(0.0),
//!     )?;
//!
//!     let mut batch = registry.begin_batch();
//!     batch.publish(handle, Value::Float(2.4))?;
//!     drop(batch);
//!
//!     let (value, _stamp) = registry.get("Conveyor1.PowerDraw")?;
//!     assert_eq!(value, Value::Float(2.4));
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod error;
pub mod link;
pub mod registry;
pub mod service;
pub mod tree;

pub use error::{LinkError, RegistryError, RegistryResult, TreeError, WriteError};
pub use link::{LoopbackLink, SubsystemLink};
pub use registry::{BatchWriter, VarHandle, VariableRegistry, VariableSpec};
pub use service::{ControlSink, OpStatus, ReadResult, SubsystemService, WriteRequest};
pub use tree::{BrowseEntry, NodeKind, NodeRef, ProcessTree, TreeBuilder};
