//! Simulated equipment state machines.
//!
//! Units are plain structs mutated by their owning subsystem under its
//! lock; nothing here touches the registry. Probabilities and power
//! bands come from the config profiles so tests can pin them.

pub mod conveyor;
pub mod filler;

pub use conveyor::ConveyorUnit;
pub use filler::FillerUnit;
