//! Typed decoding of accepted control writes.
//!
//! The service layer validates identifier, access mode and value kind,
//! then hands `(VarKey, Value)` to the owning subsystem's sink. The sink
//! decodes the pair into a [`ControlCommand`] here and applies it to the
//! unit under the subsystem lock. Routing is a match on the typed key;
//! identifier strings are never parsed.

use plant_common::role::{UnitId, VarKey, VarRole};
use plant_common::value::Value;
use plant_registry::WriteError;

/// One validated operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    PowerConveyor { unit: u8, on: bool },
    SetConveyorAutomatic { unit: u8, automatic: bool },
    SetConveyorSpeed { unit: u8, speed: f32 },
    PowerFiller { on: bool },
    SelectRecipe { name: String },
    SetFillRate { rate: f32 },
}

impl ControlCommand {
    /// Decode a write against the command table.
    ///
    /// # Errors
    ///
    /// - `TypeMismatch` when the value variant does not fit the role
    /// - `NotWritable` when the (unit, role) pair commands nothing
    pub fn decode(key: VarKey, value: &Value) -> Result<Self, WriteError> {
        let mismatch = || WriteError::TypeMismatch {
            id: key.identifier(),
            expected: key.role.kind(),
            actual: value.kind(),
        };
        match (key.unit, key.role) {
            (UnitId::Conveyor(unit), VarRole::Powered) => {
                let on = value.as_bool().ok_or_else(mismatch)?;
                Ok(Self::PowerConveyor { unit, on })
            }
            (UnitId::Conveyor(unit), VarRole::Automatic) => {
                let automatic = value.as_bool().ok_or_else(mismatch)?;
                Ok(Self::SetConveyorAutomatic { unit, automatic })
            }
            (UnitId::Conveyor(unit), VarRole::TargetSpeed) => {
                let speed = value.as_f32().ok_or_else(mismatch)?;
                Ok(Self::SetConveyorSpeed { unit, speed })
            }
            (UnitId::Filler, VarRole::Powered) => {
                let on = value.as_bool().ok_or_else(mismatch)?;
                Ok(Self::PowerFiller { on })
            }
            (UnitId::Filler, VarRole::RecipeSelect) => {
                let name = value.as_str().ok_or_else(mismatch)?;
                Ok(Self::SelectRecipe {
                    name: name.to_string(),
                })
            }
            (UnitId::Filler, VarRole::FillRate) => {
                let rate = value.as_f32().ok_or_else(mismatch)?;
                Ok(Self::SetFillRate { rate })
            }
            _ => Err(WriteError::NotWritable {
                id: key.identifier(),
            }),
        }
    }
}
