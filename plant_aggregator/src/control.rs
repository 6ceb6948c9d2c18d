//! Plant-wide control commands over subsystem links.
//!
//! [`PlantController`] resolves the writable control identifiers once,
//! then issues batched writes through the links. Per-item statuses come
//! back to the caller unfiltered, so a rejected recipe shows up as
//! `UnknownRecipe` rather than an error; only transport problems are
//! errors.

use crate::error::{ControlError, ResolveError};
use crate::resolver::PathResolver;
use plant_common::role::{UnitId, VarRole};
use plant_common::value::Value;
use plant_registry::{OpStatus, SubsystemLink, WriteRequest};
use std::sync::Arc;
use tracing::{debug, info};

/// Conveyors addressed by [`PlantController::set_front_conveyors`].
const FRONT_SECTION: u8 = 3;

struct ConveyorControls {
    powered: String,
    automatic: String,
}

/// Command surface over the whole plant.
pub struct PlantController {
    line: Arc<dyn SubsystemLink>,
    filler: Arc<dyn SubsystemLink>,
    conveyors: Vec<ConveyorControls>,
    filler_powered: String,
    recipe_select: String,
}

impl PlantController {
    /// Resolve every control identifier the command surface needs.
    pub fn new(
        line: Arc<dyn SubsystemLink>,
        line_resolver: &PathResolver<'_>,
        filler: Arc<dyn SubsystemLink>,
        filler_resolver: &PathResolver<'_>,
    ) -> Result<Self, ResolveError> {
        let count = line_resolver.conveyor_count();
        let mut conveyors = Vec::with_capacity(usize::from(count));
        for ordinal in 1..=count {
            let unit = UnitId::Conveyor(ordinal);
            conveyors.push(ConveyorControls {
                powered: line_resolver.resolve(unit, VarRole::Powered)?,
                automatic: line_resolver.resolve(unit, VarRole::Automatic)?,
            });
        }
        let filler_powered = filler_resolver.resolve(UnitId::Filler, VarRole::Powered)?;
        let recipe_select = filler_resolver.resolve(UnitId::Filler, VarRole::RecipeSelect)?;
        debug!(conveyors = conveyors.len(), "plant controller resolved");
        Ok(Self {
            line,
            filler,
            conveyors,
            filler_powered,
            recipe_select,
        })
    }

    pub fn conveyor_count(&self) -> usize {
        self.conveyors.len()
    }

    /// Power one conveyor on or off.
    pub fn set_conveyor_power(&self, ordinal: u8, on: bool) -> Result<OpStatus, ControlError> {
        let controls = self.conveyor(ordinal)?;
        debug!(ordinal, on, "conveyor power command");
        let statuses = self.line.write_variables(&[WriteRequest::new(
            controls.powered.as_str(),
            Value::Bool(on),
        )])?;
        single_status(statuses)
    }

    /// Switch one conveyor between automatic and manual mode.
    pub fn set_conveyor_automatic(
        &self,
        ordinal: u8,
        automatic: bool,
    ) -> Result<OpStatus, ControlError> {
        let controls = self.conveyor(ordinal)?;
        debug!(ordinal, automatic, "conveyor mode command");
        let statuses = self.line.write_variables(&[WriteRequest::new(
            controls.automatic.as_str(),
            Value::Bool(automatic),
        )])?;
        single_status(statuses)
    }

    /// Power the whole line with one batched write.
    pub fn set_all_conveyors(&self, on: bool) -> Result<Vec<OpStatus>, ControlError> {
        info!(units = self.conveyors.len(), on, "powering the whole line");
        self.write_powered(&self.conveyors, on)
    }

    /// Power the in-feed section: the first three conveyors, or fewer on
    /// a shorter line.
    pub fn set_front_conveyors(&self, on: bool) -> Result<Vec<OpStatus>, ControlError> {
        let section = &self.conveyors[..self.conveyors.len().min(usize::from(FRONT_SECTION))];
        info!(units = section.len(), on, "switching the front section");
        self.write_powered(section, on)
    }

    /// Power the filler on or off.
    pub fn set_filler_power(&self, on: bool) -> Result<OpStatus, ControlError> {
        debug!(on, "filler power command");
        let statuses = self.filler.write_variables(&[WriteRequest::new(
            self.filler_powered.as_str(),
            Value::Bool(on),
        )])?;
        single_status(statuses)
    }

    /// Select a recipe on the filler. A name outside the catalog comes
    /// back as `UnknownRecipe`.
    pub fn select_recipe(&self, name: &str) -> Result<OpStatus, ControlError> {
        debug!(recipe = name, "recipe selection command");
        let statuses = self.filler.write_variables(&[WriteRequest::new(
            self.recipe_select.as_str(),
            Value::String(name.to_string()),
        )])?;
        single_status(statuses)
    }

    fn write_powered(
        &self,
        section: &[ConveyorControls],
        on: bool,
    ) -> Result<Vec<OpStatus>, ControlError> {
        let requests: Vec<WriteRequest> = section
            .iter()
            .map(|controls| WriteRequest::new(controls.powered.as_str(), Value::Bool(on)))
            .collect();
        let statuses = self.line.write_variables(&requests)?;
        if statuses.len() != requests.len() {
            return Err(ControlError::MalformedResponse {
                expected: requests.len(),
                actual: statuses.len(),
            });
        }
        Ok(statuses)
    }

    fn conveyor(&self, ordinal: u8) -> Result<&ConveyorControls, ControlError> {
        ordinal
            .checked_sub(1)
            .and_then(|index| self.conveyors.get(usize::from(index)))
            .ok_or(ControlError::UnknownUnit { ordinal })
    }
}

fn single_status(statuses: Vec<OpStatus>) -> Result<OpStatus, ControlError> {
    match statuses.as_slice() {
        [status] => Ok(*status),
        other => Err(ControlError::MalformedResponse {
            expected: 1,
            actual: other.len(),
        }),
    }
}
