//! Conveyor-line subsystem: units, registry, tree and update cycle.

use crate::dispatch::ControlCommand;
use crate::equipment::ConveyorUnit;
use crate::error::BuildResult;
use parking_lot::Mutex;
use plant_common::config::{ConveyorProfile, LineConfig};
use plant_common::role::{UnitId, VarKey, VarRole};
use plant_common::snapshot::ConveyorSnapshot;
use plant_common::value::Value;
use plant_registry::{
    ControlSink, NodeRef, ProcessTree, RegistryResult, SubsystemService, TreeBuilder, VarHandle,
    VariableRegistry, VariableSpec, WriteError,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Subsystem name, doubling as the root node id of its process tree.
pub const LINE_SUBSYSTEM: &str = "ConveyorLine";

/// Registry handles of one unit's simulation-owned variables.
struct ConveyorHandles {
    status: VarHandle,
    direction: VarHandle,
    mode: VarHandle,
    power_draw: VarHandle,
    bottle_count: VarHandle,
    running_hours: VarHandle,
    start_count: VarHandle,
}

struct LineState {
    units: Vec<ConveyorUnit>,
    rng: StdRng,
}

/// The conveyor line: N units behind one lock, publishing into one
/// registry under one frozen tree.
pub struct ConveyorLineSubsystem {
    registry: Arc<VariableRegistry>,
    tree: Arc<ProcessTree>,
    handles: Vec<ConveyorHandles>,
    state: Mutex<LineState>,
    profile: ConveyorProfile,
    tick_interval: Duration,
}

impl ConveyorLineSubsystem {
    /// Build the subsystem: units, variable registration, tree.
    pub fn build(config: &LineConfig, seed: u64) -> BuildResult<Arc<Self>> {
        let registry = Arc::new(VariableRegistry::new());
        let mut builder = TreeBuilder::new(LINE_SUBSYSTEM, LINE_SUBSYSTEM);
        let root = builder.root();

        let units: Vec<ConveyorUnit> =
            (1..=config.conveyor_count).map(ConveyorUnit::new).collect();
        let mut handles = Vec::with_capacity(units.len());

        for unit in &units {
            let unit_id = UnitId::Conveyor(unit.ordinal());
            let unit_name = unit_id.to_string();
            let unit_node = builder.add_object(&root, &unit_name, &unit_name)?;
            let parameters =
                builder.add_folder(&unit_node, &format!("{unit_id}.Parameters"), "Parameters")?;
            let control =
                builder.add_folder(&unit_node, &format!("{unit_id}.Control"), "Control")?;
            let diagnostics = builder.add_folder(
                &unit_node,
                &format!("{unit_id}.Diagnostics"),
                "Diagnostics",
            )?;

            let mut add_var =
                |folder: &NodeRef, role: VarRole, initial: Value| -> BuildResult<VarHandle> {
                    let key = VarKey::new(unit_id, role);
                    let path = format!(
                        "{LINE_SUBSYSTEM}/{unit_id}/{}/{}",
                        role.category().name(),
                        role.name()
                    );
                    let handle = registry.register(VariableSpec::for_role(key, path), initial)?;
                    builder.add_variable(folder, &key.identifier(), role.name(), handle)?;
                    Ok(handle)
                };

            handles.push(ConveyorHandles {
                status: add_var(
                    &parameters,
                    VarRole::Status,
                    Value::Int32(unit.status().as_i32()),
                )?,
                direction: add_var(
                    &parameters,
                    VarRole::Direction,
                    Value::Int32(unit.direction().as_i32()),
                )?,
                mode: add_var(&parameters, VarRole::Mode, Value::Int32(unit.mode().as_i32()))?,
                power_draw: add_var(
                    &parameters,
                    VarRole::PowerDraw,
                    Value::Float(unit.power_kw()),
                )?,
                bottle_count: add_var(
                    &parameters,
                    VarRole::BottleCount,
                    Value::UInt32(unit.bottle_count()),
                )?,
                running_hours: add_var(
                    &diagnostics,
                    VarRole::RunningHours,
                    Value::Double(unit.running_hours()),
                )?,
                start_count: add_var(
                    &diagnostics,
                    VarRole::StartCount,
                    Value::UInt32(unit.start_count()),
                )?,
            });
            add_var(
                &parameters,
                VarRole::TargetSpeed,
                Value::Float(unit.target_speed()),
            )?;
            add_var(&control, VarRole::Powered, Value::Bool(unit.powered()))?;
            add_var(&control, VarRole::Automatic, Value::Bool(unit.automatic()))?;
        }

        let tree = Arc::new(builder.finish());
        for spec in registry.specs() {
            debug!(
                subsystem = LINE_SUBSYSTEM,
                id = %spec.id,
                kind = %spec.kind,
                access = ?spec.access,
                eng_unit = spec.eng_unit.unwrap_or("-"),
                "variable registered"
            );
        }
        info!(
            subsystem = LINE_SUBSYSTEM,
            units = config.conveyor_count,
            variables = registry.len(),
            nodes = tree.node_count(),
            "subsystem built"
        );

        Ok(Arc::new(Self {
            registry,
            tree,
            handles,
            state: Mutex::new(LineState {
                units,
                rng: StdRng::seed_from_u64(seed),
            }),
            profile: config.profile,
            tick_interval: Duration::from_millis(config.update_interval_ms),
        }))
    }

    /// Service façade over this subsystem, with the subsystem itself as
    /// the control sink.
    pub fn service(self: &Arc<Self>) -> Arc<SubsystemService> {
        Arc::new(SubsystemService::new(
            LINE_SUBSYSTEM,
            self.registry.clone(),
            self.tree.clone(),
            self.clone() as Arc<dyn ControlSink>,
        ))
    }

    pub fn registry(&self) -> &Arc<VariableRegistry> {
        &self.registry
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn unit_count(&self) -> usize {
        self.handles.len()
    }

    /// Advance every unit one cycle, then republish all derived fields
    /// through one batch.
    ///
    /// Lock order: unit state first, registry write guard inside it. The
    /// dispatch path takes the same two locks strictly one at a time, so
    /// the pair cannot deadlock.
    pub fn tick(&self) -> RegistryResult<()> {
        let mut state = self.state.lock();
        let dt_hours = self.tick_interval.as_secs_f64() / 3600.0;
        let LineState { units, rng } = &mut *state;
        for unit in units.iter_mut() {
            unit.tick(&self.profile, dt_hours, rng);
        }

        let mut batch = self.registry.begin_batch();
        for (unit, handles) in units.iter().zip(&self.handles) {
            batch.publish(handles.status, Value::Int32(unit.status().as_i32()))?;
            batch.publish(handles.direction, Value::Int32(unit.direction().as_i32()))?;
            batch.publish(handles.mode, Value::Int32(unit.mode().as_i32()))?;
            batch.publish(handles.power_draw, Value::Float(unit.power_kw()))?;
            batch.publish(handles.bottle_count, Value::UInt32(unit.bottle_count()))?;
            batch.publish(handles.running_hours, Value::Double(unit.running_hours()))?;
            batch.publish(handles.start_count, Value::UInt32(unit.start_count()))?;
        }
        trace!(subsystem = LINE_SUBSYSTEM, "update cycle published");
        Ok(())
    }

    /// Current per-unit snapshots, for the periodic status log.
    pub fn snapshots(&self) -> Vec<ConveyorSnapshot> {
        self.state
            .lock()
            .units
            .iter()
            .map(ConveyorUnit::snapshot)
            .collect()
    }
}

impl ControlSink for ConveyorLineSubsystem {
    fn apply(&self, key: VarKey, value: &Value) -> Result<(), WriteError> {
        let command = ControlCommand::decode(key, value)?;
        let mut state = self.state.lock();
        match command {
            ControlCommand::PowerConveyor { unit, on } => {
                unit_mut(&mut state.units, unit, key)?.set_powered(on);
            }
            ControlCommand::SetConveyorAutomatic { unit, automatic } => {
                unit_mut(&mut state.units, unit, key)?.set_automatic(automatic);
            }
            ControlCommand::SetConveyorSpeed { unit, speed } => {
                unit_mut(&mut state.units, unit, key)?.set_target_speed(speed);
            }
            // Filler commands cannot resolve against this registry.
            _ => {
                return Err(WriteError::NotFound {
                    id: key.identifier(),
                });
            }
        }
        debug!(subsystem = LINE_SUBSYSTEM, id = %key, "command applied");
        Ok(())
    }
}

fn unit_mut(
    units: &mut [ConveyorUnit],
    ordinal: u8,
    key: VarKey,
) -> Result<&mut ConveyorUnit, WriteError> {
    ordinal
        .checked_sub(1)
        .and_then(|index| units.get_mut(usize::from(index)))
        .ok_or_else(|| WriteError::NotFound {
            id: key.identifier(),
        })
}
