//! Filler subsystem: the singleton bottling station.

use crate::dispatch::ControlCommand;
use crate::equipment::FillerUnit;
use crate::error::BuildResult;
use parking_lot::Mutex;
use plant_common::config::{FillerConfig, FillerProfile};
use plant_common::recipe::{RECIPE_NONE, RecipeBook};
use plant_common::role::{UnitId, VarKey, VarRole};
use plant_common::snapshot::FillerSnapshot;
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
pub const FILLER_SUBSYSTEM: &str = "Filler";

struct FillerHandles {
    status: VarHandle,
    active_recipe: VarHandle,
    power_draw: VarHandle,
    bottle_count: VarHandle,
    running_hours: VarHandle,
    start_count: VarHandle,
}

struct FillerState {
    unit: FillerUnit,
    rng: StdRng,
}

/// The filler station. Unlike the line there is exactly one unit, and
/// the subsystem root object doubles as the unit object.
pub struct FillerSubsystem {
    registry: Arc<VariableRegistry>,
    tree: Arc<ProcessTree>,
    handles: FillerHandles,
    state: Mutex<FillerState>,
    profile: FillerProfile,
    tick_interval: Duration,
}

impl FillerSubsystem {
    /// Build the subsystem with the default recipe catalog.
    pub fn build(config: &FillerConfig, seed: u64) -> BuildResult<Arc<Self>> {
        Self::build_with_catalog(config, seed, RecipeBook::default())
    }

    pub fn build_with_catalog(
        config: &FillerConfig,
        seed: u64,
        catalog: RecipeBook,
    ) -> BuildResult<Arc<Self>> {
        let unit = FillerUnit::new(catalog);
        let registry = Arc::new(VariableRegistry::new());
        let mut builder = TreeBuilder::new(FILLER_SUBSYSTEM, FILLER_SUBSYSTEM);
        let root = builder.root();

        let parameters =
            builder.add_folder(&root, &format!("{FILLER_SUBSYSTEM}.Parameters"), "Parameters")?;
        let recipes =
            builder.add_folder(&root, &format!("{FILLER_SUBSYSTEM}.Recipes"), "Recipes")?;
        let control =
            builder.add_folder(&root, &format!("{FILLER_SUBSYSTEM}.Control"), "Control")?;
        let diagnostics = builder.add_folder(
            &root,
            &format!("{FILLER_SUBSYSTEM}.Diagnostics"),
            "Diagnostics",
        )?;

        let mut add_var =
            |folder: &NodeRef, role: VarRole, initial: Value| -> BuildResult<VarHandle> {
                let key = VarKey::new(UnitId::Filler, role);
                let path = format!(
                    "{FILLER_SUBSYSTEM}/{}/{}",
                    role.category().name(),
                    role.name()
                );
                let handle = registry.register(VariableSpec::for_role(key, path), initial)?;
                builder.add_variable(folder, &key.identifier(), role.name(), handle)?;
                Ok(handle)
            };

        let handles = FillerHandles {
            status: add_var(
                &parameters,
                VarRole::Status,
                Value::Int32(unit.status().as_i32()),
            )?,
            active_recipe: add_var(
                &parameters,
                VarRole::ActiveRecipe,
                Value::String(unit.active_recipe().to_string()),
            )?,
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
        };
        add_var(&parameters, VarRole::FillRate, Value::Float(unit.fill_rate()))?;
        add_var(
            &recipes,
            VarRole::RecipeCatalog,
            Value::StringArray(unit.catalog().as_slice().to_vec()),
        )?;
        add_var(&control, VarRole::Powered, Value::Bool(unit.powered()))?;
        add_var(
            &control,
            VarRole::RecipeSelect,
            Value::String(RECIPE_NONE.to_string()),
        )?;

        let tree = Arc::new(builder.finish());
        for spec in registry.specs() {
            debug!(
                subsystem = FILLER_SUBSYSTEM,
                id = %spec.id,
                kind = %spec.kind,
                access = ?spec.access,
                eng_unit = spec.eng_unit.unwrap_or("-"),
                "variable registered"
            );
        }
        info!(
            subsystem = FILLER_SUBSYSTEM,
            recipes = unit.catalog().len(),
            variables = registry.len(),
            nodes = tree.node_count(),
            "subsystem built"
        );

        Ok(Arc::new(Self {
            registry,
            tree,
            handles,
            state: Mutex::new(FillerState {
                unit,
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
            FILLER_SUBSYSTEM,
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

    /// Advance the unit one cycle, then republish derived fields.
    ///
    /// Same lock order as the line subsystem: unit state, then registry
    /// write guard.
    pub fn tick(&self) -> RegistryResult<()> {
        let mut state = self.state.lock();
        let dt_hours = self.tick_interval.as_secs_f64() / 3600.0;
        let FillerState { unit, rng } = &mut *state;
        unit.tick(&self.profile, dt_hours, rng);

        let mut batch = self.registry.begin_batch();
        batch.publish(self.handles.status, Value::Int32(unit.status().as_i32()))?;
        batch.publish(
            self.handles.active_recipe,
            Value::String(unit.active_recipe().to_string()),
        )?;
        batch.publish(self.handles.power_draw, Value::Float(unit.power_kw()))?;
        batch.publish(self.handles.bottle_count, Value::UInt32(unit.bottle_count()))?;
        batch.publish(
            self.handles.running_hours,
            Value::Double(unit.running_hours()),
        )?;
        batch.publish(self.handles.start_count, Value::UInt32(unit.start_count()))?;
        trace!(subsystem = FILLER_SUBSYSTEM, "update cycle published");
        Ok(())
    }

    /// Current snapshot, for the periodic status log.
    pub fn snapshot(&self) -> FillerSnapshot {
        self.state.lock().unit.snapshot()
    }
}

impl ControlSink for FillerSubsystem {
    fn apply(&self, key: VarKey, value: &Value) -> Result<(), WriteError> {
        let command = ControlCommand::decode(key, value)?;
        let mut state = self.state.lock();
        match command {
            ControlCommand::PowerFiller { on } => state.unit.set_powered(on),
            ControlCommand::SelectRecipe { name } => state.unit.select_recipe(&name)?,
            ControlCommand::SetFillRate { rate } => state.unit.set_fill_rate(rate),
            // Conveyor commands cannot resolve against this registry.
            _ => {
                return Err(WriteError::NotFound {
                    id: key.identifier(),
                });
            }
        }
        debug!(subsystem = FILLER_SUBSYSTEM, id = %key, "command applied");
        Ok(())
    }
}
