//! Subsystem pollers: resolved read sets and snapshot decoding.
//!
//! Each poller resolves its read set once against a discovery index,
//! then issues one batched read per cycle and decodes the slots
//! positionally into snapshot DTOs. Core roles (Status, PowerDraw,
//! BottleCount) must resolve and decode; the filler's ActiveRecipe is
//! optional and degrades to the "None" sentinel when the remote does
//! not expose it or the slot comes back unusable.

use crate::error::{PollError, ResolveError};
use crate::resolver::PathResolver;
use plant_common::recipe::RECIPE_NONE;
use plant_common::role::{UnitId, VarRole};
use plant_common::snapshot::{ConveyorSnapshot, FillerSnapshot};
use plant_common::status::{ConveyorStatus, FillerStatus};
use plant_common::value::Value;
use plant_registry::{ReadResult, SubsystemLink};
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolved identifiers of one conveyor's read set.
struct ConveyorReadSet {
    ordinal: u8,
    status: String,
    power: String,
    bottles: String,
}

/// Cyclic reader of the conveyor line.
pub struct ConveyorPoller {
    link: Arc<dyn SubsystemLink>,
    subsystem: String,
    units: Vec<ConveyorReadSet>,
}

impl ConveyorPoller {
    /// Resolve the read set for every discovered conveyor.
    ///
    /// All three core roles of every unit must resolve; a line with no
    /// addressable units at all reports `Unresolved` for the first one.
    pub fn new(
        link: Arc<dyn SubsystemLink>,
        resolver: &PathResolver<'_>,
    ) -> Result<Self, ResolveError> {
        let count = resolver.conveyor_count();
        if count == 0 {
            return Err(ResolveError::Unresolved {
                unit: UnitId::Conveyor(1),
                role: VarRole::Status,
            });
        }

        let mut units = Vec::with_capacity(usize::from(count));
        for ordinal in 1..=count {
            let unit = UnitId::Conveyor(ordinal);
            units.push(ConveyorReadSet {
                ordinal,
                status: resolver.resolve(unit, VarRole::Status)?,
                power: resolver.resolve(unit, VarRole::PowerDraw)?,
                bottles: resolver.resolve(unit, VarRole::BottleCount)?,
            });
        }
        debug!(
            subsystem = link.subsystem_name(),
            units = units.len(),
            "conveyor read set resolved"
        );
        Ok(Self {
            subsystem: link.subsystem_name().to_string(),
            link,
            units,
        })
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// One batched read, decoded into per-unit snapshots.
    pub fn poll(&self) -> Result<Vec<ConveyorSnapshot>, PollError> {
        let ids: Vec<String> = self
            .units
            .iter()
            .flat_map(|set| {
                [set.status.clone(), set.power.clone(), set.bottles.clone()]
            })
            .collect();
        let readings = self.read(&ids)?;

        let mut snapshots = Vec::with_capacity(self.units.len());
        for (set, slots) in self.units.iter().zip(readings.chunks_exact(3)) {
            let raw = read_i32(&self.subsystem, &set.status, &slots[0])?;
            let status = ConveyorStatus::from_i32(raw)
                .ok_or_else(|| bad_reading(&self.subsystem, &set.status))?;
            snapshots.push(ConveyorSnapshot {
                id: set.ordinal,
                status,
                power_kw: read_f32(&self.subsystem, &set.power, &slots[1])?,
                bottle_count: read_u32(&self.subsystem, &set.bottles, &slots[2])?,
            });
        }
        trace!(
            subsystem = self.subsystem.as_str(),
            units = snapshots.len(),
            "conveyor poll complete"
        );
        Ok(snapshots)
    }

    fn read(&self, ids: &[String]) -> Result<Vec<ReadResult>, PollError> {
        batched_read(self.link.as_ref(), &self.subsystem, ids)
    }
}

/// Cyclic reader of the filler.
pub struct FillerPoller {
    link: Arc<dyn SubsystemLink>,
    subsystem: String,
    status: String,
    power: String,
    bottles: String,
    recipe: Option<String>,
}

impl FillerPoller {
    pub fn new(
        link: Arc<dyn SubsystemLink>,
        resolver: &PathResolver<'_>,
    ) -> Result<Self, ResolveError> {
        let unit = UnitId::Filler;
        let status = resolver.resolve(unit, VarRole::Status)?;
        let power = resolver.resolve(unit, VarRole::PowerDraw)?;
        let bottles = resolver.resolve(unit, VarRole::BottleCount)?;
        let recipe = resolver.resolve(unit, VarRole::ActiveRecipe).ok();
        if recipe.is_none() {
            debug!(
                subsystem = link.subsystem_name(),
                "ActiveRecipe not exposed, snapshots will carry the sentinel"
            );
        }
        Ok(Self {
            subsystem: link.subsystem_name().to_string(),
            link,
            status,
            power,
            bottles,
            recipe,
        })
    }

    /// One batched read, decoded into a snapshot.
    pub fn poll(&self) -> Result<FillerSnapshot, PollError> {
        let mut ids = vec![self.status.clone(), self.power.clone(), self.bottles.clone()];
        if let Some(recipe) = &self.recipe {
            ids.push(recipe.clone());
        }
        let readings = batched_read(self.link.as_ref(), &self.subsystem, &ids)?;

        let raw = read_i32(&self.subsystem, &self.status, &readings[0])?;
        let status = FillerStatus::from_i32(raw)
            .ok_or_else(|| bad_reading(&self.subsystem, &self.status))?;
        let active_recipe = match readings.get(3) {
            Some(slot) if slot.status.is_good() => slot
                .value
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or(RECIPE_NONE)
                .to_string(),
            _ => RECIPE_NONE.to_string(),
        };

        trace!(subsystem = self.subsystem.as_str(), "filler poll complete");
        Ok(FillerSnapshot {
            status,
            active_recipe,
            power_kw: read_f32(&self.subsystem, &self.power, &readings[1])?,
            bottle_count: read_u32(&self.subsystem, &self.bottles, &readings[2])?,
        })
    }
}

fn batched_read(
    link: &dyn SubsystemLink,
    subsystem: &str,
    ids: &[String],
) -> Result<Vec<ReadResult>, PollError> {
    let readings = link
        .read_variables(ids)
        .map_err(|source| PollError::TransportFailure {
            subsystem: subsystem.to_string(),
            source,
        })?;
    if readings.len() != ids.len() {
        return Err(PollError::MalformedResponse {
            subsystem: subsystem.to_string(),
            expected: ids.len(),
            actual: readings.len(),
        });
    }
    Ok(readings)
}

fn good_value<'a>(
    subsystem: &str,
    id: &str,
    slot: &'a ReadResult,
) -> Result<&'a Value, PollError> {
    if !slot.status.is_good() {
        return Err(PollError::BadStatus {
            subsystem: subsystem.to_string(),
            id: id.to_string(),
            status: slot.status,
        });
    }
    slot.value.as_ref().ok_or_else(|| bad_reading(subsystem, id))
}

fn read_i32(subsystem: &str, id: &str, slot: &ReadResult) -> Result<i32, PollError> {
    good_value(subsystem, id, slot)?
        .as_i32()
        .ok_or_else(|| bad_reading(subsystem, id))
}

fn read_u32(subsystem: &str, id: &str, slot: &ReadResult) -> Result<u32, PollError> {
    good_value(subsystem, id, slot)?
        .as_u32()
        .ok_or_else(|| bad_reading(subsystem, id))
}

fn read_f32(subsystem: &str, id: &str, slot: &ReadResult) -> Result<f32, PollError> {
    good_value(subsystem, id, slot)?
        .as_f32()
        .ok_or_else(|| bad_reading(subsystem, id))
}

fn bad_reading(subsystem: &str, id: &str) -> PollError {
    PollError::BadReading {
        subsystem: subsystem.to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Discovery;
    use plant_common::config::{ConveyorProfile, FillerConfig, FillerProfile, LineConfig};
    use plant_common::role::VarKey;
    use plant_registry::{
        BrowseEntry, ControlSink, LinkError, LoopbackLink, NodeRef, OpStatus, SubsystemService,
        TreeBuilder, VariableRegistry, VariableSpec, WriteError, WriteRequest,
    };
    use plant_server::{ConveyorLineSubsystem, FillerSubsystem};

    fn steady_line(count: u8) -> LineConfig {
        LineConfig {
            conveyor_count: count,
            update_interval_ms: 2000,
            profile: ConveyorProfile {
                alarm_probability: 0.0,
                bottle_probability: 1.0,
                ..ConveyorProfile::default()
            },
        }
    }

    fn steady_filler() -> FillerConfig {
        FillerConfig {
            update_interval_ms: 2000,
            profile: FillerProfile {
                alarm_probability: 0.0,
                run_probability: 1.0,
                bottle_probability: 1.0,
                ..FillerProfile::default()
            },
        }
    }

    fn discovered(link: &dyn SubsystemLink) -> Discovery {
        let mut discovery = Discovery::new();
        discovery.walk(link, 4).expect("walk");
        discovery
    }

    #[test]
    fn conveyor_poller_decodes_the_line() {
        let line = ConveyorLineSubsystem::build(&steady_line(3), 7).expect("build");
        line.service()
            .write_variables(&[WriteRequest::new("Conveyor2.Powered", Value::Bool(true))]);
        line.tick().expect("tick");

        let link: Arc<dyn SubsystemLink> = Arc::new(LoopbackLink::new(line.service()));
        let discovery = discovered(link.as_ref());
        let poller = ConveyorPoller::new(link, &discovery.resolver()).expect("poller");
        assert_eq!(poller.unit_count(), 3);

        let snapshots = poller.poll().expect("poll");
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].status, ConveyorStatus::Off);
        assert_eq!(snapshots[1].status, ConveyorStatus::Running);
        assert_eq!(snapshots[1].bottle_count, 1);
        assert!(snapshots[1].power_kw >= 1.0);
        assert_eq!(snapshots[2].bottle_count, 0);
    }

    #[test]
    fn filler_poller_reports_recipe_and_counters() {
        let filler = FillerSubsystem::build(&steady_filler(), 9).expect("build");
        filler.service().write_variables(&[
            WriteRequest::new("Filler.Powered", Value::Bool(true)),
            WriteRequest::new("Filler.RecipeSelect", Value::String("Cola".into())),
        ]);
        filler.tick().expect("tick");

        let link: Arc<dyn SubsystemLink> = Arc::new(LoopbackLink::new(filler.service()));
        let discovery = discovered(link.as_ref());
        let poller = FillerPoller::new(link, &discovery.resolver()).expect("poller");

        let snapshot = poller.poll().expect("poll");
        assert_eq!(snapshot.status, FillerStatus::Running);
        assert_eq!(snapshot.active_recipe, "Cola");
        assert_eq!(snapshot.bottle_count, 1);
        assert!(snapshot.power_kw >= 3.0);
    }

    #[test]
    fn empty_index_yields_unresolved() {
        let line = ConveyorLineSubsystem::build(&steady_line(1), 1).expect("build");
        let link: Arc<dyn SubsystemLink> = Arc::new(LoopbackLink::new(line.service()));
        let discovery = Discovery::new();
        let result = ConveyorPoller::new(link, &discovery.resolver());
        assert!(matches!(
            result,
            Err(ResolveError::Unresolved {
                unit: UnitId::Conveyor(1),
                role: VarRole::Status,
            })
        ));
    }

    struct RejectWrites;

    impl ControlSink for RejectWrites {
        fn apply(&self, key: VarKey, _value: &Value) -> Result<(), WriteError> {
            Err(WriteError::NotFound {
                id: key.identifier(),
            })
        }
    }

    /// A filler that never registered ActiveRecipe.
    fn sparse_filler_service() -> Arc<SubsystemService> {
        let registry = Arc::new(VariableRegistry::new());
        let mut builder = TreeBuilder::new("Filler", "Filler");
        let root = builder.root();
        let parameters = builder
            .add_folder(&root, "Filler.Parameters", "Parameters")
            .expect("folder");
        for (role, initial) in [
            (VarRole::Status, Value::Int32(FillerStatus::Standby.as_i32())),
            (VarRole::PowerDraw, Value::Float(0.5)),
            (VarRole::BottleCount, Value::UInt32(4)),
        ] {
            let key = VarKey::new(UnitId::Filler, role);
            let handle = registry
                .register(
                    VariableSpec::for_role(key, format!("Filler/Parameters/{}", role.name())),
                    initial,
                )
                .expect("register");
            builder
                .add_variable(&parameters, &key.identifier(), role.name(), handle)
                .expect("variable");
        }
        Arc::new(SubsystemService::new(
            "Filler",
            registry,
            Arc::new(builder.finish()),
            Arc::new(RejectWrites),
        ))
    }

    #[test]
    fn missing_active_recipe_degrades_to_the_sentinel() {
        let link: Arc<dyn SubsystemLink> = Arc::new(LoopbackLink::new(sparse_filler_service()));
        let discovery = discovered(link.as_ref());
        let poller = FillerPoller::new(link, &discovery.resolver()).expect("poller");

        let snapshot = poller.poll().expect("poll");
        assert_eq!(snapshot.active_recipe, RECIPE_NONE);
        assert_eq!(snapshot.status, FillerStatus::Standby);
        assert_eq!(snapshot.bottle_count, 4);
    }

    struct ShortResponseLink {
        inner: LoopbackLink,
    }

    impl SubsystemLink for ShortResponseLink {
        fn subsystem_name(&self) -> &str {
            self.inner.subsystem_name()
        }

        fn root(&self) -> Result<NodeRef, LinkError> {
            self.inner.root()
        }

        fn browse(&self, node: &NodeRef) -> Result<Vec<BrowseEntry>, LinkError> {
            self.inner.browse(node)
        }

        fn read_variables(&self, ids: &[String]) -> Result<Vec<ReadResult>, LinkError> {
            let mut readings = self.inner.read_variables(ids)?;
            readings.pop();
            Ok(readings)
        }

        fn write_variables(&self, requests: &[WriteRequest]) -> Result<Vec<OpStatus>, LinkError> {
            self.inner.write_variables(requests)
        }
    }

    #[test]
    fn short_responses_are_reported_as_malformed() {
        let line = ConveyorLineSubsystem::build(&steady_line(2), 3).expect("build");
        let link: Arc<dyn SubsystemLink> = Arc::new(ShortResponseLink {
            inner: LoopbackLink::new(line.service()),
        });
        let discovery = discovered(link.as_ref());
        let poller = ConveyorPoller::new(link, &discovery.resolver()).expect("poller");

        let result = poller.poll();
        assert!(matches!(
            result,
            Err(PollError::MalformedResponse {
                expected: 6,
                actual: 5,
                ..
            })
        ));
    }
}
