//! Plant-wide aggregation.
//!
//! The engine folds the two per-side poll results into one fresh
//! [`PlantOverview`] per cycle. A failed side contributes zero metrics
//! and clears its online flag; the cycle itself never fails.

use crate::error::PollError;
use plant_common::snapshot::{ConveyorSnapshot, FillerSnapshot, PlantOverview};
use plant_common::status::{ConveyorStatus, FillerStatus, PlantStatus};
use std::time::SystemTime;
use tracing::warn;

/// Alarmed-conveyor count at which the plant escalates to GeneralAlarm.
const GENERAL_ALARM_CONVEYORS: usize = 3;

/// Stateless status and totals calculator.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    counter_tolerance: u32,
}

impl AggregationEngine {
    /// `counter_tolerance` is the slack allowed before the filler
    /// counter running ahead of the conveyor sum counts as an anomaly.
    pub fn new(counter_tolerance: u32) -> Self {
        Self { counter_tolerance }
    }

    /// Fold both poll results into a fresh overview.
    pub fn aggregate(
        &self,
        conveyors: Result<Vec<ConveyorSnapshot>, PollError>,
        filler: Result<FillerSnapshot, PollError>,
    ) -> PlantOverview {
        let (conveyors, conveyors_online) = match conveyors {
            Ok(snapshots) => (snapshots, true),
            Err(err) => {
                warn!(error = %err, "conveyor poll failed, aggregating without the line");
                (Vec::new(), false)
            }
        };
        let (filler, filler_online) = match filler {
            Ok(snapshot) => (Some(snapshot), true),
            Err(err) => {
                warn!(error = %err, "filler poll failed, aggregating without the filler");
                (None, false)
            }
        };

        let alarmed = count_status(&conveyors, ConveyorStatus::Alarm);
        let running = count_status(&conveyors, ConveyorStatus::Running);
        let filler_alarm = filler
            .as_ref()
            .is_some_and(|f| f.status == FillerStatus::Alarm);
        let filler_running = filler
            .as_ref()
            .is_some_and(|f| f.status == FillerStatus::Running);

        let status = if alarmed >= GENERAL_ALARM_CONVEYORS || filler_alarm {
            PlantStatus::GeneralAlarm
        } else if alarmed > 0 {
            PlantStatus::PartialAlarm
        } else if running > 0 || filler_running {
            PlantStatus::Operational
        } else {
            PlantStatus::Off
        };

        let conveyor_bottles: u64 = conveyors.iter().map(|c| u64::from(c.bottle_count)).sum();
        let filler_bottles = filler.as_ref().map_or(0, |f| u64::from(f.bottle_count));
        let total_bottles = u32::try_from(conveyor_bottles + filler_bottles).unwrap_or(u32::MAX);

        let total_power_kw = conveyors.iter().map(|c| c.power_kw).sum::<f32>()
            + filler.as_ref().map_or(0.0, |f| f.power_kw);

        // The counter comparison only means something when both sides
        // were actually read this cycle.
        let counter_anomaly = conveyors_online
            && filler_online
            && filler_bottles > conveyor_bottles + u64::from(self.counter_tolerance);

        let efficiency_pct = if conveyors.is_empty() {
            0.0
        } else {
            running as f32 / conveyors.len() as f32 * 100.0
        };

        PlantOverview {
            status,
            total_power_kw,
            total_bottles,
            counter_anomaly,
            efficiency_pct,
            conveyors_online,
            filler_online,
            updated_at: SystemTime::now(),
            conveyors,
            filler,
        }
    }
}

fn count_status(snapshots: &[ConveyorSnapshot], status: ConveyorStatus) -> usize {
    snapshots.iter().filter(|s| s.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_registry::LinkError;

    fn engine() -> AggregationEngine {
        AggregationEngine::new(10)
    }

    fn conveyor(id: u8, status: ConveyorStatus, power_kw: f32, bottle_count: u32) -> ConveyorSnapshot {
        ConveyorSnapshot {
            id,
            status,
            power_kw,
            bottle_count,
        }
    }

    fn filler(status: FillerStatus, power_kw: f32, bottle_count: u32) -> FillerSnapshot {
        FillerSnapshot {
            status,
            active_recipe: "Cola".to_string(),
            power_kw,
            bottle_count,
        }
    }

    fn poll_failure(subsystem: &str) -> PollError {
        PollError::TransportFailure {
            subsystem: subsystem.to_string(),
            source: LinkError::Unreachable {
                subsystem: subsystem.to_string(),
                reason: "injected".to_string(),
            },
        }
    }

    #[test]
    fn three_alarmed_conveyors_escalate_to_general_alarm() {
        let line = vec![
            conveyor(1, ConveyorStatus::Alarm, 0.0, 10),
            conveyor(2, ConveyorStatus::Alarm, 0.0, 10),
            conveyor(3, ConveyorStatus::Alarm, 0.0, 10),
            conveyor(4, ConveyorStatus::Running, 1.5, 10),
        ];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Running, 4.0, 30)));
        assert_eq!(overview.status, PlantStatus::GeneralAlarm);
    }

    #[test]
    fn filler_alarm_alone_is_a_general_alarm() {
        let line = vec![conveyor(1, ConveyorStatus::Running, 2.0, 5)];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Alarm, 0.0, 5)));
        assert_eq!(overview.status, PlantStatus::GeneralAlarm);
    }

    #[test]
    fn one_alarmed_conveyor_is_a_partial_alarm() {
        let line = vec![
            conveyor(1, ConveyorStatus::Alarm, 0.0, 3),
            conveyor(2, ConveyorStatus::Running, 1.1, 3),
            conveyor(3, ConveyorStatus::Off, 0.0, 0),
        ];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Standby, 0.5, 6)));
        assert_eq!(overview.status, PlantStatus::PartialAlarm);
    }

    #[test]
    fn running_units_without_alarms_are_operational() {
        let line = vec![
            conveyor(1, ConveyorStatus::Running, 1.0, 8),
            conveyor(2, ConveyorStatus::Running, 2.0, 8),
            conveyor(3, ConveyorStatus::Off, 0.0, 0),
            conveyor(4, ConveyorStatus::Off, 0.0, 0),
        ];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Standby, 0.5, 16)));
        assert_eq!(overview.status, PlantStatus::Operational);
        assert_eq!(overview.efficiency_pct, 50.0);
    }

    #[test]
    fn a_running_filler_alone_is_operational() {
        let line = vec![conveyor(1, ConveyorStatus::Off, 0.0, 0)];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Running, 5.0, 2)));
        assert_eq!(overview.status, PlantStatus::Operational);
    }

    #[test]
    fn everything_off_is_off() {
        let line = vec![
            conveyor(1, ConveyorStatus::Off, 0.0, 0),
            conveyor(2, ConveyorStatus::Off, 0.0, 0),
        ];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Off, 0.0, 0)));
        assert_eq!(overview.status, PlantStatus::Off);
        assert_eq!(overview.efficiency_pct, 0.0);
    }

    #[test]
    fn a_standby_filler_does_not_count_as_running() {
        let line = vec![conveyor(1, ConveyorStatus::Off, 0.0, 0)];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Standby, 0.5, 0)));
        assert_eq!(overview.status, PlantStatus::Off);
    }

    #[test]
    fn power_totals_sum_both_sides() {
        let line = vec![
            conveyor(1, ConveyorStatus::Running, 1.0, 0),
            conveyor(2, ConveyorStatus::Running, 2.0, 0),
            conveyor(3, ConveyorStatus::Off, 0.0, 0),
            conveyor(4, ConveyorStatus::Off, 0.0, 0),
            conveyor(5, ConveyorStatus::Off, 0.0, 0),
            conveyor(6, ConveyorStatus::Off, 0.0, 0),
        ];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Running, 4.5, 0)));
        assert!((overview.total_power_kw - 7.5).abs() < f32::EPSILON);
    }

    #[test]
    fn counter_anomaly_requires_strict_excess_over_the_tolerance() {
        let line: Vec<ConveyorSnapshot> = (1..=4)
            .map(|id| conveyor(id, ConveyorStatus::Running, 1.0, 25))
            .collect();

        // Conveyor sum 100, filler 108: within tolerance.
        let overview = engine().aggregate(
            Ok(line.clone()),
            Ok(filler(FillerStatus::Running, 4.0, 108)),
        );
        assert!(!overview.counter_anomaly);

        // Exactly at the boundary: still no anomaly.
        let overview = engine().aggregate(
            Ok(line.clone()),
            Ok(filler(FillerStatus::Running, 4.0, 110)),
        );
        assert!(!overview.counter_anomaly);

        let overview =
            engine().aggregate(Ok(line), Ok(filler(FillerStatus::Running, 4.0, 115)));
        assert!(overview.counter_anomaly);
    }

    #[test]
    fn a_failed_filler_side_degrades_without_failing_the_cycle() {
        let line = vec![
            conveyor(1, ConveyorStatus::Running, 1.2, 40),
            conveyor(2, ConveyorStatus::Off, 0.0, 2),
        ];
        let overview = engine().aggregate(Ok(line), Err(poll_failure("Filler")));
        assert!(overview.conveyors_online);
        assert!(!overview.filler_online);
        assert_eq!(overview.filler, None);
        assert_eq!(overview.status, PlantStatus::Operational);
        assert_eq!(overview.total_bottles, 42);
        assert!(!overview.counter_anomaly);
    }

    #[test]
    fn a_failed_conveyor_side_suppresses_the_anomaly_check() {
        let overview = engine().aggregate(
            Err(poll_failure("ConveyorLine")),
            Ok(filler(FillerStatus::Running, 5.0, 1000)),
        );
        assert!(!overview.conveyors_online);
        assert!(overview.filler_online);
        assert!(!overview.counter_anomaly);
        assert_eq!(overview.efficiency_pct, 0.0);
        assert_eq!(overview.total_bottles, 1000);
        assert_eq!(overview.status, PlantStatus::Operational);
    }

    #[test]
    fn bottle_total_saturates_instead_of_wrapping() {
        let line = vec![
            conveyor(1, ConveyorStatus::Running, 1.0, u32::MAX),
            conveyor(2, ConveyorStatus::Running, 1.0, u32::MAX),
        ];
        let overview = engine().aggregate(Ok(line), Ok(filler(FillerStatus::Running, 4.0, 10)));
        assert_eq!(overview.total_bottles, u32::MAX);
    }
}
