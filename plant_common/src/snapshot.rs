//! Per-unit snapshot DTOs and the aggregated plant overview.
//!
//! Snapshots are plain data the presentation surface consumes; the
//! aggregation engine recomputes a fresh [`PlantOverview`] every cycle
//! rather than patching the previous one, so a partially-updated record
//! can never be observed.

use crate::status::{ConveyorStatus, FillerStatus, PlantStatus};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Current readings of one conveyor unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConveyorSnapshot {
    /// 1-based position along the line.
    pub id: u8,
    pub status: ConveyorStatus,
    pub power_kw: f32,
    pub bottle_count: u32,
}

/// Current readings of the filler unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillerSnapshot {
    pub status: FillerStatus,
    pub active_recipe: String,
    pub power_kw: f32,
    pub bottle_count: u32,
}

/// Plant-wide state derived from all subsystem snapshots.
///
/// `conveyors_online` / `filler_online` clear when the corresponding
/// subsystem read failed; its metrics then contribute zero and its
/// snapshots are absent. Degradation is flagged, never silent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantOverview {
    pub status: PlantStatus,
    pub total_power_kw: f32,
    pub total_bottles: u32,
    pub counter_anomaly: bool,
    /// Share of conveyors currently running, in percent.
    pub efficiency_pct: f32,
    pub conveyors_online: bool,
    pub filler_online: bool,
    pub updated_at: SystemTime,
    pub conveyors: Vec<ConveyorSnapshot>,
    pub filler: Option<FillerSnapshot>,
}

impl fmt::Display for PlantOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={} power={:.2}kW bottles={} anomaly={} efficiency={:.0}%",
            self.status,
            self.total_power_kw,
            self.total_bottles,
            self.counter_anomaly,
            self.efficiency_pct,
        )?;
        if !self.conveyors_online {
            write!(f, " [conveyors offline]")?;
        }
        if !self.filler_online {
            write!(f, " [filler offline]")?;
        }
        Ok(())
    }
}
