//! Equipment and plant state enums.
//!
//! All states are `#[repr(u8)]` and travel on the wire as `Int32`
//! variables; [`from_i32`](ConveyorStatus::from_i32) is the decode path
//! used by pollers. Unknown discriminants decode to `None` rather than a
//! default so a misbehaving peer is visible instead of silently `Off`.

use core::fmt;
use serde::{Deserialize, Serialize};

// ─── ConveyorStatus ─────────────────────────────────────────────────

/// Operational state of one conveyor unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConveyorStatus {
    Off = 0,
    Running = 1,
    Alarm = 2,
}

impl ConveyorStatus {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Running),
            2 => Some(Self::Alarm),
            _ => None,
        }
    }

    pub const fn from_i32(value: i32) -> Option<Self> {
        if value < 0 || value > u8::MAX as i32 {
            return None;
        }
        Self::from_u8(value as u8)
    }

    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl Default for ConveyorStatus {
    fn default() -> Self {
        Self::Off
    }
}

impl fmt::Display for ConveyorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::Running => write!(f, "Running"),
            Self::Alarm => write!(f, "Alarm"),
        }
    }
}

// ─── FillerStatus ───────────────────────────────────────────────────

/// Operational state of the filler unit.
///
/// `Standby` is powered-but-idle: the unit draws standby power without
/// producing bottles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FillerStatus {
    Off = 0,
    Standby = 1,
    Running = 2,
    Alarm = 3,
}

impl FillerStatus {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Standby),
            2 => Some(Self::Running),
            3 => Some(Self::Alarm),
            _ => None,
        }
    }

    pub const fn from_i32(value: i32) -> Option<Self> {
        if value < 0 || value > u8::MAX as i32 {
            return None;
        }
        Self::from_u8(value as u8)
    }

    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl Default for FillerStatus {
    fn default() -> Self {
        Self::Off
    }
}

impl fmt::Display for FillerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::Standby => write!(f, "Standby"),
            Self::Running => write!(f, "Running"),
            Self::Alarm => write!(f, "Alarm"),
        }
    }
}

// ─── PlantStatus ────────────────────────────────────────────────────

/// Plant-wide status derived by the aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlantStatus {
    Off = 0,
    Operational = 1,
    PartialAlarm = 2,
    GeneralAlarm = 3,
}

impl PlantStatus {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Operational),
            2 => Some(Self::PartialAlarm),
            3 => Some(Self::GeneralAlarm),
            _ => None,
        }
    }
}

impl Default for PlantStatus {
    fn default() -> Self {
        Self::Off
    }
}

impl fmt::Display for PlantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::Operational => write!(f, "Operational"),
            Self::PartialAlarm => write!(f, "PartialAlarm"),
            Self::GeneralAlarm => write!(f, "GeneralAlarm"),
        }
    }
}

// ─── RunDirection ───────────────────────────────────────────────────

/// Belt travel direction of a conveyor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RunDirection {
    Forward = 0,
    Reverse = 1,
}

impl RunDirection {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl Default for RunDirection {
    fn default() -> Self {
        Self::Forward
    }
}

// ─── ControlMode ────────────────────────────────────────────────────

/// Automatic/manual operating mode of a conveyor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlMode {
    Automatic = 0,
    Manual = 1,
}

impl ControlMode {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Mode implied by the `Automatic` control flag.
    pub const fn from_flag(automatic: bool) -> Self {
        if automatic { Self::Automatic } else { Self::Manual }
    }
}

impl Default for ControlMode {
    fn default() -> Self {
        Self::Automatic
    }
}
