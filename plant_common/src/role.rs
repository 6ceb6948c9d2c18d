//! Unit/role addressing.
//!
//! `VarKey` is the typed identity of a process variable: which unit it
//! belongs to and which functional role it plays. Keys are stored with the
//! variable at registration time and carried through the write-dispatch
//! path, so no layer ever reconstructs unit numbers by scanning identifier
//! strings. Wire identifiers are *derived* from keys, never parsed back:
//! `VarKey::new(UnitId::Conveyor(3), VarRole::Powered).identifier()` is
//! `"Conveyor3.Powered"`.

use crate::value::{AccessMode, ValueKind};
use core::fmt;
use serde::{Deserialize, Serialize};

// ─── UnitId ─────────────────────────────────────────────────────────

/// One physical equipment instance.
///
/// Conveyors are numbered 1-based along the line; the filler is a
/// singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitId {
    Conveyor(u8),
    Filler,
}

impl UnitId {
    /// Conveyor ordinal, if this is a conveyor.
    pub const fn conveyor_ordinal(&self) -> Option<u8> {
        match self {
            Self::Conveyor(n) => Some(*n),
            Self::Filler => None,
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conveyor(n) => write!(f, "Conveyor{n}"),
            Self::Filler => write!(f, "Filler"),
        }
    }
}

// ─── VarCategory ────────────────────────────────────────────────────

/// Folder a variable is grouped under in the process tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarCategory {
    Parameters,
    Recipes,
    Control,
    Diagnostics,
}

impl VarCategory {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Parameters => "Parameters",
            Self::Recipes => "Recipes",
            Self::Control => "Control",
            Self::Diagnostics => "Diagnostics",
        }
    }
}

impl fmt::Display for VarCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── VarRole ────────────────────────────────────────────────────────

/// Functional role of a variable within its unit.
///
/// Each role fixes the declared value kind, the external access mode and
/// the tree category, so registration cannot drift from the dispatch
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarRole {
    // ── Operating parameters ────────
    Status,
    Direction,
    Mode,
    PowerDraw,
    BottleCount,
    TargetSpeed,
    FillRate,
    ActiveRecipe,

    // ── Recipes ─────────────────────
    RecipeCatalog,

    // ── Control commands ────────────
    Powered,
    Automatic,
    RecipeSelect,

    // ── Diagnostics ─────────────────
    RunningHours,
    StartCount,
}

impl VarRole {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Direction => "Direction",
            Self::Mode => "Mode",
            Self::PowerDraw => "PowerDraw",
            Self::BottleCount => "BottleCount",
            Self::TargetSpeed => "TargetSpeed",
            Self::FillRate => "FillRate",
            Self::ActiveRecipe => "ActiveRecipe",
            Self::RecipeCatalog => "Catalog",
            Self::Powered => "Powered",
            Self::Automatic => "Automatic",
            Self::RecipeSelect => "RecipeSelect",
            Self::RunningHours => "RunningHours",
            Self::StartCount => "StartCount",
        }
    }

    /// Declared value kind for variables of this role.
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::Status | Self::Direction | Self::Mode => ValueKind::Int32,
            Self::PowerDraw | Self::TargetSpeed | Self::FillRate => ValueKind::Float,
            Self::BottleCount | Self::StartCount => ValueKind::UInt32,
            Self::RunningHours => ValueKind::Double,
            Self::ActiveRecipe | Self::RecipeSelect => ValueKind::String,
            Self::RecipeCatalog => ValueKind::StringArray,
            Self::Powered | Self::Automatic => ValueKind::Bool,
        }
    }

    /// External write permission for variables of this role.
    pub const fn access(self) -> AccessMode {
        match self {
            Self::Powered
            | Self::Automatic
            | Self::RecipeSelect
            | Self::TargetSpeed
            | Self::FillRate => AccessMode::ReadWrite,
            _ => AccessMode::ReadOnly,
        }
    }

    /// Tree folder this role is grouped under.
    pub const fn category(self) -> VarCategory {
        match self {
            Self::Status
            | Self::Direction
            | Self::Mode
            | Self::PowerDraw
            | Self::BottleCount
            | Self::TargetSpeed
            | Self::FillRate
            | Self::ActiveRecipe => VarCategory::Parameters,
            Self::RecipeCatalog => VarCategory::Recipes,
            Self::Powered | Self::Automatic | Self::RecipeSelect => VarCategory::Control,
            Self::RunningHours | Self::StartCount => VarCategory::Diagnostics,
        }
    }

    /// Engineering-unit label, where one applies.
    pub const fn eng_unit(self) -> Option<&'static str> {
        match self {
            Self::PowerDraw => Some("kW"),
            Self::TargetSpeed => Some("m/min"),
            Self::FillRate => Some("bottles/min"),
            Self::RunningHours => Some("h"),
            _ => None,
        }
    }
}

impl fmt::Display for VarRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── VarKey ─────────────────────────────────────────────────────────

/// Typed variable identity: `(unit, role)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarKey {
    pub unit: UnitId,
    pub role: VarRole,
}

impl VarKey {
    pub const fn new(unit: UnitId, role: VarRole) -> Self {
        Self { unit, role }
    }

    /// Deterministic wire identifier: `"{unit}.{role}"`.
    pub fn identifier(&self) -> String {
        format!("{}.{}", self.unit, self.role)
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.unit, self.role)
    }
}
