//! Error types for discovery, polling and plant control

use plant_common::role::{UnitId, VarRole};
use plant_registry::{LinkError, OpStatus};
use thiserror::Error;

/// Errors from resolving a unit/role pair against a discovery index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// No candidate path for this unit/role exists in the index
    #[error("No addressable variable for {unit}.{role}")]
    Unresolved {
        /// Unit the lookup was for
        unit: UnitId,
        /// Role the lookup was for
        role: VarRole,
    },
}

/// Errors from one subsystem poll
///
/// Any of these marks the subsystem offline for the cycle; the
/// aggregation engine degrades the overview instead of failing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    /// The link itself failed
    #[error("Transport failure on {subsystem}: {source}")]
    TransportFailure {
        /// Subsystem name
        subsystem: String,
        #[source]
        source: LinkError,
    },

    /// The response had a different shape than the request
    #[error("Malformed response from {subsystem}: expected {expected} slots, got {actual}")]
    MalformedResponse {
        subsystem: String,
        expected: usize,
        actual: usize,
    },

    /// A core variable came back with a non-good status
    #[error("Unreadable variable on {subsystem}: {id} ({status})")]
    BadStatus {
        subsystem: String,
        /// Registry identifier
        id: String,
        status: OpStatus,
    },

    /// A core variable held a value outside its expected domain
    #[error("Undecodable reading on {subsystem}: {id}")]
    BadReading {
        subsystem: String,
        /// Registry identifier
        id: String,
    },
}

/// Errors from plant-wide control commands
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    /// Ordinal outside the discovered line
    #[error("No such conveyor: {ordinal}")]
    UnknownUnit {
        /// 1-based conveyor position
        ordinal: u8,
    },

    /// The response had a different shape than the request
    #[error("Malformed control response: expected {expected} statuses, got {actual}")]
    MalformedResponse { expected: usize, actual: usize },

    /// The link failed before any per-item status was produced
    #[error("Control transport failure: {0}")]
    Transport(#[from] LinkError),
}
