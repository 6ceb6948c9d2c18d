//! Subsystem service façade.
//!
//! Bundles a [`VariableRegistry`] and its frozen [`ProcessTree`] behind
//! the three operations remote parties use: batched reads, batched
//! writes and one-level browse. Write commands are forwarded to the
//! owning subsystem through the [`ControlSink`] seam before the new
//! value is echoed into the registry, so a rejected command never
//! becomes visible as state.

use crate::error::{RegistryError, TreeError, WriteError};
use crate::registry::VariableRegistry;
use crate::tree::{BrowseEntry, NodeRef, ProcessTree};
use core::fmt;
use plant_common::role::VarKey;
use plant_common::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

// ─── Per-item status ────────────────────────────────────────────────

/// Outcome of one item inside a batched read or write.
///
/// Batches never fail as a whole at this layer; each slot carries its
/// own status so one bad identifier cannot mask the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpStatus {
    Good,
    NotFound,
    TypeMismatch,
    NotWritable,
    UnknownRecipe,
}

impl OpStatus {
    pub const fn is_good(self) -> bool {
        matches!(self, Self::Good)
    }
}

impl fmt::Display for OpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::NotFound => write!(f, "not found"),
            Self::TypeMismatch => write!(f, "type mismatch"),
            Self::NotWritable => write!(f, "not writable"),
            Self::UnknownRecipe => write!(f, "unknown recipe"),
        }
    }
}

impl From<&RegistryError> for OpStatus {
    fn from(err: &RegistryError) -> Self {
        match err {
            RegistryError::NotFound { .. } => Self::NotFound,
            RegistryError::TypeMismatch { .. } => Self::TypeMismatch,
            RegistryError::NotWritable { .. } => Self::NotWritable,
            RegistryError::AlreadyRegistered { .. } => Self::NotFound,
        }
    }
}

impl From<&WriteError> for OpStatus {
    fn from(err: &WriteError) -> Self {
        match err {
            WriteError::NotFound { .. } => Self::NotFound,
            WriteError::TypeMismatch { .. } => Self::TypeMismatch,
            WriteError::NotWritable { .. } => Self::NotWritable,
            WriteError::UnknownRecipe { .. } => Self::UnknownRecipe,
        }
    }
}

// ─── Read / write payloads ──────────────────────────────────────────

/// One slot of a batched read result. `value` and `timestamp` are set
/// only when `status` is good.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    pub status: OpStatus,
    pub value: Option<Value>,
    pub timestamp: Option<SystemTime>,
}

impl ReadResult {
    fn good(value: Value, timestamp: SystemTime) -> Self {
        Self {
            status: OpStatus::Good,
            value: Some(value),
            timestamp: Some(timestamp),
        }
    }

    fn bad(status: OpStatus) -> Self {
        Self {
            status,
            value: None,
            timestamp: None,
        }
    }
}

/// One slot of a batched write request.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub id: String,
    pub value: Value,
}

impl WriteRequest {
    pub fn new(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

// ─── Control sink ───────────────────────────────────────────────────

/// Receiver for accepted write commands.
///
/// The service validates identifier, access and value kind before
/// calling in; the sink only decides whether the command makes sense
/// for the equipment (e.g. a recipe name must exist in the catalog)
/// and applies it to the unit state.
pub trait ControlSink: Send + Sync {
    fn apply(&self, key: VarKey, value: &Value) -> Result<(), WriteError>;
}

// ─── Service ────────────────────────────────────────────────────────

/// Entry point of one subsystem, shared with pollers and dispatchers.
pub struct SubsystemService {
    name: String,
    registry: Arc<VariableRegistry>,
    tree: Arc<ProcessTree>,
    sink: Arc<dyn ControlSink>,
}

impl SubsystemService {
    pub fn new(
        name: impl Into<String>,
        registry: Arc<VariableRegistry>,
        tree: Arc<ProcessTree>,
        sink: Arc<dyn ControlSink>,
    ) -> Self {
        Self {
            name: name.into(),
            registry,
            tree,
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &Arc<VariableRegistry> {
        &self.registry
    }

    /// Root of this subsystem's process tree.
    pub fn root(&self) -> NodeRef {
        self.tree.root()
    }

    /// One browse level under `node`.
    pub fn browse(&self, node: &NodeRef) -> Result<Vec<BrowseEntry>, TreeError> {
        self.tree.browse(node)
    }

    /// Batched read. The result has one slot per requested identifier,
    /// in request order; all good slots come from the same registry
    /// snapshot.
    pub fn read_variables(&self, ids: &[String]) -> Vec<ReadResult> {
        self.registry
            .read_many(ids)
            .into_iter()
            .map(|slot| match slot {
                Ok((value, timestamp)) => ReadResult::good(value, timestamp),
                Err(err) => ReadResult::bad(OpStatus::from(&err)),
            })
            .collect()
    }

    /// Batched write. Each item is validated against the registry spec,
    /// forwarded to the control sink and, on acceptance, echoed into
    /// the registry so a follow-up read observes the commanded value
    /// immediately. One slot per request, in request order.
    pub fn write_variables(&self, requests: &[WriteRequest]) -> Vec<OpStatus> {
        requests
            .iter()
            .map(|request| {
                let status = self.write_one(request);
                if status.is_good() {
                    debug!(
                        subsystem = %self.name,
                        id = %request.id,
                        value = %request.value,
                        "write accepted"
                    );
                } else {
                    warn!(
                        subsystem = %self.name,
                        id = %request.id,
                        %status,
                        "write rejected"
                    );
                }
                status
            })
            .collect()
    }

    fn write_one(&self, request: &WriteRequest) -> OpStatus {
        let spec = match self.registry.spec_of(&request.id) {
            Ok(spec) => spec,
            Err(err) => return OpStatus::from(&err),
        };
        if !spec.access.is_writable() {
            return OpStatus::NotWritable;
        }
        if request.value.kind() != spec.kind {
            return OpStatus::TypeMismatch;
        }
        if let Err(err) = self.sink.apply(spec.key, &request.value) {
            return OpStatus::from(&err);
        }
        // Echo the accepted command so the new value is readable before
        // the next update cycle republishes derived state.
        match self.registry.set_external(&request.id, request.value.clone()) {
            Ok(()) => OpStatus::Good,
            Err(err) => OpStatus::from(&err),
        }
    }
}
