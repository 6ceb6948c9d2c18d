//! Transport seam between subsystems and remote consumers.
//!
//! [`SubsystemLink`] is the boundary the aggregation side programs
//! against; it carries the same three operations as the service façade
//! but every call can additionally fail with a transport error. The
//! in-process [`LoopbackLink`] is the production binding for the
//! single-process deployment and the test double for everything else.

use crate::error::{LinkError, TreeError};
use crate::service::{OpStatus, ReadResult, SubsystemService, WriteRequest};
use crate::tree::{BrowseEntry, NodeRef};
use std::sync::Arc;

/// Connection to one subsystem's service façade.
///
/// Implementations decide what "transport" means; the contract is only
/// that batched results keep request order and that per-item statuses
/// survive the trip. A failed call reports [`LinkError`] and leaves the
/// caller free to retry or mark the subsystem offline.
pub trait SubsystemLink: Send + Sync {
    /// Stable name of the subsystem behind this link.
    fn subsystem_name(&self) -> &str;

    /// Entry node of the subsystem's process tree.
    fn root(&self) -> Result<NodeRef, LinkError>;

    /// One browse level under `node`.
    fn browse(&self, node: &NodeRef) -> Result<Vec<BrowseEntry>, LinkError>;

    /// Batched read by registry identifier.
    fn read_variables(&self, ids: &[String]) -> Result<Vec<ReadResult>, LinkError>;

    /// Batched write of control values.
    fn write_variables(&self, requests: &[WriteRequest]) -> Result<Vec<OpStatus>, LinkError>;
}

/// In-process link: direct calls into a shared [`SubsystemService`].
pub struct LoopbackLink {
    service: Arc<SubsystemService>,
}

impl LoopbackLink {
    pub fn new(service: Arc<SubsystemService>) -> Self {
        Self { service }
    }
}

impl SubsystemLink for LoopbackLink {
    fn subsystem_name(&self) -> &str {
        self.service.name()
    }

    fn root(&self) -> Result<NodeRef, LinkError> {
        Ok(self.service.root())
    }

    fn browse(&self, node: &NodeRef) -> Result<Vec<BrowseEntry>, LinkError> {
        self.service.browse(node).map_err(|err| match err {
            TreeError::NodeNotFound { node } => LinkError::StaleNode { node },
            other => LinkError::Unreachable {
                subsystem: self.service.name().to_string(),
                reason: other.to_string(),
            },
        })
    }

    fn read_variables(&self, ids: &[String]) -> Result<Vec<ReadResult>, LinkError> {
        Ok(self.service.read_variables(ids))
    }

    fn write_variables(&self, requests: &[WriteRequest]) -> Result<Vec<OpStatus>, LinkError> {
        Ok(self.service.write_variables(requests))
    }
}
