//! Variable registry: identifier → typed, access-controlled cell.
//!
//! One registry exists per subsystem and owns every process variable the
//! subsystem exposes: current value, update timestamp, declared kind and
//! access mode. Registration happens once at subsystem build time; after
//! that only values and timestamps mutate.
//!
//! Locking discipline: all cells sit behind a single `RwLock`. The update
//! loop and the write-dispatch echo publish through a [`BatchWriter`] that
//! holds the write guard for the whole batch, so a concurrent reader never
//! observes a unit with a mix of old and new fields. Reads take the read
//! guard; [`read_many`](VariableRegistry::read_many) resolves a whole
//! request under one guard and therefore returns one consistent snapshot.

use crate::error::{RegistryError, RegistryResult};
use parking_lot::{RwLock, RwLockWriteGuard};
use plant_common::role::VarKey;
use plant_common::value::{AccessMode, Value, ValueKind};
use std::collections::HashMap;
use std::time::SystemTime;
use tracing::debug;

/// Immutable registration metadata of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSpec {
    /// Wire identifier, derived from the key.
    pub id: String,
    /// Typed identity stored at registration; the dispatch path routes on
    /// this instead of re-parsing identifier strings.
    pub key: VarKey,
    /// Full `/`-joined tree path, recorded for discovery.
    pub path: String,
    /// Declared value kind.
    pub kind: ValueKind,
    /// External write permission.
    pub access: AccessMode,
    /// Engineering-unit label for logs and tooling.
    pub eng_unit: Option<&'static str>,
}

impl VariableSpec {
    /// Spec for a role-derived variable: identifier, kind, access and
    /// engineering unit all come from the role.
    pub fn for_role(key: VarKey, path: String) -> Self {
        Self {
            id: key.identifier(),
            kind: key.role.kind(),
            access: key.role.access(),
            eng_unit: key.role.eng_unit(),
            key,
            path,
        }
    }
}

/// Opaque handle to a registered variable; valid for the lifetime of the
/// registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarHandle(usize);

struct Cell {
    spec: VariableSpec,
    value: Value,
    updated_at: SystemTime,
}

struct RegistryInner {
    cells: Vec<Cell>,
    by_id: HashMap<String, usize>,
}

/// Per-subsystem variable store.
pub struct VariableRegistry {
    inner: RwLock<RegistryInner>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                cells: Vec::new(),
                by_id: HashMap::new(),
            }),
        }
    }

    /// Register a variable with its initial value.
    ///
    /// # Errors
    ///
    /// - `AlreadyRegistered` if the identifier is taken
    /// - `TypeMismatch` if `initial` does not match the declared kind
    pub fn register(&self, spec: VariableSpec, initial: Value) -> RegistryResult<VarHandle> {
        if initial.kind() != spec.kind {
            return Err(RegistryError::TypeMismatch {
                id: spec.id.clone(),
                expected: spec.kind,
                actual: initial.kind(),
            });
        }

        let mut inner = self.inner.write();
        if inner.by_id.contains_key(&spec.id) {
            return Err(RegistryError::AlreadyRegistered { id: spec.id });
        }

        debug!(id = %spec.id, kind = %spec.kind, access = ?spec.access, "variable registered");

        let index = inner.cells.len();
        inner.by_id.insert(spec.id.clone(), index);
        inner.cells.push(Cell {
            spec,
            value: initial,
            updated_at: SystemTime::now(),
        });
        Ok(VarHandle(index))
    }

    /// Number of registered variables.
    pub fn len(&self) -> usize {
        self.inner.read().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registration metadata for one identifier.
    pub fn spec_of(&self, id: &str) -> RegistryResult<VariableSpec> {
        let inner = self.inner.read();
        let index = *inner
            .by_id
            .get(id)
            .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
        Ok(inner.cells[index].spec.clone())
    }

    /// All registration metadata, in registration order.
    pub fn specs(&self) -> Vec<VariableSpec> {
        self.inner
            .read()
            .cells
            .iter()
            .map(|cell| cell.spec.clone())
            .collect()
    }

    /// Current value and timestamp of one variable.
    ///
    /// # Errors
    ///
    /// `NotFound` if the identifier is unregistered, never a default.
    pub fn get(&self, id: &str) -> RegistryResult<(Value, SystemTime)> {
        let inner = self.inner.read();
        let index = *inner
            .by_id
            .get(id)
            .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
        let cell = &inner.cells[index];
        Ok((cell.value.clone(), cell.updated_at))
    }

    /// Resolve a batch of identifiers under one read guard.
    ///
    /// Order-preserving; each element fails independently. Because the
    /// guard spans the whole batch, the returned values form one
    /// consistent snapshot of the subsystem.
    pub fn read_many(&self, ids: &[String]) -> Vec<RegistryResult<(Value, SystemTime)>> {
        let inner = self.inner.read();
        ids.iter()
            .map(|id| {
                let index = *inner
                    .by_id
                    .get(id.as_str())
                    .ok_or_else(|| RegistryError::NotFound { id: id.clone() })?;
                let cell = &inner.cells[index];
                Ok((cell.value.clone(), cell.updated_at))
            })
            .collect()
    }

    /// External write: access mode and kind are both enforced.
    ///
    /// This is the path behind `WriteVariables`; the simulation publishes
    /// through [`begin_batch`](Self::begin_batch) instead, which skips the
    /// access check but never the type check.
    pub fn set_external(&self, id: &str, value: Value) -> RegistryResult<()> {
        let mut inner = self.inner.write();
        let index = *inner
            .by_id
            .get(id)
            .ok_or_else(|| RegistryError::NotFound { id: id.to_string() })?;
        let cell = &mut inner.cells[index];
        if !cell.spec.access.is_writable() {
            return Err(RegistryError::NotWritable {
                id: cell.spec.id.clone(),
            });
        }
        if value.kind() != cell.spec.kind {
            return Err(RegistryError::TypeMismatch {
                id: cell.spec.id.clone(),
                expected: cell.spec.kind,
                actual: value.kind(),
            });
        }
        cell.value = value;
        cell.updated_at = SystemTime::now();
        Ok(())
    }

    /// Start a publish batch, holding the write guard until the returned
    /// writer is dropped.
    pub fn begin_batch(&self) -> BatchWriter<'_> {
        BatchWriter {
            guard: self.inner.write(),
            stamp: SystemTime::now(),
        }
    }
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Write guard over the registry for one publish cycle.
///
/// All values published through one batch share a single timestamp, the
/// tick they were derived on.
pub struct BatchWriter<'a> {
    guard: RwLockWriteGuard<'a, RegistryInner>,
    stamp: SystemTime,
}

impl BatchWriter<'_> {
    /// Publish a simulation-derived value.
    ///
    /// Bypasses the access-mode check (read-only variables are exactly the
    /// ones the simulation owns) but still rejects kind mismatches.
    pub fn publish(&mut self, handle: VarHandle, value: Value) -> RegistryResult<()> {
        let cell = self
            .guard
            .cells
            .get_mut(handle.0)
            .ok_or_else(|| RegistryError::NotFound {
                id: format!("handle#{}", handle.0),
            })?;
        if value.kind() != cell.spec.kind {
            return Err(RegistryError::TypeMismatch {
                id: cell.spec.id.clone(),
                expected: cell.spec.kind,
                actual: value.kind(),
            });
        }
        cell.value = value;
        cell.updated_at = self.stamp;
        Ok(())
    }
}
