//! Error types for registry, tree and link operations

use plant_common::value::ValueKind;
use thiserror::Error;

/// Errors that can occur during variable registry operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// A variable with this identifier is already registered
    #[error("Variable already registered: {id}")]
    AlreadyRegistered {
        /// Variable identifier
        id: String,
    },

    /// No variable registered under this identifier
    #[error("Variable not found: {id}")]
    NotFound {
        /// Variable identifier
        id: String,
    },

    /// Value type disagrees with the declared kind
    #[error("Type mismatch on {id}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Variable identifier
        id: String,
        /// Declared kind
        expected: ValueKind,
        /// Kind of the offered value
        actual: ValueKind,
    },

    /// External write attempted on a read-only variable
    #[error("Variable is not writable: {id}")]
    NotWritable {
        /// Variable identifier
        id: String,
    },
}

/// Result type for variable registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while building or browsing a process tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    /// Two siblings would share a name
    #[error("Duplicate child name under {parent}: {name}")]
    DuplicateName {
        /// Parent node id
        parent: String,
        /// Offending child name
        name: String,
    },

    /// A node with this id already exists somewhere in the tree
    #[error("Duplicate node id: {id}")]
    DuplicateId {
        /// Offending node id
        id: String,
    },

    /// Referenced node does not exist
    #[error("Node not found: {node}")]
    NodeNotFound {
        /// Node id
        node: String,
    },

    /// Children can only be attached to folders and objects
    #[error("Node is not a container: {node}")]
    NotAContainer {
        /// Node id
        node: String,
    },
}

/// Errors surfaced by a subsystem link (the transport seam)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    /// The remote subsystem could not be reached
    #[error("Subsystem {subsystem} unreachable: {reason}")]
    Unreachable {
        /// Subsystem name
        subsystem: String,
        /// Transport-level reason
        reason: String,
    },

    /// A browse referenced a node the remote no longer has
    #[error("Remote node not found: {node}")]
    StaleNode {
        /// Node id
        node: String,
    },
}

/// Errors raised by the write-dispatch path behind the service.
///
/// The service maps these onto per-item statuses; nothing here ever
/// aborts a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    /// No control target for this identifier
    #[error("No control target for: {id}")]
    NotFound {
        /// Variable identifier
        id: String,
    },

    /// Value type does not fit the control target
    #[error("Type mismatch on {id}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Variable identifier
        id: String,
        /// Expected kind
        expected: ValueKind,
        /// Kind of the offered value
        actual: ValueKind,
    },

    /// The target accepts no external writes
    #[error("Control target is not writable: {id}")]
    NotWritable {
        /// Variable identifier
        id: String,
    },

    /// Recipe name is not in the fixed catalog
    #[error("Unknown recipe: {name}")]
    UnknownRecipe {
        /// Offered recipe name
        name: String,
    },
}
