//! Server-side error types.

use plant_registry::{RegistryError, TreeError};
use thiserror::Error;

/// Failure while building a subsystem (registry population or tree
/// construction). Build failures are startup-fatal; nothing here occurs
/// after a subsystem is running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("variable registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("process tree construction failed: {0}")]
    Tree(#[from] TreeError),
}

/// Result alias for subsystem construction.
pub type BuildResult<T> = Result<T, BuildError>;
