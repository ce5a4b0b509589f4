//! Registry errors

use thiserror::Error;

/// Result type for registry construction
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Resource already registered: {0}")]
    Duplicate(String),

    #[error("Resource {resource} allows filtering on undeclared field: {field}")]
    UnknownFilterable { resource: String, field: String },
}
