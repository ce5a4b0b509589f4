//! Storage collaborator errors

use thiserror::Error;

use crate::record::FieldErrors;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage failures surfaced to the engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    /// Storage-level constraint violations (uniqueness and the like)
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// The row to update or delete is no longer there
    #[error("Row not found in {0}")]
    Missing(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.into()]);
        StorageError::Validation(errors)
    }

    pub fn lock_poisoned() -> Self {
        StorageError::Backend("Lock poisoned".to_string())
    }
}
