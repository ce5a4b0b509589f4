//! Engine error taxonomy
//!
//! Error kinds an adaptor maps to responses:
//! - NotFound (404): no row matches identifier and scope
//! - Forbidden (403): the policy refused
//! - ValidationFailed (422): changeset or storage constraint failure
//! - Unauthorized (401): reserved for adaptors; the engine never raises it
//! - anything else (400)

use thiserror::Error;

use crate::policy::Forbidden;
use crate::record::FieldErrors;
use crate::storage::StorageError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Not found")]
    NotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {0:?}")]
    ValidationFailed(FieldErrors),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Stable error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UnknownResource(_) => "UNKNOWN_RESOURCE",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// HTTP status code an adaptor should use
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Forbidden(_) => 403,
            Self::ValidationFailed(_) => 422,
            Self::Unauthorized => 401,
            _ => 400,
        }
    }

    /// Field-level messages, for validation failures
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<Forbidden> for EngineError {
    fn from(err: Forbidden) -> Self {
        Self::Forbidden(err.reason)
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Validation(errors) => Self::ValidationFailed(errors),
            StorageError::Missing(_) => Self::NotFound,
            StorageError::Backend(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(EngineError::NotFound.status_code(), 404);
        assert_eq!(EngineError::Forbidden("no".into()).status_code(), 403);
        assert_eq!(EngineError::ValidationFailed(FieldErrors::new()).status_code(), 422);
        assert_eq!(EngineError::Unauthorized.status_code(), 401);
        assert_eq!(EngineError::UnknownResource("x".into()).status_code(), 400);
        assert_eq!(EngineError::Storage("down".into()).status_code(), 400);
    }

    #[test]
    fn test_storage_validation_becomes_validation_failed() {
        let err: EngineError = StorageError::field("email", "has already been taken").into();

        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert_eq!(
            err.field_errors().and_then(|e| e.get("email")),
            Some(&vec!["has already been taken".to_string()])
        );
    }

    #[test]
    fn test_forbidden_keeps_reason() {
        let err: EngineError = Forbidden::new("not yours").into();
        assert_eq!(err, EngineError::Forbidden("not yours".to_string()));
        assert_eq!(err.to_string(), "Forbidden: not yours");
    }
}
