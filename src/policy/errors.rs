//! Policy errors

use thiserror::Error;

/// Result type for policy decisions
pub type PolicyResult<T> = Result<T, Forbidden>;

/// A policy refused the operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Forbidden: {reason}")]
pub struct Forbidden {
    pub reason: String,
}

impl Forbidden {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Refusal used by deny-by-default policies
    pub fn denied() -> Self {
        Self::new("denied by policy")
    }

    pub fn authentication_required() -> Self {
        Self::new("authentication required")
    }
}
