//! Caller identity

use std::collections::BTreeMap;

use serde_json::Value;

use crate::record::FieldValue;

pub const ROLE_ANONYMOUS: &str = "anonymous";
pub const ROLE_USER: &str = "user";

/// The caller identity passed through the pipeline.
///
/// The engine never looks inside; only policies and trigger predicates do.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// The authenticated user's identifier (None if anonymous)
    pub id: Option<FieldValue>,

    pub role: String,

    /// Custom claims from the authentication layer
    pub claims: BTreeMap<String, Value>,
}

impl Actor {
    /// Create an anonymous actor
    pub fn anonymous() -> Self {
        Self {
            id: None,
            role: ROLE_ANONYMOUS.to_string(),
            claims: BTreeMap::new(),
        }
    }

    /// Create an authenticated user
    pub fn user(id: impl Into<FieldValue>) -> Self {
        Self {
            id: Some(id.into()),
            role: ROLE_USER.to_string(),
            claims: BTreeMap::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_claim(mut self, key: impl Into<String>, value: Value) -> Self {
        self.claims.insert(key.into(), value);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::anonymous()
    }
}
