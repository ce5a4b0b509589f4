//! # Resources
//!
//! Declared resources and the registry the engine resolves them from. The
//! registry is built once at startup and never mutated afterwards.

mod errors;
mod spec;

pub use errors::{RegistryError, RegistryResult};
pub use spec::{ResourceSpec, ResourceSpecBuilder};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

/// Immutable mapping from resource name to spec
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: HashMap<String, Arc<ResourceSpec>>,
}

impl ResourceRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ResourceSpec>> {
        self.resources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Registered resource names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Collects specs, rejecting duplicates and inconsistent declarations
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    resources: HashMap<String, Arc<ResourceSpec>>,
}

impl RegistryBuilder {
    pub fn register(mut self, spec: ResourceSpec) -> RegistryResult<Self> {
        if self.resources.contains_key(spec.name()) {
            return Err(RegistryError::Duplicate(spec.name().to_string()));
        }

        if let Some(field) = spec
            .filterable()
            .and_then(|fields| fields.iter().find(|f| !spec.schema().has_field(f)))
        {
            return Err(RegistryError::UnknownFilterable {
                resource: spec.name().to_string(),
                field: field.clone(),
            });
        }

        debug!(resource = %spec.name(), policy = spec.policy().name(), "registered resource");
        self.resources.insert(spec.name().to_string(), Arc::new(spec));
        Ok(self)
    }

    pub fn build(self) -> ResourceRegistry {
        ResourceRegistry {
            resources: self.resources,
        }
    }
}
