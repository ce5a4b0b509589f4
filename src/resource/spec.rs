//! Resource declarations

use std::fmt;
use std::sync::Arc;

use crate::broadcast::BroadcastConfig;
use crate::policy::Policy;
use crate::schema::{Changeset, RecordSchema, SchemaChangeset};
use crate::triggers::Trigger;

/// A declared resource: backing record type, policy, triggers and broadcast.
///
/// Immutable once built and shared by every request.
#[derive(Clone)]
pub struct ResourceSpec {
    name: String,
    schema: RecordSchema,
    policy: Arc<dyn Policy>,
    changeset: Arc<dyn Changeset>,
    filterable: Option<Vec<String>>,
    create_triggers: Vec<Trigger>,
    update_triggers: Vec<Trigger>,
    delete_triggers: Vec<Trigger>,
    broadcast: Option<BroadcastConfig>,
}

impl ResourceSpec {
    pub fn builder(name: impl Into<String>, schema: RecordSchema, policy: Arc<dyn Policy>) -> ResourceSpecBuilder {
        ResourceSpecBuilder {
            spec: ResourceSpec {
                name: name.into(),
                schema,
                policy,
                changeset: Arc::new(SchemaChangeset),
                filterable: None,
                create_triggers: Vec::new(),
                update_triggers: Vec::new(),
                delete_triggers: Vec::new(),
                broadcast: None,
            },
        }
    }

    /// Public resource name (used in broadcasts and logs)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn primary_key(&self) -> &str {
        &self.schema.primary_key
    }

    pub fn policy(&self) -> &dyn Policy {
        self.policy.as_ref()
    }

    pub fn changeset(&self) -> &dyn Changeset {
        self.changeset.as_ref()
    }

    /// Filter allow-list; `None` means every declared field
    pub fn filterable(&self) -> Option<&[String]> {
        self.filterable.as_deref()
    }

    pub fn create_triggers(&self) -> &[Trigger] {
        &self.create_triggers
    }

    pub fn update_triggers(&self) -> &[Trigger] {
        &self.update_triggers
    }

    pub fn delete_triggers(&self) -> &[Trigger] {
        &self.delete_triggers
    }

    pub fn broadcast(&self) -> Option<&BroadcastConfig> {
        self.broadcast.as_ref()
    }
}

impl fmt::Debug for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSpec")
            .field("name", &self.name)
            .field("schema", &self.schema.name)
            .field("policy", &self.policy.name())
            .field("filterable", &self.filterable)
            .field("create_triggers", &self.create_triggers.len())
            .field("update_triggers", &self.update_triggers.len())
            .field("delete_triggers", &self.delete_triggers.len())
            .field("broadcast", &self.broadcast)
            .finish()
    }
}

/// Builder for [`ResourceSpec`]
pub struct ResourceSpecBuilder {
    spec: ResourceSpec,
}

impl ResourceSpecBuilder {
    /// Restrict client filters to these fields
    pub fn filterable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.filterable = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn changeset(mut self, changeset: Arc<dyn Changeset>) -> Self {
        self.spec.changeset = changeset;
        self
    }

    pub fn on_create(mut self, trigger: Trigger) -> Self {
        self.spec.create_triggers.push(trigger);
        self
    }

    pub fn on_update(mut self, trigger: Trigger) -> Self {
        self.spec.update_triggers.push(trigger);
        self
    }

    pub fn on_delete(mut self, trigger: Trigger) -> Self {
        self.spec.delete_triggers.push(trigger);
        self
    }

    pub fn broadcast(mut self, config: BroadcastConfig) -> Self {
        self.spec.broadcast = Some(config);
        self
    }

    pub fn build(self) -> ResourceSpec {
        self.spec
    }
}
