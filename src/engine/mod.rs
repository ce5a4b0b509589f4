//! # Engine
//!
//! Runs the five CRUD operations against a registered resource. Every call
//! follows the same pipeline:
//!
//! ```text
//! authorize -> compile (list/get) -> execute -> snapshot (mutations) -> dispatch
//! ```
//!
//! ## Invariants
//! - The policy runs, and may refuse, before any storage call
//! - The snapshot decision for an update is made before the policy is asked
//! - Triggers and broadcasts fire only after storage succeeds, never on failure
//! - Dispatch failures are logged and never change the operation's result

mod config;
mod errors;

pub use config::{ConfigError, EngineConfig};
pub use errors::{EngineError, EngineResult};

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::broadcast::{maybe_broadcast, ChangeKind, LoggingPubSub, PubSub};
use crate::policy::{Actor, Forbidden};
use crate::query::{Params, QueryCompiler, Queryable};
use crate::record::{Attrs, FieldValue, Record};
use crate::resource::{ResourceRegistry, ResourceSpec};
use crate::storage::StorageBackend;
use crate::triggers::{self, JobQueue, LoggingJobQueue, Trigger};

/// Policy-gated CRUD over registered resources.
///
/// Holds no per-request state; one engine serves any number of concurrent
/// callers.
#[derive(Clone)]
pub struct Engine {
    registry: Arc<ResourceRegistry>,
    config: EngineConfig,
    jobs: Arc<dyn JobQueue>,
    pubsub: Arc<dyn PubSub>,
}

impl Engine {
    /// Engine with default config, a logging job queue and no pub/sub
    pub fn new(registry: ResourceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            config: EngineConfig::default(),
            jobs: Arc::new(LoggingJobQueue),
            pubsub: Arc::new(LoggingPubSub),
        }
    }

    pub fn builder(registry: ResourceRegistry) -> EngineBuilder {
        EngineBuilder {
            engine: Self::new(registry),
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Look up a resource by name
    pub fn resource(&self, name: &str) -> EngineResult<Arc<ResourceSpec>> {
        self.registry
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownResource(name.to_string()))
    }

    /// List rows visible to the actor. An empty result is not an error.
    pub fn list(
        &self,
        store: &dyn StorageBackend,
        resource: &str,
        actor: &Actor,
        params: &Params,
    ) -> EngineResult<Vec<Record>> {
        let spec = self.resource(resource)?;
        debug!(resource = %resource, op = "list", role = %actor.role, "engine call");

        let scoped = spec.policy().for_list(base_query(&spec), actor, params, &spec);
        let query = self.compiler(&spec).compile_list(scoped, params);

        Ok(store.query(&query)?)
    }

    /// Fetch one row by identifier, within the actor's scope
    pub fn get(
        &self,
        store: &dyn StorageBackend,
        resource: &str,
        actor: &Actor,
        id: &str,
        params: &Params,
    ) -> EngineResult<Record> {
        let spec = self.resource(resource)?;
        debug!(resource = %resource, op = "get", id = %id, role = %actor.role, "engine call");

        let id = spec.schema().cast_id(id);
        let scoped = spec.policy().for_get(base_query(&spec), actor, &id, params, &spec);
        let query = self.compiler(&spec).compile_get(scoped, &id, params);

        first(store.query(&query)?)
    }

    pub fn create(
        &self,
        store: &dyn StorageBackend,
        resource: &str,
        actor: &Actor,
        attrs: Attrs,
        params: &Params,
    ) -> EngineResult<Record> {
        let spec = self.resource(resource)?;
        debug!(resource = %resource, op = "create", role = %actor.role, "engine call");

        let attrs = spec
            .policy()
            .for_create(actor, attrs, params, &spec)
            .map_err(|e| refused(&spec, "create", e))?;

        let record = spec
            .changeset()
            .cast(spec.schema(), &Record::new(), &attrs, Some(actor))
            .map_err(EngineError::ValidationFailed)?;

        let created = store.insert(spec.schema(), record)?;
        info!(resource = %resource, op = "create", id = %pk_of(&spec, &created), "record created");

        self.dispatch(&spec, ChangeKind::Created, spec.create_triggers(), None, Some(&created));
        Ok(created)
    }

    pub fn update(
        &self,
        store: &dyn StorageBackend,
        resource: &str,
        actor: &Actor,
        id: &str,
        attrs: Attrs,
        params: &Params,
    ) -> EngineResult<Record> {
        let spec = self.resource(resource)?;
        debug!(resource = %resource, op = "update", id = %id, role = %actor.role, "engine call");

        let snapshot = triggers::needs_snapshot(spec.update_triggers()) || spec.broadcast().is_some();
        let id = spec.schema().cast_id(id);

        let (scoped, attrs) = spec
            .policy()
            .for_update(base_query(&spec), actor, &id, attrs, params, &spec)
            .map_err(|e| refused(&spec, "update", e))?;

        let existing = first(store.query(&locate(&spec, scoped, &id))?)?;
        let before = snapshot.then(|| existing.clone());

        let changed = spec
            .changeset()
            .cast(spec.schema(), &existing, &attrs, Some(actor))
            .map_err(EngineError::ValidationFailed)?;

        let updated = store.update(spec.schema(), &existing, changed)?;
        info!(resource = %resource, op = "update", id = %id, snapshot, "record updated");

        self.dispatch(
            &spec,
            ChangeKind::Updated,
            spec.update_triggers(),
            before.as_ref(),
            Some(&updated),
        );
        Ok(updated)
    }

    pub fn delete(
        &self,
        store: &dyn StorageBackend,
        resource: &str,
        actor: &Actor,
        id: &str,
        params: &Params,
    ) -> EngineResult<Record> {
        let spec = self.resource(resource)?;
        debug!(resource = %resource, op = "delete", id = %id, role = %actor.role, "engine call");

        let id = spec.schema().cast_id(id);
        let scoped = spec
            .policy()
            .for_delete(base_query(&spec), actor, &id, params, &spec)
            .map_err(|e| refused(&spec, "delete", e))?;

        let existing = first(store.query(&locate(&spec, scoped, &id))?)?;
        let deleted = store.delete(spec.schema(), &existing)?;
        info!(resource = %resource, op = "delete", id = %id, "record deleted");

        self.dispatch(&spec, ChangeKind::Deleted, spec.delete_triggers(), Some(&deleted), None);
        Ok(deleted)
    }

    fn compiler<'a>(&self, spec: &'a ResourceSpec) -> QueryCompiler<'a> {
        QueryCompiler::new(spec.schema(), spec.filterable(), self.config.page_limits())
    }

    /// Enqueue jobs and broadcast after a successful mutation.
    ///
    /// Each failure is logged on its own; later triggers still run.
    fn dispatch(
        &self,
        spec: &ResourceSpec,
        kind: ChangeKind,
        triggers: &[Trigger],
        before: Option<&Record>,
        after: Option<&Record>,
    ) {
        for job in triggers::evaluate(triggers, before, after) {
            match self.jobs.enqueue(&job) {
                Ok(()) => debug!(resource = %spec.name(), action = %job.action, "job enqueued"),
                Err(e) => warn!(resource = %spec.name(), action = %job.action, error = %e, "job dispatch failed"),
            }
        }

        let id = after
            .or(before)
            .map(|record| pk_of(spec, record))
            .unwrap_or(FieldValue::Null);

        if let Err(e) = maybe_broadcast(
            self.pubsub.as_ref(),
            kind,
            spec.name(),
            &id,
            before,
            after,
            spec.broadcast(),
        ) {
            warn!(resource = %spec.name(), event = %kind, error = %e, "broadcast failed");
        }
    }
}

/// Configures an [`Engine`]
pub struct EngineBuilder {
    engine: Engine,
}

impl EngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.engine.config = config;
        self
    }

    pub fn job_queue(mut self, jobs: Arc<dyn JobQueue>) -> Self {
        self.engine.jobs = jobs;
        self
    }

    pub fn pubsub(mut self, pubsub: Arc<dyn PubSub>) -> Self {
        self.engine.pubsub = pubsub;
        self
    }

    pub fn build(self) -> Result<Engine, ConfigError> {
        self.engine.config.validate()?;
        Ok(self.engine)
    }
}

fn base_query(spec: &ResourceSpec) -> Queryable {
    Queryable::from_schema(spec.schema())
}

/// Narrow a policy-scoped query to the single row with this identifier
fn locate(spec: &ResourceSpec, scoped: Queryable, id: &FieldValue) -> Queryable {
    scoped.where_eq(spec.primary_key().to_string(), id.clone()).limit(1)
}

fn first(rows: Vec<Record>) -> EngineResult<Record> {
    rows.into_iter().next().ok_or(EngineError::NotFound)
}

fn pk_of(spec: &ResourceSpec, record: &Record) -> FieldValue {
    record.get(spec.primary_key()).cloned().unwrap_or(FieldValue::Null)
}

fn refused(spec: &ResourceSpec, op: &'static str, err: Forbidden) -> EngineError {
    debug!(resource = %spec.name(), op, policy = spec.policy().name(), reason = %err.reason, "policy refused");
    err.into()
}
