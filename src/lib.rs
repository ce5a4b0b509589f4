//! aerogate - policy-gated resource engine
//!
//! Executes list/get/create/update/delete against declared resources:
//! a policy scopes every read and approves every write, untrusted query
//! parameters compile into a bounded query, and successful mutations fire
//! declared jobs and change broadcasts with the right before/after state.

pub mod broadcast;
pub mod engine;
pub mod logging;
pub mod policy;
pub mod query;
pub mod record;
pub mod resource;
pub mod schema;
pub mod storage;
pub mod triggers;

pub use broadcast::{BroadcastConfig, ChangeEvent, ChangeKind, MemoryPubSub, PubSub};
pub use engine::{ConfigError, Engine, EngineBuilder, EngineConfig, EngineError, EngineResult};
pub use logging::init_tracing;
pub use policy::{Actor, DenyAll, Forbidden, OwnedByActor, Policy, Public, PublicReadOwnerWrite};
pub use query::{Params, Queryable};
pub use record::{Attrs, FieldErrors, FieldValue, Record};
pub use resource::{RegistryError, ResourceRegistry, ResourceSpec};
pub use schema::{FieldDef, FieldType, RecordSchema};
pub use storage::{InMemoryStorage, StorageBackend, StorageError};
pub use triggers::{Job, JobQueue, MemoryJobQueue, Trigger};
