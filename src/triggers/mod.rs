//! # Trigger Evaluator
//!
//! Decides, from the static trigger declarations of a resource, whether a
//! mutation needs a before/after snapshot, and which jobs it dispatches.
//!
//! ## Invariants
//! - At most one job per trigger per mutation
//! - Job arguments are transport-safe scalars, arrays and plain objects
//! - Always-fire triggers with static arguments never force a snapshot

mod queue;
mod trigger;

pub use queue::{DispatchError, Job, JobQueue, LoggingJobQueue, MemoryJobQueue};
pub use trigger::{evaluate, needs_snapshot, ArgsProducer, JobArgs, RecordPredicate, Trigger};
