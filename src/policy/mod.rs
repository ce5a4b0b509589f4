//! # Policy Contract
//!
//! The authorization seam. Each resource is bound to one [`Policy`], which
//! scopes every read and write to what the actor may touch.
//!
//! ## Invariants
//! - Reads are scoped by restricting the queryable, never by filtering rows
//!   after the fact, so a row outside the scope is indistinguishable from a
//!   missing one
//! - A write refusal happens before any storage call
//! - Deny by default: a policy that overrides nothing sees nothing and may
//!   write nothing

mod actor;
mod builtin;
mod errors;

pub use actor::{Actor, ROLE_ANONYMOUS, ROLE_USER};
pub use builtin::{DenyAll, OwnedByActor, Public, PublicReadOwnerWrite};
pub use errors::{Forbidden, PolicyResult};

use crate::query::{Params, Queryable};
use crate::record::{Attrs, FieldValue};
use crate::resource::ResourceSpec;

/// Authorization strategy for one or more resources.
///
/// Policies are stateless and shared across concurrent requests. The default
/// method bodies deny everything; implementations override the phases they
/// allow.
pub trait Policy: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Restrict a list query to rows the actor may see
    fn for_list(&self, query: Queryable, _actor: &Actor, _params: &Params, _spec: &ResourceSpec) -> Queryable {
        query.none()
    }

    /// Restrict a single-row lookup. The engine adds its own primary key
    /// filter afterwards, so policies may ignore `id`.
    fn for_get(
        &self,
        query: Queryable,
        _actor: &Actor,
        _id: &FieldValue,
        _params: &Params,
        _spec: &ResourceSpec,
    ) -> Queryable {
        query.none()
    }

    /// Approve and possibly rewrite attributes for a new record
    fn for_create(&self, _actor: &Actor, _attrs: Attrs, _params: &Params, _spec: &ResourceSpec) -> PolicyResult<Attrs> {
        Err(Forbidden::denied())
    }

    /// Return the query locating the row to update, and the attributes to apply
    fn for_update(
        &self,
        _query: Queryable,
        _actor: &Actor,
        _id: &FieldValue,
        _attrs: Attrs,
        _params: &Params,
        _spec: &ResourceSpec,
    ) -> PolicyResult<(Queryable, Attrs)> {
        Err(Forbidden::denied())
    }

    /// Return the query locating the row to delete
    fn for_delete(
        &self,
        _query: Queryable,
        _actor: &Actor,
        _id: &FieldValue,
        _params: &Params,
        _spec: &ResourceSpec,
    ) -> PolicyResult<Queryable> {
        Err(Forbidden::denied())
    }
}
