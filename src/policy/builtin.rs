//! Reference policies

use crate::query::{Params, Queryable};
use crate::record::{Attrs, FieldValue};
use crate::resource::ResourceSpec;

use super::{Actor, Forbidden, Policy, PolicyResult};

/// Sees nothing, writes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl Policy for DenyAll {
    fn name(&self) -> &'static str {
        "deny_all"
    }
}

/// No restriction at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Public;

impl Policy for Public {
    fn name(&self) -> &'static str {
        "public"
    }

    fn for_list(&self, query: Queryable, _actor: &Actor, _params: &Params, _spec: &ResourceSpec) -> Queryable {
        query
    }

    fn for_get(
        &self,
        query: Queryable,
        _actor: &Actor,
        _id: &FieldValue,
        _params: &Params,
        _spec: &ResourceSpec,
    ) -> Queryable {
        query
    }

    fn for_create(&self, _actor: &Actor, attrs: Attrs, _params: &Params, _spec: &ResourceSpec) -> PolicyResult<Attrs> {
        Ok(attrs)
    }

    fn for_update(
        &self,
        query: Queryable,
        _actor: &Actor,
        _id: &FieldValue,
        attrs: Attrs,
        _params: &Params,
        _spec: &ResourceSpec,
    ) -> PolicyResult<(Queryable, Attrs)> {
        Ok((query, attrs))
    }

    fn for_delete(
        &self,
        query: Queryable,
        _actor: &Actor,
        _id: &FieldValue,
        _params: &Params,
        _spec: &ResourceSpec,
    ) -> PolicyResult<Queryable> {
        Ok(query)
    }
}

/// Rows belong to the actor whose id is stored in `owner_field`.
///
/// - Reads only see the actor's rows; anonymous actors see none
/// - Creates stamp `owner_field` with the actor's id
/// - Updates and deletes are scoped to the actor's rows and the identifier
/// - Attributes may not hand a row to a different owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedByActor {
    owner_field: String,
}

impl OwnedByActor {
    pub fn new(owner_field: impl Into<String>) -> Self {
        Self {
            owner_field: owner_field.into(),
        }
    }

    pub fn owner_field(&self) -> &str {
        &self.owner_field
    }

    fn scope(&self, query: Queryable, actor: &Actor) -> Queryable {
        match &actor.id {
            Some(id) => query.where_eq(self.owner_field.clone(), id.clone()),
            None => query.none(),
        }
    }

    fn owner_id<'a>(&self, actor: &'a Actor) -> PolicyResult<&'a FieldValue> {
        actor.id.as_ref().ok_or_else(Forbidden::authentication_required)
    }

    fn check_owner_unchanged(&self, attrs: &Attrs, owner: &FieldValue) -> PolicyResult<()> {
        match attrs.get(&self.owner_field) {
            Some(value) if !value.loose_eq(owner) => Err(Forbidden::new(format!(
                "cannot assign {} to another actor",
                self.owner_field
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for OwnedByActor {
    fn default() -> Self {
        Self::new("user_id")
    }
}

impl Policy for OwnedByActor {
    fn name(&self) -> &'static str {
        "owned_by_actor"
    }

    fn for_list(&self, query: Queryable, actor: &Actor, _params: &Params, _spec: &ResourceSpec) -> Queryable {
        self.scope(query, actor)
    }

    fn for_get(
        &self,
        query: Queryable,
        actor: &Actor,
        _id: &FieldValue,
        _params: &Params,
        _spec: &ResourceSpec,
    ) -> Queryable {
        self.scope(query, actor)
    }

    fn for_create(&self, actor: &Actor, mut attrs: Attrs, _params: &Params, _spec: &ResourceSpec) -> PolicyResult<Attrs> {
        let owner = self.owner_id(actor)?;
        attrs.insert(self.owner_field.clone(), owner.clone());
        Ok(attrs)
    }

    fn for_update(
        &self,
        query: Queryable,
        actor: &Actor,
        id: &FieldValue,
        attrs: Attrs,
        _params: &Params,
        spec: &ResourceSpec,
    ) -> PolicyResult<(Queryable, Attrs)> {
        let owner = self.owner_id(actor)?;
        self.check_owner_unchanged(&attrs, owner)?;

        let query = self
            .scope(query, actor)
            .where_eq(spec.primary_key().to_string(), id.clone());
        Ok((query, attrs))
    }

    fn for_delete(
        &self,
        query: Queryable,
        actor: &Actor,
        id: &FieldValue,
        _params: &Params,
        spec: &ResourceSpec,
    ) -> PolicyResult<Queryable> {
        self.owner_id(actor)?;

        Ok(self
            .scope(query, actor)
            .where_eq(spec.primary_key().to_string(), id.clone()))
    }
}

/// Anyone may read; writes behave like [`OwnedByActor`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublicReadOwnerWrite {
    owner: OwnedByActor,
}

impl PublicReadOwnerWrite {
    pub fn new(owner_field: impl Into<String>) -> Self {
        Self {
            owner: OwnedByActor::new(owner_field),
        }
    }
}

impl Policy for PublicReadOwnerWrite {
    fn name(&self) -> &'static str {
        "public_read_owner_write"
    }

    fn for_list(&self, query: Queryable, _actor: &Actor, _params: &Params, _spec: &ResourceSpec) -> Queryable {
        query
    }

    fn for_get(
        &self,
        query: Queryable,
        _actor: &Actor,
        _id: &FieldValue,
        _params: &Params,
        _spec: &ResourceSpec,
    ) -> Queryable {
        query
    }

    fn for_create(&self, actor: &Actor, attrs: Attrs, params: &Params, spec: &ResourceSpec) -> PolicyResult<Attrs> {
        self.owner.for_create(actor, attrs, params, spec)
    }

    fn for_update(
        &self,
        query: Queryable,
        actor: &Actor,
        id: &FieldValue,
        attrs: Attrs,
        params: &Params,
        spec: &ResourceSpec,
    ) -> PolicyResult<(Queryable, Attrs)> {
        self.owner.for_update(query, actor, id, attrs, params, spec)
    }

    fn for_delete(
        &self,
        query: Queryable,
        actor: &Actor,
        id: &FieldValue,
        params: &Params,
        spec: &ResourceSpec,
    ) -> PolicyResult<Queryable> {
        self.owner.for_delete(query, actor, id, params, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterExpr;
    use crate::schema::{FieldDef, FieldType, RecordSchema};
    use std::sync::Arc;

    fn spec(policy: impl Policy + 'static) -> ResourceSpec {
        ResourceSpec::builder(
            "posts",
            RecordSchema::new("posts")
                .with_field("title", FieldDef::required(FieldType::String))
                .with_field("user_id", FieldDef::optional(FieldType::Int)),
            Arc::new(policy),
        )
        .build()
    }

    fn filters(query: &Queryable) -> Vec<FilterExpr> {
        query.filters().cloned().collect()
    }

    #[test]
    fn test_deny_all_defaults() {
        let spec = spec(DenyAll);
        let actor = Actor::user(1);
        let params = Params::new();
        let base = Queryable::new("posts");

        assert!(DenyAll.for_list(base.clone(), &actor, &params, &spec).is_never());
        assert!(DenyAll
            .for_get(base.clone(), &actor, &FieldValue::Int(1), &params, &spec)
            .is_never());
        assert_eq!(
            DenyAll.for_create(&actor, Attrs::new(), &params, &spec),
            Err(Forbidden::denied())
        );
        assert!(DenyAll
            .for_update(base.clone(), &actor, &FieldValue::Int(1), Attrs::new(), &params, &spec)
            .is_err());
        assert!(DenyAll
            .for_delete(base, &actor, &FieldValue::Int(1), &params, &spec)
            .is_err());
    }

    #[test]
    fn test_public_is_identity() {
        let spec = spec(Public);
        let base = Queryable::new("posts");
        let mut attrs = Attrs::new();
        attrs.insert("title".to_string(), "hi".into());

        assert_eq!(Public.for_list(base.clone(), &Actor::anonymous(), &Params::new(), &spec), base);
        assert_eq!(
            Public.for_create(&Actor::anonymous(), attrs.clone(), &Params::new(), &spec),
            Ok(attrs)
        );
    }

    #[test]
    fn test_owned_scopes_reads() {
        let policy = OwnedByActor::default();
        let spec = spec(policy.clone());

        let scoped = policy.for_list(Queryable::new("posts"), &Actor::user(7), &Params::new(), &spec);
        assert_eq!(filters(&scoped), vec![FilterExpr::eq("user_id", 7)]);

        let anon = policy.for_list(Queryable::new("posts"), &Actor::anonymous(), &Params::new(), &spec);
        assert!(anon.is_never());
    }

    #[test]
    fn test_owned_create_stamps_owner() {
        let policy = OwnedByActor::default();
        let spec = spec(policy.clone());
        let mut attrs = Attrs::new();
        attrs.insert("user_id".to_string(), FieldValue::Int(99));

        let attrs = policy
            .for_create(&Actor::user(7), attrs, &Params::new(), &spec)
            .unwrap();

        assert_eq!(attrs.get("user_id"), Some(&FieldValue::Int(7)));
        assert_eq!(
            policy.for_create(&Actor::anonymous(), Attrs::new(), &Params::new(), &spec),
            Err(Forbidden::authentication_required())
        );
    }

    #[test]
    fn test_owned_update_scopes_by_owner_and_id() {
        let policy = OwnedByActor::default();
        let spec = spec(policy.clone());

        let (query, _) = policy
            .for_update(
                Queryable::new("posts"),
                &Actor::user(7),
                &FieldValue::Int(3),
                Attrs::new(),
                &Params::new(),
                &spec,
            )
            .unwrap();

        assert_eq!(
            filters(&query),
            vec![FilterExpr::eq("user_id", 7), FilterExpr::eq("id", 3)]
        );
    }

    #[test]
    fn test_owned_update_rejects_ownership_transfer() {
        let policy = OwnedByActor::default();
        let spec = spec(policy.clone());
        let mut attrs = Attrs::new();
        attrs.insert("user_id".to_string(), FieldValue::Int(9));

        let result = policy.for_update(
            Queryable::new("posts"),
            &Actor::user(7),
            &FieldValue::Int(3),
            attrs,
            &Params::new(),
            &spec,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_public_read_owner_write() {
        let policy = PublicReadOwnerWrite::new("user_id");
        let spec = spec(policy.clone());
        let base = Queryable::new("posts");

        assert_eq!(policy.for_list(base.clone(), &Actor::anonymous(), &Params::new(), &spec), base);
        assert!(policy
            .for_delete(base, &Actor::anonymous(), &FieldValue::Int(1), &Params::new(), &spec)
            .is_err());
    }
}
