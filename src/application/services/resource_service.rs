//! Generic CRUD service shared by every catalog resource.
//!
//! The service is written once against [`ResourceMapping`]; a resource plugs
//! in by declaring its entity, its DTO shapes and three mapping hooks.

use serde::Serialize;
use serde_json::json;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::application::context::RequestContext;
use crate::domain::query::{Entity, FilterSpec, PageRequest, PagedList, QueryPlan, Record, SortSpec};
use crate::domain::repositories::ResourceRepository;
use crate::error::AppError;

/// Binds an entity to its request/response shapes.
pub trait ResourceMapping: Send + Sync + 'static {
    type Entity: Entity;
    type CreateRequest: Validate + Send + 'static;
    type UpdateRequest: Validate + Send + 'static;
    type Response: Serialize + Send + 'static;

    /// Full record for a new entity.
    fn to_record(request: Self::CreateRequest) -> Record;

    /// Only the fields the client supplied. An absent field must not appear
    /// in the record, otherwise the update would overwrite it.
    fn to_changes(request: Self::UpdateRequest) -> Record;

    /// Builds an owned response; it never aliases the stored entity.
    fn to_response(entity: &Self::Entity) -> Self::Response;
}

/// Create/Update/Delete/GetById/GetByFilter for any [`ResourceMapping`].
///
/// Holds no per-request state; the store is the authority for consistency.
pub struct ResourceService<M: ResourceMapping> {
    repository: Arc<dyn ResourceRepository<M::Entity>>,
    _mapping: PhantomData<fn() -> M>,
}

impl<M: ResourceMapping> Clone for ResourceService<M> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            _mapping: PhantomData,
        }
    }
}

fn not_found<E: Entity>(id: i64) -> AppError {
    AppError::not_found(format!("{} not found", E::RESOURCE), json!({ "id": id }))
}

impl<M: ResourceMapping> ResourceService<M> {
    pub fn new(repository: Arc<dyn ResourceRepository<M::Entity>>) -> Self {
        Self {
            repository,
            _mapping: PhantomData,
        }
    }

    /// Validates and persists a new entity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the request fails field validation.
    /// Returns [`AppError::Conflict`] if a unique field is already taken.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: M::CreateRequest,
    ) -> Result<M::Response, AppError> {
        request.validate()?;

        let entity = self
            .repository
            .insert(M::to_record(request), ctx.actor_id)
            .await?;

        info!(
            resource = <M::Entity as Entity>::RESOURCE,
            id = entity.id(),
            actor = ctx.actor_id,
            "Created"
        );
        Ok(M::to_response(&entity))
    }

    /// Applies a partial update. Fields absent from the request keep their
    /// stored values; a request carrying no fields returns the current state.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live entity has this id.
    /// See [`Self::create`] for the remaining cases.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        request: M::UpdateRequest,
    ) -> Result<M::Response, AppError> {
        request.validate()?;

        let changes = M::to_changes(request);
        let entity = if changes.is_empty() {
            debug!(resource = <M::Entity as Entity>::RESOURCE, id, "Empty update");
            self.repository.find_by_id(id).await?
        } else {
            self.repository
                .update_fields(id, changes, ctx.actor_id)
                .await?
        };

        let entity = entity.ok_or_else(|| not_found::<M::Entity>(id))?;
        info!(
            resource = <M::Entity as Entity>::RESOURCE,
            id,
            actor = ctx.actor_id,
            "Updated"
        );
        Ok(M::to_response(&entity))
    }

    /// Soft-deletes an entity. Deleting it again reports not found.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live entity has this id.
    pub async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), AppError> {
        if !self.repository.delete(id, ctx.actor_id).await? {
            return Err(not_found::<M::Entity>(id));
        }

        info!(
            resource = <M::Entity as Entity>::RESOURCE,
            id,
            actor = ctx.actor_id,
            "Deleted"
        );
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live entity has this id.
    pub async fn get_by_id(&self, id: i64) -> Result<M::Response, AppError> {
        let entity = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found::<M::Entity>(id))?;

        Ok(M::to_response(&entity))
    }

    /// Runs a filtered, paginated query. No match yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for unknown fields, unsupported
    /// operators or uncoercible values.
    pub async fn get_by_filter(
        &self,
        page: PageRequest,
        filter: &FilterSpec,
        sort: &[SortSpec],
    ) -> Result<PagedList<M::Response>, AppError> {
        let plan = QueryPlan::build::<M::Entity>(filter, sort, page)?;
        let (items, total) = self.repository.find_many(&plan).await?;

        Ok(PagedList::new(items, total, page).map(|e| M::to_response(&e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Color;
    use crate::domain::query::{FilterCondition, FilterOperator};
    use crate::infrastructure::persistence::InMemoryResourceRepository;

    #[derive(Validate)]
    struct NewColor {
        #[validate(length(min = 2, max = 15))]
        name: String,
        hex_code: String,
    }

    #[derive(Validate, Default)]
    struct ColorChanges {
        #[validate(length(min = 2, max = 15))]
        name: Option<String>,
        hex_code: Option<String>,
    }

    #[derive(Debug, Serialize, PartialEq)]
    struct ColorView {
        id: i64,
        name: String,
        hex_code: String,
    }

    struct Colors;

    impl ResourceMapping for Colors {
        type Entity = Color;
        type CreateRequest = NewColor;
        type UpdateRequest = ColorChanges;
        type Response = ColorView;

        fn to_record(request: NewColor) -> Record {
            Record::new()
                .with("name", request.name)
                .with("hex_code", request.hex_code)
        }

        fn to_changes(request: ColorChanges) -> Record {
            let mut record = Record::new();
            record.set_present("name", request.name);
            record.set_present("hex_code", request.hex_code);
            record
        }

        fn to_response(entity: &Color) -> ColorView {
            ColorView {
                id: entity.id,
                name: entity.name.clone(),
                hex_code: entity.hex_code.clone(),
            }
        }
    }

    fn service() -> ResourceService<Colors> {
        ResourceService::new(Arc::new(InMemoryResourceRepository::<Color>::new()))
    }

    fn ctx() -> RequestContext {
        RequestContext { actor_id: Some(7) }
    }

    fn red() -> NewColor {
        NewColor {
            name: "Red".to_string(),
            hex_code: "#FF0000".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_returns_same_fields() {
        let service = service();
        let created = service.create(&ctx(), red()).await.unwrap();

        assert_eq!(created.name, "Red");
        assert_eq!(created.hex_code, "#FF0000");
        assert_eq!(service.get_by_id(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_request() {
        let err = service()
            .create(
                &ctx(),
                NewColor {
                    name: "R".to_string(),
                    hex_code: "#FF0000".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_partial_update_preserves_other_fields() {
        let service = service();
        let created = service.create(&ctx(), red()).await.unwrap();

        let changes = ColorChanges {
            name: Some("Crimson".to_string()),
            ..Default::default()
        };
        service.update(&ctx(), created.id, changes).await.unwrap();

        let fetched = service.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.name, "Crimson");
        assert_eq!(fetched.hex_code, "#FF0000");
    }

    #[tokio::test]
    async fn test_empty_update_returns_current_state() {
        let service = service();
        let created = service.create(&ctx(), red()).await.unwrap();

        let unchanged = service
            .update(&ctx(), created.id, ColorChanges::default())
            .await
            .unwrap();
        assert_eq!(unchanged, created);

        let err = service
            .update(&ctx(), 999, ColorChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let changes = ColorChanges {
            name: Some("Crimson".to_string()),
            ..Default::default()
        };
        let err = service().update(&ctx(), 42, changes).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let service = service();
        let created = service.create(&ctx(), red()).await.unwrap();

        service.delete(&ctx(), created.id).await.unwrap();

        let err = service.get_by_id(created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        let err = service.delete(&ctx(), created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_filter_without_match_is_empty_page() {
        let service = service();
        service.create(&ctx(), red()).await.unwrap();

        let filter =
            FilterSpec::new().and(FilterCondition::new("name", FilterOperator::Equals, "Blue"));
        let page = service
            .get_by_filter(PageRequest::default(), &filter, &[])
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_rows, 0);
    }

    #[tokio::test]
    async fn test_filter_on_unknown_field_is_validation_error() {
        let filter =
            FilterSpec::new().and(FilterCondition::new("shade", FilterOperator::Equals, "dark"));
        let err = service()
            .get_by_filter(PageRequest::default(), &filter, &[])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }
}
