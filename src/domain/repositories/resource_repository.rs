//! Store interface consumed by the generic resource service.

use async_trait::async_trait;

use crate::domain::query::{Entity, QueryPlan, Record};
use crate::error::AppError;

/// Narrow persistence contract for any [`Entity`].
///
/// Not-found is reported as `Ok(None)` / `Ok(false)`, never as an error, so
/// callers can tell it apart from transient store failures.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgResourceRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::InMemoryResourceRepository`] - process memory
#[async_trait]
pub trait ResourceRepository<E: Entity>: Send + Sync {
    /// Finds a live (not deleted) record by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError>;

    /// Runs a filtered, sorted, paginated query.
    ///
    /// Returns the requested page and the number of records matching the
    /// filter across all pages.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn find_many(&self, plan: &QueryPlan) -> Result<(Vec<E>, i64), AppError>;

    /// Persists a new record and returns it with generated id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a unique field collides.
    /// Returns [`AppError::Internal`] on store errors.
    async fn insert(&self, record: Record, actor: Option<i64>) -> Result<E, AppError>;

    /// Overwrites only the fields present in `changes`.
    ///
    /// Returns `Ok(None)` if no live record has this id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a unique field collides.
    /// Returns [`AppError::Internal`] on store errors.
    async fn update_fields(
        &self,
        id: i64,
        changes: Record,
        actor: Option<i64>,
    ) -> Result<Option<E>, AppError>;

    /// Soft-deletes a record. Returns `false` if no live record has this id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn delete(&self, id: i64, actor: Option<i64>) -> Result<bool, AppError>;
}
