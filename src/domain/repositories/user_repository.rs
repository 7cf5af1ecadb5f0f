//! Repository trait for user accounts.

use crate::domain::entities::{NewUser, User};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for user accounts.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if username, email or mobile number is taken.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_by_mobile_number(&self, mobile_number: &str) -> Result<Option<User>, AppError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError>;

    /// Adds a role to an existing user. Adding a role twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the user does not exist.
    async fn add_role(&self, user_id: i64, role: &str) -> Result<(), AppError>;
}
