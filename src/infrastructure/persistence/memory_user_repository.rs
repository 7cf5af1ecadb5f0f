//! In-process implementation of the user repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// [`UserRepository`] kept in process memory, with the same uniqueness rules
/// as the `users` table: username, email (case-insensitive) and mobile number.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_email(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a.eq_ignore_ascii_case(b))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;

        let taken = users.iter().find_map(|u| {
            if u.username == new_user.username {
                Some("username")
            } else if same_email(&u.email, &new_user.email) {
                Some("email")
            } else if u.mobile_number.is_some() && u.mobile_number == new_user.mobile_number {
                Some("mobile_number")
            } else {
                None
            }
        });
        if let Some(field) = taken {
            return Err(AppError::conflict(
                format!("User with this {field} already exists"),
                json!({ "field": field }),
            ));
        }

        let user = User {
            id: users.last().map_or(1, |u| u.id + 1),
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            mobile_number: new_user.mobile_number,
            password_hash: new_user.password_hash,
            enabled: true,
            roles: new_user.roles,
            created_at: Utc::now(),
        };
        users.push(user.clone());

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_mobile_number(&self, mobile_number: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.mobile_number.as_deref() == Some(mobile_number))
            .cloned())
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .any(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))))
    }

    async fn add_role(&self, user_id: i64, role: &str) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::not_found("User not found", json!({ "id": user_id })))?;

        if !user.has_role(role) {
            user.roles.push(role.to_string());
        }
        Ok(())
    }
}
