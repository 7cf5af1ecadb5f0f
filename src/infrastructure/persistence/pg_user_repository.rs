//! PostgreSQL implementation of the user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, mobile_number, \
                            password_hash, enabled, roles, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    mobile_number: Option<String>,
    password_hash: String,
    enabled: bool,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            mobile_number: row.mobile_number,
            password_hash: row.password_hash,
            enabled: row.enabled,
            roles: row.roles,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL repository for user accounts.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE {column} = $1 AND deleted_at IS NULL"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (username, first_name, last_name, email, mobile_number, \
             password_hash, roles) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.email)
            .bind(&new_user.mobile_number)
            .bind(&new_user.password_hash)
            .bind(&new_user.roles)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_one("username", username).await
    }

    async fn find_by_mobile_number(&self, mobile_number: &str) -> Result<Option<User>, AppError> {
        self.find_one("mobile_number", mobile_number).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND deleted_at IS NULL)",
        )
        .bind(username)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL)",
        )
        .bind(email)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn add_role(&self, user_id: i64, role: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET roles = CASE WHEN $2 = ANY(roles) THEN roles \
             ELSE array_append(roles, $2) END \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .bind(role)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "User not found",
                json!({ "id": user_id }),
            ));
        }

        Ok(())
    }
}
