//! Bearer token authentication gate.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_auth::AuthBearer;
use std::sync::Arc;
use tracing::warn;

use super::chain::Gate;
use crate::application::services::TokenService;
use crate::error::AppError;

/// Authenticates requests using Bearer tokens from the Authorization header.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// On success the decoded [`crate::domain::identity::Identity`] is inserted
/// into the request extensions for later gates and handlers. Roles are not
/// checked here; see [`super::authorization::AuthorizationGate`].
///
/// # Errors
///
/// Rejects with `401 Unauthorized` if:
/// - Authorization header is missing or not a Bearer credential
/// - Token signature is invalid or the token has expired
/// - Token is a refresh token
pub struct AuthenticationGate {
    tokens: Arc<TokenService>,
}

impl AuthenticationGate {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl Gate for AuthenticationGate {
    fn name(&self) -> &'static str {
        "authentication"
    }

    async fn admit(&self, parts: &mut Parts) -> Result<(), AppError> {
        let AuthBearer(token) = AuthBearer::from_request_parts(parts, &())
            .await
            .map_err(|_| {
                AppError::unauthorized(
                    "Unauthorized",
                    serde_json::json!({"reason": "Authorization header is missing or invalid"}),
                )
            })?;

        let identity = self.tokens.verify_access(&token).inspect_err(|_| {
            warn!(path = %parts.uri.path(), "Rejected invalid bearer token");
        })?;

        parts.extensions.insert(identity);
        Ok(())
    }
}
