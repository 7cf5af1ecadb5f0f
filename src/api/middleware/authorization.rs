//! Role-based authorization gate.

use async_trait::async_trait;
use axum::http::request::Parts;
use serde_json::json;
use tracing::warn;

use super::chain::Gate;
use crate::domain::identity::Identity;
use crate::error::AppError;

/// Admits callers holding at least one of the route's permitted roles.
///
/// Reads the identity attached by [`super::auth::AuthenticationGate`], so it
/// must come after that gate in the chain. Without an identity the request
/// is rejected as forbidden.
pub struct AuthorizationGate {
    roles: Vec<String>,
}

impl AuthorizationGate {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl Gate for AuthorizationGate {
    fn name(&self) -> &'static str {
        "authorization"
    }

    async fn admit(&self, parts: &mut Parts) -> Result<(), AppError> {
        let Some(identity) = parts.extensions.get::<Identity>() else {
            return Err(AppError::forbidden(
                "Forbidden",
                json!({ "reason": "No authenticated identity" }),
            ));
        };

        if !identity.has_any_role(&self.roles) {
            warn!(
                user_id = identity.user_id,
                path = %parts.uri.path(),
                "Rejected caller without a permitted role"
            );
            return Err(AppError::forbidden(
                "Forbidden",
                json!({ "requiredRoles": self.roles }),
            ));
        }

        Ok(())
    }
}
