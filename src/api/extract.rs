//! Request extractors that report failures through the uniform envelope.
//!
//! Axum's stock `Json` and `Path` rejections answer with plain-text bodies;
//! these wrappers turn them into [`AppError::Validation`].

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::convert::Infallible;

use crate::application::context::RequestContext;
use crate::domain::identity::Identity;
use crate::error::AppError;

/// JSON request body.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            AppError::bad_request(
                "Invalid request body",
                json!({ "reason": rejection.body_text() }),
            )
        })?;
        Ok(Self(value))
    }
}

/// Numeric `{id}` path segment.
pub struct IdPath(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for IdPath {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::bad_request(
                    "Invalid id in path",
                    json!({ "reason": rejection.body_text() }),
                )
            })?;
        Ok(Self(id))
    }
}

/// Service context for the caller, built from the identity the
/// authentication gate attached. Anonymous on unauthenticated routes.
pub struct Actor(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(RequestContext::for_identity(
            parts.extensions.get::<Identity>(),
        )))
    }
}
