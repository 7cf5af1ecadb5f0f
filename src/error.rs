//! Application error type and its HTTP rendering.
//!
//! Every layer returns [`AppError`]; the transport turns it into a status code
//! and the uniform response envelope (see [`crate::api::dto::envelope`]).

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::time::Duration;

use crate::api::dto::envelope::ErrorEnvelope;

/// Errors surfaced by services and gates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or insufficient input (400).
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The addressed record does not exist (404).
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// The request collides with existing state, e.g. a unique value (409).
    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Missing, malformed, invalid or expired credential (401).
    #[error("{message}")]
    Unauthenticated { message: String, details: Value },

    /// Authenticated, but the role is not permitted (403).
    #[error("{message}")]
    Forbidden { message: String, details: Value },

    /// An admission limiter rejected the request (429).
    #[error("{message}")]
    TooManyRequests {
        code: &'static str,
        message: String,
        retry_after: Option<Duration>,
    },

    /// Persistence or infrastructure failure (500). Details are logged, never sent.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthenticated {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn too_many_requests(
        code: &'static str,
        message: impl Into<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self::TooManyRequests {
            code,
            message: message.into(),
            retry_after,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Machine-readable code placed in the envelope's `errorCode`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Forbidden { .. } => "forbidden",
            Self::TooManyRequests { code, .. } => code,
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details, retry_after) = match self {
            Self::Validation { message, details }
            | Self::NotFound { message, details }
            | Self::Conflict { message, details }
            | Self::Unauthenticated { message, details }
            | Self::Forbidden { message, details } => (message, Some(details), None),
            Self::TooManyRequests {
                message,
                retry_after,
                ..
            } => (message, None, retry_after),
            Self::Internal { message, details } => {
                tracing::error!(%message, %details, "Request failed with internal error");
                ("Internal server error".to_string(), None, None)
            }
        };

        let body = ErrorEnvelope::new(code, message, details.filter(|d| !is_empty(d)));
        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        if let Some(wait) = retry_after {
            let seconds = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&seconds.max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

fn is_empty(details: &Value) -> bool {
    match details {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::conflict(
                    "Unique constraint violation",
                    json!({ "constraint": db.constraint() }),
                );
            }
            if db.is_foreign_key_violation() || db.is_check_violation() {
                return AppError::bad_request(
                    "Referenced record is missing or value is out of range",
                    json!({ "constraint": db.constraint() }),
                );
            }
        }

        AppError::internal("Database error", json!({ "reason": e.to_string() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(Value::Null);
        AppError::bad_request("Request validation failed", details)
    }
}
