//! Uniform response envelope shared by every endpoint.
//!
//! ```json
//! { "data": { ... }, "success": true }
//! { "data": null, "success": false, "errorCode": "not_found", "message": "Color not found" }
//! ```

use serde::Serialize;
use serde_json::Value;

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct BaseResponse<T: Serialize> {
    pub data: T,
    pub success: bool,
}

impl<T: Serialize> BaseResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data,
            success: true,
        }
    }
}

/// Error response body, produced by [`crate::error::AppError`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub data: Option<Value>,
    pub success: bool,
    pub error_code: &'static str,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorEnvelope {
    pub fn new(error_code: &'static str, message: String, details: Option<Value>) -> Self {
        Self {
            data: None,
            success: false,
            error_code,
            message,
            details,
        }
    }
}
