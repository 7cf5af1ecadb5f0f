//! Handlers for registration, login and token refresh.

use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;
use validator::Validate;

use crate::api::dto::BaseResponse;
use crate::api::dto::user::{
    LoginByMobileRequest, LoginByUsernameRequest, RefreshTokenRequest, RegisterByUsernameRequest,
    SendOtpRequest, UserResponse,
};
use crate::api::extract::JsonBody;
use crate::application::services::{TokenDetail, UserService};
use crate::error::AppError;

/// `POST /users/send-otp`
///
/// Guarded by the OTP limiter: one request per client per interval.
///
/// # Response Codes
///
/// - **200 OK**: Code generated and handed to the delivery channel
/// - **409 Conflict**: A code for this number is still pending
/// - **429 Too Many Requests**: Limiter rejected the client
pub async fn send_otp(
    State(users): State<Arc<UserService>>,
    JsonBody(request): JsonBody<SendOtpRequest>,
) -> Result<Json<BaseResponse<()>>, AppError> {
    request.validate()?;
    users.send_otp(&request.mobile_number).await?;
    Ok(Json(BaseResponse::ok(())))
}

/// `POST /users/register-by-username`
pub async fn register_by_username(
    State(users): State<Arc<UserService>>,
    JsonBody(request): JsonBody<RegisterByUsernameRequest>,
) -> Result<(StatusCode, Json<BaseResponse<UserResponse>>), AppError> {
    request.validate()?;
    let user = users.register_by_username(request.into()).await?;
    Ok((StatusCode::CREATED, Json(BaseResponse::ok(user.into()))))
}

/// `POST /users/login-by-username`
pub async fn login_by_username(
    State(users): State<Arc<UserService>>,
    JsonBody(request): JsonBody<LoginByUsernameRequest>,
) -> Result<Json<BaseResponse<TokenDetail>>, AppError> {
    request.validate()?;
    let tokens = users
        .login_by_username(&request.username, &request.password)
        .await?;
    Ok(Json(BaseResponse::ok(tokens)))
}

/// `POST /users/login-by-mobile`
///
/// Consumes the OTP; an unknown number is registered on the fly.
pub async fn login_by_mobile(
    State(users): State<Arc<UserService>>,
    JsonBody(request): JsonBody<LoginByMobileRequest>,
) -> Result<Json<BaseResponse<TokenDetail>>, AppError> {
    request.validate()?;
    let tokens = users
        .login_by_mobile(&request.mobile_number, &request.otp)
        .await?;
    Ok(Json(BaseResponse::ok(tokens)))
}

/// `POST /users/refresh-token`
pub async fn refresh_token(
    State(users): State<Arc<UserService>>,
    JsonBody(request): JsonBody<RefreshTokenRequest>,
) -> Result<Json<BaseResponse<TokenDetail>>, AppError> {
    request.validate()?;
    let tokens = users.refresh(&request.refresh_token).await?;
    Ok(Json(BaseResponse::ok(tokens)))
}
