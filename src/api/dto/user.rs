//! User registration, login and token DTOs.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

use crate::application::services::Registration;
use crate::domain::entities::User;

static MOBILE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").unwrap());

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());

/// At least 8 characters with both letters and digits.
fn validate_password(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if password.chars().count() < 8 || !has_letter || !has_digit {
        return Err(ValidationError::new("weak_password")
            .with_message("Password must be at least 8 characters with letters and digits".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    #[validate(regex(path = *MOBILE_REGEX, message = "Invalid mobile number"))]
    pub mobile_number: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterByUsernameRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50))]
    pub last_name: String,

    #[validate(
        length(min = 5, max = 30),
        regex(path = *USERNAME_REGEX, message = "Letters, digits, '_', '.' and '-' only")
    )]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

impl From<RegisterByUsernameRequest> for Registration {
    fn from(request: RegisterByUsernameRequest) -> Self {
        Self {
            username: request.username,
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            password: request.password,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginByUsernameRequest {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginByMobileRequest {
    #[validate(regex(path = *MOBILE_REGEX, message = "Invalid mobile number"))]
    pub mobile_number: String,

    #[validate(length(min = 4, max = 10))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            mobile_number: user.mobile_number,
            roles: user.roles,
            created_at: user.created_at,
        }
    }
}
