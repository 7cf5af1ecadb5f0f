//! Issuing and verifying signed bearer tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::entities::User;
use crate::domain::identity::Identity;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT payload. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub roles: Vec<String>,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn user_id(&self) -> Result<i64, AppError> {
        self.sub.parse().map_err(|_| invalid_token("Malformed subject"))
    }
}

/// Access/refresh token pair returned by every login flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetail {
    pub access_token: String,
    pub access_token_expire_time: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_token_expire_time: DateTime<Utc>,
}

fn invalid_token(reason: &str) -> AppError {
    AppError::unauthorized("Invalid or expired token", json!({ "reason": reason }))
}

/// HS256 token issuer and verifier.
///
/// Expiry is checked with zero leeway. A refresh token is never accepted
/// where an access token is expected, and vice versa.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issues a fresh access/refresh pair for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if signing fails.
    pub fn issue(&self, user: &User) -> Result<TokenDetail, AppError> {
        let now = Utc::now();
        let access_expires = now + self.access_ttl;
        let refresh_expires = now + self.refresh_ttl;

        Ok(TokenDetail {
            access_token: self.sign(user, TokenType::Access, now, access_expires)?,
            access_token_expire_time: access_expires,
            refresh_token: self.sign(user, TokenType::Refresh, now, refresh_expires)?,
            refresh_token_expire_time: refresh_expires,
        })
    }

    fn sign(
        &self,
        user: &User,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            roles: user.roles.clone(),
            token_type,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            AppError::internal("Failed to sign token", json!({ "reason": e.to_string() }))
        })
    }

    fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| invalid_token(&e.to_string()))?
            .claims;

        if claims.token_type != expected {
            return Err(invalid_token("Wrong token type"));
        }
        Ok(claims)
    }

    /// Verifies an access token and returns the caller identity.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthenticated`] if the token is malformed, has a
    /// bad signature, is expired, or is not an access token.
    pub fn verify_access(&self, token: &str) -> Result<Identity, AppError> {
        let claims = self.verify(token, TokenType::Access)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| invalid_token("Expiry out of range"))?;

        Ok(Identity {
            user_id: claims.user_id()?,
            username: claims.username,
            roles: claims.roles,
            expires_at,
        })
    }

    /// Verifies a refresh token and returns the user id it was issued to.
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify_access`], with the token type reversed.
    pub fn verify_refresh(&self, token: &str) -> Result<i64, AppError> {
        self.verify(token, TokenType::Refresh)?.user_id()
    }
}
