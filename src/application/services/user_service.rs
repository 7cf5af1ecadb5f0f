//! Registration and login flows.

use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::otp_service::OtpService;
use super::password::{hash_password, random_password, verify_password};
use super::token_service::{TokenDetail, TokenService};
use crate::domain::entities::{DEFAULT_ROLE, NewUser, User};
use crate::domain::repositories::UserRepository;
use crate::error::AppError;

/// Input of [`UserService::register_by_username`], already validated.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

fn bad_credentials() -> AppError {
    AppError::unauthorized("Invalid username or password", json!({}))
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    otp: Arc<OtpService>,
    tokens: Arc<TokenService>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        otp: Arc<OtpService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self { users, otp, tokens }
    }

    /// Issues an OTP for the given mobile number.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a code is still pending or recently used.
    pub async fn send_otp(&self, mobile_number: &str) -> Result<(), AppError> {
        self.otp.issue(mobile_number).await
    }

    /// Creates an account with the `default` role.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the username or email is taken.
    pub async fn register_by_username(&self, registration: Registration) -> Result<User, AppError> {
        if self.users.exists_by_username(&registration.username).await? {
            return Err(AppError::conflict(
                "Username is already taken",
                json!({ "username": registration.username }),
            ));
        }
        if self.users.exists_by_email(&registration.email).await? {
            return Err(AppError::conflict(
                "Email is already registered",
                json!({ "email": registration.email }),
            ));
        }

        let password_hash = hash_password(registration.password).await?;
        let user = self
            .users
            .create(NewUser {
                username: registration.username,
                first_name: Some(registration.first_name),
                last_name: Some(registration.last_name),
                email: Some(registration.email),
                mobile_number: None,
                password_hash,
                roles: vec![DEFAULT_ROLE.to_string()],
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns [`AppError::Unauthenticated`] on unknown user, wrong password
    /// or disabled account.
    pub async fn login_by_username(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenDetail, AppError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(bad_credentials)?;

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            warn!(username, "Login failed: wrong password");
            return Err(bad_credentials());
        }

        self.sign_in(&user)
    }

    /// Consumes the OTP, then logs in the owner of the mobile number,
    /// registering a new account on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the code is absent or wrong.
    /// Returns [`AppError::Conflict`] if the code was already used.
    pub async fn login_by_mobile(
        &self,
        mobile_number: &str,
        otp: &str,
    ) -> Result<TokenDetail, AppError> {
        self.otp.consume(mobile_number, otp).await?;

        let user = match self.users.find_by_mobile_number(mobile_number).await? {
            Some(user) => user,
            None => {
                let password_hash = hash_password(random_password()).await?;
                let user = self
                    .users
                    .create(NewUser {
                        username: mobile_number.to_string(),
                        first_name: None,
                        last_name: None,
                        email: None,
                        mobile_number: Some(mobile_number.to_string()),
                        password_hash,
                        roles: vec![DEFAULT_ROLE.to_string()],
                    })
                    .await?;
                info!(user_id = user.id, "User registered by mobile");
                user
            }
        };

        self.sign_in(&user)
    }

    /// Exchanges a refresh token for a new token pair carrying the user's
    /// current roles.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthenticated`] if the token is invalid or the
    /// user no longer exists.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenDetail, AppError> {
        let user_id = self.tokens.verify_refresh(refresh_token)?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid or expired token", json!({})))?;

        self.sign_in(&user)
    }

    fn sign_in(&self, user: &User) -> Result<TokenDetail, AppError> {
        if !user.enabled {
            return Err(AppError::unauthorized(
                "Account is disabled",
                json!({ "userId": user.id }),
            ));
        }
        self.tokens.issue(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::otp_service::{LogOtpSender, OtpSettings};
    use crate::domain::repositories::MockUserRepository;
    use crate::infrastructure::cache::MemoryCache;
    use chrono::{Duration, Utc};

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(
            "user-service-test-secret",
            Duration::minutes(5),
            Duration::minutes(60),
        ))
    }

    fn service(repo: MockUserRepository) -> UserService {
        let otp = OtpService::new(
            Arc::new(MemoryCache::new()),
            Arc::new(LogOtpSender),
            "otp-secret",
            OtpSettings {
                digits: 6,
                lifetime: std::time::Duration::from_secs(120),
            },
        );
        UserService::new(Arc::new(repo), Arc::new(otp), tokens())
    }

    fn registration() -> Registration {
        Registration {
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            email: "alice@example.com".to_string(),
            password: "wonder1and".to_string(),
        }
    }

    fn stored_user(password_hash: String, enabled: bool) -> User {
        User {
            id: 3,
            username: "alice".to_string(),
            first_name: None,
            last_name: None,
            email: None,
            mobile_number: None,
            password_hash,
            enabled,
            roles: vec![DEFAULT_ROLE.to_string()],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_username_conflicts() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_username().returning(|_| Ok(true));
        repo.expect_create().never();

        let err = service(repo)
            .register_by_username(registration())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_sets_default_role() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_username().returning(|_| Ok(false));
        repo.expect_exists_by_email().returning(|_| Ok(false));
        repo.expect_create()
            .withf(|u| {
                u.password_hash.starts_with("$argon2id$")
                    && u.roles == vec![DEFAULT_ROLE.to_string()]
            })
            .times(1)
            .returning(|u| Ok(stored_user(u.password_hash, true)));

        let user = service(repo)
            .register_by_username(registration())
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_unauthenticated() {
        let hash = hash_password("right-pass1".to_string()).await.unwrap();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(stored_user(hash.clone(), true))));

        let err = service(repo)
            .login_by_username("alice", "wrong-pass1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_login_unknown_user_is_unauthenticated() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username().returning(|_| Ok(None));

        let err = service(repo)
            .login_by_username("nobody", "whatever1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_login_disabled_account_is_rejected() {
        let hash = hash_password("right-pass1".to_string()).await.unwrap();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(stored_user(hash.clone(), false))));

        let err = service(repo)
            .login_by_username("alice", "right-pass1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_pair() {
        let hash = hash_password("right-pass1".to_string()).await.unwrap();
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_username()
            .returning(move |_| Ok(Some(stored_user(hash.clone(), true))));
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(stored_user(format!("hash-{id}"), true))));

        let service = service(repo);
        let first = service.login_by_username("alice", "right-pass1").await.unwrap();
        let second = service.refresh(&first.refresh_token).await.unwrap();

        assert!(service.tokens.verify_access(&second.access_token).is_ok());
        assert!(service.refresh(&first.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_login_by_mobile_without_otp_is_validation_error() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_mobile_number().never();

        let err = service(repo)
            .login_by_mobile("09121234567", "123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
