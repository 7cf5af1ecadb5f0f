//! One-time password issuance and validation.
//!
//! Codes live in the [`CacheService`] under `otp:{mobile}` for the configured
//! lifetime. Only an HMAC-SHA256 digest of the code is stored; a consumed code
//! stays in place, marked used, until it expires, which blocks re-issuing
//! within that window.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::AppError;
use crate::infrastructure::cache::CacheService;

type HmacSha256 = Hmac<Sha256>;

/// Delivers an issued code to the user, e.g. by SMS.
#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, mobile_number: &str, code: &str) -> Result<(), AppError>;
}

/// Sender that only writes the code to the debug log.
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, mobile_number: &str, code: &str) -> Result<(), AppError> {
        debug!(mobile_number, code, "OTP issued");
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OtpState {
    digest: String,
    used: bool,
}

/// OTP policy.
#[derive(Debug, Clone, Copy)]
pub struct OtpSettings {
    pub digits: u32,
    pub lifetime: Duration,
}

pub struct OtpService {
    cache: Arc<dyn CacheService>,
    sender: Arc<dyn OtpSender>,
    secret: Vec<u8>,
    settings: OtpSettings,
}

fn key(mobile_number: &str) -> String {
    format!("otp:{mobile_number}")
}

impl OtpService {
    pub fn new(
        cache: Arc<dyn CacheService>,
        sender: Arc<dyn OtpSender>,
        secret: &str,
        settings: OtpSettings,
    ) -> Self {
        Self {
            cache,
            sender,
            secret: secret.as_bytes().to_vec(),
            settings,
        }
    }

    fn mac(&self, mobile_number: &str, code: &str) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|e| {
            AppError::internal("Invalid OTP key", json!({ "reason": e.to_string() }))
        })?;
        mac.update(mobile_number.as_bytes());
        mac.update(b":");
        mac.update(code.as_bytes());
        Ok(mac)
    }

    fn generate_code(&self) -> String {
        let digits = self.settings.digits as usize;
        let upper = 10_u64.pow(self.settings.digits);
        let code = rand::rng().random_range(0..upper);
        format!("{code:0digits$}")
    }

    /// Returns the stored state together with its raw encoding.
    async fn load(&self, mobile_number: &str) -> Result<Option<(String, OtpState)>, AppError> {
        let Some(raw) = self.cache.get(&key(mobile_number)).await? else {
            return Ok(None);
        };
        let state = serde_json::from_str(&raw).map_err(|e| {
            AppError::internal("Corrupt OTP state", json!({ "reason": e.to_string() }))
        })?;
        Ok(Some((raw, state)))
    }

    fn encode(state: &OtpState) -> Result<String, AppError> {
        serde_json::to_string(state).map_err(|e| {
            AppError::internal("Failed to encode OTP state", json!({ "reason": e.to_string() }))
        })
    }

    /// Issues a new code and hands it to the sender.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if a code for this number is still
    /// pending, or was used and has not expired yet.
    pub async fn issue(&self, mobile_number: &str) -> Result<(), AppError> {
        if let Some((_, state)) = self.load(mobile_number).await? {
            let message = if state.used {
                "OTP was already used; wait for it to expire"
            } else {
                "OTP was already sent"
            };
            return Err(AppError::conflict(message, json!({ "mobileNumber": mobile_number })));
        }

        let code = self.generate_code();
        let state = OtpState {
            digest: hex::encode(self.mac(mobile_number, &code)?.finalize().into_bytes()),
            used: false,
        };
        self.cache
            .set_ex(&key(mobile_number), &Self::encode(&state)?, self.settings.lifetime)
            .await?;
        self.sender.send(mobile_number, &code).await?;

        info!(mobile_number, "OTP sent");
        Ok(())
    }

    /// Checks a code and marks it used.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if no code is pending or the code is wrong.
    /// Returns [`AppError::Conflict`] if the code was already used.
    pub async fn consume(&self, mobile_number: &str, code: &str) -> Result<(), AppError> {
        let invalid = || {
            AppError::bad_request(
                "OTP is invalid or expired",
                json!({ "mobileNumber": mobile_number }),
            )
        };

        let already_used = || {
            AppError::conflict("OTP was already used", json!({ "mobileNumber": mobile_number }))
        };

        let (raw, mut state) = self.load(mobile_number).await?.ok_or_else(invalid)?;
        if state.used {
            return Err(already_used());
        }

        let expected = hex::decode(&state.digest).map_err(|_| invalid())?;
        self.mac(mobile_number, code)?
            .verify_slice(&expected)
            .map_err(|_| invalid())?;

        // The swap only succeeds against the exact pending entry, so two
        // concurrent requests with the same code cannot both pass.
        state.used = true;
        let swapped = self
            .cache
            .compare_and_swap(&key(mobile_number), &raw, &Self::encode(&state)?)
            .await?;
        if !swapped {
            return match self.load(mobile_number).await? {
                Some((_, current)) if current.used => Err(already_used()),
                _ => Err(invalid()),
            };
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::{MemoryCache, MockCacheService};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingSender {
        codes: Mutex<Vec<String>>,
    }

    impl CapturingSender {
        fn last(&self) -> String {
            self.codes.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl OtpSender for CapturingSender {
        async fn send(&self, _mobile_number: &str, code: &str) -> Result<(), AppError> {
            self.codes.lock().unwrap().push(code.to_string());
            Ok(())
        }
    }

    const MOBILE: &str = "09121234567";

    fn settings() -> OtpSettings {
        OtpSettings {
            digits: 6,
            lifetime: Duration::from_secs(120),
        }
    }

    fn service(sender: Arc<CapturingSender>) -> OtpService {
        OtpService::new(Arc::new(MemoryCache::new()), sender, "otp-secret", settings())
    }

    #[tokio::test]
    async fn test_issue_then_consume() {
        let sender = Arc::new(CapturingSender::default());
        let service = service(sender.clone());

        service.issue(MOBILE).await.unwrap();
        let code = sender.last();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        service.consume(MOBILE, &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_code_is_not_stored_in_clear() {
        let cache = Arc::new(MemoryCache::new());
        let sender = Arc::new(CapturingSender::default());
        let service = OtpService::new(cache.clone(), sender.clone(), "otp-secret", settings());

        service.issue(MOBILE).await.unwrap();

        let raw = cache.get("otp:09121234567").await.unwrap().unwrap();
        assert!(!raw.contains(&sender.last()));
    }

    #[tokio::test]
    async fn test_pending_code_blocks_reissue() {
        let sender = Arc::new(CapturingSender::default());
        let service = service(sender);

        service.issue(MOBILE).await.unwrap();
        let err = service.issue(MOBILE).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_used_code_cannot_be_reused_or_reissued() {
        let sender = Arc::new(CapturingSender::default());
        let service = service(sender.clone());

        service.issue(MOBILE).await.unwrap();
        let code = sender.last();
        service.consume(MOBILE, &code).await.unwrap();

        let err = service.consume(MOBILE, &code).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
        let err = service.issue(MOBILE).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_consume_succeeds_once() {
        let sender = Arc::new(CapturingSender::default());
        let service = service(sender.clone());

        service.issue(MOBILE).await.unwrap();
        let code = sender.last();

        let (first, second) = tokio::join!(
            service.consume(MOBILE, &code),
            service.consume(MOBILE, &code)
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict { .. }))));
    }

    #[tokio::test]
    async fn test_lost_swap_reports_conflict() {
        // Another request marks the code used between the read and the swap.
        let issued = Arc::new(MemoryCache::new());
        let sender = Arc::new(CapturingSender::default());
        OtpService::new(issued.clone(), sender.clone(), "otp-secret", settings())
            .issue(MOBILE)
            .await
            .unwrap();
        let pending = issued.get("otp:09121234567").await.unwrap().unwrap();
        let used = pending.replace("\"used\":false", "\"used\":true");

        let mut cache = MockCacheService::new();
        let mut reads = vec![used, pending];
        cache
            .expect_get()
            .times(2)
            .returning(move |_| Ok(reads.pop()));
        cache.expect_compare_and_swap().times(1).returning(|_, _, _| Ok(false));

        let service = OtpService::new(Arc::new(cache), sender.clone(), "otp-secret", settings());
        let err = service.consume(MOBILE, &sender.last()).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_wrong_or_missing_code_is_validation_error() {
        let sender = Arc::new(CapturingSender::default());
        let service = service(sender.clone());

        let err = service.consume(MOBILE, "000000").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        service.issue(MOBILE).await.unwrap();
        let wrong = if sender.last() == "000000" { "111111" } else { "000000" };
        let err = service.consume(MOBILE, wrong).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_cache_failure_is_internal_error() {
        let mut cache = MockCacheService::new();
        cache.expect_get().returning(|_| {
            Err(crate::infrastructure::cache::CacheError::OperationError(
                "connection reset".to_string(),
            ))
        });

        let service = OtpService::new(
            Arc::new(cache),
            Arc::new(CapturingSender::default()),
            "otp-secret",
            settings(),
        );

        let err = service.issue(MOBILE).await.unwrap_err();
        assert!(matches!(err, AppError::Internal { .. }));
    }
}
