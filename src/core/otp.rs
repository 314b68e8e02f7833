use crate::config::OtpConfig;
use crate::core::users::UserDirectory;
use crate::domain::model::MessageOutcome;
use crate::domain::ports::{OtpIssue, OtpSender, OtpStore, SheetStore};
use crate::utils::error::{AppError, Result};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyOutcome {
    pub valid: bool,
    pub message: String,
}

/// Zero-padded numeric code of `length` digits.
pub fn generate_code(length: u32) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// 一次性密碼：只發給 Users 名單內的 email
pub struct OtpService<S: SheetStore> {
    users: UserDirectory<S>,
    store: Arc<dyn OtpStore>,
    sender: Arc<dyn OtpSender>,
    config: OtpConfig,
}

impl<S: SheetStore> Clone for OtpService<S> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            store: Arc::clone(&self.store),
            sender: Arc::clone(&self.sender),
            config: self.config.clone(),
        }
    }
}

impl<S: SheetStore> OtpService<S> {
    pub fn new(
        users: UserDirectory<S>,
        store: Arc<dyn OtpStore>,
        sender: Arc<dyn OtpSender>,
        config: OtpConfig,
    ) -> Self {
        Self {
            users,
            store,
            sender,
            config,
        }
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.config.enabled {
            Ok(())
        } else {
            Err(AppError::ConfigError {
                message: "OTP is disabled (otp.enabled = false)".to_string(),
            })
        }
    }

    pub async fn send(&self, email: &str) -> Result<MessageOutcome> {
        self.ensure_enabled()?;
        let email = email.trim();

        if !self.users.contains(email).await? {
            return Err(AppError::NotFound {
                identifier: email.to_string(),
            });
        }

        let code = generate_code(self.config.code_length);
        match self.store.put(email, &code, self.config.ttl()).await? {
            OtpIssue::Issued => {}
            OtpIssue::Throttled { retry_after } => {
                return Err(AppError::invalid_input(
                    "email",
                    format!(
                        "an OTP was sent recently, retry in {}s",
                        retry_after.as_secs().max(1)
                    ),
                ));
            }
        }

        self.sender.send(email, &code).await?;
        Ok(MessageOutcome::ok("OTP sent successfully"))
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<VerifyOutcome> {
        self.ensure_enabled()?;
        let outcome = self.store.try_consume(email.trim(), code).await?;

        if outcome.accepted {
            tracing::info!("🔓 OTP verified for {}", email.trim());
        } else {
            tracing::warn!("🔒 OTP rejected for {}: {:?}", email.trim(), outcome.reason);
        }
        Ok(VerifyOutcome {
            valid: outcome.accepted,
            message: outcome.reason.message().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySheetStore;
    use crate::adapters::otp::InMemoryOtpStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 記下寄出的 code
    #[derive(Default)]
    struct CapturingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl OtpSender for CapturingSender {
        async fn send(&self, email: &str, code: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((email.to_string(), code.to_string()));
            Ok(())
        }
    }

    fn service(config: OtpConfig) -> (OtpService<InMemorySheetStore>, Arc<CapturingSender>) {
        let sheets = InMemorySheetStore::new();
        sheets.seed("Users", &[&["Name", "Email"], &["Ann", "ann@example.com"]]);
        let users = UserDirectory::new(Arc::new(sheets), "Users");
        let store = Arc::new(InMemoryOtpStore::new(
            config.max_attempts,
            config.resend_cooldown(),
        ));
        let sender = Arc::new(CapturingSender::default());
        (
            OtpService::new(users, store, sender.clone(), config),
            sender,
        )
    }

    #[test]
    fn test_code_shape() {
        for _ in 0..50 {
            let code = generate_code(6);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_send_then_verify_once() {
        let (otp, sender) = service(OtpConfig::default());
        let sent = otp.send("ann@example.com").await.unwrap();
        assert!(sent.success);
        assert!(!sent.message.contains(char::is_numeric));

        let code = sender.sent.lock().unwrap()[0].1.clone();
        assert!(otp.verify("ann@example.com", &code).await.unwrap().valid);

        let again = otp.verify("ann@example.com", &code).await.unwrap();
        assert!(!again.valid);
    }

    #[tokio::test]
    async fn test_unknown_email_gets_no_code() {
        let (otp, sender) = service(OtpConfig::default());
        let err = otp.send("stranger@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resend_is_throttled() {
        let (otp, _) = service(OtpConfig::default());
        otp.send("ann@example.com").await.unwrap();
        let err = otp.send("ann@example.com").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_disabled_is_a_configuration_error() {
        let config = OtpConfig {
            enabled: false,
            ..OtpConfig::default()
        };
        let (otp, _) = service(config);
        let err = otp.send("ann@example.com").await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(otp.verify("ann@example.com", "123456").await.is_err());
    }
}
