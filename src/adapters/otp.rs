use crate::domain::ports::{ConsumeOutcome, ConsumeReason, OtpIssue, OtpSender, OtpStore};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct OtpEntry {
    code: String,
    issued_at: Instant,
    expires_at: Instant,
    failed_attempts: u32,
}

fn key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Process-local OTP store. Entries live until consumed, expired or exhausted.
#[derive(Debug, Clone)]
pub struct InMemoryOtpStore {
    entries: Arc<Mutex<HashMap<String, OtpEntry>>>,
    max_attempts: u32,
    resend_cooldown: Duration,
}

impl InMemoryOtpStore {
    pub fn new(max_attempts: u32, resend_cooldown: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            resend_cooldown,
        }
    }

    pub async fn pending(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn put(&self, email: &str, code: &str, ttl: Duration) -> Result<OtpIssue> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let key = key(email);

        // 順便清掉從未驗證就過期的 code
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        if entries.len() < before {
            tracing::debug!("🧹 Dropped {} expired OTP entries", before - entries.len());
        }

        if let Some(existing) = entries.get(&key) {
            let age = now.duration_since(existing.issued_at);
            if now < existing.expires_at && age < self.resend_cooldown {
                return Ok(OtpIssue::Throttled {
                    retry_after: self.resend_cooldown - age,
                });
            }
        }

        entries.insert(
            key,
            OtpEntry {
                code: code.to_string(),
                issued_at: now,
                expires_at: now + ttl,
                failed_attempts: 0,
            },
        );
        Ok(OtpIssue::Issued)
    }

    async fn try_consume(&self, email: &str, code: &str) -> Result<ConsumeOutcome> {
        let mut entries = self.entries.lock().await;
        let key = key(email);

        let Some(entry) = entries.get_mut(&key) else {
            return Ok(rejected(ConsumeReason::NotIssued));
        };

        if Instant::now() >= entry.expires_at {
            entries.remove(&key);
            return Ok(rejected(ConsumeReason::Expired));
        }

        if entry.failed_attempts >= self.max_attempts {
            entries.remove(&key);
            return Ok(rejected(ConsumeReason::TooManyAttempts));
        }

        if entry.code == code.trim() {
            entries.remove(&key);
            return Ok(ConsumeOutcome {
                accepted: true,
                reason: ConsumeReason::Accepted,
            });
        }

        entry.failed_attempts += 1;
        tracing::debug!(
            "OTP mismatch for {} ({}/{})",
            key,
            entry.failed_attempts,
            self.max_attempts
        );
        Ok(rejected(ConsumeReason::Incorrect))
    }
}

fn rejected(reason: ConsumeReason) -> ConsumeOutcome {
    ConsumeOutcome {
        accepted: false,
        reason,
    }
}

/// 不實際寄送，只寫 log；code 只出現在 debug 等級
#[derive(Debug, Clone, Default)]
pub struct LogOtpSender;

#[async_trait]
impl OtpSender for LogOtpSender {
    async fn send(&self, email: &str, code: &str) -> Result<()> {
        tracing::info!("📧 OTP issued for {}", email);
        tracing::debug!("📧 OTP for {}: {}", email, code);
        Ok(())
    }
}
