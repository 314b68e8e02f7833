use crate::domain::model::CellValue;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// 後端試算表
///
/// Ranges are A1 notation (`Sheet`, `Sheet!A:M`, `Sheet!A5:M5`). Rows come back
/// as the sheet displays them, with trailing empty cells and rows omitted.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Appends one row after the last non-empty row of the range's table.
    async fn append_row(&self, range: &str, row: Vec<CellValue>) -> Result<()>;

    /// Overwrites exactly the cells of `range`.
    async fn update_range(&self, range: &str, row: Vec<CellValue>) -> Result<()>;

    /// Structural removal of the 1-based `row_number` of `sheet`.
    async fn delete_row(&self, sheet: &str, row_number: usize) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpIssue {
    Issued,
    Throttled { retry_after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumeReason {
    Accepted,
    NotIssued,
    Expired,
    Incorrect,
    TooManyAttempts,
}

impl ConsumeReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::Accepted => "OTP verified successfully",
            Self::NotIssued => "No OTP has been sent to this email",
            Self::Expired => "OTP has expired, please request a new one",
            Self::Incorrect => "Incorrect OTP",
            Self::TooManyAttempts => "Too many attempts, please request a new OTP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeOutcome {
    pub accepted: bool,
    pub reason: ConsumeReason,
}

/// 一次性密碼儲存，過期與嘗試次數記在 entry 內，每次呼叫皆為原子操作
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn put(&self, email: &str, code: &str, ttl: Duration) -> Result<OtpIssue>;
    async fn try_consume(&self, email: &str, code: &str) -> Result<ConsumeOutcome>;
}

#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, email: &str, code: &str) -> Result<()>;
}
