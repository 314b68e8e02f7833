//! Action dispatcher behind the single POST endpoint.

use crate::core::borrowers::{BorrowerData, BorrowerService};
use crate::core::otp::OtpService;
use crate::core::users::UserDirectory;
use crate::domain::ports::SheetStore;
use crate::utils::error::{AppError, ErrorCategory, Result};
use crate::utils::validation::required_text;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CheckUserEmail,
    FetchBorrowerData,
    FetchFreddieMacRates,
    AddBorrowerData,
    UpdateBorrowerData,
    DeleteBorrowerData,
    SendOtp,
    VerifyOtp,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Self::CheckUserEmail => "checkUserEmail",
            Self::FetchBorrowerData => "fetchBorrowerData",
            Self::FetchFreddieMacRates => "fetchFreddieMacRates",
            Self::AddBorrowerData => "addBorrowerData",
            Self::UpdateBorrowerData => "updateBorrowerData",
            Self::DeleteBorrowerData => "deleteBorrowerData",
            Self::SendOtp => "sendOTP",
            Self::VerifyOtp => "verifyOTP",
        }
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "checkUserEmail" => Ok(Self::CheckUserEmail),
            "fetchBorrowerData" => Ok(Self::FetchBorrowerData),
            "fetchFreddieMacRates" => Ok(Self::FetchFreddieMacRates),
            "addBorrowerData" => Ok(Self::AddBorrowerData),
            "updateBorrowerData" => Ok(Self::UpdateBorrowerData),
            "deleteBorrowerData" => Ok(Self::DeleteBorrowerData),
            "sendOTP" => Ok(Self::SendOtp),
            "verifyOTP" => Ok(Self::VerifyOtp),
            other => Err(AppError::UnknownAction(other.to_string())),
        }
    }
}

/// 解析後的請求：`{ action, ...params }`
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: Action,
    pub params: Map<String, Value>,
}

impl ActionRequest {
    pub fn parse(body: &Value) -> Result<Self> {
        let Value::Object(fields) = body else {
            return Err(AppError::invalid_input("body", "expected a JSON object"));
        };

        let name = match fields.get("action") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim(),
            Some(Value::String(_)) | Some(Value::Null) | None => {
                return Err(AppError::invalid_input("action", "value is required"))
            }
            Some(_) => return Err(AppError::invalid_input("action", "must be a string")),
        };
        let action = name.parse()?;

        let mut params = fields.clone();
        params.remove("action");
        Ok(Self { action, params })
    }

    pub fn from_body(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Err(AppError::invalid_input("body", "request body is empty"));
        }
        let value: Value = serde_json::from_str(body)
            .map_err(|e| AppError::invalid_input("body", format!("invalid JSON: {}", e)))?;
        Self::parse(&value)
    }

    fn text(&self, name: &str) -> Result<String> {
        required_text(name, self.params.get(name))
    }
}

/// `{ success: true, data }` / `{ success: false, error, errorType, details? }`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_type: None,
            details: None,
        }
    }

    pub fn from_error(error: &AppError) -> Self {
        let details = match error {
            AppError::AmbiguousMatch { identifier, rows } => {
                Some(json!({ "identifier": identifier, "rows": rows }))
            }
            AppError::InvalidInput { field, .. } => Some(json!({ "field": field })),
            AppError::NotFound { identifier } => Some(json!({ "identifier": identifier })),
            _ => None,
        };
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            error_type: Some(error.category()),
            details,
        }
    }
}

pub struct Dispatcher<S: SheetStore> {
    borrowers: BorrowerService<S>,
    users: UserDirectory<S>,
    otp: OtpService<S>,
    timeout: Duration,
}

impl<S: SheetStore> Clone for Dispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            borrowers: self.borrowers.clone(),
            users: self.users.clone(),
            otp: self.otp.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: SheetStore> Dispatcher<S> {
    pub fn new(
        borrowers: BorrowerService<S>,
        users: UserDirectory<S>,
        otp: OtpService<S>,
        timeout: Duration,
    ) -> Self {
        Self {
            borrowers,
            users,
            otp,
            timeout,
        }
    }

    /// Runs one request within the request timeout.
    pub async fn dispatch(&self, request: ActionRequest) -> Result<Value> {
        let action = request.action;
        tracing::info!("🎯 Action: {}", action.name());

        tokio::time::timeout(self.timeout, self.run(request))
            .await
            .map_err(|_| AppError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
    }

    async fn run(&self, request: ActionRequest) -> Result<Value> {
        let data = match request.action {
            Action::CheckUserEmail => {
                let exists = self.users.contains(&request.text("email")?).await?;
                json!({ "exists": exists })
            }
            Action::FetchBorrowerData => {
                let email = request.text("userEmail")?;
                serde_json::to_value(self.borrowers.list_for_owner(&email).await?)?
            }
            Action::FetchFreddieMacRates => {
                serde_json::to_value(self.borrowers.rates().all().await?)?
            }
            Action::AddBorrowerData => {
                let data = BorrowerData::from_value(request.params.get("borrowerData"))?;
                serde_json::to_value(self.borrowers.create(data).await?)?
            }
            Action::UpdateBorrowerData => {
                let id = request.text("borrowerId")?;
                let data = BorrowerData::from_value(request.params.get("borrowerData"))?;
                serde_json::to_value(self.borrowers.update(&id, data).await?)?
            }
            Action::DeleteBorrowerData => {
                let id = request.text("borrowerId")?;
                serde_json::to_value(self.borrowers.delete(&id).await?)?
            }
            Action::SendOtp => {
                serde_json::to_value(self.otp.send(&request.text("email")?).await?)?
            }
            Action::VerifyOtp => {
                let email = request.text("email")?;
                let code = request.text("otp")?;
                serde_json::to_value(self.otp.verify(&email, &code).await?)?
            }
        };
        Ok(data)
    }

    /// Raw request body → HTTP status and response envelope. Never fails.
    pub async fn handle_body(&self, body: &str) -> (u16, ApiResponse) {
        let start = Instant::now();
        let result = match ActionRequest::from_body(body) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(data) => {
                tracing::info!("✅ Operation successful in {:?}", start.elapsed());
                (200, ApiResponse::ok(data))
            }
            Err(e) => {
                tracing::error!("❌ Request failed: {} (Category: {:?})", e, e.category());
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                (e.status_code(), ApiResponse::from_error(&e))
            }
        }
    }
}
