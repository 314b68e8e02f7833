use crate::adapters::auth::{ServiceAccountKey, TokenSource};
use crate::domain::model::{DerivedMode, SheetNames};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub otp: OtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8888".to_string(),
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    pub access_token: Option<String>,
    #[serde(default)]
    pub service_account: ServiceAccountConfig,
    pub token_url: Option<String>,
    #[serde(default)]
    pub tabs: SheetNames,
    #[serde(default)]
    pub derived_columns: DerivedMode,
}

/// `key_file` 優先於 `client_email` + `private_key`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceAccountConfig {
    pub key_file: Option<String>,
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    pub token_uri: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_SHEETS_API_BASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    pub enabled: bool,
    pub code_length: u32,
    pub ttl_seconds: u64,
    pub max_attempts: u32,
    pub resend_cooldown_seconds: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            code_length: 6,
            ttl_seconds: 300,
            max_attempts: 5,
            resend_cooldown_seconds: 60,
        }
    }
}

impl OtpConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn resend_cooldown(&self) -> Duration {
        Duration::from_secs(self.resend_cooldown_seconds)
    }
}

/// 未被環境變數取代的 `${VAR}` 視為未設定
fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || (trimmed.starts_with("${") && trimmed.ends_with('}'))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !is_placeholder(v))
}

impl ServiceAccountConfig {
    fn key(&self) -> Result<Option<ServiceAccountKey>> {
        let key = match (
            present(&self.key_file),
            present(&self.client_email),
            present(&self.private_key),
        ) {
            (Some(path), _, _) => ServiceAccountKey::from_file(path)?,
            (None, Some(email), Some(private_key)) => ServiceAccountKey::new(email, private_key),
            (None, None, None) => return Ok(None),
            (None, None, Some(_)) => {
                return Err(AppError::MissingConfigError {
                    field: "sheets.service_account.client_email".to_string(),
                })
            }
            (None, Some(_), None) => {
                return Err(AppError::MissingConfigError {
                    field: "sheets.service_account.private_key".to_string(),
                })
            }
        };

        Ok(Some(match present(&self.token_uri) {
            Some(uri) => key.with_token_uri(uri),
            None => key,
        }))
    }
}

impl SheetsConfig {
    /// access token → service account → metadata server
    pub fn token_source(&self) -> Result<TokenSource> {
        if let Some(token) = present(&self.access_token) {
            return Ok(TokenSource::Static(token.to_string()));
        }
        if let Some(key) = self.service_account.key()? {
            return Ok(TokenSource::ServiceAccount(Box::new(key)));
        }
        if let Some(url) = present(&self.token_url) {
            return Ok(TokenSource::Metadata {
                url: url.to_string(),
            });
        }
        Err(AppError::MissingConfigError {
            field: "sheets.access_token, sheets.service_account or sheets.token_url".to_string(),
        })
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AppError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GOOGLE_SPREADSHEET_ID})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("bad substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if is_placeholder(&self.sheets.spreadsheet_id) {
            return Err(AppError::MissingConfigError {
                field: "sheets.spreadsheet_id".to_string(),
            });
        }

        validate_url("sheets.api_base_url", &self.sheets.api_base_url)?;
        match self.sheets.token_source()? {
            TokenSource::Metadata { url } => validate_url("sheets.token_url", &url)?,
            TokenSource::ServiceAccount(key) => {
                validate_url("sheets.service_account.token_uri", &key.token_uri)?;
                key.encoding_key()?;
            }
            TokenSource::Static(_) => {}
        }

        validate_non_empty_string("sheets.tabs.users", &self.sheets.tabs.users)?;
        validate_non_empty_string("sheets.tabs.borrowers", &self.sheets.tabs.borrowers)?;
        validate_non_empty_string("sheets.tabs.rates", &self.sheets.tabs.rates)?;
        // 第 1 列是 header
        validate_positive_number(
            "sheets.tabs.current_rate_row",
            self.sheets.tabs.current_rate_row as u64,
            2,
        )?;

        validate_non_empty_string("server.bind_address", &self.server.bind_address)?;
        validate_positive_number(
            "server.request_timeout_seconds",
            self.server.request_timeout_seconds,
            1,
        )?;

        if self.otp.enabled {
            validate_range("otp.code_length", self.otp.code_length, 4, 10)?;
            validate_positive_number("otp.ttl_seconds", self.otp.ttl_seconds, 1)?;
            validate_positive_number("otp.max_attempts", self.otp.max_attempts as u64, 1)?;
        }

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()?;
        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }
}
