use crate::config::toml_config::{
    AppConfig, OtpConfig, ServerConfig, ServiceAccountConfig, SheetsConfig,
    DEFAULT_SHEETS_API_BASE_URL,
};
use crate::domain::model::{DerivedMode, SheetNames};
use crate::utils::error::{AppError, Result};
use std::env;
use std::str::FromStr;

fn parse_var<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw.filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|_| AppError::InvalidConfigValueError {
                field: name.to_string(),
                value,
                reason: "cannot be parsed".to_string(),
            })
        }
    }
}

fn parse_bool(name: &str, raw: Option<String>, default: bool) -> Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("FALSE") | Some("no") => Ok(false),
        Some(other) => Err(AppError::InvalidConfigValueError {
            field: name.to_string(),
            value: other.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

impl AppConfig {
    /// 從環境變數建立配置 (serverless 部署使用)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server_defaults = ServerConfig::default();
        let otp_defaults = OtpConfig::default();
        let tab_defaults = SheetNames::default();

        let derived_columns = match lookup("DERIVED_COLUMNS").as_deref().map(str::trim) {
            None | Some("") | Some("formula") => DerivedMode::Formula,
            Some("static") => DerivedMode::Static,
            Some(other) => {
                return Err(AppError::InvalidConfigValueError {
                    field: "DERIVED_COLUMNS".to_string(),
                    value: other.to_string(),
                    reason: "expected 'formula' or 'static'".to_string(),
                })
            }
        };

        Ok(Self {
            server: ServerConfig {
                bind_address: lookup("BIND_ADDRESS").unwrap_or(server_defaults.bind_address),
                request_timeout_seconds: parse_var(
                    "REQUEST_TIMEOUT_SECONDS",
                    lookup("REQUEST_TIMEOUT_SECONDS"),
                    server_defaults.request_timeout_seconds,
                )?,
            },
            sheets: SheetsConfig {
                spreadsheet_id: lookup("GOOGLE_SPREADSHEET_ID").unwrap_or_default(),
                api_base_url: lookup("SHEETS_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SHEETS_API_BASE_URL.to_string()),
                access_token: lookup("GOOGLE_SHEETS_ACCESS_TOKEN"),
                service_account: ServiceAccountConfig {
                    key_file: lookup("GOOGLE_SERVICE_ACCOUNT_KEY_FILE"),
                    client_email: lookup("GOOGLE_SERVICE_ACCOUNT_CLIENT_EMAIL"),
                    private_key: lookup("GOOGLE_SERVICE_ACCOUNT_PRIVATE_KEY"),
                    token_uri: lookup("GOOGLE_SERVICE_ACCOUNT_TOKEN_URI"),
                },
                token_url: lookup("GOOGLE_METADATA_TOKEN_URL"),
                tabs: SheetNames {
                    users: lookup("USERS_SHEET").unwrap_or(tab_defaults.users),
                    borrowers: lookup("BORROWERS_SHEET").unwrap_or(tab_defaults.borrowers),
                    rates: lookup("RATES_SHEET").unwrap_or(tab_defaults.rates),
                    current_rate_row: parse_var(
                        "CURRENT_RATE_ROW",
                        lookup("CURRENT_RATE_ROW"),
                        tab_defaults.current_rate_row,
                    )?,
                },
                derived_columns,
            },
            otp: OtpConfig {
                enabled: parse_bool("OTP_ENABLED", lookup("OTP_ENABLED"), otp_defaults.enabled)?,
                code_length: parse_var(
                    "OTP_CODE_LENGTH",
                    lookup("OTP_CODE_LENGTH"),
                    otp_defaults.code_length,
                )?,
                ttl_seconds: parse_var(
                    "OTP_TTL_SECONDS",
                    lookup("OTP_TTL_SECONDS"),
                    otp_defaults.ttl_seconds,
                )?,
                max_attempts: parse_var(
                    "OTP_MAX_ATTEMPTS",
                    lookup("OTP_MAX_ATTEMPTS"),
                    otp_defaults.max_attempts,
                )?,
                resend_cooldown_seconds: parse_var(
                    "OTP_RESEND_COOLDOWN_SECONDS",
                    lookup("OTP_RESEND_COOLDOWN_SECONDS"),
                    otp_defaults.resend_cooldown_seconds,
                )?,
            },
        })
    }
}
