use crate::utils::error::{AppError, Result};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(AppError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 解析使用者輸入的數字：接受 JSON number 或字串，去掉 `$`、`,`、`%` 與空白
pub fn parse_decimal_text(field_name: &str, raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(AppError::invalid_input(field_name, "value is required"));
    }

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .map_err(|_| AppError::invalid_input(field_name, format!("not a number: '{}'", raw)))
}

pub fn parse_decimal_value(field_name: &str, value: Option<&Value>) -> Result<Decimal> {
    match value {
        None | Some(Value::Null) => Err(AppError::invalid_input(field_name, "value is required")),
        Some(Value::Number(n)) => parse_decimal_text(field_name, &n.to_string()),
        Some(Value::String(s)) => parse_decimal_text(field_name, s),
        Some(other) => Err(AppError::invalid_input(
            field_name,
            format!("expected a number, got {}", other),
        )),
    }
}

pub fn require_positive(field_name: &str, value: Decimal) -> Result<Decimal> {
    if value <= Decimal::ZERO {
        return Err(AppError::invalid_input(field_name, "must be greater than 0"));
    }
    Ok(value)
}

pub fn require_non_negative(field_name: &str, value: Decimal) -> Result<Decimal> {
    if value < Decimal::ZERO {
        return Err(AppError::invalid_input(field_name, "must not be negative"));
    }
    Ok(value)
}

pub fn required_text(field_name: &str, value: Option<&Value>) -> Result<String> {
    let text = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        None | Some(Value::Null) => String::new(),
        Some(other) => {
            return Err(AppError::invalid_input(
                field_name,
                format!("expected a string, got {}", other),
            ))
        }
    };
    if text.is_empty() {
        return Err(AppError::invalid_input(field_name, "value is required"));
    }
    Ok(text)
}
