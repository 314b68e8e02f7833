//! Google Sheets v4 REST adapter.

use crate::adapters::auth::AccessTokenProvider;
use crate::config::SheetsConfig;
use crate::domain::model::CellValue;
use crate::domain::ports::SheetStore;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

/// Sheets 回傳的 cell 一律轉成顯示文字
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

/// Pulls `error.message` out of a Google API error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

#[derive(Debug, Clone)]
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    auth: AccessTokenProvider,
    timeout: Duration,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url =
            Url::parse(&config.api_base_url).map_err(|e| AppError::InvalidConfigValueError {
                field: "sheets.api_base_url".to_string(),
                value: config.api_base_url.clone(),
                reason: e.to_string(),
            })?;
        let auth = AccessTokenProvider::new(config.token_source()?, client.clone());

        Ok(Self {
            client,
            base_url,
            spreadsheet_id: config.spreadsheet_id.clone(),
            auth,
            timeout,
        })
    }

    /// `{base}/v4/spreadsheets/<segments...>`
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| AppError::ConfigError {
                message: format!("'{}' cannot be used as a base URL", self.base_url),
            })?;
            path.pop_if_empty().push("v4").push("spreadsheets");
            path.extend(segments);
        }
        Ok(url)
    }

    fn values_endpoint(&self, range: &str) -> Result<Url> {
        self.endpoint(&[self.spreadsheet_id.as_str(), "values", range])
    }

    async fn execute(&self, request: RequestBuilder, operation: &str) -> Result<Value> {
        let token = self.auth.token().await?;
        let response = request.bearer_auth(token).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout {
                    seconds: self.timeout.as_secs(),
                }
            } else {
                AppError::ApiError(e)
            }
        })?;

        let status = response.status();
        tracing::debug!("📡 {}: Sheets API responded {}", operation, status);
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::upstream(format!(
                "{} failed with status {}: {}",
                operation,
                status,
                error_message(&body)
            )));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| AppError::upstream(format!("{} returned malformed JSON: {}", operation, e)))
    }

    /// Numeric id of the tab titled `sheet`, needed for structural edits.
    pub async fn sheet_id(&self, sheet: &str) -> Result<i64> {
        let url = self.endpoint(&[self.spreadsheet_id.as_str()])?;
        let request = self
            .client
            .get(url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let body = self.execute(request, "get spreadsheet").await?;

        let meta: SpreadsheetMeta = serde_json::from_value(body)
            .map_err(|e| AppError::upstream(format!("unexpected spreadsheet metadata: {}", e)))?;

        meta.sheets
            .into_iter()
            .find(|s| s.properties.title == sheet)
            .map(|s| s.properties.sheet_id)
            .ok_or_else(|| AppError::upstream(format!("spreadsheet has no tab named '{}'", sheet)))
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let request = self
            .client
            .get(self.values_endpoint(range)?)
            .query(&[("majorDimension", "ROWS")]);
        let body = self.execute(request, "read").await?;

        let parsed: ValueRange = serde_json::from_value(body)
            .map_err(|e| AppError::upstream(format!("unexpected value range for {}: {}", range, e)))?;

        let rows: Vec<Vec<String>> = parsed
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        tracing::debug!("📥 Read {} rows from {}", rows.len(), range);
        Ok(rows)
    }

    async fn append_row(&self, range: &str, row: Vec<CellValue>) -> Result<()> {
        let cells: Vec<Value> = row.iter().map(CellValue::to_json).collect();
        let target = format!("{}:append", range);
        let request = self
            .client
            .post(self.endpoint(&[self.spreadsheet_id.as_str(), "values", target.as_str()])?)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "majorDimension": "ROWS", "values": [cells] }));

        self.execute(request, "append").await?;
        tracing::debug!("📤 Appended one row to {}", range);
        Ok(())
    }

    async fn update_range(&self, range: &str, row: Vec<CellValue>) -> Result<()> {
        let cells: Vec<Value> = row.iter().map(CellValue::to_json).collect();
        let request = self
            .client
            .put(self.values_endpoint(range)?)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": [cells] }));

        self.execute(request, "update").await?;
        tracing::debug!("📤 Overwrote {}", range);
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, row_number: usize) -> Result<()> {
        if row_number == 0 {
            return Err(AppError::invalid_input("row", "sheet rows start at 1"));
        }
        let sheet_id = self.sheet_id(sheet).await?;
        let target = format!("{}:batchUpdate", self.spreadsheet_id);

        let request = self
            .client
            .post(self.endpoint(&[target.as_str()])?)
            .json(&json!({
                "requests": [{
                    "deleteDimension": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "ROWS",
                            "startIndex": row_number - 1,
                            "endIndex": row_number
                        }
                    }
                }]
            }));

        self.execute(request, "delete row").await?;
        tracing::debug!("🗑️ Deleted row {} of '{}'", row_number, sheet);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_renders_json_scalars() {
        assert_eq!(cell_text(&json!("Smith")), "Smith");
        assert_eq!(cell_text(&json!(1896)), "1896");
        assert_eq!(cell_text(&json!(true)), "TRUE");
        assert_eq!(cell_text(&Value::Null), "");
    }

    #[test]
    fn test_error_message_prefers_google_error() {
        let body = r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(body), "The caller does not have permission");
        assert_eq!(error_message("  plain text  "), "plain text");
    }
}
