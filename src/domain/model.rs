use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 一列資料：header label → cell 文字
pub type RowMap = HashMap<String, String>;

/// 寫入 Sheets 的 cell 值
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(Decimal),
    Bool(bool),
    Formula(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Sheets 在 USER_ENTERED 模式下會把 `=`/`+`/`-`/`@` 開頭的文字當公式，
    /// 因此加上 `'` 前綴
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) if s.starts_with(['=', '+', '-', '@']) => {
                serde_json::Value::String(format!("'{}", s))
            }
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Number(d) => serde_json::Value::String(d.normalize().to_string()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Formula(f) => serde_json::Value::String(f.clone()),
        }
    }

    /// The text a sheet shows for this cell when nothing evaluates it.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(d) => d.normalize().to_string(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Formula(f) => f.clone(),
        }
    }
}

/// 衍生欄位寫入方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedMode {
    /// 由 Sheets 公式即時重算
    #[default]
    Formula,
    /// 寫入伺服器算好的值
    Static,
}

/// 試算表分頁名稱與目前利率所在列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub users: String,
    pub borrowers: String,
    pub rates: String,
    /// 1-based sheet row of the current market rate (row 1 is the header).
    pub current_rate_row: usize,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            users: "Users".to_string(),
            borrowers: "Borrower_Data".to_string(),
            rates: "Freddie_Mac_Rate".to_string(),
            current_rate_row: 2,
        }
    }
}

/// Validated primary inputs of a borrower.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanInputs {
    pub loan_amount: Decimal,
    pub annual_rate_percent: Decimal,
    pub desired_monthly_savings: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFields {
    #[serde(with = "rust_decimal::serde::float")]
    pub current_monthly_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_payment: Decimal,
    pub market_rate_at_entry_time: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub market_monthly_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_new_payment: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_savings: Decimal,
    pub refi_opportunity: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BorrowerRecord {
    pub unique_id: String,
    pub borrower_name: String,
    pub inputs: LoanInputs,
    pub user_email: String,
}

/// 市場利率快照，rate 保持原樣字串 (例如 "5.00%")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRate {
    pub date: String,
    pub thirty_year_fixed_rate: String,
}

/// The rate the calculator uses, with the cell it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentRate {
    pub rate: MarketRate,
    pub percent: Decimal,
    pub cell: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    pub success: bool,
    pub unique_id: String,
    pub calculated_values: DerivedFields,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageOutcome {
    pub success: bool,
    pub message: String,
}

impl MessageOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
