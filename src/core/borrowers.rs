//! Create / read / update / delete of borrower rows.

use crate::core::calculator::calculate;
use crate::core::codec::{self, cell, BorrowerColumn, HeaderIndex};
use crate::core::identity::{resolve, SheetTable};
use crate::core::rates::RateTable;
use crate::domain::model::{
    BorrowerRecord, CellValue, CreateOutcome, DerivedMode, LoanInputs, MessageOutcome, RowMap,
    SheetNames,
};
use crate::domain::ports::SheetStore;
use crate::utils::a1::{quote_sheet, row_range};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{
    parse_decimal_value, require_non_negative, require_positive, required_text,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

/// `borrowerData` as the widget sends it. Both camelCase keys and sheet
/// header labels are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerData {
    #[serde(alias = "Unique ID")]
    pub unique_id: Option<Value>,
    #[serde(
        alias = "Borrower Name",
        alias = "borrowerLastName",
        alias = "Borrower Last Name"
    )]
    pub borrower_name: Option<Value>,
    #[serde(alias = "Current Loan Amount", alias = "loanAmount")]
    pub current_loan_amount: Option<Value>,
    #[serde(alias = "Current Interest Rate", alias = "interestRate")]
    pub current_interest_rate: Option<Value>,
    #[serde(alias = "Desired Monthly Savings", alias = "desiredSavings")]
    pub desired_monthly_savings: Option<Value>,
    #[serde(alias = "User Email")]
    pub user_email: Option<Value>,
    /// 其餘欄位 (包含前端送來的衍生值) 一律忽略
    #[serde(flatten)]
    pub ignored: Map<String, Value>,
}

impl BorrowerData {
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        match value {
            Some(v @ Value::Object(_)) => serde_json::from_value(v.clone())
                .map_err(|e| AppError::invalid_input("borrowerData", e.to_string())),
            Some(_) => Err(AppError::invalid_input("borrowerData", "must be an object")),
            None => Err(AppError::invalid_input("borrowerData", "value is required")),
        }
    }

    /// Validated primary numeric inputs.
    pub fn loan_inputs(&self) -> Result<LoanInputs> {
        Ok(LoanInputs {
            loan_amount: require_positive(
                "currentLoanAmount",
                parse_decimal_value("currentLoanAmount", self.current_loan_amount.as_ref())?,
            )?,
            annual_rate_percent: require_positive(
                "currentInterestRate",
                parse_decimal_value("currentInterestRate", self.current_interest_rate.as_ref())?,
            )?,
            desired_monthly_savings: require_non_negative(
                "desiredMonthlySavings",
                parse_decimal_value(
                    "desiredMonthlySavings",
                    self.desired_monthly_savings.as_ref(),
                )?,
            )?,
        })
    }

    /// Fills every field the caller left out from the stored row.
    fn or_stored(mut self, index: &HeaderIndex, row: &[String]) -> Self {
        let stored = |column: BorrowerColumn| {
            index
                .find_column(column)
                .map(|i| cell(row, i).trim())
                .filter(|v| !v.is_empty())
                .map(|v| Value::String(v.to_string()))
        };
        let fill = |slot: &mut Option<Value>, column: BorrowerColumn| {
            let blank = match slot {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            };
            if blank {
                *slot = stored(column);
            }
        };

        fill(&mut self.borrower_name, BorrowerColumn::BorrowerName);
        fill(&mut self.current_loan_amount, BorrowerColumn::CurrentLoanAmount);
        fill(&mut self.current_interest_rate, BorrowerColumn::CurrentInterestRate);
        fill(&mut self.desired_monthly_savings, BorrowerColumn::DesiredMonthlySavings);
        fill(&mut self.user_email, BorrowerColumn::UserEmail);
        self
    }

    fn into_record(self, unique_id: String) -> Result<BorrowerRecord> {
        if !self.ignored.is_empty() {
            let keys: Vec<&String> = self.ignored.keys().collect();
            tracing::debug!("Ignoring client-supplied fields: {:?}", keys);
        }

        let inputs = self.loan_inputs()?;
        Ok(BorrowerRecord {
            unique_id,
            borrower_name: required_text("borrowerName", self.borrower_name.as_ref())?,
            inputs,
            user_email: required_text("userEmail", self.user_email.as_ref())?,
        })
    }
}

/// `BRW-<unix millis>-<12 hex>`
pub fn mint_unique_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(12).collect();
    format!("BRW-{}-{}", Utc::now().timestamp_millis(), suffix)
}

pub struct BorrowerService<S: SheetStore> {
    store: Arc<S>,
    rates: RateTable<S>,
    names: SheetNames,
    mode: DerivedMode,
}

impl<S: SheetStore> Clone for BorrowerService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            rates: self.rates.clone(),
            names: self.names.clone(),
            mode: self.mode,
        }
    }
}

impl<S: SheetStore> BorrowerService<S> {
    pub fn new(store: Arc<S>, names: SheetNames, mode: DerivedMode) -> Self {
        Self {
            rates: RateTable::new(Arc::clone(&store), names.clone()),
            store,
            names,
            mode,
        }
    }

    pub fn rates(&self) -> &RateTable<S> {
        &self.rates
    }

    fn sheet(&self) -> &str {
        &self.names.borrowers
    }

    /// `Borrower_Data!A:M`, the append target
    fn table_range(&self) -> String {
        format!(
            "{}!A:{}",
            quote_sheet(self.sheet()),
            BorrowerColumn::last().letter()
        )
    }

    async fn load(&self) -> Result<SheetTable> {
        // 讀整個分頁，欄位由 header 決定
        let values = self.store.read_range(&quote_sheet(self.sheet())).await?;
        Ok(SheetTable::from_values(self.sheet(), values))
    }

    async fn ensure_header(&self) -> Result<()> {
        let header_range = row_range(self.sheet(), 0, BorrowerColumn::last().index(), 1);
        let header = self.store.read_range(&header_range).await?;
        if header.iter().all(|row| row.is_empty()) {
            tracing::info!("📋 '{}' is empty, writing header row", self.sheet());
            let cells = codec::borrower_headers()
                .into_iter()
                .map(CellValue::Text)
                .collect();
            self.store.update_range(&header_range, cells).await?;
        }
        Ok(())
    }

    pub async fn create(&self, data: BorrowerData) -> Result<CreateOutcome> {
        // 先驗證輸入，再碰後端
        let record = data.into_record(mint_unique_id())?;
        let rate = self.rates.current().await?;
        let derived = calculate(&record.inputs, rate.percent)?;

        self.ensure_header().await?;
        let row = codec::encode(&record, &derived, &rate, self.mode);
        self.store.append_row(&self.table_range(), row).await?;

        tracing::info!(
            "✅ Borrower {} created ({} savings {})",
            record.unique_id,
            record.borrower_name,
            derived.estimated_savings
        );
        Ok(CreateOutcome {
            success: true,
            unique_id: record.unique_id,
            calculated_values: derived,
        })
    }

    /// Rows owned by `email`, keyed by header label.
    pub async fn list_for_owner(&self, email: &str) -> Result<Vec<RowMap>> {
        let table = self.load().await?;
        let Some(email_column) = table.index().find_column(BorrowerColumn::UserEmail) else {
            tracing::debug!("'{}' has no email column", self.sheet());
            return Ok(Vec::new());
        };

        let rows: Vec<RowMap> = table
            .data_rows()
            .iter()
            .filter(|row| cell(row, email_column) == email)
            .map(|row| table.index().decode(row))
            .collect();

        tracing::info!("👤 {} borrower rows for {}", rows.len(), email);
        Ok(rows)
    }

    pub async fn update(&self, identifier: &str, data: BorrowerData) -> Result<MessageOutcome> {
        let table = self.load().await?;
        let row_number = resolve(identifier, &table)?;
        let stored = table.row(row_number).unwrap_or(&[]);

        let existing_id = table
            .index()
            .find_column(BorrowerColumn::UniqueId)
            .map(|i| cell(stored, i).trim().to_string())
            .filter(|id| !id.is_empty());
        let unique_id = match existing_id {
            Some(id) => id,
            None => {
                let id = mint_unique_id();
                tracing::info!("🆔 Row {} had no id, assigned {}", row_number, id);
                id
            }
        };

        let record = data
            .or_stored(table.index(), stored)
            .into_record(unique_id)?;
        let rate = self.rates.current().await?;
        let derived = calculate(&record.inputs, rate.percent)?;

        let range = row_range(self.sheet(), 0, BorrowerColumn::last().index(), row_number);
        let row = codec::encode(&record, &derived, &rate, self.mode);
        self.store.update_range(&range, row).await?;

        tracing::info!("✅ Borrower {} updated at {}", record.unique_id, range);
        Ok(MessageOutcome::ok("Borrower data updated successfully"))
    }

    pub async fn delete(&self, identifier: &str) -> Result<MessageOutcome> {
        let table = self.load().await?;
        let row_number = resolve(identifier, &table)?;

        self.store.delete_row(self.sheet(), row_number).await?;

        tracing::info!("🗑️ Borrower '{}' deleted (row {})", identifier, row_number);
        Ok(MessageOutcome::ok("Borrower data deleted successfully"))
    }
}
