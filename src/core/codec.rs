//! Header-resolved row codec for the borrower sheet.
//!
//! Reads never depend on column positions: every semantic column is resolved
//! against the header row. Writes use the fixed [`BorrowerColumn`] layout.

use crate::core::calculator::TERM_MONTHS;
use crate::domain::model::{
    BorrowerRecord, CellValue, CurrentRate, DerivedFields, DerivedMode, LoanInputs, RowMap,
};
use crate::utils::a1::column_letter;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::parse_decimal_text;

/// Header row of a sheet with case-insensitive column lookup.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    sheet: String,
    headers: Vec<String>,
}

impl HeaderIndex {
    pub fn new(sheet: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            sheet: sheet.into(),
            headers,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 依位置對應 header，缺少的尾端 cell 一律給空字串
    pub fn decode(&self, row: &[String]) -> RowMap {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.trim().is_empty())
            .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect()
    }

    /// First column whose header satisfies `matcher` (on the lowercased header).
    pub fn find(&self, matcher: impl Fn(&str) -> bool) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| matcher(&h.trim().to_lowercase()))
    }

    pub fn find_column(&self, column: BorrowerColumn) -> Option<usize> {
        self.find(|h| column.matches(h))
    }

    pub fn require_column(&self, column: BorrowerColumn) -> Result<usize> {
        self.find_column(column).ok_or_else(|| AppError::MissingColumn {
            sheet: self.sheet.clone(),
            column: column.header().to_string(),
        })
    }
}

/// Cell of `row` at `index`, empty when the row is short.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

/// Persisted `Borrower_Data` layout, A..M.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowerColumn {
    UniqueId,
    BorrowerName,
    CurrentLoanAmount,
    CurrentInterestRate,
    CurrentMonthlyRate,
    DesiredMonthlySavings,
    UserEmail,
    CurrentPayment,
    MarketRate,
    MarketMonthlyRate,
    EstimatedNewPayment,
    EstimatedSavings,
    RefiOpportunity,
}

impl BorrowerColumn {
    pub const ALL: [BorrowerColumn; 13] = [
        Self::UniqueId,
        Self::BorrowerName,
        Self::CurrentLoanAmount,
        Self::CurrentInterestRate,
        Self::CurrentMonthlyRate,
        Self::DesiredMonthlySavings,
        Self::UserEmail,
        Self::CurrentPayment,
        Self::MarketRate,
        Self::MarketMonthlyRate,
        Self::EstimatedNewPayment,
        Self::EstimatedSavings,
        Self::RefiOpportunity,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Self::UniqueId => "Unique ID",
            Self::BorrowerName => "Borrower Name",
            Self::CurrentLoanAmount => "Current Loan Amount",
            Self::CurrentInterestRate => "Current Interest Rate",
            Self::CurrentMonthlyRate => "Current Monthly Rate",
            Self::DesiredMonthlySavings => "Desired Monthly Savings",
            Self::UserEmail => "User Email",
            Self::CurrentPayment => "Current Payment",
            Self::MarketRate => "Freddie Mac Rate",
            Self::MarketMonthlyRate => "Freddie Mac Monthly Rate",
            Self::EstimatedNewPayment => "Estimated New Payment",
            Self::EstimatedSavings => "Estimated Savings",
            Self::RefiOpportunity => "Refi Opportunity",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn letter(self) -> String {
        column_letter(self.index())
    }

    pub fn last() -> Self {
        Self::RefiOpportunity
    }

    /// 比對已轉小寫的 header
    pub fn matches(self, header: &str) -> bool {
        let has = |needle: &str| header.contains(needle);
        match self {
            Self::UniqueId => (has("unique") && has("id")) || header == "id",
            Self::BorrowerName => has("borrower") && (has("name") || has("last")),
            Self::CurrentLoanAmount => has("loan") && has("amount"),
            Self::CurrentInterestRate => has("interest") && has("rate"),
            Self::CurrentMonthlyRate => has("current") && has("monthly") && has("rate"),
            Self::DesiredMonthlySavings => has("desired") && has("savings"),
            Self::UserEmail => has("email"),
            Self::CurrentPayment => has("current") && has("payment"),
            Self::MarketRate => {
                (has("freddie") || has("market")) && has("rate") && !has("monthly")
            }
            Self::MarketMonthlyRate => (has("freddie") || has("market")) && has("monthly"),
            Self::EstimatedNewPayment => has("new") && has("payment"),
            Self::EstimatedSavings => has("estimated") && has("savings"),
            Self::RefiOpportunity => has("refi"),
        }
    }
}

/// Header row written when the borrower sheet is empty.
pub fn borrower_headers() -> Vec<String> {
    BorrowerColumn::ALL
        .iter()
        .map(|c| c.header().to_string())
        .collect()
}

/// `INDIRECT("C"&ROW())`: a reference to `column` on whatever row the formula lands on
fn same_row(column: BorrowerColumn) -> String {
    format!("INDIRECT(\"{}\"&ROW())", column.letter())
}

fn payment_formula(rate: BorrowerColumn) -> String {
    format!(
        "=ROUND(PMT({},{},-{}),0)",
        same_row(rate),
        TERM_MONTHS,
        same_row(BorrowerColumn::CurrentLoanAmount)
    )
}

/// Encodes one record in layout order.
///
/// In [`DerivedMode::Formula`] the derived columns are sheet formulas that follow
/// `rate.cell`; in [`DerivedMode::Static`] they hold `derived`. The rate cell is
/// referenced through `INDIRECT` so inserting a newer rate above it does not
/// shift the reference.
pub fn encode(
    record: &BorrowerRecord,
    derived: &DerivedFields,
    rate: &CurrentRate,
    mode: DerivedMode,
) -> Vec<CellValue> {
    use BorrowerColumn as C;

    BorrowerColumn::ALL
        .iter()
        .map(|&column| match (column, mode) {
            (C::UniqueId, _) => CellValue::text(&record.unique_id),
            (C::BorrowerName, _) => CellValue::text(&record.borrower_name),
            (C::CurrentLoanAmount, _) => CellValue::Number(record.inputs.loan_amount),
            (C::CurrentInterestRate, _) => CellValue::Number(record.inputs.annual_rate_percent),
            (C::DesiredMonthlySavings, _) => {
                CellValue::Number(record.inputs.desired_monthly_savings)
            }
            (C::UserEmail, _) => CellValue::text(&record.user_email),

            (C::CurrentMonthlyRate, DerivedMode::Formula) => CellValue::Formula(format!(
                "={}/100/12",
                same_row(C::CurrentInterestRate)
            )),
            (C::CurrentPayment, DerivedMode::Formula) => {
                CellValue::Formula(payment_formula(C::CurrentMonthlyRate))
            }
            (C::MarketRate, DerivedMode::Formula) => {
                CellValue::Formula(format!("=INDIRECT(\"{}\")", rate.cell))
            }
            (C::MarketMonthlyRate, DerivedMode::Formula) => {
                CellValue::Formula(format!("={}/12", same_row(C::MarketRate)))
            }
            (C::EstimatedNewPayment, DerivedMode::Formula) => {
                CellValue::Formula(payment_formula(C::MarketMonthlyRate))
            }
            (C::EstimatedSavings, DerivedMode::Formula) => CellValue::Formula(format!(
                "={}-{}",
                same_row(C::CurrentPayment),
                same_row(C::EstimatedNewPayment)
            )),
            (C::RefiOpportunity, DerivedMode::Formula) => CellValue::Formula(format!(
                "={}>={}",
                same_row(C::EstimatedSavings),
                same_row(C::DesiredMonthlySavings)
            )),

            (C::CurrentMonthlyRate, DerivedMode::Static) => {
                CellValue::Number(derived.current_monthly_rate)
            }
            (C::CurrentPayment, DerivedMode::Static) => CellValue::Number(derived.current_payment),
            (C::MarketRate, DerivedMode::Static) => {
                CellValue::text(&derived.market_rate_at_entry_time)
            }
            (C::MarketMonthlyRate, DerivedMode::Static) => {
                CellValue::Number(derived.market_monthly_rate)
            }
            (C::EstimatedNewPayment, DerivedMode::Static) => {
                CellValue::Number(derived.estimated_new_payment)
            }
            (C::EstimatedSavings, DerivedMode::Static) => {
                CellValue::Number(derived.estimated_savings)
            }
            (C::RefiOpportunity, DerivedMode::Static) => CellValue::Bool(derived.refi_opportunity),
        })
        .collect()
}

fn lookup<'a>(index: &HeaderIndex, map: &'a RowMap, column: BorrowerColumn) -> Option<&'a str> {
    let position = index.find_column(column)?;
    let header = index.headers().get(position)?;
    map.get(header).map(String::as_str)
}

fn required<'a>(index: &HeaderIndex, map: &'a RowMap, column: BorrowerColumn) -> Result<&'a str> {
    index.require_column(column)?;
    Ok(lookup(index, map, column).unwrap_or(""))
}

impl BorrowerRecord {
    /// Primary fields of a decoded row. Derived cells are not read back;
    /// they are recomputed on every write.
    pub fn from_mapping(index: &HeaderIndex, map: &RowMap) -> Result<Self> {
        use BorrowerColumn as C;

        Ok(Self {
            unique_id: lookup(index, map, C::UniqueId).unwrap_or("").to_string(),
            borrower_name: required(index, map, C::BorrowerName)?.to_string(),
            inputs: LoanInputs {
                loan_amount: parse_decimal_text(
                    "currentLoanAmount",
                    required(index, map, C::CurrentLoanAmount)?,
                )?,
                annual_rate_percent: parse_decimal_text(
                    "currentInterestRate",
                    required(index, map, C::CurrentInterestRate)?,
                )?,
                desired_monthly_savings: parse_decimal_text(
                    "desiredMonthlySavings",
                    required(index, map, C::DesiredMonthlySavings)?,
                )?,
            },
            user_email: required(index, map, C::UserEmail)?.to_string(),
        })
    }
}
