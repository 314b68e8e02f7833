use crate::core::codec::cell;
use crate::core::identity::SheetTable;
use crate::domain::model::{CurrentRate, MarketRate, RowMap, SheetNames};
use crate::domain::ports::SheetStore;
use crate::utils::a1::{cell_ref, quote_sheet};
use crate::utils::error::{AppError, Result};
use crate::utils::validation::parse_decimal_text;
use std::sync::Arc;

/// Reader for the market-rate reference sheet.
pub struct RateTable<S: SheetStore> {
    store: Arc<S>,
    names: SheetNames,
}

impl<S: SheetStore> Clone for RateTable<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            names: self.names.clone(),
        }
    }
}

fn is_rate_header(h: &str) -> bool {
    h.contains("rate") && h.contains("30")
}

impl<S: SheetStore> RateTable<S> {
    pub fn new(store: Arc<S>, names: SheetNames) -> Self {
        Self { store, names }
    }

    async fn load(&self) -> Result<SheetTable> {
        let values = self.store.read_range(&quote_sheet(&self.names.rates)).await?;
        Ok(SheetTable::from_values(&self.names.rates, values))
    }

    /// 全部利率列，依 header 轉成 mapping
    pub async fn all(&self) -> Result<Vec<RowMap>> {
        let table = self.load().await?;
        let rates: Vec<RowMap> = table
            .data_rows()
            .iter()
            .map(|row| table.index().decode(row))
            .collect();

        tracing::debug!("📈 {} market rate rows", rates.len());
        Ok(rates)
    }

    /// The rate the calculator uses: the configured reference row.
    pub async fn current(&self) -> Result<CurrentRate> {
        let table = self.load().await?;
        let row_number = self.names.current_rate_row;

        let rate_col = table
            .index()
            .find(is_rate_header)
            .or_else(|| table.index().find(|h| h.contains("rate")))
            .ok_or_else(|| AppError::MissingColumn {
                sheet: self.names.rates.clone(),
                column: "30-Year Fixed Rate".to_string(),
            })?;
        let date_col = table.index().find(|h| h.contains("date"));

        let row = table.row(row_number).ok_or_else(|| {
            AppError::upstream(format!(
                "no market rate at row {} of '{}'",
                row_number, self.names.rates
            ))
        })?;

        let raw = cell(row, rate_col).trim().to_string();
        let percent = parse_decimal_text("marketRate", &raw).map_err(|_| {
            AppError::upstream(format!(
                "market rate cell {} is not a rate: '{}'",
                cell_ref(&self.names.rates, rate_col, row_number),
                raw
            ))
        })?;
        if percent <= rust_decimal::Decimal::ZERO {
            return Err(AppError::upstream(format!("market rate must be positive, got '{}'", raw)));
        }

        let current = CurrentRate {
            rate: MarketRate {
                date: date_col.map(|c| cell(row, c).to_string()).unwrap_or_default(),
                thirty_year_fixed_rate: raw,
            },
            percent,
            cell: cell_ref(&self.names.rates, rate_col, row_number),
        };

        tracing::debug!(
            "📈 Current market rate {} ({})",
            current.rate.thirty_year_fixed_rate,
            current.rate.date
        );
        Ok(current)
    }
}
