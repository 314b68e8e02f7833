//! Locates the single sheet row a borrower identifier refers to.

use crate::core::codec::{cell, BorrowerColumn, HeaderIndex};
use crate::utils::error::{AppError, Result};

/// 第一列為 header 的資料表快照
#[derive(Debug, Clone)]
pub struct SheetTable {
    index: HeaderIndex,
    rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn from_values(sheet: &str, mut values: Vec<Vec<String>>) -> Self {
        let headers = if values.is_empty() {
            Vec::new()
        } else {
            values.remove(0)
        };
        Self {
            index: HeaderIndex::new(sheet, headers),
            rows: values,
        }
    }

    pub fn index(&self) -> &HeaderIndex {
        &self.index
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Data row at a 1-based sheet row number (row 1 is the header).
    pub fn row(&self, row_number: usize) -> Option<&[String]> {
        row_number
            .checked_sub(2)
            .and_then(|i| self.rows.get(i))
            .map(Vec::as_slice)
    }

    /// Sheet row numbers of data rows whose `column` cell equals `value`.
    fn rows_where(&self, column: usize, value: &str) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| cell(row, column) == value)
            .map(|(i, _)| i + 2)
            .collect()
    }
}

/// Resolves `identifier` to exactly one sheet row number.
///
/// Matches the identity column first and falls back to the borrower name.
/// Several candidates are an [`AppError::AmbiguousMatch`]; the first one is
/// never picked.
pub fn resolve(identifier: &str, table: &SheetTable) -> Result<usize> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(AppError::invalid_input("borrowerId", "value is required"));
    }

    let id_column = table.index().find_column(BorrowerColumn::UniqueId);
    let name_column = table.index().find_column(BorrowerColumn::BorrowerName);

    if id_column.is_none() {
        // 舊版表格沒有 ID 欄，至少要有姓名欄
        table.index().require_column(BorrowerColumn::BorrowerName)?;
    }

    let mut candidates = id_column
        .map(|c| table.rows_where(c, identifier))
        .unwrap_or_default();

    if candidates.is_empty() {
        if let Some(c) = name_column {
            candidates = table.rows_where(c, identifier);
            if !candidates.is_empty() {
                tracing::debug!("'{}' matched by borrower name", identifier);
            }
        }
    }

    match candidates.as_slice() {
        [] => Err(AppError::NotFound {
            identifier: identifier.to_string(),
        }),
        [row] => Ok(*row),
        rows => Err(AppError::AmbiguousMatch {
            identifier: identifier.to_string(),
            rows: rows.to_vec(),
        }),
    }
}
