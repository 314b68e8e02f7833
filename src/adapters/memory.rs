use crate::domain::model::CellValue;
use crate::domain::ports::SheetStore;
use crate::utils::a1::parse_range;
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-local sheet store for tests and local development.
///
/// Cells hold the text a sheet would display for unevaluated values; formulas
/// are kept as their source text.
#[derive(Debug, Clone, Default)]
pub struct InMemorySheetStore {
    sheets: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Vec<String>>>>> {
        self.sheets
            .lock()
            .map_err(|_| AppError::upstream("in-memory sheet store poisoned"))
    }

    /// 直接覆寫整個分頁
    pub fn seed(&self, sheet: &str, rows: &[&[&str]]) {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect();
        if let Ok(mut sheets) = self.lock() {
            sheets.insert(sheet.to_string(), rows);
        }
    }

    /// Snapshot of a sheet's rows (empty if the sheet does not exist).
    pub fn rows(&self, sheet: &str) -> Vec<Vec<String>> {
        self.lock()
            .ok()
            .and_then(|sheets| sheets.get(sheet).cloned())
            .unwrap_or_default()
    }
}

fn trim_row(mut row: Vec<String>) -> Vec<String> {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
    row
}

#[async_trait]
impl SheetStore for InMemorySheetStore {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let parsed = parse_range(range)?;
        let sheets = self.lock()?;
        let Some(rows) = sheets.get(&parsed.sheet) else {
            return Ok(Vec::new());
        };

        let first_row = parsed.start_row.unwrap_or(1).max(1) - 1;
        let last_row = parsed.end_row.unwrap_or(rows.len()).min(rows.len());
        let first_col = parsed.start_col.unwrap_or(0);

        let mut values: Vec<Vec<String>> = rows
            .iter()
            .take(last_row)
            .skip(first_row)
            .map(|row| {
                let end = parsed.end_col.map(|c| c + 1).unwrap_or(row.len()).min(row.len());
                let cells = row.get(first_col..end).map(<[String]>::to_vec).unwrap_or_default();
                trim_row(cells)
            })
            .collect();

        while values.last().is_some_and(|r| r.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    async fn append_row(&self, range: &str, row: Vec<CellValue>) -> Result<()> {
        let parsed = parse_range(range)?;
        let mut sheets = self.lock()?;
        let rows = sheets.entry(parsed.sheet).or_default();
        while rows.last().is_some_and(|r| r.iter().all(String::is_empty)) {
            rows.pop();
        }
        rows.push(row.iter().map(CellValue::display).collect());
        Ok(())
    }

    async fn update_range(&self, range: &str, row: Vec<CellValue>) -> Result<()> {
        let parsed = parse_range(range)?;
        let row_number = parsed
            .start_row
            .ok_or_else(|| AppError::invalid_input("range", format!("'{}' has no row", range)))?;
        let first_col = parsed.start_col.unwrap_or(0);

        let mut sheets = self.lock()?;
        let rows = sheets.entry(parsed.sheet).or_default();
        if rows.len() < row_number {
            rows.resize(row_number, Vec::new());
        }
        let target = &mut rows[row_number - 1];
        if target.len() < first_col + row.len() {
            target.resize(first_col + row.len(), String::new());
        }
        for (offset, value) in row.iter().enumerate() {
            target[first_col + offset] = value.display();
        }
        Ok(())
    }

    async fn delete_row(&self, sheet: &str, row_number: usize) -> Result<()> {
        let mut sheets = self.lock()?;
        let rows = sheets
            .get_mut(sheet)
            .ok_or_else(|| AppError::upstream(format!("no sheet named '{}'", sheet)))?;
        if row_number == 0 || row_number > rows.len() {
            return Err(AppError::upstream(format!(
                "row {} is outside '{}' ({} rows)",
                row_number,
                sheet,
                rows.len()
            )));
        }
        rows.remove(row_number - 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_trims_and_bounds() {
        let store = InMemorySheetStore::new();
        store.seed("Users", &[&["Name", "Email", ""], &["Ann", "ann@example.com"], &[]]);

        let all = store.read_range("Users").await.unwrap();
        assert_eq!(all, vec![vec!["Name", "Email"], vec!["Ann", "ann@example.com"]]);

        let col_b = store.read_range("Users!B:B").await.unwrap();
        assert_eq!(col_b, vec![vec!["Email"], vec!["ann@example.com"]]);

        assert!(store.read_range("Missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_update_delete() {
        let store = InMemorySheetStore::new();
        store.seed("Data", &[&["A", "B"]]);

        store
            .append_row("Data!A:B", vec![CellValue::text("x"), CellValue::Bool(true)])
            .await
            .unwrap();
        store
            .append_row("Data!A:B", vec![CellValue::text("y"), CellValue::Bool(false)])
            .await
            .unwrap();
        assert_eq!(store.rows("Data")[2], vec!["y", "FALSE"]);

        store
            .update_range("Data!A2:B2", vec![CellValue::text("z"), CellValue::Formula("=1".into())])
            .await
            .unwrap();
        assert_eq!(store.rows("Data")[1], vec!["z", "=1"]);

        store.delete_row("Data", 2).await.unwrap();
        assert_eq!(store.rows("Data").len(), 2);
        assert_eq!(store.rows("Data")[1][0], "y");

        assert!(store.delete_row("Data", 9).await.is_err());
    }
}
