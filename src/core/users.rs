use crate::core::codec::cell;
use crate::core::identity::SheetTable;
use crate::domain::ports::SheetStore;
use crate::utils::a1::quote_sheet;
use crate::utils::error::Result;
use std::sync::Arc;

/// 沒有 email header 時使用 B 欄
const FALLBACK_EMAIL_COLUMN: usize = 1;

/// Allow-list of loan officers kept in the `Users` tab.
pub struct UserDirectory<S: SheetStore> {
    store: Arc<S>,
    sheet: String,
}

impl<S: SheetStore> Clone for UserDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sheet: self.sheet.clone(),
        }
    }
}

impl<S: SheetStore> UserDirectory<S> {
    pub fn new(store: Arc<S>, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
        }
    }

    pub async fn contains(&self, email: &str) -> Result<bool> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(false);
        }

        let values = self.store.read_range(&quote_sheet(&self.sheet)).await?;
        let table = SheetTable::from_values(&self.sheet, values);
        let column = table
            .index()
            .find(|h| h.contains("email"))
            .unwrap_or(FALLBACK_EMAIL_COLUMN);

        let exists = table
            .data_rows()
            .iter()
            .any(|row| cell(row, column).trim() == email);

        tracing::debug!("👤 {} in '{}': {}", email, self.sheet, exists);
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySheetStore;

    fn directory(rows: &[&[&str]]) -> UserDirectory<InMemorySheetStore> {
        let store = InMemorySheetStore::new();
        store.seed("Users", rows);
        UserDirectory::new(Arc::new(store), "Users")
    }

    #[tokio::test]
    async fn test_exact_match_after_trim() {
        let users = directory(&[
            &["Name", "Email"],
            &["Ann", "ann@example.com"],
            &["Bob", " bob@example.com "],
        ]);
        assert!(users.contains("ann@example.com").await.unwrap());
        assert!(users.contains(" bob@example.com").await.unwrap());
        assert!(!users.contains("ANN@example.com").await.unwrap());
        assert!(!users.contains("carol@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_header_row_is_not_a_user() {
        let users = directory(&[&["Name", "Email"]]);
        assert!(!users.contains("Email").await.unwrap());
    }

    #[tokio::test]
    async fn test_column_b_without_email_header() {
        let users = directory(&[&["Name", "Login"], &["Ann", "ann@example.com"]]);
        assert!(users.contains("ann@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_sheet() {
        let users = directory(&[]);
        assert!(!users.contains("ann@example.com").await.unwrap());
    }
}
