//! Item Sharing Operations
//!
//! Sharing lists, explicit recipients, attachments and summaries.

use rusqlite::params;

use crate::domain::{DomainResult, Summary};
use super::item_repo::encode_json;

pub trait ItemSharingOperations {
    /// Replace the read-access list; callers keep the author in it
    fn replace_shared_with(&self, id: i64, users: &[i64]) -> DomainResult<()>;

    fn replace_recipients(&self, id: i64, users: &[i64]) -> DomainResult<()>;

    fn replace_attachments(&self, id: i64, files: &[i64]) -> DomainResult<()>;

    fn set_summary(&self, id: i64, summary: &Summary) -> DomainResult<()>;

    /// Returns false when the item had no summary
    fn delete_summary(&self, id: i64) -> DomainResult<bool>;
}

impl super::item_repo::ItemRepository<'_> {
    fn replace_list(&self, table: &str, column: &str, id: i64, values: &[i64]) -> DomainResult<()> {
        self.conn.execute(
            &format!("DELETE FROM {} WHERE item_id = ?", table),
            params![id],
        )?;
        let mut stmt = self.conn.prepare(&format!(
            "INSERT OR IGNORE INTO {} (item_id, {}) VALUES (?, ?)",
            table, column
        ))?;
        for value in values {
            stmt.execute(params![id, value])?;
        }
        Ok(())
    }
}

impl ItemSharingOperations for super::item_repo::ItemRepository<'_> {
    fn replace_shared_with(&self, id: i64, users: &[i64]) -> DomainResult<()> {
        self.replace_list("item_shared_with", "user_id", id, users)
    }

    fn replace_recipients(&self, id: i64, users: &[i64]) -> DomainResult<()> {
        self.replace_list("item_recipients", "user_id", id, users)
    }

    fn replace_attachments(&self, id: i64, files: &[i64]) -> DomainResult<()> {
        self.replace_list("item_attachments", "file_id", id, files)
    }

    fn set_summary(&self, id: i64, summary: &Summary) -> DomainResult<()> {
        self.conn.execute(
            "INSERT INTO item_summaries (item_id, text, rich_text, should_replace_original_item)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (item_id) DO UPDATE SET text = excluded.text,
                rich_text = excluded.rich_text,
                should_replace_original_item = excluded.should_replace_original_item",
            params![
                id,
                summary.text,
                encode_json(&summary.rich_text)?,
                summary.should_replace_original_item
            ],
        )?;
        Ok(())
    }

    fn delete_summary(&self, id: i64) -> DomainResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM item_summaries WHERE item_id = ?", params![id])?;
        Ok(removed > 0)
    }
}
