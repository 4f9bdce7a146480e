//! File Metadata Registration

use serde::Deserialize;

use crate::domain::{DomainError, DomainResult, FileNamer, User};
use crate::repository::{FileRepository, NewFile};
use super::views::FileView;
use super::Services;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileInput {
    pub original_name: String,
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: i64,
}

impl Services {
    /// Register an upload; the generated filename keeps the original extension
    pub async fn create_file(&self, user: &User, input: CreateFileInput) -> DomainResult<FileView> {
        if input.size < 0 {
            return Err(DomainError::invalid("File size must not be negative"));
        }
        let content_type = input
            .content_type
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| FileNamer::guess_content_type(&input.original_name));
        let meta = NewFile {
            original_name: input.original_name,
            content_type,
            size: input.size,
        };

        self.db
            .with_transaction(|conn| {
                let file = FileRepository::new(conn).create(&meta, user.id)?;
                Ok(FileView::from(&file))
            })
            .await
    }
}
