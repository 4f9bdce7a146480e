//! File Metadata Repository

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{DomainResult, FileNamer, FileRecord};
use super::traits::Repository;

/// Metadata supplied by the uploader
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
}

pub struct FileRepository<'c> {
    conn: &'c Connection,
}

impl<'c> FileRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Store metadata under a freshly generated filename
    pub fn create(&self, meta: &NewFile, owner_id: i64) -> DomainResult<FileRecord> {
        let filename = FileNamer::generate(&meta.original_name);
        self.conn.execute(
            "INSERT INTO files (filename, original_name, content_type, size, owner_id)
             VALUES (?, ?, ?, ?, ?)",
            params![filename, meta.original_name, meta.content_type, meta.size, owner_id],
        )?;
        Ok(FileRecord {
            id: self.conn.last_insert_rowid(),
            filename,
            original_name: meta.original_name.clone(),
            content_type: meta.content_type.clone(),
            size: meta.size,
            owner_id,
        })
    }
}

impl Repository<FileRecord> for FileRepository<'_> {
    fn find_by_id(&self, id: i64) -> DomainResult<Option<FileRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, filename, original_name, content_type, size, owner_id FROM files WHERE id = ?",
                params![id],
                |row| {
                    Ok(FileRecord {
                        id: row.get(0)?,
                        filename: row.get(1)?,
                        original_name: row.get(2)?,
                        content_type: row.get(3)?,
                        size: row.get(4)?,
                        owner_id: row.get(5)?,
                    })
                },
            )
            .optional()?)
    }
}
