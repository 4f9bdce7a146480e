//! Database Connection and Setup
//!
//! Manages the SQLite connection, migrations and transaction scoping.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};

/// Shared handle to the single SQLite connection
///
/// Every request goes through this handle, so writers are serialized.
/// Repository closures run inline on the task holding the lock; one
/// request at a time is the intended concurrency model for this store.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run read-only work against the connection
    pub async fn read<F, T>(&self, f: F) -> DomainResult<T>
    where
        F: FnOnce(&Connection) -> DomainResult<T> + Send,
        T: Send,
    {
        let conn = self.conn.lock().await;
        f(&conn)
    }

    /// Execute a closure within a transaction.
    /// Commits on Ok, rolls back on Err.
    pub async fn with_transaction<F, T>(&self, f: F) -> DomainResult<T>
    where
        F: FnOnce(&Connection) -> DomainResult<T> + Send,
        T: Send,
    {
        let conn = self.conn.lock().await;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| DomainError::Internal(format!("Failed to begin transaction: {}", e)))?;
        match f(&conn) {
            Ok(val) => {
                conn.execute_batch("COMMIT")
                    .map_err(|e| DomainError::Internal(format!("Failed to commit transaction: {}", e)))?;
                Ok(val)
            }
            Err(e) => {
                if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                    tracing::error!("rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }
}

/// Open (or create) the database at `db_path` and apply the schema
pub fn init_db(db_path: &Path) -> DomainResult<Db> {
    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Internal(format!("Failed to open db: {}", e)))?;
    run_migrations(&conn)?;
    Ok(Db::new(conn))
}

/// In-memory database with the full schema
pub fn init_memory_db() -> DomainResult<Db> {
    let conn = Connection::open_in_memory()?;
    run_migrations(&conn)?;
    Ok(Db::new(conn))
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            name TEXT NOT NULL,
            photo_url TEXT
        );

        CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            client_id INTEGER NOT NULL REFERENCES clients(id),
            role TEXT NOT NULL,
            UNIQUE (user_id, client_id)
        );

        CREATE TABLE IF NOT EXISTS client_invites (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL COLLATE NOCASE,
            client_id INTEGER NOT NULL REFERENCES clients(id),
            invited_by INTEGER NOT NULL REFERENCES users(id),
            created_at INTEGER NOT NULL,
            UNIQUE (email, client_id)
        );

        CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT NOT NULL UNIQUE,
            original_name TEXT NOT NULL,
            content_type TEXT NOT NULL,
            size INTEGER NOT NULL,
            owner_id INTEGER NOT NULL REFERENCES users(id)
        );

        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_type TEXT NOT NULL,
            parent_id INTEGER REFERENCES items(id),
            author_id INTEGER NOT NULL REFERENCES users(id),
            text TEXT NOT NULL DEFAULT '',
            rich_text TEXT,
            has_expectation INTEGER NOT NULL DEFAULT 0,
            complete_until INTEGER,
            fulfilled INTEGER NOT NULL DEFAULT 0,
            is_accepted_answer INTEGER,
            status TEXT,
            has_accepted_answer INTEGER NOT NULL DEFAULT 0,
            accepted_text TEXT,
            accepted_rich_text TEXT,
            acknowledged INTEGER,
            goal_status TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_items_parent ON items(parent_id);
        CREATE INDEX IF NOT EXISTS idx_items_created ON items(created_at, id);

        CREATE TABLE IF NOT EXISTS item_shared_with (
            item_id INTEGER NOT NULL REFERENCES items(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            PRIMARY KEY (item_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_shared_with_user ON item_shared_with(user_id);

        CREATE TABLE IF NOT EXISTS item_recipients (
            item_id INTEGER NOT NULL REFERENCES items(id),
            user_id INTEGER NOT NULL REFERENCES users(id),
            PRIMARY KEY (item_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS item_attachments (
            item_id INTEGER NOT NULL REFERENCES items(id),
            file_id INTEGER NOT NULL REFERENCES files(id),
            PRIMARY KEY (item_id, file_id)
        );

        CREATE TABLE IF NOT EXISTS item_summaries (
            item_id INTEGER PRIMARY KEY REFERENCES items(id),
            text TEXT NOT NULL,
            rich_text TEXT,
            should_replace_original_item INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS goal_constituents (
            goal_id INTEGER NOT NULL REFERENCES items(id),
            item_id INTEGER NOT NULL REFERENCES items(id),
            PRIMARY KEY (goal_id, item_id)
        );

        CREATE TABLE IF NOT EXISTS item_blocked_by (
            item_id INTEGER NOT NULL REFERENCES items(id),
            blocker_id INTEGER NOT NULL REFERENCES items(id),
            PRIMARY KEY (item_id, blocker_id)
        );

        -- parent_key 0 stands for the top-level feed
        CREATE TABLE IF NOT EXISTS feed_activity (
            user_id INTEGER NOT NULL REFERENCES users(id),
            parent_key INTEGER NOT NULL,
            last_viewed_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, parent_key)
        );",
    )
    .map_err(|e| DomainError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

pub(crate) fn to_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}

/// Current time truncated to the stored millisecond precision
pub(crate) fn now() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis())
}

/// `?, ?, ?` for an IN clause of `n` values
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
