//! Feed Activity Repository

use rusqlite::{params, Connection};

use crate::domain::{DomainResult, FeedActivity};
use super::db::{now, to_millis};

pub struct ActivityRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ActivityRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Record that `user_id` just viewed the feed under `parent_id`
    pub fn bump(&self, user_id: i64, parent_id: Option<i64>) -> DomainResult<FeedActivity> {
        let viewed_at = now();
        self.conn.execute(
            "INSERT INTO feed_activity (user_id, parent_key, last_viewed_at) VALUES (?, ?, ?)
             ON CONFLICT (user_id, parent_key) DO UPDATE SET last_viewed_at = excluded.last_viewed_at",
            params![user_id, parent_id.unwrap_or(0), to_millis(&viewed_at)],
        )?;
        Ok(FeedActivity {
            user_id,
            parent_id,
            last_viewed_at: viewed_at,
        })
    }
}
