//! Client Invite Repository

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{Client, ClientInvite, DomainResult};
use super::db::{from_millis, now, to_millis};
use super::traits::Repository;

const SELECT_INVITE: &str = "SELECT i.id, i.email, c.id, c.name, i.invited_by, i.created_at
     FROM client_invites i JOIN clients c ON c.id = i.client_id";

pub struct InviteRepository<'c> {
    conn: &'c Connection,
}

impl<'c> InviteRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert unless an invite for (email, client) exists; returns the stored row either way
    pub fn upsert(&self, email: &str, client: &Client, invited_by: i64) -> DomainResult<ClientInvite> {
        self.conn.execute(
            "INSERT OR IGNORE INTO client_invites (email, client_id, invited_by, created_at)
             VALUES (?, ?, ?, ?)",
            params![email, client.id, invited_by, to_millis(&now())],
        )?;
        let invite = self.conn.query_row(
            &format!("{} WHERE i.email = ? AND i.client_id = ?", SELECT_INVITE),
            params![email, client.id],
            row_to_invite,
        )?;
        Ok(invite)
    }

    pub fn delete(&self, id: i64) -> DomainResult<()> {
        self.conn
            .execute("DELETE FROM client_invites WHERE id = ?", params![id])?;
        Ok(())
    }

    pub fn list_for_email(&self, email: &str) -> DomainResult<Vec<ClientInvite>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE i.email = ? ORDER BY i.id", SELECT_INVITE))?;
        let rows = stmt.query_map(params![email], row_to_invite)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl Repository<ClientInvite> for InviteRepository<'_> {
    fn find_by_id(&self, id: i64) -> DomainResult<Option<ClientInvite>> {
        Ok(self
            .conn
            .query_row(&format!("{} WHERE i.id = ?", SELECT_INVITE), params![id], row_to_invite)
            .optional()?)
    }
}

fn row_to_invite(row: &rusqlite::Row) -> rusqlite::Result<ClientInvite> {
    Ok(ClientInvite {
        id: row.get(0)?,
        email: row.get(1)?,
        client: Client {
            id: row.get(2)?,
            name: row.get(3)?,
        },
        invited_by: row.get(4)?,
        created_at: from_millis(row.get(5)?),
    })
}
