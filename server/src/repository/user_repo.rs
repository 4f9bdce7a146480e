//! User Repository
//!
//! Users, clients and memberships.

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{Client, DomainResult, Role, User, UserClient};
use super::traits::{like_pattern, Repository, SearchableRepository};

pub struct UserRepository<'c> {
    conn: &'c Connection,
}

impl<'c> UserRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, name, photo_url FROM users WHERE email = ?",
                params![email],
                row_to_user,
            )
            .optional()?)
    }

    pub fn create(&self, email: &str, name: &str, photo_url: Option<&str>) -> DomainResult<User> {
        self.conn.execute(
            "INSERT INTO users (email, name, photo_url) VALUES (?, ?, ?)",
            params![email, name, photo_url],
        )?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            email: email.to_string(),
            name: name.to_string(),
            photo_url: photo_url.map(str::to_string),
        })
    }

    pub fn create_client(&self, name: &str) -> DomainResult<Client> {
        self.conn
            .execute("INSERT INTO clients (name) VALUES (?)", params![name])?;
        Ok(Client {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn find_client(&self, client_id: i64) -> DomainResult<Option<Client>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM clients WHERE id = ?",
                params![client_id],
                |row| Ok(Client { id: row.get(0)?, name: row.get(1)? }),
            )
            .optional()?)
    }

    pub fn add_membership(&self, user_id: i64, client: &Client, role: Role) -> DomainResult<UserClient> {
        self.conn.execute(
            "INSERT INTO user_clients (user_id, client_id, role) VALUES (?, ?, ?)",
            params![user_id, client.id, role.as_str()],
        )?;
        Ok(UserClient {
            id: self.conn.last_insert_rowid(),
            user_id,
            client: client.clone(),
            role,
        })
    }

    pub fn membership(&self, user_id: i64, client_id: i64) -> DomainResult<Option<UserClient>> {
        Ok(self
            .conn
            .query_row(
                "SELECT uc.id, uc.user_id, c.id, c.name, uc.role
                 FROM user_clients uc JOIN clients c ON c.id = uc.client_id
                 WHERE uc.user_id = ? AND uc.client_id = ?",
                params![user_id, client_id],
                row_to_membership,
            )
            .optional()?)
    }

    pub fn memberships(&self, user_id: i64) -> DomainResult<Vec<UserClient>> {
        let mut stmt = self.conn.prepare(
            "SELECT uc.id, uc.user_id, c.id, c.name, uc.role
             FROM user_clients uc JOIN clients c ON c.id = uc.client_id
             WHERE uc.user_id = ? ORDER BY uc.id",
        )?;
        let rows = stmt.query_map(params![user_id], row_to_membership)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Whether a user with `email` already belongs to the client
    pub fn is_email_member(&self, email: &str, client_id: i64) -> DomainResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_clients uc JOIN users u ON u.id = uc.user_id
             WHERE u.email = ? AND uc.client_id = ?",
            params![email, client_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl Repository<User> for UserRepository<'_> {
    fn find_by_id(&self, id: i64) -> DomainResult<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, email, name, photo_url FROM users WHERE id = ?",
                params![id],
                row_to_user,
            )
            .optional()?)
    }
}

impl SearchableRepository<User> for UserRepository<'_> {
    /// Matches name or email
    fn search(&self, query: &str) -> DomainResult<Vec<User>> {
        let pattern = like_pattern(query);
        let mut stmt = self.conn.prepare(
            "SELECT id, email, name, photo_url FROM users
             WHERE name LIKE ?1 ESCAPE '\\' OR email LIKE ?1 ESCAPE '\\'
             ORDER BY name, id",
        )?;
        let rows = stmt.query_map(params![pattern], row_to_user)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        photo_url: row.get(3)?,
    })
}

fn row_to_membership(row: &rusqlite::Row) -> rusqlite::Result<UserClient> {
    Ok(UserClient {
        id: row.get(0)?,
        user_id: row.get(1)?,
        client: Client {
            id: row.get(2)?,
            name: row.get(3)?,
        },
        role: Role::from_str(&row.get::<_, String>(4)?),
    })
}
