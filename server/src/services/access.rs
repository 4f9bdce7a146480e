//! Authorization Filter
//!
//! Read access is authorship or membership of `sharedWith`. Any referenced
//! item the caller cannot read is reported as not found, so inaccessible
//! items never reveal that they exist.

use rusqlite::Connection;

use crate::domain::{
    parse_tagged, Client, DomainError, DomainResult, GlobalId, IdTag, Item, User,
};
use crate::repository::{ItemRepository, Repository, UserRepository};

pub fn can_read(user: &User, item: &Item) -> bool {
    item.can_read(user.id)
}

pub fn can_write(user: &User, item: &Item) -> bool {
    item.can_write(user.id)
}

pub fn can_read_goal(user: &User, item: &Item) -> bool {
    item.is_goal() && can_read(user, item)
}

/// Owners and admins of a client may manage its invites
pub fn can_manage_client(conn: &Connection, user: &User, client: &Client) -> DomainResult<bool> {
    Ok(UserRepository::new(conn)
        .membership(user.id, client.id)?
        .map(|m| m.role.can_manage())
        .unwrap_or(false))
}

/// Fail with `Unauthorized` unless `user` may modify `item`
pub fn ensure_writable(user: &User, item: &Item) -> DomainResult<()> {
    if can_write(user, item) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized("Not allowed to modify item".to_string()))
    }
}

/// Parse an `Item:n` id; anything else is `<what> not found`
pub fn item_ref(raw: &str, what: &str) -> DomainResult<i64> {
    raw.parse::<GlobalId>()
        .map_err(|_| DomainError::not_found(format!("{} not found", what)))?
        .expect_tag(IdTag::Item, what)
}

/// Load an item the user can read, or `<what> not found`
pub fn readable_item(conn: &Connection, user: &User, id: i64, what: &str) -> DomainResult<Item> {
    ItemRepository::new(conn)
        .find_by_id(id)?
        .filter(|item| can_read(user, item))
        .ok_or_else(|| DomainError::not_found(format!("{} not found", what)))
}

/// Resolve a list of `Item:n` ids, all of which must be readable
pub fn readable_items(conn: &Connection, user: &User, raw: &[String], what: &str) -> DomainResult<Vec<Item>> {
    let ids = dedup(parse_tagged(raw, IdTag::Item, what)?);
    ids.into_iter()
        .map(|id| readable_item(conn, user, id, what))
        .collect()
}

/// Order-preserving dedup
pub fn dedup(ids: Vec<i64>) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

/// Keep the ids among `ids` that `user` can read
pub fn filter_readable(conn: &Connection, user: &User, ids: &[i64]) -> DomainResult<Vec<i64>> {
    let repo = ItemRepository::new(conn);
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(item) = repo.find_by_id(*id)? {
            if can_read(user, &item) {
                out.push(*id);
            }
        }
    }
    Ok(out)
}
