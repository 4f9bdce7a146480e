//! Item Repository - Core CRUD Operations
//!
//! SQLite-backed storage for the polymorphic item table.
//! Specialized operations are in separate modules:
//! - item_hierarchy: parent links, recursive child counts, answer flags
//! - item_sharing: sharing/recipient/attachment lists and summaries
//! - item_links: goal constituents and blocked-by graph
//! - item_feed: visibility-filtered feed queries

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::{
    AcceptedAnswer, ActionExpectation, DomainError, DomainResult, Item, ItemType, ItemVariant,
    Summary, TaskStatus,
};
use super::super::db::{from_millis, now, to_millis};
use super::super::traits::Repository;
use super::item_sharing::ItemSharingOperations;

pub(super) const ITEM_COLUMNS: &str = "id, item_type, parent_id, author_id, text, rich_text, \
    has_expectation, complete_until, fulfilled, is_accepted_answer, status, has_accepted_answer, \
    accepted_text, accepted_rich_text, acknowledged, goal_status, created_at, updated_at";

/// SQLite implementation of the Item store
pub struct ItemRepository<'c> {
    pub(super) conn: &'c Connection,
}

/// Column values for the variant-specific part of a row
struct VariantColumns {
    status: Option<&'static str>,
    has_accepted_answer: bool,
    accepted_text: Option<String>,
    accepted_rich_text: Option<String>,
    acknowledged: Option<bool>,
    goal_status: Option<&'static str>,
}

impl VariantColumns {
    fn from_variant(variant: &ItemVariant) -> DomainResult<Self> {
        let mut cols = VariantColumns {
            status: None,
            has_accepted_answer: false,
            accepted_text: None,
            accepted_rich_text: None,
            acknowledged: None,
            goal_status: None,
        };
        match variant {
            ItemVariant::Message => {}
            ItemVariant::Task { status } => cols.status = Some(status.as_str()),
            ItemVariant::Question { accepted_answer } => {
                if let Some(answer) = accepted_answer {
                    cols.has_accepted_answer = true;
                    cols.accepted_text = Some(answer.text.clone());
                    cols.accepted_rich_text = encode_json(&answer.rich_text)?;
                }
            }
            ItemVariant::Info { acknowledged } => cols.acknowledged = Some(*acknowledged),
            ItemVariant::Goal { goal_status } => cols.goal_status = Some(goal_status.as_str()),
        }
        Ok(cols)
    }
}

impl<'c> ItemRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Insert a new item with its sharing lists; `entity.id` is ignored
    pub fn create(&self, entity: &Item) -> DomainResult<Item> {
        let cols = VariantColumns::from_variant(&entity.variant)?;
        let expectation = entity.action_expectation.as_ref();

        self.conn.execute(
            "INSERT INTO items (item_type, parent_id, author_id, text, rich_text, has_expectation,
                complete_until, fulfilled, is_accepted_answer, status, has_accepted_answer,
                accepted_text, accepted_rich_text, acknowledged, goal_status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                entity.item_type().as_str(),
                entity.parent_id,
                entity.author_id,
                entity.text,
                encode_json(&entity.rich_text)?,
                expectation.is_some(),
                expectation.and_then(|e| e.complete_until.as_ref()).map(to_millis),
                expectation.map(|e| e.fulfilled).unwrap_or(false),
                entity.is_accepted_answer,
                cols.status,
                cols.has_accepted_answer,
                cols.accepted_text,
                cols.accepted_rich_text,
                cols.acknowledged,
                cols.goal_status,
                to_millis(&entity.created_at),
                to_millis(&entity.updated_at),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.replace_shared_with(id, &entity.shared_with)?;
        self.replace_recipients(id, &entity.to)?;
        self.replace_attachments(id, &entity.attachments)?;

        self.find_by_id(id)?
            .ok_or_else(|| DomainError::Internal(format!("Item {} vanished after insert", id)))
    }

    /// Persist the base row and variant fields, bumping `updated_at`.
    /// Sharing lists are written through `ItemSharingOperations`.
    pub fn update(&self, entity: &Item) -> DomainResult<Item> {
        let cols = VariantColumns::from_variant(&entity.variant)?;
        let expectation = entity.action_expectation.as_ref();
        let updated_at = now();

        let changed = self.conn.execute(
            "UPDATE items SET item_type = ?, parent_id = ?, text = ?, rich_text = ?,
                has_expectation = ?, complete_until = ?, fulfilled = ?, is_accepted_answer = ?,
                status = ?, has_accepted_answer = ?, accepted_text = ?, accepted_rich_text = ?,
                acknowledged = ?, goal_status = ?, updated_at = ?
             WHERE id = ?",
            params![
                entity.item_type().as_str(),
                entity.parent_id,
                entity.text,
                encode_json(&entity.rich_text)?,
                expectation.is_some(),
                expectation.and_then(|e| e.complete_until.as_ref()).map(to_millis),
                expectation.map(|e| e.fulfilled).unwrap_or(false),
                entity.is_accepted_answer,
                cols.status,
                cols.has_accepted_answer,
                cols.accepted_text,
                cols.accepted_rich_text,
                cols.acknowledged,
                cols.goal_status,
                to_millis(&updated_at),
                entity.id,
            ],
        )?;
        if changed == 0 {
            return Err(DomainError::not_found("Item not found"));
        }

        let mut updated = entity.clone();
        updated.updated_at = updated_at;
        Ok(updated)
    }

    /// Load sharing lists, attachments and summary for a base row
    pub(super) fn load_relations(&self, item: &mut Item) -> DomainResult<()> {
        item.shared_with = self.id_list(
            "SELECT user_id FROM item_shared_with WHERE item_id = ? ORDER BY rowid",
            item.id,
        )?;
        item.to = self.id_list(
            "SELECT user_id FROM item_recipients WHERE item_id = ? ORDER BY rowid",
            item.id,
        )?;
        item.attachments = self.id_list(
            "SELECT file_id FROM item_attachments WHERE item_id = ? ORDER BY rowid",
            item.id,
        )?;
        item.summary = self
            .conn
            .query_row(
                "SELECT text, rich_text, should_replace_original_item FROM item_summaries WHERE item_id = ?",
                params![item.id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, bool>(2)?,
                    ))
                },
            )
            .optional()?
            .map(|(text, rich_text, should_replace_original_item)| {
                Ok::<_, DomainError>(Summary {
                    text,
                    rich_text: decode_json(rich_text)?,
                    should_replace_original_item,
                })
            })
            .transpose()?;
        Ok(())
    }

    pub(super) fn id_list(&self, sql: &str, id: i64) -> DomainResult<Vec<i64>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params![id], |row| row.get::<_, i64>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Run a query selecting `ITEM_COLUMNS` and hydrate every row
    pub(super) fn query_items(&self, sql: &str, values: &[rusqlite::types::Value]) -> DomainResult<Vec<Item>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(row_to_item(row)?);
        }
        drop(rows);
        for item in items.iter_mut() {
            self.load_relations(item)?;
        }
        Ok(items)
    }
}

impl Repository<Item> for ItemRepository<'_> {
    fn find_by_id(&self, id: i64) -> DomainResult<Option<Item>> {
        let items = self.query_items(
            &format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS),
            &[id.into()],
        )?;
        Ok(items.into_iter().next())
    }
}

/// Convert a database row to an Item without its relation lists
pub(super) fn row_to_item(row: &rusqlite::Row) -> DomainResult<Item> {
    let item_type = ItemType::parse(&row.get::<_, String>(1)?)?;
    let variant = match item_type {
        ItemType::Message => ItemVariant::Message,
        ItemType::Task => ItemVariant::Task {
            status: TaskStatus::from_str(&row.get::<_, Option<String>>(10)?.unwrap_or_default()),
        },
        ItemType::Question => {
            let accepted_answer = if row.get::<_, bool>(11)? {
                Some(AcceptedAnswer {
                    text: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
                    rich_text: decode_json(row.get(13)?)?,
                })
            } else {
                None
            };
            ItemVariant::Question { accepted_answer }
        }
        ItemType::Info => ItemVariant::Info {
            acknowledged: row.get::<_, Option<bool>>(14)?.unwrap_or(false),
        },
        ItemType::Goal => ItemVariant::Goal {
            goal_status: TaskStatus::from_str(&row.get::<_, Option<String>>(15)?.unwrap_or_default()),
        },
    };

    let action_expectation = if row.get::<_, bool>(6)? {
        Some(ActionExpectation {
            complete_until: row.get::<_, Option<i64>>(7)?.map(from_millis),
            fulfilled: row.get(8)?,
        })
    } else {
        None
    };

    Ok(Item {
        id: row.get(0)?,
        parent_id: row.get(2)?,
        author_id: row.get(3)?,
        text: row.get(4)?,
        rich_text: decode_json(row.get(5)?)?,
        to: Vec::new(),
        shared_with: Vec::new(),
        attachments: Vec::new(),
        action_expectation,
        is_accepted_answer: row.get(9)?,
        summary: None,
        variant,
        created_at: from_millis(row.get(16)?),
        updated_at: from_millis(row.get(17)?),
    })
}

pub(super) fn encode_json(value: &Option<serde_json::Value>) -> DomainResult<Option<String>> {
    Ok(value.as_ref().map(serde_json::to_string).transpose()?)
}

pub(super) fn decode_json(raw: Option<String>) -> DomainResult<Option<serde_json::Value>> {
    Ok(raw.as_deref().map(serde_json::from_str).transpose()?)
}
