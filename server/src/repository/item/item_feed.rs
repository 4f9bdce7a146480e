//! Item Feed Operations
//!
//! Visibility-filtered listing used by the feed and search queries.

use rusqlite::types::Value;

use crate::domain::{DomainResult, Item, ItemsSort};
use super::super::traits::like_pattern;
use super::item_repo::ITEM_COLUMNS;

/// Which part of the tree a feed covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// `parent_id IS NULL`
    TopLevel,
    Under(i64),
    /// Any depth, used by search
    Anywhere,
}

pub trait ItemFeedOperations {
    /// Items `viewer_id` authored or was shared on, in feed order
    fn list_visible(
        &self,
        viewer_id: i64,
        scope: FeedScope,
        search: Option<&str>,
        sort: ItemsSort,
    ) -> DomainResult<Vec<Item>>;
}

impl ItemFeedOperations for super::item_repo::ItemRepository<'_> {
    fn list_visible(
        &self,
        viewer_id: i64,
        scope: FeedScope,
        search: Option<&str>,
        sort: ItemsSort,
    ) -> DomainResult<Vec<Item>> {
        let mut sql = format!(
            "SELECT {} FROM items i WHERE (i.author_id = ? OR EXISTS (
                SELECT 1 FROM item_shared_with s WHERE s.item_id = i.id AND s.user_id = ?))",
            ITEM_COLUMNS
        );
        let mut values: Vec<Value> = vec![viewer_id.into(), viewer_id.into()];

        match scope {
            FeedScope::TopLevel => sql.push_str(" AND i.parent_id IS NULL"),
            FeedScope::Under(parent_id) => {
                sql.push_str(" AND i.parent_id = ?");
                values.push(parent_id.into());
            }
            FeedScope::Anywhere => {}
        }

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            sql.push_str(" AND i.text LIKE ? ESCAPE '\\'");
            values.push(like_pattern(term).into());
        }

        sql.push_str(match sort {
            ItemsSort::NewestFirst => " ORDER BY i.created_at DESC, i.id ASC",
            ItemsSort::OldestFirst => " ORDER BY i.created_at ASC, i.id ASC",
        });

        self.query_items(&sql, &values)
    }
}
