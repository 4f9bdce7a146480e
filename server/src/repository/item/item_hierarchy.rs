//! Item Hierarchy Operations
//!
//! Operations for managing parent-child relationships between items.
//! None of these enforce authorization; that belongs to the services.

use std::collections::HashMap;

use rusqlite::params;

use crate::domain::{DomainResult, Item};
use super::item_repo::ITEM_COLUMNS;

/// Trait for item hierarchy operations
pub trait ItemHierarchyOperations {
    /// Direct children in insertion order
    fn get_children(&self, parent_id: i64) -> DomainResult<Vec<Item>>;

    /// Pure link update
    fn set_parent(&self, id: i64, new_parent_id: Option<i64>) -> DomainResult<()>;

    /// Number of descendants, excluding the item itself
    fn child_count(&self, id: i64) -> DomainResult<i64>;

    /// Descendant counts for several items in one recursive query
    fn child_counts(&self, ids: &[i64]) -> DomainResult<HashMap<i64, i64>>;

    /// Whether `candidate` sits somewhere below `ancestor`
    fn is_descendant(&self, ancestor: i64, candidate: i64) -> DomainResult<bool>;

    fn set_accepted_flag(&self, id: i64, flag: Option<bool>) -> DomainResult<()>;

    /// Set `isAcceptedAnswer` on every direct child of `parent_id`
    fn set_children_accepted_flag(&self, parent_id: i64, flag: Option<bool>) -> DomainResult<()>;
}

impl ItemHierarchyOperations for super::item_repo::ItemRepository<'_> {
    fn get_children(&self, parent_id: i64) -> DomainResult<Vec<Item>> {
        self.query_items(
            &format!("SELECT {} FROM items WHERE parent_id = ? ORDER BY id", ITEM_COLUMNS),
            &[parent_id.into()],
        )
    }

    fn set_parent(&self, id: i64, new_parent_id: Option<i64>) -> DomainResult<()> {
        self.conn.execute(
            "UPDATE items SET parent_id = ? WHERE id = ?",
            params![new_parent_id, id],
        )?;
        Ok(())
    }

    fn child_count(&self, id: i64) -> DomainResult<i64> {
        Ok(self.child_counts(&[id])?.get(&id).copied().unwrap_or(0))
    }

    fn child_counts(&self, ids: &[i64]) -> DomainResult<HashMap<i64, i64>> {
        let mut counts: HashMap<i64, i64> = ids.iter().map(|id| (*id, 0)).collect();
        if ids.is_empty() {
            return Ok(counts);
        }

        // UNION (not UNION ALL) so a corrupt cycle cannot recurse forever
        let sql = format!(
            "WITH RECURSIVE tree(root, id) AS (
                SELECT parent_id, id FROM items WHERE parent_id IN ({})
                UNION
                SELECT tree.root, items.id FROM items JOIN tree ON items.parent_id = tree.id
            )
            SELECT root, COUNT(*) FROM tree GROUP BY root",
            super::super::db::placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(ids.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (root, count) = row?;
            counts.insert(root, count);
        }
        Ok(counts)
    }

    fn is_descendant(&self, ancestor: i64, candidate: i64) -> DomainResult<bool> {
        let found: bool = self.conn.query_row(
            "WITH RECURSIVE tree(id) AS (
                SELECT id FROM items WHERE parent_id = ?1
                UNION
                SELECT items.id FROM items JOIN tree ON items.parent_id = tree.id
            )
            SELECT EXISTS (SELECT 1 FROM tree WHERE id = ?2)",
            params![ancestor, candidate],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn set_accepted_flag(&self, id: i64, flag: Option<bool>) -> DomainResult<()> {
        self.conn.execute(
            "UPDATE items SET is_accepted_answer = ? WHERE id = ?",
            params![flag, id],
        )?;
        Ok(())
    }

    fn set_children_accepted_flag(&self, parent_id: i64, flag: Option<bool>) -> DomainResult<()> {
        self.conn.execute(
            "UPDATE items SET is_accepted_answer = ? WHERE parent_id = ?",
            params![flag, parent_id],
        )?;
        Ok(())
    }
}
