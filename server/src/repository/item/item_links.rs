//! Item Link Operations
//!
//! Many-to-many graphs that live beside the parent/child tree:
//! goal -> constituent (`goal_constituents`) and item -> blocker
//! (`item_blocked_by`). An item's `goals` are the goals listing it as a
//! constituent; `blocks` is the reverse of `blocked_by`.

use rusqlite::params;

use crate::domain::DomainResult;

pub trait ItemLinkOperations {
    fn constituents(&self, goal_id: i64) -> DomainResult<Vec<i64>>;

    fn goals_of(&self, item_id: i64) -> DomainResult<Vec<i64>>;

    fn link_constituents(&self, goal_id: i64, item_ids: &[i64]) -> DomainResult<()>;

    fn unlink_constituents(&self, goal_id: i64, item_ids: &[i64]) -> DomainResult<()>;

    fn blocked_by(&self, item_id: i64) -> DomainResult<Vec<i64>>;

    fn blocks(&self, item_id: i64) -> DomainResult<Vec<i64>>;

    fn link_blockers(&self, item_id: i64, blocker_ids: &[i64]) -> DomainResult<()>;

    fn unlink_blockers(&self, item_id: i64, blocker_ids: &[i64]) -> DomainResult<()>;

    /// Whether `target` is reachable from `start` along goal -> constituent edges
    fn constituent_path_exists(&self, start: i64, target: i64) -> DomainResult<bool>;

    /// Whether `target` is reachable from `start` along item -> blocker edges
    fn blocker_path_exists(&self, start: i64, target: i64) -> DomainResult<bool>;
}

impl super::item_repo::ItemRepository<'_> {
    fn link_pairs(&self, sql: &str, owner: i64, others: &[i64]) -> DomainResult<()> {
        let mut stmt = self.conn.prepare(sql)?;
        for other in others {
            stmt.execute(params![owner, other])?;
        }
        Ok(())
    }

    fn path_exists(&self, table: &str, from: &str, to: &str, start: i64, target: i64) -> DomainResult<bool> {
        let sql = format!(
            "WITH RECURSIVE reach(id) AS (
                SELECT {to} FROM {table} WHERE {from} = ?1
                UNION
                SELECT t.{to} FROM {table} t JOIN reach r ON t.{from} = r.id
            )
            SELECT EXISTS (SELECT 1 FROM reach WHERE id = ?2)",
            table = table,
            from = from,
            to = to
        );
        let found: bool = self
            .conn
            .query_row(&sql, params![start, target], |row| row.get(0))?;
        Ok(found)
    }
}

impl ItemLinkOperations for super::item_repo::ItemRepository<'_> {
    fn constituents(&self, goal_id: i64) -> DomainResult<Vec<i64>> {
        self.id_list(
            "SELECT item_id FROM goal_constituents WHERE goal_id = ? ORDER BY rowid",
            goal_id,
        )
    }

    fn goals_of(&self, item_id: i64) -> DomainResult<Vec<i64>> {
        self.id_list(
            "SELECT goal_id FROM goal_constituents WHERE item_id = ? ORDER BY rowid",
            item_id,
        )
    }

    fn link_constituents(&self, goal_id: i64, item_ids: &[i64]) -> DomainResult<()> {
        self.link_pairs(
            "INSERT OR IGNORE INTO goal_constituents (goal_id, item_id) VALUES (?, ?)",
            goal_id,
            item_ids,
        )
    }

    fn unlink_constituents(&self, goal_id: i64, item_ids: &[i64]) -> DomainResult<()> {
        self.link_pairs(
            "DELETE FROM goal_constituents WHERE goal_id = ? AND item_id = ?",
            goal_id,
            item_ids,
        )
    }

    fn blocked_by(&self, item_id: i64) -> DomainResult<Vec<i64>> {
        self.id_list(
            "SELECT blocker_id FROM item_blocked_by WHERE item_id = ? ORDER BY rowid",
            item_id,
        )
    }

    fn blocks(&self, item_id: i64) -> DomainResult<Vec<i64>> {
        self.id_list(
            "SELECT item_id FROM item_blocked_by WHERE blocker_id = ? ORDER BY rowid",
            item_id,
        )
    }

    fn link_blockers(&self, item_id: i64, blocker_ids: &[i64]) -> DomainResult<()> {
        self.link_pairs(
            "INSERT OR IGNORE INTO item_blocked_by (item_id, blocker_id) VALUES (?, ?)",
            item_id,
            blocker_ids,
        )
    }

    fn unlink_blockers(&self, item_id: i64, blocker_ids: &[i64]) -> DomainResult<()> {
        self.link_pairs(
            "DELETE FROM item_blocked_by WHERE item_id = ? AND blocker_id = ?",
            item_id,
            blocker_ids,
        )
    }

    fn constituent_path_exists(&self, start: i64, target: i64) -> DomainResult<bool> {
        self.path_exists("goal_constituents", "goal_id", "item_id", start, target)
    }

    fn blocker_path_exists(&self, start: i64, target: i64) -> DomainResult<bool> {
        self.path_exists("item_blocked_by", "item_id", "blocker_id", start, target)
    }
}
