//! Goal and Blocked-by Links
//!
//! Add/remove set operations on the two many-to-many graphs. The whole
//! request is validated before the first write, so a rejected request
//! changes nothing.

use rusqlite::Connection;
use serde::Deserialize;

use crate::domain::{parse_tagged, DomainError, DomainResult, IdTag, Item, User};
use crate::repository::{ItemLinkOperations, ItemRepository};
use super::access::{can_read_goal, dedup, ensure_writable, item_ref, readable_item, readable_items};
use super::items::reload;
use super::views::{ItemRenderer, ItemView};
use super::Services;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGoalConstituentsInput {
    pub goal_id: String,
    #[serde(default)]
    pub constituents_added: Vec<String>,
    #[serde(default)]
    pub constituents_removed: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemGoalsInput {
    pub item_id: String,
    #[serde(default)]
    pub goals_added: Vec<String>,
    #[serde(default)]
    pub goals_removed: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemsBlockedInput {
    pub item_id: String,
    #[serde(default)]
    pub blocked_by_added: Vec<String>,
    #[serde(default)]
    pub blocked_by_removed: Vec<String>,
}

/// Validated change to one item's link set
struct LinkChange {
    added: Vec<i64>,
    removed: Vec<i64>,
}

impl LinkChange {
    /// `added` must be readable and not yet linked; `removed` must be linked.
    /// `label` names the linked side in error messages, e.g. `Goal(s)`.
    fn validate(
        conn: &Connection,
        user: &User,
        owner: &Item,
        current: &[i64],
        added: &[String],
        removed: &[String],
        label: &str,
    ) -> DomainResult<(Self, Vec<Item>)> {
        let added_items = readable_items(conn, user, added, label)?;
        if added_items.iter().any(|i| i.id == owner.id) {
            return Err(DomainError::invalid("Item cannot be linked to itself"));
        }
        if added_items.iter().any(|i| current.contains(&i.id)) {
            return Err(DomainError::conflict(format!("{} already added", label)));
        }

        let removed = dedup(parse_tagged(removed, IdTag::Item, label)?);
        if removed.iter().any(|id| !current.contains(id)) {
            return Err(DomainError::not_found(format!("{} not found", label)));
        }

        let change = LinkChange {
            added: added_items.iter().map(|i| i.id).collect(),
            removed,
        };
        Ok((change, added_items))
    }
}

impl Services {
    pub async fn update_goal_constituents(
        &self,
        user: &User,
        input: UpdateGoalConstituentsInput,
    ) -> DomainResult<ItemView> {
        self.db
            .with_transaction(|conn| {
                let goal = load_goal(conn, user, &input.goal_id)?;
                ensure_writable(user, &goal)?;

                let repo = ItemRepository::new(conn);
                let current = repo.constituents(goal.id)?;
                let (change, _) = LinkChange::validate(
                    conn,
                    user,
                    &goal,
                    &current,
                    &input.constituents_added,
                    &input.constituents_removed,
                    "Constituent(s)",
                )?;
                for constituent in &change.added {
                    if repo.constituent_path_exists(*constituent, goal.id)? {
                        return Err(cycle());
                    }
                }

                repo.unlink_constituents(goal.id, &change.removed)?;
                repo.link_constituents(goal.id, &change.added)?;
                ItemRenderer::new(conn, user).render_one(reload(conn, goal.id)?)
            })
            .await
    }

    pub async fn update_item_goals(&self, user: &User, input: UpdateItemGoalsInput) -> DomainResult<ItemView> {
        self.db
            .with_transaction(|conn| {
                let id = item_ref(&input.item_id, "Item")?;
                let item = readable_item(conn, user, id, "Item")?;
                ensure_writable(user, &item)?;

                let repo = ItemRepository::new(conn);
                let current = repo.goals_of(item.id)?;
                let (change, goals) = LinkChange::validate(
                    conn,
                    user,
                    &item,
                    &current,
                    &input.goals_added,
                    &input.goals_removed,
                    "Goal(s)",
                )?;
                if goals.iter().any(|g| !can_read_goal(user, g)) {
                    return Err(DomainError::invalid("Non goal item(s) passed in goalsAdded"));
                }
                for goal in &change.added {
                    if repo.constituent_path_exists(item.id, *goal)? {
                        return Err(cycle());
                    }
                }

                for goal in &change.removed {
                    repo.unlink_constituents(*goal, &[item.id])?;
                }
                for goal in &change.added {
                    repo.link_constituents(*goal, &[item.id])?;
                }
                ItemRenderer::new(conn, user).render_one(reload(conn, item.id)?)
            })
            .await
    }

    pub async fn update_items_blocked(&self, user: &User, input: UpdateItemsBlockedInput) -> DomainResult<ItemView> {
        self.db
            .with_transaction(|conn| {
                let id = item_ref(&input.item_id, "Item")?;
                let item = readable_item(conn, user, id, "Item")?;
                ensure_writable(user, &item)?;

                let repo = ItemRepository::new(conn);
                let current = repo.blocked_by(item.id)?;
                let (change, _) = LinkChange::validate(
                    conn,
                    user,
                    &item,
                    &current,
                    &input.blocked_by_added,
                    &input.blocked_by_removed,
                    "Blocking item(s)",
                )?;
                for blocker in &change.added {
                    if repo.blocker_path_exists(*blocker, item.id)? {
                        return Err(cycle());
                    }
                }

                repo.unlink_blockers(item.id, &change.removed)?;
                repo.link_blockers(item.id, &change.added)?;
                ItemRenderer::new(conn, user).render_one(reload(conn, item.id)?)
            })
            .await
    }
}

/// Wrong tag or unreadable is `Item not found`; readable non-goal is invalid
fn load_goal(conn: &Connection, user: &User, raw: &str) -> DomainResult<Item> {
    let id = item_ref(raw, "Item")?;
    let item = readable_item(conn, user, id, "Item")?;
    if !item.is_goal() {
        return Err(DomainError::invalid("Item is not a Goal"));
    }
    Ok(item)
}

fn cycle() -> DomainError {
    DomainError::invalid("Link would create a cycle")
}
