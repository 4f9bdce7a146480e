//! Item Mutations
//!
//! Create, amend, convert and summarize. Each runs in one transaction and
//! returns the item rendered for the caller.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    accepted_flag_under, parse_tagged, sharing_closure, ActionExpectation, DomainError,
    DomainResult, GlobalId, IdTag, Item, ItemType, ItemVariant, Summary, TaskStatus, User,
};
use crate::repository::{
    FileRepository, ItemHierarchyOperations, ItemRepository, ItemSharingOperations, Repository,
    UserRepository,
};
use super::access::{dedup, ensure_writable, item_ref, readable_item};
use super::deserialize_some;
use super::file_access::FileAccessPlan;
use super::views::{GenericResult, ItemRenderer, ItemView};
use super::Services;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExpectationInput {
    /// `null` clears the deadline, absent leaves it alone
    #[serde(default, deserialize_with = "deserialize_some")]
    pub complete_until: Option<Option<DateTime<Utc>>>,
    pub fulfilled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemInput {
    pub parent_id: Option<String>,
    pub share_with: Option<Vec<String>>,
    pub to: Option<Vec<String>>,
    #[serde(default)]
    pub text: String,
    pub rich_text: Option<Value>,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub action_expectation: Option<ActionExpectationInput>,
    pub status: Option<TaskStatus>,
    pub acknowledged: Option<bool>,
    pub goal_status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendItemInput {
    pub id: String,
    pub text: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub rich_text: Option<Option<Value>>,
    pub to: Option<Vec<String>>,
    pub shared_with: Option<Vec<String>>,
    pub attachments: Option<Vec<String>>,
    pub action_expectation: Option<ActionExpectationInput>,
    pub status: Option<TaskStatus>,
    pub acknowledged: Option<bool>,
    pub goal_status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertItemInput {
    pub id: String,
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeItemInput {
    pub id: String,
    pub text: String,
    pub rich_text: Option<Value>,
    #[serde(default)]
    pub should_replace_original_item: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteItemSummaryInput {
    pub id: String,
}

impl Services {
    pub async fn create_item(
        &self,
        user: &User,
        item_type: ItemType,
        input: CreateItemInput,
    ) -> DomainResult<ItemView> {
        let (view, plan) = self
            .db
            .with_transaction(|conn| {
                let has_share = input.share_with.as_ref().is_some_and(|v| !v.is_empty());
                let has_to = input.to.as_ref().is_some_and(|v| !v.is_empty());
                if input.parent_id.is_none() && !has_share && !has_to {
                    return Err(DomainError::invalid("Must provide one of parentId, shareWith or to"));
                }

                let parent = input
                    .parent_id
                    .as_deref()
                    .map(|raw| resolve_parent(conn, user, raw))
                    .transpose()?;
                let to = user_ids(conn, input.to.as_deref().unwrap_or_default())?;
                let share_with = if !has_share && !has_to {
                    parent.as_ref().map(|p| p.shared_with.clone()).unwrap_or_default()
                } else {
                    user_ids(conn, input.share_with.as_deref().unwrap_or_default())?
                };
                let attachments = owned_files(conn, user, &input.attachments, &[])?;

                let mut item = Item::new(user.id, input.text.clone(), item_type);
                item.parent_id = parent.as_ref().map(|p| p.id);
                item.rich_text = input.rich_text.clone();
                item.shared_with = sharing_closure(user.id, &share_with, &to);
                item.to = to;
                item.attachments = attachments;
                item.is_accepted_answer = accepted_flag_under(parent.as_ref().map(Item::item_type));
                let mirrored = patch_variant(
                    &mut item.variant,
                    input.status,
                    input.acknowledged,
                    input.goal_status,
                );
                patch_expectation(&mut item, input.action_expectation.as_ref(), mirrored);

                let created = ItemRepository::new(conn).create(&item)?;

                let mut plan = FileAccessPlan::default();
                plan.grant(
                    emails(conn, &created.shared_with)?,
                    filenames(conn, &created.attachments)?,
                );
                let view = ItemRenderer::new(conn, user).render_one(created)?;
                Ok((view, plan))
            })
            .await?;

        plan.dispatch(self.file_access.clone());
        Ok(view)
    }

    /// Variant-specific amend; `item_type` is the variant the caller targets
    pub async fn amend_item(
        &self,
        user: &User,
        item_type: ItemType,
        input: AmendItemInput,
    ) -> DomainResult<ItemView> {
        let (view, plan) = self
            .db
            .with_transaction(|conn| {
                let id = item_ref(&input.id, "Item")?;
                let mut item = readable_item(conn, user, id, "Item")?;
                ensure_writable(user, &item)?;
                if item.item_type() != item_type {
                    return Err(DomainError::invalid(format!("Item is not a {}", item_type.as_str())));
                }

                let old_shared = item.shared_with.clone();
                let old_to = item.to.clone();
                let old_files = item.attachments.clone();

                if let Some(text) = &input.text {
                    item.text = text.clone();
                }
                if let Some(rich_text) = &input.rich_text {
                    item.rich_text = rich_text.clone();
                }
                if let Some(raw) = &input.to {
                    item.to = user_ids(conn, raw)?;
                }
                if input.to.is_some() || input.shared_with.is_some() {
                    let share_with = match &input.shared_with {
                        Some(raw) => user_ids(conn, raw)?,
                        None => item.shared_with.clone(),
                    };
                    item.shared_with = sharing_closure(item.author_id, &share_with, &item.to);
                }
                if let Some(raw) = &input.attachments {
                    item.attachments = owned_files(conn, user, raw, &old_files)?;
                }
                let mirrored = patch_variant(
                    &mut item.variant,
                    input.status,
                    input.acknowledged,
                    input.goal_status,
                );
                patch_expectation(&mut item, input.action_expectation.as_ref(), mirrored);

                let repo = ItemRepository::new(conn);
                repo.update(&item)?;
                if item.shared_with != old_shared {
                    repo.replace_shared_with(item.id, &item.shared_with)?;
                }
                if item.to != old_to {
                    repo.replace_recipients(item.id, &item.to)?;
                }
                if item.attachments != old_files {
                    repo.replace_attachments(item.id, &item.attachments)?;
                }

                let plan = FileAccessPlan::for_amend(
                    &emails(conn, &old_shared)?,
                    &emails(conn, &item.shared_with)?,
                    &filenames(conn, &old_files)?,
                    &filenames(conn, &item.attachments)?,
                );
                let view = ItemRenderer::new(conn, user).render_one(reload(conn, item.id)?)?;
                Ok((view, plan))
            })
            .await?;

        plan.dispatch(self.file_access.clone());
        Ok(view)
    }

    /// Change the variant in place, keeping the shared fields
    pub async fn convert_item(&self, user: &User, input: ConvertItemInput) -> DomainResult<ItemView> {
        self.db
            .with_transaction(|conn| {
                let id = item_ref(&input.id, "Item")?;
                let mut item = readable_item(conn, user, id, "Item")?;
                ensure_writable(user, &item)?;

                let from = item.item_type();
                let to = input.item_type;
                if from == to {
                    return ItemRenderer::new(conn, user).render_one(item);
                }

                item.variant = convert_variant(&item.variant, to);
                item.action_expectation = match (item.action_expectation.take(), to.has_action_expectation()) {
                    (_, false) => None,
                    (Some(existing), true) => Some(existing),
                    (None, true) => Some(ActionExpectation::default()),
                };

                let repo = ItemRepository::new(conn);
                repo.update(&item)?;
                if to == ItemType::Question {
                    repo.set_children_accepted_flag(item.id, Some(false))?;
                } else if from == ItemType::Question {
                    repo.set_children_accepted_flag(item.id, None)?;
                }

                ItemRenderer::new(conn, user).render_one(reload(conn, item.id)?)
            })
            .await
    }

    pub async fn summarize_item(&self, user: &User, input: SummarizeItemInput) -> DomainResult<ItemView> {
        self.db
            .with_transaction(|conn| {
                let id = item_ref(&input.id, "Item")?;
                let item = readable_item(conn, user, id, "Item")?;
                ensure_writable(user, &item)?;

                ItemRepository::new(conn).set_summary(
                    item.id,
                    &Summary {
                        text: input.text.clone(),
                        rich_text: input.rich_text.clone(),
                        should_replace_original_item: input.should_replace_original_item,
                    },
                )?;
                ItemRenderer::new(conn, user).render_one(reload(conn, item.id)?)
            })
            .await
    }

    pub async fn delete_item_summary(
        &self,
        user: &User,
        input: DeleteItemSummaryInput,
    ) -> DomainResult<GenericResult> {
        self.db
            .with_transaction(|conn| {
                let id = item_ref(&input.id, "Item")?;
                let item = readable_item(conn, user, id, "Item")?;
                ensure_writable(user, &item)?;

                if !ItemRepository::new(conn).delete_summary(item.id)? {
                    return Err(DomainError::not_found("Summary not found"));
                }
                Ok(GenericResult::ok("Summary deleted"))
            })
            .await
    }
}

/// A `parentId` on create must name a readable Item
fn resolve_parent(conn: &Connection, user: &User, raw: &str) -> DomainResult<Item> {
    let id: GlobalId = raw
        .parse()
        .map_err(|_| DomainError::invalid("Invalid parent id"))?;
    if id.tag != IdTag::Item {
        return Err(DomainError::invalid("Invalid parentId entity type"));
    }
    readable_item(conn, user, id.id, "Parent")
}

/// Resolve `User:n` ids, all of which must exist
pub(super) fn user_ids(conn: &Connection, raw: &[String]) -> DomainResult<Vec<i64>> {
    let ids = dedup(parse_tagged(raw, IdTag::User, "User(s)")?);
    let found = UserRepository::new(conn).find_many(&ids)?;
    if found.len() != ids.len() {
        return Err(DomainError::not_found("User(s) not found"));
    }
    Ok(ids)
}

/// Resolve `File:n` ids. Files not already in `existing` must belong to `user`.
fn owned_files(conn: &Connection, user: &User, raw: &[String], existing: &[i64]) -> DomainResult<Vec<i64>> {
    let ids = dedup(parse_tagged(raw, IdTag::File, "File(s)")?);
    let repo = FileRepository::new(conn);
    for id in ids.iter().filter(|id| !existing.contains(id)) {
        match repo.find_by_id(*id)? {
            Some(file) if file.owner_id == user.id => {}
            _ => return Err(DomainError::not_found("File(s) not found")),
        }
    }
    Ok(ids)
}

pub(super) fn emails(conn: &Connection, user_ids: &[i64]) -> DomainResult<Vec<String>> {
    Ok(UserRepository::new(conn)
        .find_many(user_ids)?
        .into_iter()
        .map(|u| u.email)
        .collect())
}

pub(super) fn filenames(conn: &Connection, file_ids: &[i64]) -> DomainResult<Vec<String>> {
    Ok(FileRepository::new(conn)
        .find_many(file_ids)?
        .into_iter()
        .map(|f| f.filename)
        .collect())
}

/// Fetch an item that is known to exist
pub(super) fn reload(conn: &Connection, id: i64) -> DomainResult<Item> {
    ItemRepository::new(conn)
        .find_by_id(id)?
        .ok_or_else(|| DomainError::not_found("Item not found"))
}

/// Apply status-like fields that match the variant.
/// Returns the fulfilled value they imply, if one was set.
fn patch_variant(
    variant: &mut ItemVariant,
    status: Option<TaskStatus>,
    acknowledged: Option<bool>,
    goal_status: Option<TaskStatus>,
) -> Option<bool> {
    match variant {
        ItemVariant::Task { status: current } => status.map(|s| {
            *current = s;
            s == TaskStatus::Done
        }),
        ItemVariant::Info { acknowledged: current } => acknowledged.map(|a| {
            *current = a;
            a
        }),
        ItemVariant::Goal { goal_status: current } => goal_status.map(|s| {
            *current = s;
            s == TaskStatus::Done
        }),
        ItemVariant::Message | ItemVariant::Question { .. } => None,
    }
}

/// Explicit input beats the value mirrored from the variant
fn patch_expectation(item: &mut Item, input: Option<&ActionExpectationInput>, mirrored: Option<bool>) {
    let Some(expectation) = item.action_expectation.as_mut() else {
        return;
    };
    if let Some(fulfilled) = mirrored {
        expectation.fulfilled = fulfilled;
    }
    if let Some(input) = input {
        if let Some(deadline) = input.complete_until {
            expectation.complete_until = deadline;
        }
        if let Some(fulfilled) = input.fulfilled {
            expectation.fulfilled = fulfilled;
        }
    }
}

/// Task status and Goal status carry over to each other
fn convert_variant(from: &ItemVariant, to: ItemType) -> ItemVariant {
    match (from, to) {
        (ItemVariant::Task { status }, ItemType::Goal) => ItemVariant::Goal { goal_status: *status },
        (ItemVariant::Goal { goal_status }, ItemType::Task) => ItemVariant::Task { status: *goal_status },
        _ => ItemVariant::default_for(to),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_fulfilled_beats_mirroring() {
        let mut task = Item::new(1, "t".to_string(), ItemType::Task);
        let mirrored = patch_variant(&mut task.variant, Some(TaskStatus::Done), None, None);
        assert_eq!(mirrored, Some(true));

        let input = ActionExpectationInput {
            complete_until: None,
            fulfilled: Some(false),
        };
        patch_expectation(&mut task, Some(&input), mirrored);
        assert_eq!(task.variant, ItemVariant::Task { status: TaskStatus::Done });
        assert!(!task.action_expectation.unwrap().fulfilled);
    }

    #[test]
    fn test_null_deadline_clears_but_absent_keeps() {
        let absent: ActionExpectationInput = serde_json::from_str(r#"{"fulfilled": true}"#).unwrap();
        assert_eq!(absent.complete_until, None);

        let cleared: ActionExpectationInput = serde_json::from_str(r#"{"completeUntil": null}"#).unwrap();
        assert_eq!(cleared.complete_until, Some(None));

        let mut task = Item::new(1, "t".to_string(), ItemType::Task);
        task.action_expectation = Some(ActionExpectation {
            complete_until: Some(Utc::now()),
            fulfilled: false,
        });
        patch_expectation(&mut task, Some(&absent), None);
        assert!(task.action_expectation.as_ref().unwrap().complete_until.is_some());
        patch_expectation(&mut task, Some(&cleared), None);
        let expectation = task.action_expectation.unwrap();
        assert!(expectation.complete_until.is_none());
        assert!(expectation.fulfilled);
    }

    #[test]
    fn test_convert_carries_status_between_task_and_goal() {
        let done = ItemVariant::Task { status: TaskStatus::Done };
        assert_eq!(
            convert_variant(&done, ItemType::Goal),
            ItemVariant::Goal { goal_status: TaskStatus::Done }
        );
        assert_eq!(
            convert_variant(&done, ItemType::Info),
            ItemVariant::Info { acknowledged: false }
        );
    }
}
