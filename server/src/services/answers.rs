//! Answer Acceptance and Re-parenting
//!
//! Both operations touch the item, its siblings and up to two parents, so
//! each runs as one transaction. At most one child of a Question holds
//! `isAcceptedAnswer = true` after either commits.

use rusqlite::Connection;
use serde::Deserialize;

use crate::domain::{accepted_flag_under, DomainError, DomainResult, GlobalId, IdTag, Item, ItemVariant, User};
use crate::repository::{ItemHierarchyOperations, ItemRepository, Repository};
use super::access::{ensure_writable, item_ref, readable_item};
use super::items::reload;
use super::views::{AcceptAnswerPayload, ItemRenderer, NestItemPayload};
use super::Services;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptAnswerInput {
    pub item_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestItemInput {
    pub item_id: String,
    /// Absent, or a `User:n` id, moves the item to the top level
    pub new_parent_id: Option<String>,
}

impl Services {
    pub async fn accept_answer(&self, user: &User, input: AcceptAnswerInput) -> DomainResult<AcceptAnswerPayload> {
        self.db
            .with_transaction(|conn| {
                let id = item_ref(&input.item_id, "Item")?;
                let answer = readable_item(conn, user, id, "Item")?;
                let parent_id = answer
                    .parent_id
                    .ok_or_else(|| DomainError::invalid("Item is not nested under a Question"))?;
                let mut question = readable_item(conn, user, parent_id, "Parent")?;
                if !question.is_question() {
                    return Err(DomainError::invalid("Item is not nested under a Question"));
                }
                ensure_writable(user, &question)?;

                let repo = ItemRepository::new(conn);
                repo.set_children_accepted_flag(question.id, Some(false))?;
                repo.set_accepted_flag(answer.id, Some(true))?;

                question.variant = ItemVariant::Question {
                    accepted_answer: Some(answer.accepted_answer_copy()),
                };
                if let Some(expectation) = question.action_expectation.as_mut() {
                    expectation.fulfilled = true;
                }
                repo.update(&question)?;

                let mut renderer = ItemRenderer::new(conn, user);
                Ok(AcceptAnswerPayload {
                    answer: renderer.render_one(reload(conn, answer.id)?)?,
                    question: renderer.render_one(reload(conn, question.id)?)?,
                })
            })
            .await
    }

    pub async fn nest_item(&self, user: &User, input: NestItemInput) -> DomainResult<NestItemPayload> {
        self.db
            .with_transaction(|conn| {
                let id = item_ref(&input.item_id, "Item")?;
                let new_parent_id = input
                    .new_parent_id
                    .as_deref()
                    .map(parse_new_parent)
                    .transpose()?
                    .flatten();
                if new_parent_id == Some(id) {
                    return Err(DomainError::invalid("Cannot nest item under itself"));
                }

                let mut item = readable_item(conn, user, id, "Item")?;
                let repo = ItemRepository::new(conn);
                let new_parent = match new_parent_id {
                    Some(parent_id) => {
                        let parent = readable_item(conn, user, parent_id, "Parent")?;
                        if repo.is_descendant(item.id, parent.id)? {
                            return Err(DomainError::invalid("Cannot nest item under its own descendant"));
                        }
                        Some(parent)
                    }
                    None => None,
                };
                let old_parent = item
                    .parent_id
                    .map(|pid| repo.find_by_id(pid))
                    .transpose()?
                    .flatten();

                let moving = item.parent_id != new_parent.as_ref().map(|p| p.id);
                if moving {
                    if let Some(old) = old_parent.as_ref() {
                        release_accepted_answer(conn, old, &item)?;
                    }
                    item.parent_id = new_parent.as_ref().map(|p| p.id);
                    item.is_accepted_answer = accepted_flag_under(new_parent.as_ref().map(Item::item_type));
                    repo.set_parent(item.id, item.parent_id)?;
                    repo.set_accepted_flag(item.id, item.is_accepted_answer)?;
                }

                let mut renderer = ItemRenderer::new(conn, user);
                let old_parent = old_parent
                    .filter(|p| p.can_read(user.id))
                    .map(|p| reload(conn, p.id).and_then(|p| renderer.render_one(p)))
                    .transpose()?;
                let new_parent = new_parent
                    .map(|p| reload(conn, p.id).and_then(|p| renderer.render_one(p)))
                    .transpose()?;
                Ok(NestItemPayload {
                    item: renderer.render_one(reload(conn, item.id)?)?,
                    old_parent,
                    new_parent,
                })
            })
            .await
    }
}

/// `Item:n` is a parent, `User:n` means top level, anything else is invalid
fn parse_new_parent(raw: &str) -> DomainResult<Option<i64>> {
    let id: GlobalId = raw
        .parse()
        .map_err(|_| DomainError::invalid("Invalid parent id"))?;
    match id.tag {
        IdTag::Item => Ok(Some(id.id)),
        IdTag::User => Ok(None),
        _ => Err(DomainError::invalid("Invalid parentId entity type")),
    }
}

/// Clear the old Question's answer when its accepted child leaves
fn release_accepted_answer(conn: &Connection, old_parent: &Item, moved: &Item) -> DomainResult<()> {
    if !old_parent.is_question() || moved.is_accepted_answer != Some(true) {
        return Ok(());
    }
    let mut question = old_parent.clone();
    question.variant = ItemVariant::Question { accepted_answer: None };
    if let Some(expectation) = question.action_expectation.as_mut() {
        expectation.fulfilled = false;
    }
    ItemRepository::new(conn).update(&question)?;
    Ok(())
}
