//! Response Views
//!
//! Serializable shapes returned to clients. Items are rendered relative to
//! a viewer: action expectation type and linked-item lists depend on who
//! is asking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    AcceptedAnswer, ActionExpectationType, ClientInvite, DomainResult, Entity, FeedActivity,
    FileRecord, GlobalId, IdTag, Item, ItemType, ItemVariant, Summary, TaskStatus, User, UserClient,
};
use crate::repository::{
    FileRepository, ItemHierarchyOperations, ItemLinkOperations, ItemRepository, Repository,
    UserRepository,
};
use super::access::filter_readable;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserView {
    pub id: GlobalId,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

impl From<&User> for PublicUserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.global_id(),
            name: user.name.clone(),
            email: user.email.clone(),
            photo_url: user.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileView {
    pub id: GlobalId,
    pub filename: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
}

impl From<&FileRecord> for FileView {
    fn from(file: &FileRecord) -> Self {
        Self {
            id: file.global_id(),
            filename: file.filename.clone(),
            original_name: file.original_name.clone(),
            content_type: file.content_type.clone(),
            size: file.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExpectationView {
    #[serde(rename = "type")]
    pub kind: ActionExpectationType,
    pub complete_until: Option<DateTime<Utc>>,
    pub fulfilled: bool,
}

/// Per-variant fields, flattened into the item object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VariantView {
    Message {},
    Task {
        status: TaskStatus,
    },
    Question {
        #[serde(rename = "acceptedAnswer")]
        accepted_answer: Option<AcceptedAnswer>,
    },
    Info {
        acknowledged: bool,
    },
    Goal {
        #[serde(rename = "goalStatus")]
        goal_status: TaskStatus,
        constituents: Vec<GlobalId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    #[serde(rename = "__typename")]
    pub typename: ItemType,
    pub id: GlobalId,
    pub parent_id: Option<GlobalId>,
    pub author_id: GlobalId,
    pub text: String,
    pub rich_text: Option<Value>,
    pub to: Vec<PublicUserView>,
    pub shared_with: Vec<PublicUserView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub child_count: i64,
    pub summary: Option<Summary>,
    pub attachments: Vec<FileView>,
    pub action_expectation: Option<ActionExpectationView>,
    pub is_accepted_answer: Option<bool>,
    pub goals: Vec<GlobalId>,
    pub blocks: Vec<GlobalId>,
    pub blocked_by: Vec<GlobalId>,
    #[serde(flatten)]
    pub variant: VariantView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientView {
    pub id: GlobalId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MembershipView {
    pub id: GlobalId,
    pub client: ClientView,
    pub role: crate::domain::Role,
}

impl From<&UserClient> for MembershipView {
    fn from(m: &UserClient) -> Self {
        Self {
            id: m.global_id(),
            client: ClientView {
                id: m.client.global_id(),
                name: m.client.name.clone(),
            },
            role: m.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteView {
    pub id: GlobalId,
    pub email: String,
    pub client: ClientView,
    pub created_at: DateTime<Utc>,
}

impl From<&ClientInvite> for InviteView {
    fn from(invite: &ClientInvite) -> Self {
        Self {
            id: invite.global_id(),
            email: invite.email.clone(),
            client: ClientView {
                id: invite.client.global_id(),
                name: invite.client.name.clone(),
            },
            created_at: invite.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub user: PublicUserView,
    pub clients: Vec<MembershipView>,
    pub invites: Vec<InviteView>,
}

/// Generic mutation outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenericResult {
    pub success: bool,
    pub message: String,
}

impl GenericResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptAnswerPayload {
    pub answer: ItemView,
    pub question: ItemView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestItemPayload {
    pub item: ItemView,
    pub old_parent: Option<ItemView>,
    pub new_parent: Option<ItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultsView {
    pub items: Vec<ItemView>,
    pub public_users: Vec<PublicUserView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedActivityView {
    pub parent_id: Option<GlobalId>,
    pub last_viewed_at: DateTime<Utc>,
}

impl From<&FeedActivity> for FeedActivityView {
    fn from(activity: &FeedActivity) -> Self {
        Self {
            parent_id: activity.parent_id.map(|id| GlobalId::new(IdTag::Item, id)),
            last_viewed_at: activity.last_viewed_at,
        }
    }
}

/// Renders items for one viewer, caching user and file lookups
pub struct ItemRenderer<'c> {
    conn: &'c Connection,
    viewer: &'c User,
    users: HashMap<i64, Option<PublicUserView>>,
    files: HashMap<i64, Option<FileView>>,
}

impl<'c> ItemRenderer<'c> {
    pub fn new(conn: &'c Connection, viewer: &'c User) -> Self {
        Self {
            conn,
            viewer,
            users: HashMap::new(),
            files: HashMap::new(),
        }
    }

    pub fn render_one(&mut self, item: Item) -> DomainResult<ItemView> {
        let mut views = self.render(vec![item])?;
        Ok(views.remove(0))
    }

    /// Render a batch; child counts come from a single recursive query
    pub fn render(&mut self, items: Vec<Item>) -> DomainResult<Vec<ItemView>> {
        let repo = ItemRepository::new(self.conn);
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        let counts = repo.child_counts(&ids)?;

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let child_count = counts.get(&item.id).copied().unwrap_or(0);
            let goals = self.visible_links(repo.goals_of(item.id)?)?;
            let blocks = self.visible_links(repo.blocks(item.id)?)?;
            let blocked_by = self.visible_links(repo.blocked_by(item.id)?)?;
            let variant = match &item.variant {
                ItemVariant::Message => VariantView::Message {},
                ItemVariant::Task { status } => VariantView::Task { status: *status },
                ItemVariant::Question { accepted_answer } => VariantView::Question {
                    accepted_answer: accepted_answer.clone(),
                },
                ItemVariant::Info { acknowledged } => VariantView::Info {
                    acknowledged: *acknowledged,
                },
                ItemVariant::Goal { goal_status } => VariantView::Goal {
                    goal_status: *goal_status,
                    constituents: self.visible_links(repo.constituents(item.id)?)?,
                },
            };
            let action_expectation = item.action_expectation.as_ref().map(|e| ActionExpectationView {
                kind: item.action_expectation_type_for(self.viewer.id),
                complete_until: e.complete_until,
                fulfilled: e.fulfilled,
            });

            out.push(ItemView {
                typename: item.item_type(),
                id: item.global_id(),
                parent_id: item.parent_id.map(|id| GlobalId::new(IdTag::Item, id)),
                author_id: GlobalId::new(IdTag::User, item.author_id),
                to: self.users(&item.to)?,
                shared_with: self.users(&item.shared_with)?,
                attachments: self.files(&item.attachments)?,
                created_at: item.created_at,
                updated_at: item.updated_at,
                child_count,
                summary: item.summary,
                action_expectation,
                is_accepted_answer: item.is_accepted_answer,
                goals,
                blocks,
                blocked_by,
                variant,
                text: item.text,
                rich_text: item.rich_text,
            });
        }
        Ok(out)
    }

    fn visible_links(&self, ids: Vec<i64>) -> DomainResult<Vec<GlobalId>> {
        Ok(filter_readable(self.conn, self.viewer, &ids)?
            .into_iter()
            .map(|id| GlobalId::new(IdTag::Item, id))
            .collect())
    }

    fn users(&mut self, ids: &[i64]) -> DomainResult<Vec<PublicUserView>> {
        let repo = UserRepository::new(self.conn);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.users.contains_key(id) {
                let view = repo.find_by_id(*id)?.as_ref().map(PublicUserView::from);
                self.users.insert(*id, view);
            }
            if let Some(Some(view)) = self.users.get(id) {
                out.push(view.clone());
            }
        }
        Ok(out)
    }

    fn files(&mut self, ids: &[i64]) -> DomainResult<Vec<FileView>> {
        let repo = FileRepository::new(self.conn);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if !self.files.contains_key(id) {
                let view = repo.find_by_id(*id)?.as_ref().map(FileView::from);
                self.files.insert(*id, view);
            }
            if let Some(Some(view)) = self.files.get(id) {
                out.push(view.clone());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_fields_flatten_into_item() {
        let view = ItemView {
            typename: ItemType::Question,
            id: GlobalId::new(IdTag::Item, 4),
            parent_id: None,
            author_id: GlobalId::new(IdTag::User, 1),
            text: "Why?".to_string(),
            rich_text: None,
            to: Vec::new(),
            shared_with: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            child_count: 0,
            summary: None,
            attachments: Vec::new(),
            action_expectation: Some(ActionExpectationView {
                kind: ActionExpectationType::ActionExpectedFromYou,
                complete_until: None,
                fulfilled: false,
            }),
            is_accepted_answer: None,
            goals: Vec::new(),
            blocks: Vec::new(),
            blocked_by: Vec::new(),
            variant: VariantView::Question { accepted_answer: None },
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["__typename"], "Question");
        assert_eq!(json["id"], "Item:4");
        assert!(json["acceptedAnswer"].is_null());
        assert!(json.as_object().unwrap().contains_key("acceptedAnswer"));
        assert_eq!(json["actionExpectation"]["type"], "ActionExpectedFromYou");
    }
}
