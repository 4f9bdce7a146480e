//! Client Models
//!
//! Data structures matching the server's wire shapes. Ids are the opaque
//! `Tag:number` strings handed out by the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Message,
    Task,
    Question,
    Info,
    Goal,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Message => "Message",
            ItemType::Task => "Task",
            ItemType::Question => "Question",
            ItemType::Info => "Info",
            ItemType::Goal => "Goal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemsSort {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Todo,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionExpectationType {
    ActionExpected,
    ActionExpectedFromYou,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExpectation {
    #[serde(rename = "type")]
    pub kind: ActionExpectationType,
    pub complete_until: Option<DateTime<Utc>>,
    pub fulfilled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedAnswer {
    pub text: String,
    pub rich_text: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub text: String,
    pub rich_text: Option<Value>,
    pub should_replace_original_item: bool,
}

/// Feed item; variant fields are present only on the matching `typename`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(rename = "__typename")]
    pub typename: ItemType,
    pub id: String,
    pub parent_id: Option<String>,
    pub author_id: String,
    pub text: String,
    pub rich_text: Option<Value>,
    #[serde(default)]
    pub to: Vec<PublicUser>,
    #[serde(default)]
    pub shared_with: Vec<PublicUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub child_count: i64,
    pub summary: Option<Summary>,
    #[serde(default)]
    pub attachments: Vec<File>,
    pub action_expectation: Option<ActionExpectation>,
    pub is_accepted_answer: Option<bool>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub blocked_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_answer: Option<AcceptedAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constituents: Option<Vec<String>>,
}

impl Item {
    pub fn is_question(&self) -> bool {
        self.typename == ItemType::Question
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub client: ClientRef,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: String,
    pub email: String,
    pub client: ClientRef,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user: PublicUser,
    pub clients: Vec<Membership>,
    pub invites: Vec<Invite>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericResult {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptAnswerPayload {
    pub answer: Item,
    pub question: Item,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestItemPayload {
    pub item: Item,
    pub old_parent: Option<Item>,
    pub new_parent: Option<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub items: Vec<Item>,
    pub public_users: Vec<PublicUser>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedActivity {
    pub parent_id: Option<String>,
    pub last_viewed_at: DateTime<Utc>,
}
