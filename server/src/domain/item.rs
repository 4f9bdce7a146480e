//! Item Entity
//!
//! The polymorphic feed entry. Every item shares a base record (tree link,
//! author, sharing lists, content) and carries exactly one variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{DomainError, Entity};
use super::ids::IdTag;

/// Discriminant stored in `items.item_type`
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

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "Message" => Ok(ItemType::Message),
            "Task" => Ok(ItemType::Task),
            "Question" => Ok(ItemType::Question),
            "Info" => Ok(ItemType::Info),
            "Goal" => Ok(ItemType::Goal),
            other => Err(DomainError::Internal(format!("Unknown item type {}", other))),
        }
    }

    /// Messages are plain conversation and never await an action
    pub fn has_action_expectation(&self) -> bool {
        !matches!(self, ItemType::Message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Todo,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "Todo",
            TaskStatus::Done => "Done",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Done" => TaskStatus::Done,
            _ => TaskStatus::Todo,
        }
    }
}

/// Denormalized copy of the accepted answer's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedAnswer {
    pub text: String,
    pub rich_text: Option<Value>,
}

/// Variant-specific fields
#[derive(Debug, Clone, PartialEq)]
pub enum ItemVariant {
    Message,
    Task { status: TaskStatus },
    Question { accepted_answer: Option<AcceptedAnswer> },
    Info { acknowledged: bool },
    Goal { goal_status: TaskStatus },
}

impl ItemVariant {
    /// Fresh variant fields for a newly created or converted item
    pub fn default_for(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Message => ItemVariant::Message,
            ItemType::Task => ItemVariant::Task { status: TaskStatus::Todo },
            ItemType::Question => ItemVariant::Question { accepted_answer: None },
            ItemType::Info => ItemVariant::Info { acknowledged: false },
            ItemType::Goal => ItemVariant::Goal { goal_status: TaskStatus::Todo },
        }
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            ItemVariant::Message => ItemType::Message,
            ItemVariant::Task { .. } => ItemType::Task,
            ItemVariant::Question { .. } => ItemType::Question,
            ItemVariant::Info { .. } => ItemType::Info,
            ItemVariant::Goal { .. } => ItemType::Goal,
        }
    }
}

/// Whose turn it is, relative to the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionExpectationType {
    ActionExpected,
    ActionExpectedFromYou,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionExpectation {
    pub complete_until: Option<DateTime<Utc>>,
    pub fulfilled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub text: String,
    pub rich_text: Option<Value>,
    pub should_replace_original_item: bool,
}

/// A feed item with its tree link, sharing lists and variant
///
/// `shared_with` always contains `author_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub author_id: i64,
    pub text: String,
    pub rich_text: Option<Value>,
    /// Explicit recipients, narrows who is expected to act
    pub to: Vec<i64>,
    pub shared_with: Vec<i64>,
    pub attachments: Vec<i64>,
    pub action_expectation: Option<ActionExpectation>,
    /// None unless the parent is a Question
    pub is_accepted_answer: Option<bool>,
    pub summary: Option<Summary>,
    pub variant: ItemVariant,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create an unsaved root item shared with its author only
    pub fn new(author_id: i64, text: String, item_type: ItemType) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            parent_id: None,
            author_id,
            text,
            rich_text: None,
            to: Vec::new(),
            shared_with: vec![author_id],
            attachments: Vec::new(),
            action_expectation: item_type
                .has_action_expectation()
                .then(ActionExpectation::default),
            is_accepted_answer: None,
            summary: None,
            variant: ItemVariant::default_for(item_type),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an unsaved item under a parent
    pub fn new_child(author_id: i64, text: String, item_type: ItemType, parent_id: i64) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(author_id, text, item_type)
        }
    }

    /// Check if this is a root item (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn item_type(&self) -> ItemType {
        self.variant.item_type()
    }

    pub fn is_question(&self) -> bool {
        self.item_type() == ItemType::Question
    }

    pub fn is_goal(&self) -> bool {
        self.item_type() == ItemType::Goal
    }

    pub fn can_read(&self, user_id: i64) -> bool {
        self.author_id == user_id || self.shared_with.contains(&user_id)
    }

    /// Explicit recipients narrow write access; otherwise every reader may write
    pub fn can_write(&self, user_id: i64) -> bool {
        if self.author_id == user_id {
            return true;
        }
        if self.to.is_empty() {
            self.shared_with.contains(&user_id)
        } else {
            self.to.contains(&user_id)
        }
    }

    pub fn action_expectation_type_for(&self, viewer_id: i64) -> ActionExpectationType {
        if !self.to.is_empty() && !self.to.contains(&viewer_id) {
            ActionExpectationType::ActionExpected
        } else {
            ActionExpectationType::ActionExpectedFromYou
        }
    }

    pub fn accepted_answer_copy(&self) -> AcceptedAnswer {
        AcceptedAnswer {
            text: self.text.clone(),
            rich_text: self.rich_text.clone(),
        }
    }
}

impl Entity for Item {
    const TAG: IdTag = IdTag::Item;

    fn id(&self) -> i64 {
        self.id
    }
}

/// Feed ordering by creation time; ties fall back to id ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ItemsSort {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// `{author} ∪ share_with ∪ to`, deduplicated, author first
pub fn sharing_closure(author_id: i64, share_with: &[i64], to: &[i64]) -> Vec<i64> {
    let mut out = vec![author_id];
    for id in share_with.iter().chain(to.iter()) {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

/// `isAcceptedAnswer` for an item sitting under `parent_type`
pub fn accepted_flag_under(parent_type: Option<ItemType>) -> Option<bool> {
    match parent_type {
        Some(ItemType::Question) => Some(false),
        _ => None,
    }
}
