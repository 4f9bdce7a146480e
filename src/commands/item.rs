//! Item Commands
//!
//! Bindings for item mutations and feed queries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::Transport;
use crate::error::ClientResult;
use crate::models::{
    AcceptAnswerPayload, FeedActivity, GenericResult, Item, ItemType, ItemsSort,
    NestItemPayload, SearchResults, TaskStatus,
};

// ========================
// Argument Structs
// ========================

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionExpectationArgs {
    /// `Some(None)` clears the deadline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_until: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilled: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemArgs {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_with: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_expectation: Option<ActionExpectationArgs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_status: Option<TaskStatus>,
}

/// Omitted fields are left unchanged by the server
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendItemArgs {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rich_text: Option<Option<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_with: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_expectation: Option<ActionExpectationArgs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_status: Option<TaskStatus>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcceptAnswerArgs<'a> {
    item_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NestItemArgs<'a> {
    item_id: &'a str,
    new_parent_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertItemArgs<'a> {
    id: &'a str,
    item_type: ItemType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeItemArgs {
    pub id: String,
    pub text: String,
    pub rich_text: Option<Value>,
    pub should_replace_original_item: bool,
}

#[derive(Serialize)]
struct IdArgs<'a> {
    id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalConstituentsArgs<'a> {
    goal_id: &'a str,
    constituents_added: &'a [String],
    constituents_removed: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemGoalsArgs<'a> {
    item_id: &'a str,
    goals_added: &'a [String],
    goals_removed: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemsBlockedArgs<'a> {
    item_id: &'a str,
    blocked_by_added: &'a [String],
    blocked_by_removed: &'a [String],
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Serialize)]
struct ItemsArgs<'a> {
    sort: ItemsSort,
    filters: &'a ItemsFilters,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchArgs<'a> {
    items_filters: &'a ItemsFilters,
    public_users_filters: SearchFilter<'a>,
    items_sort: ItemsSort,
}

#[derive(Serialize)]
pub(super) struct SearchFilter<'a> {
    pub(super) search: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedActivityArgs<'a> {
    parent_id: Option<&'a str>,
}

// ========================
// Commands
// ========================

pub async fn create_item(t: &Transport, item_type: ItemType, args: &CreateItemArgs) -> ClientResult<Item> {
    t.invoke(&format!("create{}", item_type.as_str()), args).await
}

pub async fn amend_item(t: &Transport, item_type: ItemType, args: &AmendItemArgs) -> ClientResult<Item> {
    t.invoke(&format!("amend{}", item_type.as_str()), args).await
}

pub async fn accept_answer(t: &Transport, item_id: &str) -> ClientResult<AcceptAnswerPayload> {
    t.invoke("acceptAnswer", &AcceptAnswerArgs { item_id }).await
}

/// `None` moves the item to the top level
pub async fn nest_item(t: &Transport, item_id: &str, new_parent_id: Option<&str>) -> ClientResult<NestItemPayload> {
    t.invoke("nestItem", &NestItemArgs { item_id, new_parent_id }).await
}

pub async fn convert_item(t: &Transport, id: &str, item_type: ItemType) -> ClientResult<Item> {
    t.invoke("convertItem", &ConvertItemArgs { id, item_type }).await
}

pub async fn summarize_item(t: &Transport, args: &SummarizeItemArgs) -> ClientResult<Item> {
    t.invoke("summarizeItem", args).await
}

pub async fn delete_item_summary(t: &Transport, id: &str) -> ClientResult<GenericResult> {
    t.invoke("deleteItemSummary", &IdArgs { id }).await
}

pub async fn update_goal_constituents(
    t: &Transport,
    goal_id: &str,
    added: &[String],
    removed: &[String],
) -> ClientResult<Item> {
    let args = GoalConstituentsArgs {
        goal_id,
        constituents_added: added,
        constituents_removed: removed,
    };
    t.invoke("updateGoalConstituents", &args).await
}

pub async fn update_item_goals(t: &Transport, item_id: &str, added: &[String], removed: &[String]) -> ClientResult<Item> {
    let args = ItemGoalsArgs {
        item_id,
        goals_added: added,
        goals_removed: removed,
    };
    t.invoke("updateItemGoals", &args).await
}

pub async fn update_items_blocked(
    t: &Transport,
    item_id: &str,
    added: &[String],
    removed: &[String],
) -> ClientResult<Item> {
    let args = ItemsBlockedArgs {
        item_id,
        blocked_by_added: added,
        blocked_by_removed: removed,
    };
    t.invoke("updateItemsBlocked", &args).await
}

pub async fn list_items(t: &Transport, sort: ItemsSort, filters: &ItemsFilters) -> ClientResult<Vec<Item>> {
    t.invoke("items", &ItemsArgs { sort, filters }).await
}

pub async fn get_search_results(
    t: &Transport,
    items_filters: &ItemsFilters,
    users_search: Option<&str>,
    items_sort: ItemsSort,
) -> ClientResult<SearchResults> {
    let args = SearchArgs {
        items_filters,
        public_users_filters: SearchFilter { search: users_search },
        items_sort,
    };
    t.invoke("getSearchResults", &args).await
}

pub async fn update_feed_activity(t: &Transport, parent_id: Option<&str>) -> ClientResult<FeedActivity> {
    t.invoke("updateFeedActivity", &FeedActivityArgs { parent_id }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_amend_args_omit_untouched_fields() {
        let args = AmendItemArgs {
            id: "Item:3".to_string(),
            rich_text: Some(None),
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({"id": "Item:3", "richText": null, "status": "Done"})
        );
    }
}
