//! Item Operations
//!
//! Create/amend per variant plus the generic item mutations.

use serde_json::Value;

use crate::domain::{DomainResult, ItemType, User};
use crate::services::{
    AcceptAnswerInput, AmendItemInput, ConvertItemInput, CreateItemInput, DeleteItemSummaryInput,
    NestItemInput, Services, SummarizeItemInput, UpdateGoalConstituentsInput,
    UpdateItemGoalsInput, UpdateItemsBlockedInput,
};
use super::{input, output};

/// Variant targeted by a `create*` operation name
pub fn create_variant(operation: &str) -> Option<ItemType> {
    operation.strip_prefix("create").and_then(|v| ItemType::parse(v).ok())
}

/// Variant targeted by an `amend*` operation name
pub fn amend_variant(operation: &str) -> Option<ItemType> {
    operation.strip_prefix("amend").and_then(|v| ItemType::parse(v).ok())
}

pub async fn create_item(s: &Services, user: &User, item_type: ItemType, vars: Value) -> DomainResult<Value> {
    let input: CreateItemInput = input(vars)?;
    output(s.create_item(user, item_type, input).await?)
}

pub async fn amend_item(s: &Services, user: &User, item_type: ItemType, vars: Value) -> DomainResult<Value> {
    let input: AmendItemInput = input(vars)?;
    output(s.amend_item(user, item_type, input).await?)
}

pub async fn accept_answer(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: AcceptAnswerInput = input(vars)?;
    output(s.accept_answer(user, input).await?)
}

pub async fn nest_item(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: NestItemInput = input(vars)?;
    output(s.nest_item(user, input).await?)
}

pub async fn convert_item(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: ConvertItemInput = input(vars)?;
    output(s.convert_item(user, input).await?)
}

pub async fn summarize_item(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: SummarizeItemInput = input(vars)?;
    output(s.summarize_item(user, input).await?)
}

pub async fn delete_item_summary(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: DeleteItemSummaryInput = input(vars)?;
    output(s.delete_item_summary(user, input).await?)
}

pub async fn update_goal_constituents(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: UpdateGoalConstituentsInput = input(vars)?;
    output(s.update_goal_constituents(user, input).await?)
}

pub async fn update_item_goals(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: UpdateItemGoalsInput = input(vars)?;
    output(s.update_item_goals(user, input).await?)
}

pub async fn update_items_blocked(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: UpdateItemsBlockedInput = input(vars)?;
    output(s.update_items_blocked(user, input).await?)
}
