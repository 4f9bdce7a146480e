//! Feed and Search Queries

use serde_json::Value;

use crate::domain::{DomainResult, User};
use crate::services::{
    GetSearchResultsInput, ItemsInput, PublicUsersInput, Services, UpdateFeedActivityInput,
};
use super::{input, output};

pub async fn items(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: ItemsInput = input(vars)?;
    output(s.items(user, input).await?)
}

pub async fn public_users(s: &Services, vars: Value) -> DomainResult<Value> {
    let input: PublicUsersInput = input(vars)?;
    output(s.public_users(input).await?)
}

pub async fn get_search_results(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: GetSearchResultsInput = input(vars)?;
    output(s.get_search_results(user, input).await?)
}

pub async fn update_feed_activity(s: &Services, user: &User, vars: Value) -> DomainResult<Value> {
    let input: UpdateFeedActivityInput = input(vars)?;
    output(s.update_feed_activity(user, input).await?)
}
