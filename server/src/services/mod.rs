//! Services Layer
//!
//! Identity resolution, authorization and the mutation/query operations.
//! Every write runs inside one `Db::with_transaction`; file-access side
//! effects are collected into a `FileAccessPlan` and issued after commit.

pub mod access;
mod answers;
mod clients;
mod feed;
pub mod file_access;
mod files;
mod identity;
mod items;
mod links;
pub mod views;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::repository::Db;
use file_access::FileAccess;

pub use answers::{AcceptAnswerInput, NestItemInput};
pub use clients::{AcceptClientInviteInput, DeclineClientInviteInput, InviteToClientInput};
pub use feed::{
    GetSearchResultsInput, ItemsFilters, ItemsInput, PublicUsersFilters, PublicUsersInput,
    UpdateFeedActivityInput,
};
pub use files::CreateFileInput;
pub use identity::resolve_user;
pub use items::{
    ActionExpectationInput, AmendItemInput, ConvertItemInput, CreateItemInput,
    DeleteItemSummaryInput, SummarizeItemInput,
};
pub use links::{UpdateGoalConstituentsInput, UpdateItemGoalsInput, UpdateItemsBlockedInput};

/// Handle shared by every request
#[derive(Clone)]
pub struct Services {
    pub(crate) db: Db,
    pub(crate) file_access: Arc<dyn FileAccess>,
}

impl Services {
    pub fn new(db: Db, file_access: Arc<dyn FileAccess>) -> Self {
        Self { db, file_access }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

/// Distinguishes an explicit `null` from an absent field when used with
/// `#[serde(default)]` on an `Option<Option<T>>`
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
