//! Query/Feed Engine
//!
//! Feeds only ever contain items the viewer can read. Without a
//! `parentId` the `items` feed is the top level, not every item.

use rusqlite::Connection;
use serde::Deserialize;

use crate::domain::{DomainResult, ItemsSort, User};
use crate::repository::{
    ActivityRepository, FeedScope, ItemFeedOperations, ItemRepository, SearchableRepository,
    UserRepository,
};
use super::access::{item_ref, readable_item};
use super::views::{FeedActivityView, ItemRenderer, ItemView, PublicUserView, SearchResultsView};
use super::Services;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsFilters {
    pub parent_id: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemsInput {
    #[serde(default)]
    pub sort: ItemsSort,
    #[serde(default)]
    pub filters: ItemsFilters,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicUsersFilters {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicUsersInput {
    #[serde(default)]
    pub filters: PublicUsersFilters,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSearchResultsInput {
    #[serde(default)]
    pub items_filters: ItemsFilters,
    #[serde(default)]
    pub public_users_filters: PublicUsersFilters,
    #[serde(default)]
    pub items_sort: ItemsSort,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedActivityInput {
    pub parent_id: Option<String>,
}

impl Services {
    pub async fn items(&self, user: &User, input: ItemsInput) -> DomainResult<Vec<ItemView>> {
        self.db
            .read(|conn| {
                let scope = match input.filters.parent_id.as_deref() {
                    Some(raw) => FeedScope::Under(item_ref(raw, "Parent")?),
                    None => FeedScope::TopLevel,
                };
                feed(conn, user, scope, input.filters.search.as_deref(), input.sort)
            })
            .await
    }

    pub async fn public_users(&self, input: PublicUsersInput) -> DomainResult<Vec<PublicUserView>> {
        self.db
            .read(|conn| public_users(conn, input.filters.search.as_deref()))
            .await
    }

    /// Items at any depth unless a parent is given, plus matching users
    pub async fn get_search_results(
        &self,
        user: &User,
        input: GetSearchResultsInput,
    ) -> DomainResult<SearchResultsView> {
        self.db
            .read(|conn| {
                let scope = match input.items_filters.parent_id.as_deref() {
                    Some(raw) => FeedScope::Under(item_ref(raw, "Parent")?),
                    None => FeedScope::Anywhere,
                };
                Ok(SearchResultsView {
                    items: feed(
                        conn,
                        user,
                        scope,
                        input.items_filters.search.as_deref(),
                        input.items_sort,
                    )?,
                    public_users: public_users(conn, input.public_users_filters.search.as_deref())?,
                })
            })
            .await
    }

    pub async fn update_feed_activity(
        &self,
        user: &User,
        input: UpdateFeedActivityInput,
    ) -> DomainResult<FeedActivityView> {
        self.db
            .with_transaction(|conn| {
                let parent_id = input
                    .parent_id
                    .as_deref()
                    .map(|raw| {
                        let id = item_ref(raw, "Parent")?;
                        readable_item(conn, user, id, "Parent").map(|p| p.id)
                    })
                    .transpose()?;
                let activity = ActivityRepository::new(conn).bump(user.id, parent_id)?;
                Ok(FeedActivityView::from(&activity))
            })
            .await
    }
}

fn feed(
    conn: &Connection,
    user: &User,
    scope: FeedScope,
    search: Option<&str>,
    sort: ItemsSort,
) -> DomainResult<Vec<ItemView>> {
    let items = ItemRepository::new(conn).list_visible(user.id, scope, search, sort)?;
    ItemRenderer::new(conn, user).render(items)
}

fn public_users(conn: &Connection, search: Option<&str>) -> DomainResult<Vec<PublicUserView>> {
    let users = UserRepository::new(conn).search(search.map(str::trim).unwrap_or_default())?;
    Ok(users.iter().map(PublicUserView::from).collect())
}
