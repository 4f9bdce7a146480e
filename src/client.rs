//! Client Facade
//!
//! Runs operations against the server and folds each result into the
//! shared `FeedStore`.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::commands::{self, AmendItemArgs, CreateFileArgs, CreateItemArgs, ItemsFilters, SummarizeItemArgs, Transport};
use crate::error::ClientResult;
use crate::events::CacheEvent;
use crate::models::{File, GenericResult, Invite, Item, ItemType, ItemsSort, Membership, Profile, PublicUser, SearchResults};
use crate::polling::{spawn_poll, PollHandle, PollingPolicy};
use crate::store::{ApplyOutcome, FeedKey, FeedStore};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full url of the `/graphql` endpoint
    pub endpoint: String,
    pub token: String,
    pub polling: PollingPolicy,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            polling: PollingPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct ContagClient {
    transport: Transport,
    store: Arc<Mutex<FeedStore>>,
    polling: PollingPolicy,
}

impl ContagClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            transport: Transport::new(config.endpoint, config.token),
            store: Arc::new(Mutex::new(FeedStore::new())),
            polling: config.polling,
        }
    }

    pub fn store(&self) -> Arc<Mutex<FeedStore>> {
        self.store.clone()
    }

    async fn fold(&self, event: CacheEvent) -> ApplyOutcome {
        self.store.lock().await.apply(event)
    }

    // ========================
    // Queries
    // ========================

    pub async fn fetch_feed(&self, key: &FeedKey) -> ClientResult<Vec<Item>> {
        let filters = ItemsFilters {
            parent_id: key.parent_id.clone(),
            search: None,
        };
        let items = commands::list_items(&self.transport, key.sort, &filters).await?;
        self.fold(CacheEvent::FeedFetched {
            key: key.clone(),
            items: items.clone(),
        })
        .await;
        Ok(items)
    }

    pub async fn fetch_profile(&self) -> ClientResult<Profile> {
        let profile = commands::my_profile(&self.transport).await?;
        self.fold(CacheEvent::ProfileFetched(profile.clone())).await;
        Ok(profile)
    }

    /// Search results are not cached
    pub async fn search(
        &self,
        filters: &ItemsFilters,
        users_search: Option<&str>,
        sort: ItemsSort,
    ) -> ClientResult<SearchResults> {
        commands::get_search_results(&self.transport, filters, users_search, sort).await
    }

    pub async fn public_users(&self, search: Option<&str>) -> ClientResult<Vec<PublicUser>> {
        commands::public_users(&self.transport, search).await
    }

    // ========================
    // Item Mutations
    // ========================

    pub async fn create_item(&self, item_type: ItemType, args: &CreateItemArgs) -> ClientResult<Item> {
        let item = commands::create_item(&self.transport, item_type, args).await?;
        self.fold(CacheEvent::ItemCreated(item.clone())).await;
        Ok(item)
    }

    pub async fn amend_item(&self, item_type: ItemType, args: &AmendItemArgs) -> ClientResult<Item> {
        let item = commands::amend_item(&self.transport, item_type, args).await?;
        self.fold(CacheEvent::ItemAmended(item.clone())).await;
        Ok(item)
    }

    /// Returns the accepted answer
    pub async fn accept_answer(&self, item_id: &str) -> ClientResult<Item> {
        let payload = commands::accept_answer(&self.transport, item_id).await?;
        let answer = payload.answer.clone();
        self.fold(payload.into()).await;
        Ok(answer)
    }

    pub async fn nest_item(&self, item_id: &str, new_parent_id: Option<&str>) -> ClientResult<Item> {
        let payload = commands::nest_item(&self.transport, item_id, new_parent_id).await?;
        let item = payload.item.clone();
        self.fold(payload.into()).await;
        Ok(item)
    }

    pub async fn convert_item(&self, id: &str, item_type: ItemType) -> ClientResult<Item> {
        let item = commands::convert_item(&self.transport, id, item_type).await?;
        self.fold(CacheEvent::ItemConverted(item.clone())).await;
        Ok(item)
    }

    pub async fn summarize_item(&self, args: &SummarizeItemArgs) -> ClientResult<Item> {
        let item = commands::summarize_item(&self.transport, args).await?;
        self.fold(CacheEvent::SummaryChanged {
            item_id: item.id.clone(),
            summary: item.summary.clone(),
        })
        .await;
        Ok(item)
    }

    pub async fn delete_item_summary(&self, id: &str) -> ClientResult<GenericResult> {
        let result = commands::delete_item_summary(&self.transport, id).await?;
        self.fold(CacheEvent::SummaryChanged {
            item_id: id.to_string(),
            summary: None,
        })
        .await;
        Ok(result)
    }

    pub async fn update_goal_constituents(&self, goal_id: &str, added: &[String], removed: &[String]) -> ClientResult<Item> {
        let goal = commands::update_goal_constituents(&self.transport, goal_id, added, removed).await?;
        self.fold(CacheEvent::ItemAmended(goal.clone())).await;
        Ok(goal)
    }

    pub async fn update_item_goals(&self, item_id: &str, added: &[String], removed: &[String]) -> ClientResult<Item> {
        let item = commands::update_item_goals(&self.transport, item_id, added, removed).await?;
        self.fold(CacheEvent::ItemAmended(item.clone())).await;
        Ok(item)
    }

    pub async fn update_items_blocked(&self, item_id: &str, added: &[String], removed: &[String]) -> ClientResult<Item> {
        let item = commands::update_items_blocked(&self.transport, item_id, added, removed).await?;
        self.fold(CacheEvent::ItemAmended(item.clone())).await;
        Ok(item)
    }

    pub async fn mark_feed_viewed(&self, parent_id: Option<&str>) -> ClientResult<()> {
        commands::update_feed_activity(&self.transport, parent_id).await?;
        Ok(())
    }

    // ========================
    // Clients and Files
    // ========================

    pub async fn invite_to_client(&self, email: &str, client_id: &str) -> ClientResult<Invite> {
        commands::invite_to_client(&self.transport, email, client_id).await
    }

    pub async fn accept_invite(&self, invite_id: &str) -> ClientResult<Membership> {
        let membership = commands::accept_client_invite(&self.transport, invite_id).await?;
        self.fold(CacheEvent::InviteAccepted {
            invite_id: invite_id.to_string(),
            membership: membership.clone(),
        })
        .await;
        Ok(membership)
    }

    pub async fn decline_invite(&self, invite_id: &str) -> ClientResult<GenericResult> {
        let result = commands::decline_client_invite(&self.transport, invite_id).await?;
        self.fold(CacheEvent::InviteDeclined {
            invite_id: invite_id.to_string(),
        })
        .await;
        Ok(result)
    }

    pub async fn create_file(&self, args: &CreateFileArgs) -> ClientResult<File> {
        commands::create_file(&self.transport, args).await
    }

    // ========================
    // Polling
    // ========================

    /// Start the profile loop and one loop per feed. Empty when polling is
    /// disabled. Failed polls are logged and retried on the next tick.
    pub fn start_polling(&self, feeds: Vec<FeedKey>) -> Vec<PollHandle> {
        let mut handles = Vec::new();

        let client = self.clone();
        handles.extend(spawn_poll(self.polling.profile_every(), move || {
            let client = client.clone();
            async move {
                if let Err(e) = client.fetch_profile().await {
                    log::warn!("profile poll failed: {}", e);
                }
            }
        }));

        for key in feeds {
            let client = self.clone();
            handles.extend(spawn_poll(self.polling.feed_every(), move || {
                let client = client.clone();
                let key = key.clone();
                async move {
                    if let Err(e) = client.fetch_feed(&key).await {
                        log::warn!("feed poll for {:?} failed: {}", key.parent_id, e);
                    }
                }
            }));
        }

        handles
    }
}
