//! Item Repository Module
//!
//! This module provides item storage split into specialized sub-modules:
//! - item_repo: Core CRUD operations
//! - item_hierarchy: Hierarchy operations (children, child counts, moves)
//! - item_sharing: Sharing lists, attachments and summaries
//! - item_links: Goal constituents and blocked-by links
//! - item_feed: Visibility-filtered feed listing

mod item_feed;
mod item_hierarchy;
mod item_links;
mod item_repo;
mod item_sharing;

pub use item_repo::ItemRepository;

// Re-export all operation traits so they can be used by importing ItemRepository
pub use item_feed::{FeedScope, ItemFeedOperations};
pub use item_hierarchy::ItemHierarchyOperations;
pub use item_links::ItemLinkOperations;
pub use item_sharing::ItemSharingOperations;
