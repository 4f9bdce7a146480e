//! Repository Layer
//!
//! Data access abstractions and the SQLite implementation.

mod activity_repo;
mod db;
mod file_repo;
mod invite_repo;
mod item;
mod traits;
mod user_repo;


pub use activity_repo::ActivityRepository;
pub use db::{init_db, init_memory_db, Db};
pub use file_repo::{FileRepository, NewFile};
pub use invite_repo::InviteRepository;
pub use item::{
    FeedScope, ItemFeedOperations, ItemHierarchyOperations, ItemLinkOperations, ItemRepository,
    ItemSharingOperations,
};
pub use traits::{Repository, SearchableRepository};
pub use user_repo::UserRepository;
