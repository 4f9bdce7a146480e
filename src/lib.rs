//! Contag Client
//!
//! - models: wire shapes returned by the server
//! - commands: typed operation wrappers over HTTP
//! - events / store: event-sourced cache of fetched feeds and the profile
//! - polling: periodic refetch policy
//! - client: facade that runs an operation and folds its result into the cache

pub mod client;
pub mod commands;
pub mod error;
pub mod events;
pub mod models;
pub mod polling;
pub mod store;

pub use client::{ClientConfig, ContagClient};
pub use error::{ClientError, ClientResult};
pub use events::CacheEvent;
pub use store::{ApplyOutcome, FeedKey, FeedStore};
