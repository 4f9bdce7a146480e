//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer does no I/O.

mod entity;
mod file;
mod ids;
mod item;
mod user;

pub use entity::{DomainError, DomainResult, Entity};
pub use file::{FileNamer, FileRecord};
pub use ids::{parse_tagged, GlobalId, IdTag};
pub use item::{
    accepted_flag_under, sharing_closure, AcceptedAnswer, ActionExpectation,
    ActionExpectationType, Item, ItemType, ItemsSort, ItemVariant, Summary, TaskStatus,
};
pub use user::{Client, ClientInvite, FeedActivity, Identity, Role, User, UserClient};
