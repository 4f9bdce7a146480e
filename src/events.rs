//! Cache Events
//!
//! Every mutation or fetch result is folded into the local cache as one of
//! these events. See `FeedStore::apply`.

use crate::models::{AcceptAnswerPayload, Item, Membership, NestItemPayload, Profile, Summary};
use crate::store::FeedKey;

#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    ItemCreated(Item),
    /// Amend and link updates; the server copy replaces cached entries
    ItemAmended(Item),
    AnswerAccepted {
        answer: Item,
        question: Item,
    },
    /// `old_parent` is absent when the caller cannot read it
    ItemMoved {
        item: Item,
        old_parent: Option<Item>,
        new_parent: Option<Item>,
    },
    ItemConverted(Item),
    SummaryChanged {
        item_id: String,
        summary: Option<Summary>,
    },
    InviteAccepted {
        invite_id: String,
        membership: Membership,
    },
    InviteDeclined {
        invite_id: String,
    },
    FeedFetched {
        key: FeedKey,
        items: Vec<Item>,
    },
    ProfileFetched(Profile),
}

impl CacheEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CacheEvent::ItemCreated(_) => "ItemCreated",
            CacheEvent::ItemAmended(_) => "ItemAmended",
            CacheEvent::AnswerAccepted { .. } => "AnswerAccepted",
            CacheEvent::ItemMoved { .. } => "ItemMoved",
            CacheEvent::ItemConverted(_) => "ItemConverted",
            CacheEvent::SummaryChanged { .. } => "SummaryChanged",
            CacheEvent::InviteAccepted { .. } => "InviteAccepted",
            CacheEvent::InviteDeclined { .. } => "InviteDeclined",
            CacheEvent::FeedFetched { .. } => "FeedFetched",
            CacheEvent::ProfileFetched(_) => "ProfileFetched",
        }
    }
}

impl From<AcceptAnswerPayload> for CacheEvent {
    fn from(payload: AcceptAnswerPayload) -> Self {
        CacheEvent::AnswerAccepted {
            answer: payload.answer,
            question: payload.question,
        }
    }
}

impl From<NestItemPayload> for CacheEvent {
    fn from(payload: NestItemPayload) -> Self {
        CacheEvent::ItemMoved {
            item: payload.item,
            old_parent: payload.old_parent,
            new_parent: payload.new_parent,
        }
    }
}
