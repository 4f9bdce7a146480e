//! Feed Cache Store
//!
//! Holds every fetched feed view plus the profile, and folds `CacheEvent`s
//! into all of them through one reducer. Patching is local only; the next
//! fetch or poll replaces a view wholesale.

use std::collections::{HashMap, HashSet};

use crate::events::CacheEvent;
use crate::models::{Item, ItemsSort, Membership, Profile, Summary};

/// Identity of one cached `items` result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedKey {
    pub parent_id: Option<String>,
    pub sort: ItemsSort,
}

impl FeedKey {
    pub fn top_level(sort: ItemsSort) -> Self {
        Self { parent_id: None, sort }
    }

    pub fn children(parent_id: impl Into<String>, sort: ItemsSort) -> Self {
        Self {
            parent_id: Some(parent_id.into()),
            sort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Number of views changed
    Patched(usize),
    NotCached,
}

/// Views changed while applying one event
#[derive(Default)]
struct Touched {
    feeds: HashSet<FeedKey>,
    profile: bool,
}

impl Touched {
    fn count(&self) -> usize {
        self.feeds.len() + usize::from(self.profile)
    }
}

#[derive(Debug, Default)]
pub struct FeedStore {
    feeds: HashMap<FeedKey, Vec<Item>>,
    profile: Option<Profile>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, key: &FeedKey) -> Option<&[Item]> {
        self.feeds.get(key).map(Vec::as_slice)
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// First cached copy of an item in any view
    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.feeds.values().flatten().find(|item| item.id == id)
    }

    pub fn apply(&mut self, event: CacheEvent) -> ApplyOutcome {
        let name = event.name();
        let mut touched = Touched::default();

        match event {
            CacheEvent::FeedFetched { key, items } => {
                self.feeds.insert(key.clone(), items);
                touched.feeds.insert(key);
            }
            CacheEvent::ProfileFetched(profile) => {
                self.profile = Some(profile);
                touched.profile = true;
            }
            CacheEvent::ItemCreated(item) => self.item_created(item, &mut touched),
            CacheEvent::ItemAmended(item) => self.update_item(&item, &mut touched),
            CacheEvent::ItemConverted(item) => self.item_converted(item, &mut touched),
            CacheEvent::SummaryChanged { item_id, summary } => {
                self.summary_changed(&item_id, summary, &mut touched)
            }
            CacheEvent::AnswerAccepted { answer, question } => {
                self.answer_accepted(answer, question, &mut touched)
            }
            CacheEvent::ItemMoved {
                item,
                old_parent,
                new_parent,
            } => self.item_moved(item, old_parent, new_parent, &mut touched),
            CacheEvent::InviteAccepted {
                invite_id,
                membership,
            } => self.invite_accepted(&invite_id, membership, &mut touched),
            CacheEvent::InviteDeclined { invite_id } => self.invite_declined(&invite_id, &mut touched),
        }

        match touched.count() {
            0 => {
                log::debug!("{} touched no cached view", name);
                ApplyOutcome::NotCached
            }
            n => ApplyOutcome::Patched(n),
        }
    }

    // ========================
    // Event Handlers
    // ========================

    fn item_created(&mut self, item: Item, touched: &mut Touched) {
        let chain = self.ancestors(item.parent_id.as_deref());
        for (key, feed) in self.feeds.iter_mut() {
            if key.parent_id != item.parent_id {
                continue;
            }
            if let Some(existing) = feed.iter_mut().find(|entry| entry.id == item.id) {
                *existing = item.clone();
            } else {
                match key.sort {
                    ItemsSort::NewestFirst => feed.insert(0, item.clone()),
                    ItemsSort::OldestFirst => feed.push(item.clone()),
                }
            }
            touched.feeds.insert(key.clone());
        }
        self.adjust_child_counts(&chain, 1 + item.child_count, touched);
    }

    /// Child flags only change when the variant does
    fn item_converted(&mut self, item: Item, touched: &mut Touched) {
        let previous = self.find_item(&item.id).map(|cached| cached.typename);
        self.update_item(&item, touched);
        if previous == Some(item.typename) {
            return;
        }
        let flag = item.is_question().then_some(false);
        self.patch_children(&item.id, touched, |child| child.is_accepted_answer = flag);
    }

    fn summary_changed(&mut self, item_id: &str, summary: Option<Summary>, touched: &mut Touched) {
        self.patch_item(item_id, touched, |entry| entry.summary = summary.clone());
    }

    fn answer_accepted(&mut self, answer: Item, question: Item, touched: &mut Touched) {
        self.update_item(&question, touched);
        self.update_item(&answer, touched);
        self.patch_children(&question.id, touched, |child| {
            child.is_accepted_answer = Some(child.id == answer.id)
        });
    }

    fn item_moved(&mut self, mut item: Item, old_parent: Option<Item>, new_parent: Option<Item>, touched: &mut Touched) {
        let cached = self.find_item(&item.id).cloned();
        let old_parent_id = match &cached {
            Some(cached) => cached.parent_id.clone(),
            None => old_parent.as_ref().map(|p| p.id.clone()),
        };
        let old_chain = self.ancestors(old_parent_id.as_deref());
        let new_chain = self.ancestors(item.parent_id.as_deref());

        let new_parent_is_question = match (&new_parent, item.parent_id.as_deref()) {
            (Some(parent), _) => Some(parent.is_question()),
            (None, Some(pid)) => self.find_item(pid).map(Item::is_question),
            (None, None) => Some(false),
        };
        if let Some(is_question) = new_parent_is_question {
            item.is_accepted_answer = is_question.then_some(false);
        }

        for (key, feed) in self.feeds.iter_mut() {
            if key.parent_id == old_parent_id {
                let before = feed.len();
                feed.retain(|entry| entry.id != item.id);
                if feed.len() != before {
                    touched.feeds.insert(key.clone());
                }
            }
        }
        for (key, feed) in self.feeds.iter_mut() {
            if key.parent_id == item.parent_id {
                insert_sorted(feed, item.clone(), key.sort);
                touched.feeds.insert(key.clone());
            }
        }
        self.update_item(&item, touched);

        let weight = 1 + item.child_count;
        self.adjust_child_counts(&old_chain, -weight, touched);
        self.adjust_child_counts(&new_chain, weight, touched);

        match (old_parent, old_parent_id) {
            (Some(parent), _) => self.update_item(&parent, touched),
            (None, Some(pid)) if cached.as_ref().and_then(|c| c.is_accepted_answer) == Some(true) => {
                self.patch_item(&pid, touched, |parent| {
                    if parent.is_question() {
                        parent.accepted_answer = None;
                        if let Some(expectation) = parent.action_expectation.as_mut() {
                            expectation.fulfilled = false;
                        }
                    }
                });
            }
            _ => {}
        }
        if let Some(parent) = new_parent {
            self.update_item(&parent, touched);
        }
    }

    fn invite_accepted(&mut self, invite_id: &str, membership: Membership, touched: &mut Touched) {
        let Some(profile) = self.profile.as_mut() else {
            return;
        };
        profile.invites.retain(|invite| invite.id != invite_id);
        if !profile.clients.iter().any(|m| m.id == membership.id) {
            profile.clients.push(membership);
        }
        touched.profile = true;
    }

    fn invite_declined(&mut self, invite_id: &str, touched: &mut Touched) {
        let Some(profile) = self.profile.as_mut() else {
            return;
        };
        let before = profile.invites.len();
        profile.invites.retain(|invite| invite.id != invite_id);
        touched.profile |= profile.invites.len() != before;
    }

    // ========================
    // Store Helpers
    // ========================

    /// Replace every cached copy of an item by ID
    fn update_item(&mut self, updated: &Item, touched: &mut Touched) {
        self.patch_item(&updated.id, touched, |entry| *entry = updated.clone());
    }

    /// Run `f` on every cached copy of an item, recording views that changed
    fn patch_item(&mut self, id: &str, touched: &mut Touched, mut f: impl FnMut(&mut Item)) {
        for (key, feed) in self.feeds.iter_mut() {
            for entry in feed.iter_mut().filter(|entry| entry.id == id) {
                let before = entry.clone();
                f(entry);
                if *entry != before {
                    touched.feeds.insert(key.clone());
                }
            }
        }
    }

    /// Run `f` on every entry of the feeds listing `parent_id`'s children
    fn patch_children(&mut self, parent_id: &str, touched: &mut Touched, mut f: impl FnMut(&mut Item)) {
        for (key, feed) in self.feeds.iter_mut() {
            if key.parent_id.as_deref() != Some(parent_id) {
                continue;
            }
            for entry in feed.iter_mut() {
                let before = entry.clone();
                f(entry);
                if *entry != before {
                    touched.feeds.insert(key.clone());
                }
            }
        }
    }

    /// `start` followed by its cached ancestors, nearest first
    fn ancestors(&self, start: Option<&str>) -> Vec<String> {
        let mut chain: Vec<String> = Vec::new();
        let mut next = start.map(str::to_string);
        while let Some(id) = next {
            if chain.contains(&id) {
                break;
            }
            next = self.find_item(&id).and_then(|item| item.parent_id.clone());
            chain.push(id);
        }
        chain
    }

    fn adjust_child_counts(&mut self, chain: &[String], delta: i64, touched: &mut Touched) {
        for id in chain {
            self.patch_item(id, touched, |entry| entry.child_count = (entry.child_count + delta).max(0));
        }
    }
}

/// Insert at the position the feed's sort order dictates
fn insert_sorted(feed: &mut Vec<Item>, item: Item, sort: ItemsSort) {
    feed.retain(|entry| entry.id != item.id);
    let position = feed
        .iter()
        .position(|entry| match sort {
            ItemsSort::NewestFirst => entry.created_at < item.created_at,
            ItemsSort::OldestFirst => entry.created_at > item.created_at,
        })
        .unwrap_or(feed.len());
    feed.insert(position, item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AcceptedAnswer, ActionExpectation, ActionExpectationType, ClientRef, Invite, ItemType, PublicUser, Role,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn item(id: &str, typename: ItemType, parent_id: Option<&str>, minute: i64) -> Item {
        Item {
            typename,
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
            author_id: "User:1".to_string(),
            text: id.to_string(),
            rich_text: None,
            to: Vec::new(),
            shared_with: Vec::new(),
            created_at: at(minute),
            updated_at: at(minute),
            child_count: 0,
            summary: None,
            attachments: Vec::new(),
            action_expectation: None,
            is_accepted_answer: None,
            goals: Vec::new(),
            blocks: Vec::new(),
            blocked_by: Vec::new(),
            status: None,
            accepted_answer: None,
            acknowledged: None,
            goal_status: None,
            constituents: None,
        }
    }

    fn answered_question() -> (Item, Item, Item) {
        let mut question = item("Item:1", ItemType::Question, None, 0);
        question.child_count = 2;
        question.accepted_answer = Some(AcceptedAnswer {
            text: "Item:2".to_string(),
            rich_text: None,
        });
        question.action_expectation = Some(ActionExpectation {
            kind: ActionExpectationType::ActionExpectedFromYou,
            complete_until: None,
            fulfilled: true,
        });
        let mut accepted = item("Item:2", ItemType::Message, Some("Item:1"), 1);
        accepted.is_accepted_answer = Some(true);
        let mut other = item("Item:3", ItemType::Message, Some("Item:1"), 2);
        other.is_accepted_answer = Some(false);
        (question, accepted, other)
    }

    fn store_with(feeds: Vec<(FeedKey, Vec<Item>)>) -> FeedStore {
        let mut store = FeedStore::new();
        for (key, items) in feeds {
            store.apply(CacheEvent::FeedFetched { key, items });
        }
        store
    }

    fn ids(store: &FeedStore, key: &FeedKey) -> Vec<String> {
        store.feed(key).unwrap().iter().map(|i| i.id.clone()).collect()
    }

    #[test]
    fn test_created_item_follows_feed_sort() {
        let parent = item("Item:1", ItemType::Task, None, 0);
        let first = item("Item:2", ItemType::Message, Some("Item:1"), 1);
        let newest = FeedKey::children("Item:1", ItemsSort::NewestFirst);
        let oldest = FeedKey::children("Item:1", ItemsSort::OldestFirst);
        let top = FeedKey::top_level(ItemsSort::NewestFirst);
        let mut store = store_with(vec![
            (top.clone(), vec![parent]),
            (newest.clone(), vec![first.clone()]),
            (oldest.clone(), vec![first]),
        ]);

        let outcome = store.apply(CacheEvent::ItemCreated(item("Item:5", ItemType::Message, Some("Item:1"), 5)));

        assert_eq!(outcome, ApplyOutcome::Patched(3));
        assert_eq!(ids(&store, &newest), vec!["Item:5", "Item:2"]);
        assert_eq!(ids(&store, &oldest), vec!["Item:2", "Item:5"]);
        assert_eq!(store.feed(&top).unwrap()[0].child_count, 1);
    }

    #[test]
    fn test_created_item_bumps_every_cached_ancestor() {
        let mut root = item("Item:1", ItemType::Task, None, 0);
        root.child_count = 1;
        let mid = item("Item:2", ItemType::Task, Some("Item:1"), 1);
        let mut store = store_with(vec![
            (FeedKey::top_level(ItemsSort::NewestFirst), vec![root]),
            (FeedKey::children("Item:1", ItemsSort::NewestFirst), vec![mid]),
        ]);

        store.apply(CacheEvent::ItemCreated(item("Item:3", ItemType::Message, Some("Item:2"), 2)));

        assert_eq!(store.find_item("Item:1").unwrap().child_count, 2);
        assert_eq!(store.find_item("Item:2").unwrap().child_count, 1);
    }

    #[test]
    fn test_event_for_unloaded_feed_is_not_cached() {
        let mut store = store_with(vec![(
            FeedKey::top_level(ItemsSort::NewestFirst),
            vec![item("Item:1", ItemType::Message, None, 0)],
        )]);

        let outcome = store.apply(CacheEvent::ItemCreated(item("Item:9", ItemType::Message, Some("Item:8"), 1)));
        assert_eq!(outcome, ApplyOutcome::NotCached);

        let outcome = store.apply(CacheEvent::InviteDeclined {
            invite_id: "InviteToClient:1".to_string(),
        });
        assert_eq!(outcome, ApplyOutcome::NotCached);
    }

    #[test]
    fn test_accepting_answer_leaves_one_flag_set() {
        let (question, accepted, other) = answered_question();
        let children = FeedKey::children("Item:1", ItemsSort::OldestFirst);
        let mut store = store_with(vec![
            (FeedKey::top_level(ItemsSort::NewestFirst), vec![question.clone()]),
            (children.clone(), vec![accepted, other.clone()]),
        ]);

        let mut answer = other;
        answer.is_accepted_answer = Some(true);
        let mut updated_question = question;
        updated_question.accepted_answer = Some(AcceptedAnswer {
            text: "Item:3".to_string(),
            rich_text: None,
        });
        let outcome = store.apply(CacheEvent::AnswerAccepted {
            answer,
            question: updated_question,
        });

        assert_eq!(outcome, ApplyOutcome::Patched(2));
        let flags: Vec<Option<bool>> = store.feed(&children).unwrap().iter().map(|i| i.is_accepted_answer).collect();
        assert_eq!(flags, vec![Some(false), Some(true)]);
        let q = store.find_item("Item:1").unwrap();
        assert_eq!(q.accepted_answer.as_ref().unwrap().text, "Item:3");
    }

    #[test]
    fn test_moving_accepted_answer_out_clears_old_question() {
        let (question, accepted, other) = answered_question();
        let top = FeedKey::top_level(ItemsSort::NewestFirst);
        let children = FeedKey::children("Item:1", ItemsSort::OldestFirst);
        let mut store = store_with(vec![
            (top.clone(), vec![question]),
            (children.clone(), vec![accepted.clone(), other]),
        ]);

        let mut moved = accepted;
        moved.parent_id = None;
        moved.is_accepted_answer = Some(true);
        store.apply(CacheEvent::ItemMoved {
            item: moved,
            old_parent: None,
            new_parent: None,
        });

        assert_eq!(ids(&store, &children), vec!["Item:3"]);
        assert_eq!(ids(&store, &top), vec!["Item:2", "Item:1"]);
        let q = store.find_item("Item:1").unwrap();
        assert_eq!(q.accepted_answer, None);
        assert!(!q.action_expectation.as_ref().unwrap().fulfilled);
        assert_eq!(q.child_count, 1);
        assert_eq!(store.find_item("Item:2").unwrap().is_accepted_answer, None);
    }

    #[test]
    fn test_moving_under_question_marks_item_unaccepted() {
        let question = item("Item:1", ItemType::Question, None, 0);
        let task = item("Item:4", ItemType::Task, None, 3);
        let top = FeedKey::top_level(ItemsSort::NewestFirst);
        let children = FeedKey::children("Item:1", ItemsSort::NewestFirst);
        let mut store = store_with(vec![(top.clone(), vec![task.clone(), question]), (children.clone(), vec![])]);

        let mut moved = task;
        moved.parent_id = Some("Item:1".to_string());
        store.apply(CacheEvent::ItemMoved {
            item: moved,
            old_parent: None,
            new_parent: None,
        });

        assert_eq!(ids(&store, &top), vec!["Item:1"]);
        let placed = &store.feed(&children).unwrap()[0];
        assert_eq!(placed.is_accepted_answer, Some(false));
        assert_eq!(store.find_item("Item:1").unwrap().child_count, 1);
    }

    #[test]
    fn test_converting_to_question_resets_child_flags() {
        let task = item("Item:1", ItemType::Task, None, 0);
        let children = FeedKey::children("Item:1", ItemsSort::OldestFirst);
        let mut store = store_with(vec![
            (FeedKey::top_level(ItemsSort::NewestFirst), vec![task.clone()]),
            (children.clone(), vec![item("Item:2", ItemType::Message, Some("Item:1"), 1)]),
        ]);

        let mut converted = task;
        converted.typename = ItemType::Question;
        let outcome = store.apply(CacheEvent::ItemConverted(converted));

        assert_eq!(outcome, ApplyOutcome::Patched(2));
        assert_eq!(store.feed(&children).unwrap()[0].is_accepted_answer, Some(false));
    }

    #[test]
    fn test_converting_to_same_type_keeps_accepted_flag() {
        let (question, accepted, other) = answered_question();
        let children = FeedKey::children("Item:1", ItemsSort::OldestFirst);
        let mut store = store_with(vec![
            (FeedKey::top_level(ItemsSort::NewestFirst), vec![question.clone()]),
            (children.clone(), vec![accepted, other]),
        ]);

        let mut reconverted = question;
        reconverted.text = "Which database?".to_string();
        let outcome = store.apply(CacheEvent::ItemConverted(reconverted));

        assert_eq!(outcome, ApplyOutcome::Patched(1));
        let flags: Vec<_> = store.feed(&children).unwrap().iter().map(|c| c.is_accepted_answer).collect();
        assert_eq!(flags, vec![Some(true), Some(false)]);
    }

    #[test]
    fn test_summary_changes_apply_to_every_copy() {
        let message = item("Item:1", ItemType::Message, None, 0);
        let mut store = store_with(vec![
            (FeedKey::top_level(ItemsSort::NewestFirst), vec![message.clone()]),
            (FeedKey::top_level(ItemsSort::OldestFirst), vec![message]),
        ]);
        let summary = Summary {
            text: "tl;dr".to_string(),
            rich_text: None,
            should_replace_original_item: true,
        };

        let outcome = store.apply(CacheEvent::SummaryChanged {
            item_id: "Item:1".to_string(),
            summary: Some(summary),
        });
        assert_eq!(outcome, ApplyOutcome::Patched(2));

        let outcome = store.apply(CacheEvent::SummaryChanged {
            item_id: "Item:1".to_string(),
            summary: None,
        });
        assert_eq!(outcome, ApplyOutcome::Patched(2));
        assert_eq!(store.find_item("Item:1").unwrap().summary, None);
    }

    #[test]
    fn test_invite_accept_and_decline_patch_profile() {
        let acme = ClientRef {
            id: "Client:2".to_string(),
            name: "Acme".to_string(),
        };
        let invite = |id: &str| Invite {
            id: id.to_string(),
            email: "bob@example.com".to_string(),
            client: acme.clone(),
            created_at: at(0),
        };
        let mut store = FeedStore::new();
        store.apply(CacheEvent::ProfileFetched(Profile {
            user: PublicUser {
                id: "User:2".to_string(),
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
                photo_url: None,
            },
            clients: Vec::new(),
            invites: vec![invite("InviteToClient:1"), invite("InviteToClient:2")],
        }));

        let outcome = store.apply(CacheEvent::InviteAccepted {
            invite_id: "InviteToClient:1".to_string(),
            membership: Membership {
                id: "UserClient:7".to_string(),
                client: acme.clone(),
                role: Role::Member,
            },
        });
        assert_eq!(outcome, ApplyOutcome::Patched(1));

        store.apply(CacheEvent::InviteDeclined {
            invite_id: "InviteToClient:2".to_string(),
        });
        let profile = store.profile().unwrap();
        assert!(profile.invites.is_empty());
        assert_eq!(profile.clients.len(), 1);
        assert_eq!(profile.clients[0].client.name, "Acme");
    }

    #[test]
    fn test_fetch_replaces_patched_view() {
        let key = FeedKey::top_level(ItemsSort::NewestFirst);
        let mut store = store_with(vec![(key.clone(), vec![])]);
        store.apply(CacheEvent::ItemCreated(item("Item:1", ItemType::Message, None, 0)));
        assert_eq!(ids(&store, &key), vec!["Item:1"]);

        store.apply(CacheEvent::FeedFetched {
            key: key.clone(),
            items: vec![item("Item:2", ItemType::Message, None, 1)],
        });
        assert_eq!(ids(&store, &key), vec!["Item:2"]);
    }
}
