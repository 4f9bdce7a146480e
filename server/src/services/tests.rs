//! Orchestrator Scenario Tests
//!
//! End-to-end service calls over an in-memory database with a recording
//! file-access fake.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::domain::{
        DomainError, DomainResult, Entity, Identity, ItemType, ItemsSort, TaskStatus, User,
    };
    use crate::repository::init_memory_db;
    use crate::services::file_access::{AccessChange, FileAccess};
    use crate::services::views::{FileView, ItemView, VariantView};
    use crate::services::*;

    #[derive(Default)]
    struct RecordingFileAccess {
        calls: Mutex<Vec<AccessChange>>,
    }

    #[async_trait]
    impl FileAccess for RecordingFileAccess {
        async fn grant_file_access(&self, users: &[String], filenames: &[String]) -> DomainResult<()> {
            self.calls.lock().unwrap().push(AccessChange::Grant {
                users: users.to_vec(),
                filenames: filenames.to_vec(),
            });
            Ok(())
        }

        async fn revoke_file_access(&self, users: &[String], filenames: &[String]) -> DomainResult<()> {
            self.calls.lock().unwrap().push(AccessChange::Revoke {
                users: users.to_vec(),
                filenames: filenames.to_vec(),
            });
            Ok(())
        }

        async fn revoke_all_file_access(&self, filenames: &[String]) -> DomainResult<()> {
            self.calls.lock().unwrap().push(AccessChange::RevokeAll {
                filenames: filenames.to_vec(),
            });
            Ok(())
        }
    }

    struct Fixture {
        services: Services,
        recorder: Arc<RecordingFileAccess>,
    }

    fn setup() -> Fixture {
        let recorder = Arc::new(RecordingFileAccess::default());
        let db = init_memory_db().expect("Failed to init test DB");
        Fixture {
            services: Services::new(db, recorder.clone()),
            recorder,
        }
    }

    async fn user(f: &Fixture, name: &str) -> User {
        resolve_user(
            f.services.db(),
            &Identity {
                email: format!("{}@example.com", name.to_lowercase()),
                name: name.to_string(),
                picture: None,
            },
        )
        .await
        .expect("Failed to resolve user")
    }

    fn shared(users: &[&User]) -> Option<Vec<String>> {
        Some(users.iter().map(|u| u.global_id().to_string()).collect())
    }

    async fn create(f: &Fixture, author: &User, item_type: ItemType, input: CreateItemInput) -> ItemView {
        f.services
            .create_item(author, item_type, input)
            .await
            .expect("Failed to create item")
    }

    async fn top_level(f: &Fixture, author: &User, item_type: ItemType, text: &str, with: &[&User]) -> ItemView {
        create(
            f,
            author,
            item_type,
            CreateItemInput {
                text: text.to_string(),
                share_with: shared(with),
                ..Default::default()
            },
        )
        .await
    }

    async fn child(f: &Fixture, author: &User, item_type: ItemType, text: &str, parent: &ItemView) -> ItemView {
        create(
            f,
            author,
            item_type,
            CreateItemInput {
                text: text.to_string(),
                parent_id: Some(parent.id.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    async fn feed_under(f: &Fixture, viewer: &User, parent: &ItemView) -> Vec<ItemView> {
        f.services
            .items(
                viewer,
                ItemsInput {
                    sort: ItemsSort::OldestFirst,
                    filters: ItemsFilters {
                        parent_id: Some(parent.id.to_string()),
                        search: None,
                    },
                },
            )
            .await
            .unwrap()
    }

    fn accepted_answer_text(view: &ItemView) -> Option<String> {
        match &view.variant {
            VariantView::Question { accepted_answer } => accepted_answer.as_ref().map(|a| a.text.clone()),
            other => panic!("not a question: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_requires_context() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let err = f
            .services
            .create_item(&alice, ItemType::Message, CreateItemInput::default())
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::invalid("Must provide one of parentId, shareWith or to"));
    }

    #[tokio::test]
    async fn test_sharing_closure_for_every_variant() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;

        for item_type in [ItemType::Message, ItemType::Task, ItemType::Question, ItemType::Info, ItemType::Goal] {
            let view = top_level(&f, &alice, item_type, "hello", &[&bob]).await;
            let ids: Vec<_> = view.shared_with.iter().map(|u| u.id).collect();
            assert_eq!(ids, vec![alice.global_id(), bob.global_id()]);
            assert_eq!(view.action_expectation.is_some(), item_type != ItemType::Message);
        }
    }

    #[tokio::test]
    async fn test_child_inherits_parent_sharing() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let carol = user(&f, "Carol").await;

        let root = top_level(&f, &alice, ItemType::Task, "plan", &[&bob, &carol]).await;
        let reply = child(&f, &bob, ItemType::Message, "on it", &root).await;

        let mut ids: Vec<_> = reply.shared_with.iter().map(|u| u.id.id).collect();
        ids.sort();
        assert_eq!(ids, vec![alice.id, bob.id, carol.id]);
        assert_eq!(reply.parent_id, Some(root.id));
    }

    #[tokio::test]
    async fn test_parent_id_validation() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let private = top_level(&f, &bob, ItemType::Task, "private", &[&bob]).await;

        let attempt = |parent: &str| CreateItemInput {
            parent_id: Some(parent.to_string()),
            ..Default::default()
        };
        let err = f.services.create_item(&alice, ItemType::Message, attempt("nonsense")).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("Invalid parent id"));

        let err = f
            .services
            .create_item(&alice, ItemType::Message, attempt(&bob.global_id().to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::invalid("Invalid parentId entity type"));

        let err = f
            .services
            .create_item(&alice, ItemType::Message, attempt(&private.id.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("Parent not found"));
    }

    #[tokio::test]
    async fn test_feed_visibility() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let carol = user(&f, "Carol").await;

        let with_bob = top_level(&f, &alice, ItemType::Task, "with bob", &[&bob]).await;
        top_level(&f, &alice, ItemType::Task, "with carol", &[&carol]).await;

        let bob_feed = f.services.items(&bob, ItemsInput::default()).await.unwrap();
        assert_eq!(bob_feed.iter().map(|i| i.id).collect::<Vec<_>>(), vec![with_bob.id]);

        let results = f
            .services
            .get_search_results(
                &bob,
                GetSearchResultsInput {
                    items_filters: ItemsFilters {
                        parent_id: None,
                        search: Some("carol".to_string()),
                    },
                    public_users_filters: PublicUsersFilters {
                        search: Some("carol".to_string()),
                    },
                    items_sort: ItemsSort::NewestFirst,
                },
            )
            .await
            .unwrap();
        assert!(results.items.is_empty());
        assert_eq!(results.public_users.len(), 1);
        assert_eq!(results.public_users[0].id, carol.global_id());
    }

    #[tokio::test]
    async fn test_child_counts_in_feed() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;

        let grandparent = top_level(&f, &alice, ItemType::Goal, "gp", &[&bob]).await;
        let parent = child(&f, &alice, ItemType::Task, "p", &grandparent).await;
        child(&f, &alice, ItemType::Message, "c", &parent).await;

        let feed = f.services.items(&alice, ItemsInput::default()).await.unwrap();
        assert_eq!(feed[0].child_count, 2);
        assert_eq!(feed_under(&f, &alice, &grandparent).await[0].child_count, 1);
    }

    #[tokio::test]
    async fn test_accept_answer_scenario() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;

        let question = top_level(&f, &alice, ItemType::Question, "Which db?", &[&bob]).await;
        let answer = child(&f, &bob, ItemType::Message, "SQLite", &question).await;
        assert_eq!(answer.is_accepted_answer, Some(false));

        let payload = f
            .services
            .accept_answer(&alice, AcceptAnswerInput { item_id: answer.id.to_string() })
            .await
            .unwrap();
        assert_eq!(payload.answer.is_accepted_answer, Some(true));
        assert_eq!(accepted_answer_text(&payload.question).as_deref(), Some("SQLite"));
        assert!(payload.question.action_expectation.as_ref().unwrap().fulfilled);
    }

    #[tokio::test]
    async fn test_single_accepted_answer() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;

        let question = top_level(&f, &alice, ItemType::Question, "Which db?", &[&bob]).await;
        let first = child(&f, &bob, ItemType::Message, "SQLite", &question).await;
        let second = child(&f, &bob, ItemType::Message, "Postgres", &question).await;

        for answer in [&first, &second] {
            f.services
                .accept_answer(&alice, AcceptAnswerInput { item_id: answer.id.to_string() })
                .await
                .unwrap();
        }

        let children = feed_under(&f, &alice, &question).await;
        let accepted: Vec<_> = children
            .iter()
            .filter(|c| c.is_accepted_answer == Some(true))
            .map(|c| c.id)
            .collect();
        assert_eq!(accepted, vec![second.id]);
    }

    #[tokio::test]
    async fn test_nest_accepted_answer_under_non_question() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;

        let question = top_level(&f, &alice, ItemType::Question, "Which db?", &[&bob]).await;
        let answer = child(&f, &bob, ItemType::Message, "SQLite", &question).await;
        let task = top_level(&f, &alice, ItemType::Task, "Migrate", &[&bob]).await;
        f.services
            .accept_answer(&alice, AcceptAnswerInput { item_id: answer.id.to_string() })
            .await
            .unwrap();

        let payload = f
            .services
            .nest_item(
                &alice,
                NestItemInput {
                    item_id: answer.id.to_string(),
                    new_parent_id: Some(task.id.to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(payload.item.is_accepted_answer, None);
        assert_eq!(payload.item.parent_id, Some(task.id));
        let old_parent = payload.old_parent.unwrap();
        assert_eq!(accepted_answer_text(&old_parent), None);
        assert!(!old_parent.action_expectation.unwrap().fulfilled);
        assert_eq!(payload.new_parent.unwrap().child_count, 1);
    }

    #[tokio::test]
    async fn test_nest_rejections() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;

        let root = top_level(&f, &alice, ItemType::Task, "root", &[&bob]).await;
        let leaf = child(&f, &alice, ItemType::Message, "leaf", &root).await;

        let nest = |item: &ItemView, parent: &ItemView| NestItemInput {
            item_id: item.id.to_string(),
            new_parent_id: Some(parent.id.to_string()),
        };
        let err = f.services.nest_item(&alice, nest(&root, &root)).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("Cannot nest item under itself"));

        let err = f.services.nest_item(&alice, nest(&root, &leaf)).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("Cannot nest item under its own descendant"));

        let to_top = f
            .services
            .nest_item(
                &alice,
                NestItemInput {
                    item_id: leaf.id.to_string(),
                    new_parent_id: Some(bob.global_id().to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(to_top.item.parent_id, None);
        assert!(to_top.new_parent.is_none());
    }

    #[tokio::test]
    async fn test_amend_mirrors_status_and_checks_variant() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let task = top_level(&f, &alice, ItemType::Task, "ship", &[&bob]).await;

        let amended = f
            .services
            .amend_item(
                &bob,
                ItemType::Task,
                AmendItemInput {
                    id: task.id.to_string(),
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(amended.variant, VariantView::Task { status: TaskStatus::Done });
        assert!(amended.action_expectation.unwrap().fulfilled);

        let err = f
            .services
            .amend_item(
                &alice,
                ItemType::Info,
                AmendItemInput {
                    id: task.id.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::invalid("Item is not a Info"));
    }

    #[tokio::test]
    async fn test_recipients_narrow_write_access() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let carol = user(&f, "Carol").await;

        let task = create(
            &f,
            &alice,
            ItemType::Task,
            CreateItemInput {
                text: "review".to_string(),
                share_with: shared(&[&carol]),
                to: shared(&[&bob]),
                ..Default::default()
            },
        )
        .await;

        let err = f
            .services
            .amend_item(
                &carol,
                ItemType::Task,
                AmendItemInput {
                    id: task.id.to_string(),
                    text: Some("hijack".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Unauthorized("Not allowed to modify item".to_string()));
    }

    #[tokio::test]
    async fn test_convert_question_clears_children_flags() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let question = top_level(&f, &alice, ItemType::Question, "Which db?", &[&bob]).await;
        child(&f, &bob, ItemType::Message, "SQLite", &question).await;

        let converted = f
            .services
            .convert_item(
                &alice,
                ConvertItemInput {
                    id: question.id.to_string(),
                    item_type: ItemType::Message,
                },
            )
            .await
            .unwrap();
        assert_eq!(converted.typename, ItemType::Message);
        assert!(converted.action_expectation.is_none());
        assert_eq!(feed_under(&f, &alice, &question).await[0].is_accepted_answer, None);
    }

    #[tokio::test]
    async fn test_constituent_add_remove_symmetry() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let goal = top_level(&f, &alice, ItemType::Goal, "launch", &[&alice]).await;
        let existing = top_level(&f, &alice, ItemType::Task, "design", &[&alice]).await;
        let extra = top_level(&f, &alice, ItemType::Task, "build", &[&alice]).await;

        let update = |added: &[&ItemView], removed: &[&ItemView]| UpdateGoalConstituentsInput {
            goal_id: goal.id.to_string(),
            constituents_added: added.iter().map(|i| i.id.to_string()).collect(),
            constituents_removed: removed.iter().map(|i| i.id.to_string()).collect(),
        };
        let before = f.services.update_goal_constituents(&alice, update(&[&existing], &[])).await.unwrap();
        let added = f.services.update_goal_constituents(&alice, update(&[&extra], &[])).await.unwrap();
        let after = f.services.update_goal_constituents(&alice, update(&[], &[&extra])).await.unwrap();

        let constituents = |v: &ItemView| match &v.variant {
            VariantView::Goal { constituents, .. } => constituents.clone(),
            other => panic!("not a goal: {:?}", other),
        };
        assert_eq!(constituents(&added).len(), 2);
        assert_eq!(constituents(&before), constituents(&after));

        let err = f
            .services
            .update_goal_constituents(&alice, update(&[&existing], &[]))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::conflict("Constituent(s) already added"));

        let err = f
            .services
            .update_goal_constituents(&alice, update(&[], &[&extra]))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("Constituent(s) not found"));
    }

    #[tokio::test]
    async fn test_goal_links_reject_non_goals_and_cycles() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let outer = top_level(&f, &alice, ItemType::Goal, "outer", &[&alice]).await;
        let inner = top_level(&f, &alice, ItemType::Goal, "inner", &[&alice]).await;
        let task = top_level(&f, &alice, ItemType::Task, "task", &[&alice]).await;

        let goals = |item: &ItemView, added: &ItemView| UpdateItemGoalsInput {
            item_id: item.id.to_string(),
            goals_added: vec![added.id.to_string()],
            goals_removed: Vec::new(),
        };
        let err = f.services.update_item_goals(&alice, goals(&inner, &task)).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("Non goal item(s) passed in goalsAdded"));

        let linked = f.services.update_item_goals(&alice, goals(&inner, &outer)).await.unwrap();
        assert_eq!(linked.goals, vec![outer.id]);

        let err = f.services.update_item_goals(&alice, goals(&outer, &inner)).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("Link would create a cycle"));

        let err = f
            .services
            .update_goal_constituents(
                &alice,
                UpdateGoalConstituentsInput {
                    goal_id: task.id.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::invalid("Item is not a Goal"));
    }

    #[tokio::test]
    async fn test_unreadable_blocker_is_not_found() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let item = top_level(&f, &alice, ItemType::Task, "mine", &[&alice]).await;
        let hidden = top_level(&f, &bob, ItemType::Task, "bob's", &[&bob]).await;

        let err = f
            .services
            .update_items_blocked(
                &alice,
                UpdateItemsBlockedInput {
                    item_id: item.id.to_string(),
                    blocked_by_added: vec![hidden.id.to_string()],
                    blocked_by_removed: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("Blocking item(s) not found"));
    }

    #[tokio::test]
    async fn test_invite_flow() {
        let f = setup();
        let owner = user(&f, "Owner").await;
        let client_id = f.services.my_profile(&owner).await.unwrap().clients[0].client.id.to_string();

        let invite = |email: &str| InviteToClientInput {
            email: email.to_string(),
            client_id: client_id.clone(),
        };
        let first = f.services.invite_to_client(&owner, invite("newbie@example.com")).await.unwrap();
        let second = f.services.invite_to_client(&owner, invite("newbie@example.com")).await.unwrap();
        assert_eq!(first, second);

        let newbie = user(&f, "Newbie").await;
        let profile = f.services.my_profile(&newbie).await.unwrap();
        assert_eq!(profile.invites.len(), 1);

        let err = f
            .services
            .invite_to_client(&newbie, invite("someone@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        let membership = f
            .services
            .accept_client_invite(&newbie, AcceptClientInviteInput { invite_id: first.id.to_string() })
            .await
            .unwrap();
        assert_eq!(membership.role, crate::domain::Role::Member);
        assert!(f.services.my_profile(&newbie).await.unwrap().invites.is_empty());

        let err = f
            .services
            .invite_to_client(&owner, invite("newbie@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::conflict("User is already in the client"));

        let err = f
            .services
            .decline_client_invite(&newbie, DeclineClientInviteInput { invite_id: first.id.to_string() })
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("Invite not found"));
    }

    #[tokio::test]
    async fn test_file_extension_and_access_grants() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;

        let file = f
            .services
            .create_file(
                &alice,
                CreateFileInput {
                    original_name: "report.pdf".to_string(),
                    content_type: None,
                    size: 2048,
                },
            )
            .await
            .unwrap();
        assert!(file.filename.ends_with(".pdf"));
        assert_eq!(file.content_type, "application/pdf");

        create(
            &f,
            &alice,
            ItemType::Info,
            CreateItemInput {
                text: "see attached".to_string(),
                share_with: shared(&[&bob]),
                attachments: vec![file.id.to_string()],
                ..Default::default()
            },
        )
        .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        let calls = f.recorder.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![AccessChange::Grant {
                users: vec![alice.email.clone(), bob.email.clone()],
                filenames: vec![file.filename.clone()],
            }]
        );
    }

    #[tokio::test]
    async fn test_foreign_file_is_not_found() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let file = f
            .services
            .create_file(
                &bob,
                CreateFileInput {
                    original_name: "secret.txt".to_string(),
                    content_type: None,
                    size: 1,
                },
            )
            .await
            .unwrap();

        let err = f
            .services
            .create_item(
                &alice,
                ItemType::Message,
                CreateItemInput {
                    share_with: shared(&[&bob]),
                    attachments: vec![file.id.to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("File(s) not found"));
    }

    #[tokio::test]
    async fn test_feed_activity_bump() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let activity = f
            .services
            .update_feed_activity(&alice, UpdateFeedActivityInput::default())
            .await
            .unwrap();
        assert!(activity.parent_id.is_none());
    }

    async fn upload(f: &Fixture, owner: &User, name: &str) -> FileView {
        f.services
            .create_file(
                owner,
                CreateFileInput {
                    original_name: name.to_string(),
                    content_type: None,
                    size: 10,
                },
            )
            .await
            .expect("Failed to create file")
    }

    async fn drain(f: &Fixture) -> Vec<AccessChange> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        std::mem::take(&mut *f.recorder.calls.lock().unwrap())
    }

    #[tokio::test]
    async fn test_amend_diffs_file_access() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let carol = user(&f, "Carol").await;
        let keep = upload(&f, &alice, "keep.pdf").await;
        let dropped = upload(&f, &alice, "drop.txt").await;
        let added = upload(&f, &alice, "new.png").await;

        let info = create(
            &f,
            &alice,
            ItemType::Info,
            CreateItemInput {
                text: "specs".to_string(),
                share_with: shared(&[&bob]),
                attachments: vec![keep.id.to_string(), dropped.id.to_string()],
                ..Default::default()
            },
        )
        .await;
        drain(&f).await;

        let amended = f
            .services
            .amend_item(
                &alice,
                ItemType::Info,
                AmendItemInput {
                    id: info.id.to_string(),
                    shared_with: shared(&[&carol]),
                    attachments: Some(vec![keep.id.to_string(), added.id.to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(amended.attachments.len(), 2);

        assert_eq!(
            drain(&f).await,
            vec![
                AccessChange::Grant {
                    users: vec![carol.email.clone()],
                    filenames: vec![keep.filename.clone()],
                },
                AccessChange::Revoke {
                    users: vec![bob.email.clone()],
                    filenames: vec![keep.filename.clone()],
                },
                AccessChange::Grant {
                    users: vec![alice.email.clone(), carol.email.clone()],
                    filenames: vec![added.filename.clone()],
                },
                AccessChange::RevokeAll {
                    filenames: vec![dropped.filename.clone()],
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_amend_without_sharing_changes_issues_nothing() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let file = upload(&f, &alice, "notes.md").await;
        let message = create(
            &f,
            &alice,
            ItemType::Message,
            CreateItemInput {
                text: "draft".to_string(),
                share_with: shared(&[&bob]),
                attachments: vec![file.id.to_string()],
                ..Default::default()
            },
        )
        .await;
        drain(&f).await;

        f.services
            .amend_item(
                &alice,
                ItemType::Message,
                AmendItemInput {
                    id: message.id.to_string(),
                    text: Some("final".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(drain(&f).await.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_and_delete_summary() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let carol = user(&f, "Carol").await;
        let task = top_level(&f, &alice, ItemType::Task, "long thread", &[&bob]).await;

        let summarize = |text: &str| SummarizeItemInput {
            id: task.id.to_string(),
            text: text.to_string(),
            rich_text: None,
            should_replace_original_item: true,
        };
        let summarized = f.services.summarize_item(&bob, summarize("tl;dr")).await.unwrap();
        let summary = summarized.summary.unwrap();
        assert_eq!(summary.text, "tl;dr");
        assert!(summary.should_replace_original_item);

        let err = f.services.summarize_item(&carol, summarize("hijack")).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("Item not found"));

        let delete = || DeleteItemSummaryInput { id: task.id.to_string() };
        let result = f.services.delete_item_summary(&alice, delete()).await.unwrap();
        assert!(result.success);

        let err = f.services.delete_item_summary(&alice, delete()).await.unwrap_err();
        assert_eq!(err, DomainError::not_found("Summary not found"));

        let feed = f.services.items(&alice, ItemsInput::default()).await.unwrap();
        assert!(feed[0].summary.is_none());
    }

    #[tokio::test]
    async fn test_convert_to_question_marks_children_unaccepted() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let bob = user(&f, "Bob").await;
        let task = top_level(&f, &alice, ItemType::Task, "pick a db", &[&bob]).await;
        let reply = child(&f, &bob, ItemType::Message, "SQLite", &task).await;
        assert_eq!(reply.is_accepted_answer, None);

        let convert = |item_type: ItemType| ConvertItemInput {
            id: task.id.to_string(),
            item_type,
        };
        let converted = f.services.convert_item(&alice, convert(ItemType::Question)).await.unwrap();
        assert_eq!(converted.typename, ItemType::Question);
        assert!(converted.action_expectation.is_some());
        assert_eq!(feed_under(&f, &alice, &task).await[0].is_accepted_answer, Some(false));

        f.services
            .accept_answer(&alice, AcceptAnswerInput { item_id: reply.id.to_string() })
            .await
            .unwrap();
        let unchanged = f.services.convert_item(&alice, convert(ItemType::Question)).await.unwrap();
        assert_eq!(accepted_answer_text(&unchanged).as_deref(), Some("SQLite"));
        assert_eq!(feed_under(&f, &alice, &task).await[0].is_accepted_answer, Some(true));
    }

    #[tokio::test]
    async fn test_blocked_by_conflicts_and_cycles() {
        let f = setup();
        let alice = user(&f, "Alice").await;
        let first = top_level(&f, &alice, ItemType::Task, "schema", &[&alice]).await;
        let second = top_level(&f, &alice, ItemType::Task, "api", &[&alice]).await;

        let block = |item: &ItemView, blocker: &ItemView| UpdateItemsBlockedInput {
            item_id: item.id.to_string(),
            blocked_by_added: vec![blocker.id.to_string()],
            blocked_by_removed: Vec::new(),
        };
        let blocked = f.services.update_items_blocked(&alice, block(&second, &first)).await.unwrap();
        assert_eq!(blocked.blocked_by, vec![first.id]);

        let err = f.services.update_items_blocked(&alice, block(&second, &first)).await.unwrap_err();
        assert_eq!(err, DomainError::conflict("Blocking item(s) already added"));

        let err = f.services.update_items_blocked(&alice, block(&first, &second)).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("Link would create a cycle"));

        let err = f.services.update_items_blocked(&alice, block(&first, &first)).await.unwrap_err();
        assert_eq!(err, DomainError::invalid("Item cannot be linked to itself"));

        let feed = f.services.items(&alice, ItemsInput::default()).await.unwrap();
        let schema = feed.iter().find(|i| i.id == first.id).unwrap();
        assert_eq!(schema.blocks, vec![second.id]);
    }

    #[tokio::test]
    async fn test_invite_emails_ignore_case() {
        let f = setup();
        let owner = user(&f, "Owner").await;
        let client_id = f.services.my_profile(&owner).await.unwrap().clients[0].client.id.to_string();
        let invite = |email: &str| InviteToClientInput {
            email: email.to_string(),
            client_id: client_id.clone(),
        };

        let first = f.services.invite_to_client(&owner, invite("Bob@Example.com")).await.unwrap();
        let second = f.services.invite_to_client(&owner, invite("bob@example.com")).await.unwrap();
        assert_eq!(first.id, second.id);

        let bob = user(&f, "Bob").await;
        let profile = f.services.my_profile(&bob).await.unwrap();
        assert_eq!(profile.invites.len(), 1);

        f.services
            .accept_client_invite(&bob, AcceptClientInviteInput { invite_id: first.id.to_string() })
            .await
            .unwrap();
        let err = f
            .services
            .invite_to_client(&owner, invite("BOB@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::conflict("User is already in the client"));
    }
}
