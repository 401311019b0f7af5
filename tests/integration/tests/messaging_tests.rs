//! Messaging service behaviour over the in-memory store
//!
//! Run with: cargo test -p integration-tests --test messaging_tests

use std::sync::Arc;

use chrono::Utc;
use dm_core::entities::Message;
use dm_core::traits::{ConversationRepository, MessageQuery, MessageRepository};
use dm_core::{Conversation, DomainError, ParticipantsKey, RealtimeEventKind, Snowflake};
use dm_service::{MessagingService, ServiceError};
use integration_tests::{FailingNotifier, TestWorld, ALICE, BOB, CAROL, GHOST};

fn domain(err: ServiceError) -> DomainError {
    match err {
        ServiceError::Domain(e) => e,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

// ============================================================================
// Uniqueness
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_messages_share_one_conversation() {
    let world = TestWorld::new();
    let context = Arc::new(world.context.clone());

    let mut tasks = Vec::new();
    for i in 0..16 {
        let context = context.clone();
        // Half the senders are Alice, half Bob, so both key orders race
        let (from, to) = if i % 2 == 0 { (ALICE, BOB) } else { (BOB, ALICE) };
        tasks.push(tokio::spawn(async move {
            MessagingService::new(&context)
                .send_message(from, to, format!("hello #{i}"))
                .await
        }));
    }

    let mut conversation_ids = Vec::new();
    for task in tasks {
        let sent = task.await.unwrap().unwrap();
        conversation_ids.push(sent.conversation.id);
    }

    assert_eq!(world.store.conversation_count(), 1);
    conversation_ids.dedup();
    assert_eq!(conversation_ids.len(), 1);

    let conversation = world.store.conversation_for(ALICE, BOB).unwrap();
    assert_eq!(conversation.participants_key.to_string(), "1001_1002");
    assert_eq!(world.store.messages_in(conversation.id).len(), 16);
}

#[tokio::test]
async fn test_lost_creation_race_reuses_existing_conversation() {
    let world = TestWorld::new();
    let first = world
        .messaging()
        .send_message(ALICE, BOB, "first".to_string())
        .await
        .unwrap();

    // The next lookup misses, so the service tries to create and conflicts
    world.store.miss_next_lookups(1);
    let second = world
        .messaging()
        .send_message(BOB, ALICE, "second".to_string())
        .await
        .unwrap();

    assert_eq!(first.conversation.id, second.conversation.id);
    assert_eq!(world.store.conversation_count(), 1);
}

#[tokio::test]
async fn test_store_rejects_duplicate_participants_key() {
    let world = TestWorld::new();
    let a = Conversation::new(Snowflake::new(1), ALICE, BOB).unwrap();
    let b = Conversation::new(Snowflake::new(2), BOB, ALICE).unwrap();

    world.store.create(&a).await.unwrap();
    let err = world.store.create(&b).await.unwrap_err();
    assert!(err.is_conflict());
}

// ============================================================================
// Ordering
// ============================================================================

#[tokio::test]
async fn test_identical_timestamps_keep_insertion_order() {
    let world = TestWorld::new();
    let conversation = Conversation::new(Snowflake::new(500), ALICE, BOB).unwrap();
    world.store.create(&conversation).await.unwrap();

    let at = Utc::now();
    // Ids deliberately out of order so only insertion order can explain the result
    for (id, text) in [(30, "one"), (10, "two"), (20, "three")] {
        let mut message = Message::new(
            Snowflake::new(id),
            conversation.id,
            ALICE,
            BOB,
            text.to_string(),
        );
        message.sent_at = at;
        world.store.append(&message).await.unwrap();
    }

    let page = world
        .store
        .list(conversation.id, MessageQuery::default())
        .await
        .unwrap();
    let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "two", "three"]);
}

#[tokio::test]
async fn test_pages_read_oldest_to_newest() {
    let world = TestWorld::new();
    let mut ids = Vec::new();
    for i in 0..7 {
        let sent = world
            .messaging()
            .send_message(ALICE, BOB, format!("m{i}"))
            .await
            .unwrap();
        ids.push(sent.message.id.parse::<Snowflake>().unwrap());
    }
    let conversation = world.store.conversation_for(ALICE, BOB).unwrap();

    let latest = world
        .messaging()
        .get_conversation_messages(ALICE, conversation.id, MessageQuery::latest(3))
        .await
        .unwrap();
    let contents: Vec<&str> = latest.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m4", "m5", "m6"]);

    let older = world
        .messaging()
        .get_conversation_messages(
            ALICE,
            conversation.id,
            MessageQuery {
                before: Some(ids[4]),
                after: None,
                limit: 3,
            },
        )
        .await
        .unwrap();
    let contents: Vec<&str> = older.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m1", "m2", "m3"]);

    let newer = world
        .messaging()
        .get_conversation_messages(
            ALICE,
            conversation.id,
            MessageQuery {
                before: None,
                after: Some(ids[1]),
                limit: 2,
            },
        )
        .await
        .unwrap();
    let contents: Vec<&str> = newer.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m2", "m3"]);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_self_messaging_is_rejected() {
    let world = TestWorld::new();
    for user in [ALICE, BOB, CAROL, GHOST] {
        let err = world
            .messaging()
            .send_message(user, user, "hi".to_string())
            .await
            .unwrap_err();
        assert!(matches!(domain(err), DomainError::SelfConversation));
    }
    assert_eq!(world.store.conversation_count(), 0);
}

#[tokio::test]
async fn test_content_bounds() {
    let world = TestWorld::new();
    let service = world.messaging();

    let err = service.send_message(ALICE, BOB, String::new()).await.unwrap_err();
    assert!(domain(err).is_validation());

    let err = service
        .send_message(ALICE, BOB, " \n\t ".to_string())
        .await
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::EmptyContent));

    service
        .send_message(ALICE, BOB, "a".repeat(1000))
        .await
        .unwrap();
    service
        .send_message(ALICE, BOB, "é".repeat(1000))
        .await
        .unwrap();

    let err = service
        .send_message(ALICE, BOB, "a".repeat(1001))
        .await
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::ContentTooLong { .. }));
}

#[tokio::test]
async fn test_unknown_recipient_is_not_found() {
    let world = TestWorld::new();
    let err = world
        .messaging()
        .send_message(ALICE, GHOST, "anyone there?".to_string())
        .await
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::UserNotFound(id) if id == GHOST));
    assert_eq!(world.store.conversation_count(), 0);
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_viewing_twice_is_idempotent() {
    let world = TestWorld::new();
    for text in ["a", "b", "c"] {
        world
            .messaging()
            .send_message(ALICE, BOB, text.to_string())
            .await
            .unwrap();
    }
    let conversation = world.store.conversation_for(ALICE, BOB).unwrap();

    let first = world
        .messaging()
        .get_conversation_messages(BOB, conversation.id, MessageQuery::default())
        .await
        .unwrap();
    assert!(first.messages.iter().all(|m| m.read));
    let after_first = world.store.messages_in(conversation.id);

    let second = world
        .messaging()
        .get_conversation_messages(BOB, conversation.id, MessageQuery::default())
        .await
        .unwrap();
    assert!(second.messages.iter().all(|m| m.read));
    assert_eq!(world.store.messages_in(conversation.id), after_first);

    let explicit = world
        .messaging()
        .mark_conversation_read(BOB, conversation.id)
        .await
        .unwrap();
    assert_eq!(explicit.updated, 0);
}

#[tokio::test]
async fn test_sender_viewing_leaves_recipient_unread() {
    let world = TestWorld::new();
    world
        .messaging()
        .send_message(ALICE, BOB, "ping".to_string())
        .await
        .unwrap();
    let conversation = world.store.conversation_for(ALICE, BOB).unwrap();

    world
        .messaging()
        .get_conversation_messages(ALICE, conversation.id, MessageQuery::default())
        .await
        .unwrap();

    assert!(world.store.messages_in(conversation.id).iter().all(|m| !m.read));
    assert_eq!(world.messaging().unread_count(BOB).await.unwrap().unread_count, 1);
}

#[tokio::test]
async fn test_read_action_notifies_other_participant() {
    let world = TestWorld::new();
    world
        .messaging()
        .send_message(ALICE, BOB, "one".to_string())
        .await
        .unwrap();
    world
        .messaging()
        .send_message(ALICE, BOB, "two".to_string())
        .await
        .unwrap();
    let conversation = world.store.conversation_for(ALICE, BOB).unwrap();
    world.notifier.clear();

    let marked = world
        .messaging()
        .mark_conversation_read(BOB, conversation.id)
        .await
        .unwrap();
    assert_eq!(marked.updated, 2);

    let events = world.notifier.events_for(ALICE);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, RealtimeEventKind::ConversationRead);
    assert_eq!(events[0].data["readerId"], BOB.to_string());
    assert_eq!(events[0].data["count"], 2);

    // Nothing flipped, nothing pushed
    world.notifier.clear();
    world
        .messaging()
        .mark_conversation_read(BOB, conversation.id)
        .await
        .unwrap();
    assert!(world.notifier.events_for(ALICE).is_empty());
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_outsider_cannot_read_or_mark() {
    let world = TestWorld::new();
    for text in ["private", "very private"] {
        world
            .messaging()
            .send_message(ALICE, BOB, text.to_string())
            .await
            .unwrap();
    }
    let conversation = world.store.conversation_for(ALICE, BOB).unwrap();

    let err = world
        .messaging()
        .get_conversation_messages(CAROL, conversation.id, MessageQuery::default())
        .await
        .unwrap_err();
    assert!(domain(err).is_authorization());

    let err = world
        .messaging()
        .mark_conversation_read(CAROL, conversation.id)
        .await
        .unwrap_err();
    assert!(domain(err).is_authorization());

    // Nothing was flipped by the failed attempts
    assert!(world.store.messages_in(conversation.id).iter().all(|m| !m.read));
}

#[tokio::test]
async fn test_unknown_conversation_is_not_found() {
    let world = TestWorld::new();
    let err = world
        .messaging()
        .get_conversation_messages(ALICE, Snowflake::new(424_242), MessageQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(domain(err), DomainError::ConversationNotFound(_)));
}

// ============================================================================
// Pair addressing
// ============================================================================

#[tokio::test]
async fn test_messages_with_user_before_first_contact_is_empty() {
    let world = TestWorld::new();
    let page = world
        .messaging()
        .get_messages_with_user(ALICE, CAROL, MessageQuery::default())
        .await
        .unwrap();

    assert!(page.conversation_id.is_none());
    assert!(page.messages.is_empty());
    assert_eq!(world.store.conversation_count(), 0);
}

#[tokio::test]
async fn test_messages_with_user_resolves_the_pair() {
    let world = TestWorld::new();
    let sent = world
        .messaging()
        .send_message(BOB, ALICE, "interview friday?".to_string())
        .await
        .unwrap();

    let page = world
        .messaging()
        .get_messages_with_user(ALICE, BOB, MessageQuery::default())
        .await
        .unwrap();
    assert_eq!(page.conversation_id.as_deref(), Some(sent.conversation.id.as_str()));
    assert_eq!(page.messages.len(), 1);
    assert!(page.messages[0].read);

    let err = world
        .messaging()
        .get_messages_with_user(ALICE, GHOST, MessageQuery::default())
        .await
        .unwrap_err();
    assert!(domain(err).is_not_found());

    let err = world
        .messaging()
        .get_messages_with_user(ALICE, ALICE, MessageQuery::default())
        .await
        .unwrap_err();
    assert!(domain(err).is_validation());
}

// ============================================================================
// Inbox
// ============================================================================

#[tokio::test]
async fn test_inbox_orders_by_latest_message() {
    let world = TestWorld::new();
    world
        .messaging()
        .send_message(BOB, ALICE, "from bob".to_string())
        .await
        .unwrap();
    world
        .messaging()
        .send_message(CAROL, ALICE, "from carol".to_string())
        .await
        .unwrap();
    world
        .messaging()
        .send_message(CAROL, ALICE, "carol again".to_string())
        .await
        .unwrap();

    let inbox = world.messaging().list_conversations(ALICE).await.unwrap();
    assert_eq!(inbox.len(), 2);

    assert_eq!(inbox[0].other_user.id, CAROL.to_string());
    assert_eq!(inbox[0].unread_count, 2);
    assert_eq!(
        inbox[0].last_message.as_ref().map(|m| m.content.as_str()),
        Some("carol again")
    );
    assert!(!inbox[0].is_from_current_user);

    assert_eq!(inbox[1].other_user.id, BOB.to_string());
    assert_eq!(inbox[1].other_user.name, "Bob Recruiter");
    assert_eq!(inbox[1].unread_count, 1);

    let bob_inbox = world.messaging().list_conversations(BOB).await.unwrap();
    assert_eq!(bob_inbox.len(), 1);
    assert!(bob_inbox[0].is_from_current_user);
    assert_eq!(bob_inbox[0].unread_count, 0);
    assert_eq!(bob_inbox[0].other_user.profile_pic.as_deref(), Some("alice.png"));
}

#[tokio::test]
async fn test_inbox_falls_back_for_departed_user() {
    let world = TestWorld::new();
    world
        .messaging()
        .send_message(CAROL, ALICE, "bye".to_string())
        .await
        .unwrap();
    world.users.remove(CAROL);

    let inbox = world.messaging().list_conversations(ALICE).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].other_user.id, CAROL.to_string());
    assert_eq!(inbox[0].other_user.name, "Unknown user");
    assert!(inbox[0].other_user.role.is_none());
}

#[tokio::test]
async fn test_unread_count_spans_conversations() {
    let world = TestWorld::new();
    world
        .messaging()
        .send_message(BOB, ALICE, "one".to_string())
        .await
        .unwrap();
    world
        .messaging()
        .send_message(CAROL, ALICE, "two".to_string())
        .await
        .unwrap();
    world
        .messaging()
        .send_message(ALICE, CAROL, "reply".to_string())
        .await
        .unwrap();

    assert_eq!(world.messaging().unread_count(ALICE).await.unwrap().unread_count, 2);
    assert_eq!(world.messaging().unread_count(CAROL).await.unwrap().unread_count, 1);
    assert_eq!(world.messaging().unread_count(BOB).await.unwrap().unread_count, 0);
}

// ============================================================================
// Push decoupling
// ============================================================================

#[tokio::test]
async fn test_send_pushes_new_and_sent_events() {
    let world = TestWorld::new();
    let sent = world
        .messaging()
        .send_message(ALICE, BOB, "hello".to_string())
        .await
        .unwrap();

    assert_eq!(world.notifier.kinds_for(BOB), [RealtimeEventKind::MessageNew]);
    assert_eq!(world.notifier.kinds_for(ALICE), [RealtimeEventKind::MessageSent]);

    let event = &world.notifier.events_for(BOB)[0];
    assert_eq!(event.data["conversationId"], sent.conversation.id);
    assert_eq!(event.data["message"]["content"], "hello");
    assert_eq!(event.data["message"]["senderId"], ALICE.to_string());
}

#[tokio::test]
async fn test_push_failure_does_not_fail_send() {
    let world = TestWorld::with_notifier(Arc::new(FailingNotifier));
    let sent = world
        .messaging()
        .send_message(ALICE, BOB, "still stored".to_string())
        .await
        .unwrap();

    let conversation_id: Snowflake = sent.conversation.id.parse().unwrap();
    let stored = world.store.messages_in(conversation_id);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content, "still stored");
}

#[tokio::test]
async fn test_store_failure_aborts_send_without_pushing() {
    let world = TestWorld::new();
    world.store.fail_appends(true);

    let err = world
        .messaging()
        .send_message(ALICE, BOB, "lost".to_string())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(world.notifier.events_for(BOB).is_empty());
    assert!(world.notifier.events_for(ALICE).is_empty());
}

// ============================================================================
// Scenario
// ============================================================================

#[tokio::test]
async fn test_first_contact_scenario() {
    let world = TestWorld::new();

    let hello = world
        .messaging()
        .send_message(ALICE, BOB, "hello".to_string())
        .await
        .unwrap();
    assert_eq!(world.store.conversation_count(), 1);
    assert_eq!(world.notifier.kinds_for(BOB), [RealtimeEventKind::MessageNew]);
    assert_eq!(world.notifier.kinds_for(ALICE), [RealtimeEventKind::MessageSent]);

    let how = world
        .messaging()
        .send_message(ALICE, BOB, "how are you".to_string())
        .await
        .unwrap();
    assert_eq!(hello.conversation.id, how.conversation.id);
    assert_eq!(
        hello.conversation.participants_key,
        how.conversation.participants_key
    );
    assert_eq!(
        how.conversation.participants_key,
        ParticipantsKey::new(ALICE, BOB).unwrap().to_string()
    );

    let conversation_id: Snowflake = how.conversation.id.parse().unwrap();
    let page = world
        .messaging()
        .get_conversation_messages(BOB, conversation_id, MessageQuery::default())
        .await
        .unwrap();
    let contents: Vec<&str> = page.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["hello", "how are you"]);
    assert!(page.messages.iter().all(|m| m.read));

    let bob_inbox = world.messaging().list_conversations(BOB).await.unwrap();
    assert_eq!(bob_inbox[0].unread_count, 0);

    let err = world
        .messaging()
        .get_conversation_messages(CAROL, conversation_id, MessageQuery::default())
        .await
        .unwrap_err();
    assert!(domain(err).is_authorization());
}
