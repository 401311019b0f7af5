//! In-memory fakes and seeded test data
//!
//! The fakes keep the same rules the PostgreSQL store enforces: one
//! conversation per participants key, pages ordered by
//! `(sent_at, insertion sequence)`, and read flags that only the recipient
//! can flip.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dm_cache::PubSubEvent;
use dm_common::JwtService;
use dm_core::entities::{validate_content, Conversation, ConversationPreview, Message, UserProfile};
use dm_core::traits::{
    ConversationRepository, MessageQuery, MessageRepository, RepoResult, UserDirectory,
};
use dm_core::{
    DomainError, ParticipantsKey, RealtimeEventKind, Snowflake, SnowflakeGenerator, UserRole,
};
use dm_service::{MessagingService, Notifier, NotifyError, ServiceContext, ServiceContextBuilder};
use parking_lot::{Mutex, RwLock};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-that-is-long-enough";

/// A job seeker
pub const ALICE: Snowflake = Snowflake::new(1001);
/// A recruiter
pub const BOB: Snowflake = Snowflake::new(1002);
/// Another seeker, never part of Alice and Bob's thread
pub const CAROL: Snowflake = Snowflake::new(1003);
/// An id the directory does not know
pub const GHOST: Snowflake = Snowflake::new(9999);

// ============================================================================
// Conversation store
// ============================================================================

#[derive(Default)]
struct StoreState {
    conversations: HashMap<Snowflake, Conversation>,
    by_key: HashMap<ParticipantsKey, Snowflake>,
    /// Append order doubles as the insertion sequence
    messages: Vec<Message>,
}

impl StoreState {
    fn position(&self, id: Snowflake) -> Option<usize> {
        self.messages.iter().position(|m| m.id == id)
    }

    /// Ordered `(sent_at, seq)` positions of one conversation's messages
    fn ordered(&self, conversation_id: Snowflake) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.conversation_id == conversation_id)
            .map(|(seq, _)| seq)
            .collect();
        positions.sort_by_key(|&seq| (self.messages[seq].sent_at, seq));
        positions
    }

    fn sort_key(&self, seq: usize) -> (chrono::DateTime<chrono::Utc>, usize) {
        (self.messages[seq].sent_at, seq)
    }
}

/// Conversation and message store held in memory
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
    stale_lookups: AtomicUsize,
    fail_appends: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `n` participant lookups miss, as if another request
    /// created the row right after this one looked
    pub fn miss_next_lookups(&self, n: usize) {
        self.stale_lookups.store(n, Ordering::SeqCst);
    }

    /// Make every append fail like an unreachable database
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn conversation_count(&self) -> usize {
        self.state.read().conversations.len()
    }

    pub fn conversation_for(&self, a: Snowflake, b: Snowflake) -> Option<Conversation> {
        let key = ParticipantsKey::new(a, b).ok()?;
        let state = self.state.read();
        state
            .by_key
            .get(&key)
            .and_then(|id| state.conversations.get(id))
            .cloned()
    }

    /// Every stored message of a conversation, in store order
    pub fn messages_in(&self, conversation_id: Snowflake) -> Vec<Message> {
        let state = self.state.read();
        state
            .ordered(conversation_id)
            .into_iter()
            .map(|seq| state.messages[seq].clone())
            .collect()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>> {
        Ok(self.state.read().conversations.get(&id).cloned())
    }

    async fn find_by_participants(
        &self,
        key: &ParticipantsKey,
    ) -> RepoResult<Option<Conversation>> {
        let stale = self
            .stale_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(None);
        }

        // Give concurrent senders a chance to interleave between find and create
        tokio::task::yield_now().await;

        let state = self.state.read();
        Ok(state
            .by_key
            .get(key)
            .and_then(|id| state.conversations.get(id))
            .cloned())
    }

    async fn create(&self, conversation: &Conversation) -> RepoResult<()> {
        let mut state = self.state.write();
        if state.by_key.contains_key(&conversation.participants_key) {
            return Err(DomainError::ConversationExists(
                conversation.participants_key.to_string(),
            ));
        }
        state
            .by_key
            .insert(conversation.participants_key.clone(), conversation.id);
        state.conversations.insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn update_last_message(
        &self,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> RepoResult<()> {
        let mut state = self.state.write();
        let sent_at = state
            .position(message_id)
            .map(|seq| state.messages[seq].sent_at)
            .ok_or(DomainError::MessageNotFound(message_id))?;
        let conversation = state
            .conversations
            .get_mut(&conversation_id)
            .ok_or(DomainError::ConversationNotFound(conversation_id))?;

        if conversation.updated_at <= sent_at {
            conversation.last_message_id = Some(message_id);
            conversation.updated_at = sent_at;
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationPreview>> {
        let state = self.state.read();

        type Ranked = (Option<(chrono::DateTime<chrono::Utc>, usize)>, ConversationPreview);
        let mut previews: Vec<Ranked> = state
            .conversations
            .values()
            .filter(|c| c.has_participant(user_id))
            .map(|conversation| {
                let last = state.ordered(conversation.id).last().copied();
                let unread_count = state
                    .messages
                    .iter()
                    .filter(|m| {
                        m.conversation_id == conversation.id
                            && m.recipient_id == user_id
                            && !m.read
                    })
                    .count() as i64;
                (
                    last.map(|seq| state.sort_key(seq)),
                    ConversationPreview {
                        conversation: conversation.clone(),
                        last_message: last.map(|seq| state.messages[seq].clone()),
                        unread_count,
                    },
                )
            })
            .collect();

        // Newest message first; conversations without one go last
        previews.sort_by(|(a_key, a), (b_key, b)| {
            b_key
                .is_some()
                .cmp(&a_key.is_some())
                .then_with(|| b_key.cmp(a_key))
                .then_with(|| b.conversation.updated_at.cmp(&a.conversation.updated_at))
                .then_with(|| b.conversation.id.cmp(&a.conversation.id))
        });

        Ok(previews.into_iter().map(|(_, p)| p).collect())
    }
}

#[async_trait]
impl MessageRepository for InMemoryStore {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        let state = self.state.read();
        Ok(state.position(id).map(|seq| state.messages[seq].clone()))
    }

    async fn append(&self, message: &Message) -> RepoResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("connection refused".to_string()));
        }
        validate_content(&message.content)?;

        let mut state = self.state.write();
        if !state.conversations.contains_key(&message.conversation_id) {
            return Err(DomainError::ConversationNotFound(message.conversation_id));
        }
        state.messages.push(message.clone());
        Ok(())
    }

    async fn list(
        &self,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>> {
        let state = self.state.read();
        let limit = usize::try_from(query.effective_limit()).unwrap_or(0);
        let ordered = state.ordered(conversation_id);

        let cursor = |id: Snowflake| {
            ordered
                .iter()
                .find(|&&seq| state.messages[seq].id == id)
                .map(|&seq| state.sort_key(seq))
        };

        let after = match query.after {
            Some(id) => match cursor(id) {
                Some(key) => Some(key),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let before = match query.before {
            Some(id) => match cursor(id) {
                Some(key) => Some(key),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let window: Vec<usize> = ordered
            .into_iter()
            .filter(|&seq| after.map_or(true, |key| state.sort_key(seq) > key))
            .filter(|&seq| before.map_or(true, |key| state.sort_key(seq) < key))
            .collect();

        let page: Vec<usize> = if query.after.is_some() {
            window.into_iter().take(limit).collect()
        } else {
            let skip = window.len().saturating_sub(limit);
            window.into_iter().skip(skip).collect()
        };

        Ok(page.into_iter().map(|seq| state.messages[seq].clone()).collect())
    }

    async fn mark_read(&self, conversation_id: Snowflake, reader_id: Snowflake) -> RepoResult<u64> {
        let mut state = self.state.write();
        let mut flipped = 0;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id && m.recipient_id == reader_id)
        {
            if message.mark_read() {
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn count_unread_for_user(&self, user_id: Snowflake) -> RepoResult<i64> {
        Ok(self
            .state
            .read()
            .messages
            .iter()
            .filter(|m| m.recipient_id == user_id && !m.read)
            .count() as i64)
    }
}

// ============================================================================
// User directory
// ============================================================================

/// Users known to the identity provider
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<Snowflake, UserProfile>>,
}

impl InMemoryUserDirectory {
    /// Directory holding Alice, Bob and Carol
    pub fn seeded() -> Arc<Self> {
        let directory = Self::default();
        directory.add(
            UserProfile::new(ALICE, "Alice Seeker", UserRole::Seeker).with_avatar("alice.png"),
        );
        directory.add(UserProfile::new(BOB, "Bob Recruiter", UserRole::Recruiter));
        directory.add(UserProfile::new(CAROL, "Carol Seeker", UserRole::Seeker));
        Arc::new(directory)
    }

    pub fn add(&self, user: UserProfile) {
        self.users.write().insert(user.id, user);
    }

    pub fn remove(&self, id: Snowflake) {
        self.users.write().remove(&id);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: Snowflake) -> RepoResult<Option<UserProfile>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_users(&self, ids: &[Snowflake]) -> RepoResult<Vec<UserProfile>> {
        let users = self.users.read();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

// ============================================================================
// Notifiers
// ============================================================================

/// Keeps every pushed event for later inspection
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(Snowflake, PubSubEvent)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events_for(&self, user_id: Snowflake) -> Vec<PubSubEvent> {
        self.events
            .lock()
            .iter()
            .filter(|(to, _)| *to == user_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn kinds_for(&self, user_id: Snowflake) -> Vec<RealtimeEventKind> {
        self.events_for(user_id)
            .into_iter()
            .map(|event| event.event_type)
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, user_id: Snowflake, event: &PubSubEvent) -> Result<(), NotifyError> {
        self.events.lock().push((user_id, event.clone()));
        Ok(())
    }
}

/// Fails every push, like a Redis outage
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, user_id: Snowflake, _event: &PubSubEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Undeliverable(format!("user {user_id} unreachable")))
    }
}

// ============================================================================
// Test world
// ============================================================================

/// Service context wired to in-memory fakes
pub struct TestWorld {
    pub store: Arc<InMemoryStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub jwt: Arc<JwtService>,
    pub context: ServiceContext,
}

impl TestWorld {
    /// Seeded users, recording notifier
    pub fn new() -> Self {
        let notifier = RecordingNotifier::new();
        Self::build(notifier.clone(), notifier)
    }

    /// Seeded users, pushes go to `push` (the recorder stays empty)
    pub fn with_notifier(push: Arc<dyn Notifier>) -> Self {
        Self::build(RecordingNotifier::new(), push)
    }

    fn build(notifier: Arc<RecordingNotifier>, push: Arc<dyn Notifier>) -> Self {
        let store = InMemoryStore::new();
        let users = InMemoryUserDirectory::seeded();
        let jwt = Arc::new(JwtService::new(TEST_JWT_SECRET, 900));

        let context = ServiceContextBuilder::new()
            .conversation_repo(store.clone())
            .message_repo(store.clone())
            .user_directory(users.clone())
            .notifier(push)
            .jwt_service(jwt.clone())
            .snowflake_generator(Arc::new(SnowflakeGenerator::new(1)))
            .build()
            .expect("test context");

        Self {
            store,
            users,
            notifier,
            jwt,
            context,
        }
    }

    pub fn messaging(&self) -> MessagingService<'_> {
        MessagingService::new(&self.context)
    }

    /// Access token for `user_id`
    pub fn token(&self, user_id: Snowflake) -> String {
        self.jwt
            .generate_access_token(user_id)
            .expect("token generation")
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}
