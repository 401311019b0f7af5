//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation (PostgreSQL in `dm-db`, in-memory fakes in tests).

use async_trait::async_trait;

use crate::entities::{Conversation, ConversationPreview, Message, UserProfile};
use crate::error::DomainError;
use crate::value_objects::{ParticipantsKey, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Directory
// ============================================================================

/// Read-only view of the identity provider's users
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by ID
    async fn find_user(&self, id: Snowflake) -> RepoResult<Option<UserProfile>>;

    /// Find several users at once; unknown ids are skipped
    async fn find_users(&self, ids: &[Snowflake]) -> RepoResult<Vec<UserProfile>>;
}

// ============================================================================
// Conversation Repository
// ============================================================================

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Find conversation by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>>;

    /// Find the conversation for a participant pair via its unique key
    async fn find_by_participants(&self, key: &ParticipantsKey)
        -> RepoResult<Option<Conversation>>;

    /// Insert a new conversation.
    ///
    /// Fails with [`DomainError::ConversationExists`] when another
    /// conversation already holds the same participants key.
    async fn create(&self, conversation: &Conversation) -> RepoResult<()>;

    /// Point a conversation at its newest message and bump `updated_at`
    async fn update_last_message(
        &self,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> RepoResult<()>;

    /// Inbox for a user, most recent activity first
    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationPreview>>;
}

// ============================================================================
// Message Repository
// ============================================================================

/// Pagination options for message queries.
///
/// `before`/`after` are message ids used as exclusive cursors. Pages are
/// always returned oldest-to-newest.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    pub before: Option<Snowflake>,
    pub after: Option<Snowflake>,
    pub limit: i64,
}

impl MessageQuery {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    /// The newest `limit` messages
    pub fn latest(limit: i64) -> Self {
        Self {
            before: None,
            after: None,
            limit,
        }
    }

    /// Limit clamped into the accepted range; zero means the default
    pub fn effective_limit(&self) -> i64 {
        if self.limit <= 0 {
            Self::DEFAULT_LIMIT
        } else {
            self.limit.min(Self::MAX_LIMIT)
        }
    }
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by ID
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>>;

    /// Persist a new message
    async fn append(&self, message: &Message) -> RepoResult<()>;

    /// One page of a conversation, ordered by (sent_at, insertion order)
    async fn list(&self, conversation_id: Snowflake, query: MessageQuery)
        -> RepoResult<Vec<Message>>;

    /// Flag every unread message addressed to `reader_id` as read.
    ///
    /// Returns how many messages changed; a repeated call returns 0.
    async fn mark_read(&self, conversation_id: Snowflake, reader_id: Snowflake)
        -> RepoResult<u64>;

    /// Unread messages addressed to the user, across all conversations
    async fn count_unread_for_user(&self, user_id: Snowflake) -> RepoResult<i64>;
}
