//! Conversation entity - the thread between exactly two users

use chrono::{DateTime, Utc};

use super::Message;
use crate::error::DomainError;
use crate::value_objects::{ParticipantsKey, Snowflake};

/// Conversation entity
///
/// Created lazily on the first message between a pair. Only
/// `last_message_id` and `updated_at` change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: Snowflake,
    pub participants_key: ParticipantsKey,
    pub last_message_id: Option<Snowflake>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a conversation between two distinct users
    pub fn new(id: Snowflake, a: Snowflake, b: Snowflake) -> Result<Self, DomainError> {
        let participants_key = ParticipantsKey::new(a, b)?;
        let now = super::now();
        Ok(Self {
            id,
            participants_key,
            last_message_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Both participants, smaller id first
    #[inline]
    pub fn participants(&self) -> [Snowflake; 2] {
        self.participants_key.participants()
    }

    #[inline]
    pub fn has_participant(&self, user_id: Snowflake) -> bool {
        self.participants_key.contains(user_id)
    }

    /// The other participant, from `user_id`'s point of view
    pub fn other_participant(&self, user_id: Snowflake) -> Option<Snowflake> {
        self.participants_key.other(user_id)
    }

    /// Fail with `NotParticipant` unless `user_id` belongs to this conversation
    pub fn ensure_participant(&self, user_id: Snowflake) -> Result<(), DomainError> {
        if self.has_participant(user_id) {
            Ok(())
        } else {
            Err(DomainError::NotParticipant)
        }
    }

    /// Point the conversation at its newest message
    pub fn record_message(&mut self, message: &Message) {
        self.last_message_id = Some(message.id);
        self.updated_at = message.sent_at;
    }
}

/// A conversation as seen in one user's inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationPreview {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
    /// Unread messages addressed to the viewing user
    pub unread_count: i64,
}

impl ConversationPreview {
    /// Timestamp used to order an inbox, newest first
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_message
            .as_ref()
            .map_or(self.conversation.updated_at, |m| m.sent_at)
    }
}
