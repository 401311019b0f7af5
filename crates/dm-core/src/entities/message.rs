//! Message entity - an append-only fact inside one conversation

use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Maximum message length, in characters
pub const MAX_CONTENT_LENGTH: usize = 1000;

/// Check message content against the length rules.
///
/// Whitespace-only content counts as empty. Length is measured in
/// characters, not bytes.
pub fn validate_content(content: &str) -> Result<(), DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::EmptyContent);
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(DomainError::ContentTooLong {
            max: MAX_CONTENT_LENGTH,
        });
    }
    Ok(())
}

/// Message entity
///
/// Immutable after creation except for the `read` flag, which only moves
/// from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Snowflake,
    pub conversation_id: Snowflake,
    pub sender_id: Snowflake,
    pub recipient_id: Snowflake,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

impl Message {
    /// Create a new, unread message stamped with the current time
    pub fn new(
        id: Snowflake,
        conversation_id: Snowflake,
        sender_id: Snowflake,
        recipient_id: Snowflake,
        content: String,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender_id,
            recipient_id,
            content,
            sent_at: super::now(),
            read: false,
        }
    }

    /// Whether `user_id` is the one this message is addressed to
    #[inline]
    pub fn is_addressed_to(&self, user_id: Snowflake) -> bool {
        self.recipient_id == user_id
    }

    #[inline]
    pub fn is_from(&self, user_id: Snowflake) -> bool {
        self.sender_id == user_id
    }

    /// Mark as read. Returns `true` only on the first transition.
    pub fn mark_read(&mut self) -> bool {
        let changed = !self.read;
        self.read = true;
        changed
    }
}
