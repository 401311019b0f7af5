//! Conversation database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for conversations table
#[derive(Debug, Clone, FromRow)]
pub struct ConversationModel {
    pub id: i64,
    pub participant_low: i64,
    pub participant_high: i64,
    pub participants_key: String,
    pub last_message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inbox row: a conversation joined with its newest message and the
/// viewer's unread count. Message columns are prefixed `lm_` and are all
/// NULL when the conversation has no messages.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationPreviewModel {
    #[sqlx(flatten)]
    pub conversation: ConversationModel,
    pub lm_id: Option<i64>,
    pub lm_sender_id: Option<i64>,
    pub lm_recipient_id: Option<i64>,
    pub lm_content: Option<String>,
    pub lm_sent_at: Option<DateTime<Utc>>,
    pub lm_is_read: Option<bool>,
    pub unread_count: i64,
}
