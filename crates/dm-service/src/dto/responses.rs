//! Response DTOs for API endpoints and realtime payloads
//!
//! Snowflake IDs are serialized as strings for JavaScript compatibility.

use chrono::{DateTime, Utc};
use dm_core::UserRole;
use serde::Serialize;

// ============================================================================
// Message Responses
// ============================================================================

/// A persisted message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// A conversation row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub participants: [String; 2],
    pub participants_key: String,
    pub last_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a send
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageResponse {
    pub conversation: ConversationResponse,
    pub message: MessageResponse,
}

/// One page of a thread, oldest first
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessagesResponse {
    /// Absent when the pair has never exchanged a message
    pub conversation_id: Option<String>,
    pub messages: Vec<MessageResponse>,
}

impl ConversationMessagesResponse {
    /// Thread that does not exist yet
    pub fn empty() -> Self {
        Self {
            conversation_id: None,
            messages: Vec::new(),
        }
    }
}

/// Result of an explicit read action
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadResponse {
    pub conversation_id: String,
    pub updated: u64,
}

/// Unread badge
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

// ============================================================================
// Conversation Previews
// ============================================================================

/// The participant on the other side of a conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherUserResponse {
    pub id: String,
    pub name: String,
    pub profile_pic: Option<String>,
    pub role: Option<UserRole>,
}

/// Inbox entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPreviewResponse {
    pub conversation_id: String,
    pub other_user: OtherUserResponse,
    pub last_message: Option<MessageResponse>,
    pub unread_count: i64,
    pub is_from_current_user: bool,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Realtime Payloads
// ============================================================================

/// Payload of `message:new` and `message:sent`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEventPayload {
    pub conversation_id: String,
    pub message: MessageResponse,
}

/// Payload of `conversation:read`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadEventPayload {
    pub conversation_id: String,
    pub reader_id: String,
    pub count: u64,
}

// ============================================================================
// Health Responses
// ============================================================================

/// Basic health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    /// Dependency name to `healthy` / `unhealthy`
    pub checks: std::collections::BTreeMap<String, String>,
}

impl ReadinessResponse {
    pub fn from_checks(results: impl IntoIterator<Item = (&'static str, bool)>) -> Self {
        let checks: std::collections::BTreeMap<String, String> = results
            .into_iter()
            .map(|(name, ok)| {
                let state = if ok { "healthy" } else { "unhealthy" };
                (name.to_string(), state.to_string())
            })
            .collect();

        let ready = checks.values().all(|state| state == "healthy");

        Self {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}
