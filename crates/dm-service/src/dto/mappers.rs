//! Entity to DTO mappers

use dm_core::entities::{Conversation, ConversationPreview, Message, UserProfile};
use dm_core::Snowflake;

use super::responses::{
    ConversationPreviewResponse, ConversationResponse, MessageResponse, OtherUserResponse,
};

/// Display name used when the directory no longer knows a participant
pub const UNKNOWN_USER_NAME: &str = "Unknown user";

impl From<&Message> for MessageResponse {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.to_string(),
            conversation_id: message.conversation_id.to_string(),
            sender_id: message.sender_id.to_string(),
            recipient_id: message.recipient_id.to_string(),
            content: message.content.clone(),
            sent_at: message.sent_at,
            read: message.read,
        }
    }
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self::from(&message)
    }
}

impl From<&Conversation> for ConversationResponse {
    fn from(conversation: &Conversation) -> Self {
        let [low, high] = conversation.participants();
        Self {
            id: conversation.id.to_string(),
            participants: [low.to_string(), high.to_string()],
            participants_key: conversation.participants_key.to_string(),
            last_message_id: conversation.last_message_id.map(|id| id.to_string()),
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

impl From<&UserProfile> for OtherUserResponse {
    fn from(user: &UserProfile) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.display_name.clone(),
            profile_pic: user.avatar_ref.clone(),
            role: Some(user.role),
        }
    }
}

impl OtherUserResponse {
    /// Placeholder for a participant missing from the directory
    pub fn unknown(id: Snowflake) -> Self {
        Self {
            id: id.to_string(),
            name: UNKNOWN_USER_NAME.to_string(),
            profile_pic: None,
            role: None,
        }
    }
}

impl ConversationPreviewResponse {
    /// Build an inbox entry as seen by `viewer`
    pub fn for_viewer(
        preview: &ConversationPreview,
        viewer: Snowflake,
        other_user: OtherUserResponse,
    ) -> Self {
        Self {
            conversation_id: preview.conversation.id.to_string(),
            other_user,
            last_message: preview.last_message.as_ref().map(MessageResponse::from),
            unread_count: preview.unread_count,
            is_from_current_user: preview
                .last_message
                .as_ref()
                .is_some_and(|m| m.is_from(viewer)),
            updated_at: preview.activity_at(),
        }
    }
}
