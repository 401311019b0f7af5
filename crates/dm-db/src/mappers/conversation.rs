//! Conversation entity <-> model mappers

use dm_core::entities::{Conversation, ConversationPreview, Message};
use dm_core::error::DomainError;
use dm_core::value_objects::{ParticipantsKey, Snowflake};

use crate::models::{ConversationModel, ConversationPreviewModel};

impl TryFrom<ConversationModel> for Conversation {
    type Error = DomainError;

    fn try_from(model: ConversationModel) -> Result<Self, Self::Error> {
        let participants_key = ParticipantsKey::new(
            Snowflake::new(model.participant_low),
            Snowflake::new(model.participant_high),
        )?;

        if participants_key.to_string() != model.participants_key {
            return Err(DomainError::InternalError(format!(
                "conversation {} has inconsistent participants key {}",
                model.id, model.participants_key
            )));
        }

        Ok(Conversation {
            id: Snowflake::new(model.id),
            participants_key,
            last_message_id: model.last_message_id.map(Snowflake::new),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

impl TryFrom<ConversationPreviewModel> for ConversationPreview {
    type Error = DomainError;

    fn try_from(row: ConversationPreviewModel) -> Result<Self, Self::Error> {
        let conversation = Conversation::try_from(row.conversation)?;

        let last_message = match (
            row.lm_id,
            row.lm_sender_id,
            row.lm_recipient_id,
            row.lm_content,
            row.lm_sent_at,
        ) {
            (Some(id), Some(sender_id), Some(recipient_id), Some(content), Some(sent_at)) => {
                Some(Message {
                    id: Snowflake::new(id),
                    conversation_id: conversation.id,
                    sender_id: Snowflake::new(sender_id),
                    recipient_id: Snowflake::new(recipient_id),
                    content,
                    sent_at,
                    read: row.lm_is_read.unwrap_or(false),
                })
            }
            _ => None,
        };

        Ok(ConversationPreview {
            conversation,
            last_message,
            unread_count: row.unread_count,
        })
    }
}
