//! Message entity <-> model mapper

use dm_core::entities::Message;
use dm_core::value_objects::Snowflake;

use crate::models::MessageModel;

impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: Snowflake::new(model.id),
            conversation_id: Snowflake::new(model.conversation_id),
            sender_id: Snowflake::new(model.sender_id),
            recipient_id: Snowflake::new(model.recipient_id),
            content: model.content,
            sent_at: model.sent_at,
            read: model.is_read,
        }
    }
}
