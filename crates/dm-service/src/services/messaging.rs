//! Messaging service
//!
//! Send, read, and list direct messages. Every write goes to the store
//! first; realtime pushes follow and never affect the returned result.

use std::collections::HashMap;

use dm_cache::PubSubEvent;
use dm_core::entities::{validate_content, Conversation, Message};
use dm_core::traits::MessageQuery;
use dm_core::{DomainError, ParticipantsKey, RealtimeEventKind, Snowflake};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::dto::{
    ConversationMessagesResponse, ConversationPreviewResponse, ConversationResponse,
    MarkReadResponse, MessageEventPayload, MessageResponse, OtherUserResponse, ReadEventPayload,
    SendMessageResponse, UnreadCountResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Messaging service
pub struct MessagingService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessagingService<'a> {
    /// Create a new MessagingService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Send a message, creating the conversation on first contact
    #[instrument(skip(self, content), fields(content_len = content.len()))]
    pub async fn send_message(
        &self,
        caller_id: Snowflake,
        recipient_id: Snowflake,
        content: String,
    ) -> ServiceResult<SendMessageResponse> {
        if caller_id == recipient_id {
            return Err(DomainError::SelfConversation.into());
        }
        validate_content(&content)?;

        self.ctx
            .user_directory()
            .find_user(recipient_id)
            .await?
            .ok_or(DomainError::UserNotFound(recipient_id))?;

        let mut conversation = self.find_or_create_conversation(caller_id, recipient_id).await?;

        let message = Message::new(
            self.ctx.generate_id(),
            conversation.id,
            caller_id,
            recipient_id,
            content,
        );
        self.ctx.message_repo().append(&message).await?;

        // The pointer only feeds inbox ordering and may lag
        if let Err(e) = self
            .ctx
            .conversation_repo()
            .update_last_message(conversation.id, message.id)
            .await
        {
            warn!(conversation_id = %conversation.id, error = %e, "Failed to update last message");
        }
        conversation.record_message(&message);

        info!(
            message_id = %message.id,
            conversation_id = %conversation.id,
            "Message sent"
        );

        let payload = MessageEventPayload {
            conversation_id: conversation.id.to_string(),
            message: MessageResponse::from(&message),
        };
        self.notify(recipient_id, RealtimeEventKind::MessageNew, &payload).await;
        self.notify(caller_id, RealtimeEventKind::MessageSent, &payload).await;

        Ok(SendMessageResponse {
            conversation: ConversationResponse::from(&conversation),
            message: payload.message,
        })
    }

    /// Read a page of a conversation by id, marking the caller's messages read
    #[instrument(skip(self))]
    pub async fn get_conversation_messages(
        &self,
        caller_id: Snowflake,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> ServiceResult<ConversationMessagesResponse> {
        let conversation = self.authorized_conversation(caller_id, conversation_id).await?;
        self.read_thread(&conversation, caller_id, query).await
    }

    /// Read a page of the conversation with another user
    ///
    /// A pair that never exchanged a message yields an empty page; nothing
    /// is created.
    #[instrument(skip(self))]
    pub async fn get_messages_with_user(
        &self,
        caller_id: Snowflake,
        other_user_id: Snowflake,
        query: MessageQuery,
    ) -> ServiceResult<ConversationMessagesResponse> {
        let key = ParticipantsKey::new(caller_id, other_user_id)?;

        self.ctx
            .user_directory()
            .find_user(other_user_id)
            .await?
            .ok_or(DomainError::UserNotFound(other_user_id))?;

        match self.ctx.conversation_repo().find_by_participants(&key).await? {
            Some(conversation) => self.read_thread(&conversation, caller_id, query).await,
            None => Ok(ConversationMessagesResponse::empty()),
        }
    }

    /// Explicit read action
    #[instrument(skip(self))]
    pub async fn mark_conversation_read(
        &self,
        caller_id: Snowflake,
        conversation_id: Snowflake,
    ) -> ServiceResult<MarkReadResponse> {
        let conversation = self.authorized_conversation(caller_id, conversation_id).await?;
        let updated = self.mark_read(&conversation, caller_id).await?;

        Ok(MarkReadResponse {
            conversation_id: conversation.id.to_string(),
            updated,
        })
    }

    /// Inbox of the caller, most recent activity first
    #[instrument(skip(self))]
    pub async fn list_conversations(
        &self,
        caller_id: Snowflake,
    ) -> ServiceResult<Vec<ConversationPreviewResponse>> {
        let previews = self.ctx.conversation_repo().list_for_user(caller_id).await?;

        let other_ids: Vec<Snowflake> = previews
            .iter()
            .filter_map(|p| p.conversation.other_participant(caller_id))
            .collect();

        let users: HashMap<Snowflake, OtherUserResponse> = self
            .ctx
            .user_directory()
            .find_users(&other_ids)
            .await?
            .iter()
            .map(|u| (u.id, OtherUserResponse::from(u)))
            .collect();

        Ok(previews
            .iter()
            .filter_map(|preview| {
                let other_id = preview.conversation.other_participant(caller_id)?;
                let other_user = users
                    .get(&other_id)
                    .cloned()
                    .unwrap_or_else(|| OtherUserResponse::unknown(other_id));
                Some(ConversationPreviewResponse::for_viewer(preview, caller_id, other_user))
            })
            .collect())
    }

    /// Total unread messages addressed to the caller
    #[instrument(skip(self))]
    pub async fn unread_count(&self, caller_id: Snowflake) -> ServiceResult<UnreadCountResponse> {
        let unread_count = self
            .ctx
            .message_repo()
            .count_unread_for_user(caller_id)
            .await?;

        Ok(UnreadCountResponse { unread_count })
    }

    // ------------------------------------------------------------------------

    /// Look up the pair's conversation, creating it when absent.
    ///
    /// Losing a creation race surfaces as `ConversationExists`; the winner's
    /// row is re-read once.
    async fn find_or_create_conversation(
        &self,
        a: Snowflake,
        b: Snowflake,
    ) -> ServiceResult<Conversation> {
        let key = ParticipantsKey::new(a, b)?;
        let repo = self.ctx.conversation_repo();

        if let Some(existing) = repo.find_by_participants(&key).await? {
            return Ok(existing);
        }

        let conversation = Conversation::new(self.ctx.generate_id(), a, b)?;
        match repo.create(&conversation).await {
            Ok(()) => {
                info!(conversation_id = %conversation.id, key = %key, "Conversation created");
                Ok(conversation)
            }
            Err(DomainError::ConversationExists(_)) => {
                debug!(key = %key, "Lost conversation creation race, re-fetching");
                repo.find_by_participants(&key).await?.ok_or_else(|| {
                    ServiceError::internal(format!("conversation {key} missing after conflict"))
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn authorized_conversation(
        &self,
        caller_id: Snowflake,
        conversation_id: Snowflake,
    ) -> ServiceResult<Conversation> {
        let conversation = self
            .ctx
            .conversation_repo()
            .find_by_id(conversation_id)
            .await?
            .ok_or(DomainError::ConversationNotFound(conversation_id))?;

        conversation.ensure_participant(caller_id)?;
        Ok(conversation)
    }

    /// List a page, then mark what the caller just saw as read
    async fn read_thread(
        &self,
        conversation: &Conversation,
        caller_id: Snowflake,
        query: MessageQuery,
    ) -> ServiceResult<ConversationMessagesResponse> {
        let mut messages = self
            .ctx
            .message_repo()
            .list(conversation.id, query)
            .await?;

        if self.mark_read(conversation, caller_id).await? > 0 {
            for message in messages.iter_mut().filter(|m| m.is_addressed_to(caller_id)) {
                message.mark_read();
            }
        }

        Ok(ConversationMessagesResponse {
            conversation_id: Some(conversation.id.to_string()),
            messages: messages.iter().map(MessageResponse::from).collect(),
        })
    }

    async fn mark_read(
        &self,
        conversation: &Conversation,
        reader_id: Snowflake,
    ) -> ServiceResult<u64> {
        let count = self
            .ctx
            .message_repo()
            .mark_read(conversation.id, reader_id)
            .await?;

        if count > 0 {
            debug!(conversation_id = %conversation.id, count, "Messages marked read");

            if let Some(other) = conversation.other_participant(reader_id) {
                let payload = ReadEventPayload {
                    conversation_id: conversation.id.to_string(),
                    reader_id: reader_id.to_string(),
                    count,
                };
                self.notify(other, RealtimeEventKind::ConversationRead, &payload).await;
            }
        }

        Ok(count)
    }

    /// Best-effort push; failures are logged and swallowed
    async fn notify<T: Serialize>(
        &self,
        user_id: Snowflake,
        kind: RealtimeEventKind,
        payload: &T,
    ) {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                warn!(%user_id, event_type = %kind, error = %e, "Failed to encode event");
                return;
            }
        };

        let event = PubSubEvent::new(kind, data);
        if let Err(e) = self.ctx.notifier().notify(user_id, &event).await {
            warn!(%user_id, event_type = %kind, error = %e, "Failed to push event");
        }
    }
}
