//! PostgreSQL implementation of ConversationRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use dm_core::entities::{Conversation, ConversationPreview};
use dm_core::error::DomainError;
use dm_core::traits::{ConversationRepository, RepoResult};
use dm_core::value_objects::{ParticipantsKey, Snowflake};

use crate::models::{ConversationModel, ConversationPreviewModel};

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of ConversationRepository
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Conversation>> {
        let result = sqlx::query_as::<_, ConversationModel>(
            r#"
            SELECT id, participant_low, participant_high, participants_key,
                   last_message_id, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Conversation::try_from).transpose()
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn find_by_participants(
        &self,
        key: &ParticipantsKey,
    ) -> RepoResult<Option<Conversation>> {
        let result = sqlx::query_as::<_, ConversationModel>(
            r#"
            SELECT id, participant_low, participant_high, participants_key,
                   last_message_id, created_at, updated_at
            FROM conversations
            WHERE participants_key = $1
            "#,
        )
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Conversation::try_from).transpose()
    }

    #[instrument(skip(self, conversation), fields(conversation_id = %conversation.id))]
    async fn create(&self, conversation: &Conversation) -> RepoResult<()> {
        let key = &conversation.participants_key;

        sqlx::query(
            r#"
            INSERT INTO conversations
                (id, participant_low, participant_high, participants_key,
                 last_message_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(conversation.id.into_inner())
        .bind(key.low().into_inner())
        .bind(key.high().into_inner())
        .bind(key.to_string())
        .bind(conversation.last_message_id.map(Snowflake::into_inner))
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ConversationExists(key.to_string())))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_last_message(
        &self,
        conversation_id: Snowflake,
        message_id: Snowflake,
    ) -> RepoResult<()> {
        // Never move the pointer backwards when two sends race
        let result = sqlx::query(
            r#"
            UPDATE conversations c
            SET last_message_id = m.id,
                updated_at = GREATEST(c.updated_at, m.sent_at)
            FROM messages m
            WHERE c.id = $1
              AND m.id = $2
              AND m.conversation_id = c.id
              AND NOT EXISTS (
                  SELECT 1 FROM messages cur
                  WHERE cur.id = c.last_message_id
                    AND (cur.sent_at, cur.seq) > (m.sent_at, m.seq)
              )
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(message_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            tracing::debug!("last message pointer already newer, left unchanged");
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: Snowflake) -> RepoResult<Vec<ConversationPreview>> {
        // The newest message is looked up directly rather than through
        // last_message_id, which may lag behind a failed pointer update.
        let rows = sqlx::query_as::<_, ConversationPreviewModel>(
            r#"
            SELECT c.id, c.participant_low, c.participant_high, c.participants_key,
                   c.last_message_id, c.created_at, c.updated_at,
                   lm.id AS lm_id,
                   lm.sender_id AS lm_sender_id,
                   lm.recipient_id AS lm_recipient_id,
                   lm.content AS lm_content,
                   lm.sent_at AS lm_sent_at,
                   lm.is_read AS lm_is_read,
                   unread.count AS unread_count
            FROM conversations c
            LEFT JOIN LATERAL (
                SELECT m.id, m.sender_id, m.recipient_id, m.content, m.sent_at, m.is_read
                FROM messages m
                WHERE m.conversation_id = c.id
                ORDER BY m.sent_at DESC, m.seq DESC
                LIMIT 1
            ) lm ON TRUE
            CROSS JOIN LATERAL (
                SELECT COUNT(*) AS count
                FROM messages u
                WHERE u.conversation_id = c.id
                  AND u.recipient_id = $1
                  AND NOT u.is_read
            ) unread
            WHERE c.participant_low = $1 OR c.participant_high = $1
            ORDER BY lm.sent_at DESC NULLS LAST, c.updated_at DESC, c.id DESC
            "#,
        )
        .bind(user_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(ConversationPreview::try_from).collect()
    }
}
