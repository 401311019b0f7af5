//! PostgreSQL implementation of MessageRepository
//!
//! Ordering is `(sent_at, seq)`: wall-clock time first, then the identity
//! column, so equal timestamps keep insertion order.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use dm_core::entities::{validate_content, Message};
use dm_core::error::DomainError;
use dm_core::traits::{MessageQuery, MessageRepository, RepoResult};
use dm_core::value_objects::Snowflake;

use crate::models::MessageModel;

use super::error::{map_db_error, map_foreign_key_violation};

/// PostgreSQL implementation of MessageRepository
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r#"
            SELECT id, conversation_id, sender_id, recipient_id, content, sent_at, is_read
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(
        skip(self, message),
        fields(message_id = %message.id, conversation_id = %message.conversation_id)
    )]
    async fn append(&self, message: &Message) -> RepoResult<()> {
        validate_content(&message.content)?;

        sqlx::query(
            r#"
            INSERT INTO messages
                (id, conversation_id, sender_id, recipient_id, content, sent_at, is_read)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id.into_inner())
        .bind(message.conversation_id.into_inner())
        .bind(message.sender_id.into_inner())
        .bind(message.recipient_id.into_inner())
        .bind(&message.content)
        .bind(message.sent_at)
        .bind(message.read)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_foreign_key_violation(e, || {
                DomainError::ConversationNotFound(message.conversation_id)
            })
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        conversation_id: Snowflake,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>> {
        let limit = query.effective_limit();

        let mut results = match (query.before, query.after) {
            (Some(before), None) => {
                // Older page, scrolling up
                sqlx::query_as::<_, MessageModel>(
                    r#"
                    SELECT id, conversation_id, sender_id, recipient_id, content, sent_at, is_read
                    FROM messages
                    WHERE conversation_id = $1
                      AND (sent_at, seq) < (
                          SELECT sent_at, seq FROM messages
                          WHERE id = $2 AND conversation_id = $1
                      )
                    ORDER BY sent_at DESC, seq DESC
                    LIMIT $3
                    "#,
                )
                .bind(conversation_id.into_inner())
                .bind(before.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            (None, Some(after)) => {
                // Newer page, catching up
                sqlx::query_as::<_, MessageModel>(
                    r#"
                    SELECT id, conversation_id, sender_id, recipient_id, content, sent_at, is_read
                    FROM messages
                    WHERE conversation_id = $1
                      AND (sent_at, seq) > (
                          SELECT sent_at, seq FROM messages
                          WHERE id = $2 AND conversation_id = $1
                      )
                    ORDER BY sent_at ASC, seq ASC
                    LIMIT $3
                    "#,
                )
                .bind(conversation_id.into_inner())
                .bind(after.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            (Some(before), Some(after)) => {
                // Window between two known messages
                sqlx::query_as::<_, MessageModel>(
                    r#"
                    SELECT id, conversation_id, sender_id, recipient_id, content, sent_at, is_read
                    FROM messages
                    WHERE conversation_id = $1
                      AND (sent_at, seq) > (
                          SELECT sent_at, seq FROM messages
                          WHERE id = $2 AND conversation_id = $1
                      )
                      AND (sent_at, seq) < (
                          SELECT sent_at, seq FROM messages
                          WHERE id = $3 AND conversation_id = $1
                      )
                    ORDER BY sent_at ASC, seq ASC
                    LIMIT $4
                    "#,
                )
                .bind(conversation_id.into_inner())
                .bind(after.into_inner())
                .bind(before.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            (None, None) => {
                // Latest page
                sqlx::query_as::<_, MessageModel>(
                    r#"
                    SELECT id, conversation_id, sender_id, recipient_id, content, sent_at, is_read
                    FROM messages
                    WHERE conversation_id = $1
                    ORDER BY sent_at DESC, seq DESC
                    LIMIT $2
                    "#,
                )
                .bind(conversation_id.into_inner())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        // Descending queries are flipped so every page reads oldest-to-newest
        if query.after.is_none() {
            results.reverse();
        }

        Ok(results.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, conversation_id: Snowflake, reader_id: Snowflake) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE conversation_id = $1
              AND recipient_id = $2
              AND NOT is_read
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(reader_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn count_unread_for_user(&self, user_id: Snowflake) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE recipient_id = $1 AND NOT is_read
            "#,
        )
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }
}
