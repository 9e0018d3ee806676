//! Message repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use kinnect_core::error::{AppError, ErrorKind};
use kinnect_core::result::AppResult;
use kinnect_core::types::{MessageId, UserId};
use kinnect_entity::message::{Message, MessageStatus, NewMessage};
use kinnect_entity::store::{MessageStore, StatusAdvance};

/// PostgreSQL-backed [`MessageStore`].
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn append(&self, new: NewMessage) -> AppResult<Message> {
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (sender_id, receiver_id, body, kind, status, reply_to) \
             VALUES ($1, $2, $3, $4, 'sent', $5) \
             RETURNING *",
        )
        .bind(new.sender_id)
        .bind(new.receiver_id)
        .bind(&new.body)
        .bind(new.kind)
        .bind(new.reply_to)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to append message", e))
    }

    async fn history(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) \
                OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC",
        )
        .bind(a)
        .bind(b)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fetch conversation history", e)
        })
    }

    async fn advance_status(
        &self,
        id: MessageId,
        status: MessageStatus,
    ) -> AppResult<StatusAdvance> {
        // Conditional write: the enum's declaration order matches the
        // lifecycle order, so `status < $2` never regresses a row.
        let updated = sqlx::query_as::<_, Message>(
            "UPDATE messages SET status = $2 WHERE id = $1 AND status < $2 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to advance message status", e)
        })?;

        if let Some(message) = updated {
            return Ok(StatusAdvance {
                message,
                changed: true,
            });
        }

        // Not advanced: either already at/past the requested status, or the
        // id is unknown. Distinguish by re-reading.
        let existing = self.get(id).await?.ok_or_else(|| {
            AppError::not_found(format!("Message {id} not found for status update"))
        })?;

        Ok(StatusAdvance {
            message: existing,
            changed: false,
        })
    }

    async fn get(&self, id: MessageId) -> AppResult<Option<Message>> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find message by id", e)
            })
    }
}
