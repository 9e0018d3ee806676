//! Storage interfaces consumed by the chat core.
//!
//! The realtime engine depends only on these traits; concrete backends live
//! in `kinnect-database` (PostgreSQL) and in test support code (in-memory).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use kinnect_core::result::AppResult;
use kinnect_core::types::{MessageId, UserId};

use crate::message::{Message, MessageStatus, NewMessage};
use crate::user::User;

/// Outcome of a conditional status advance.
#[derive(Debug, Clone)]
pub struct StatusAdvance {
    /// The stored message after the operation.
    pub message: Message,
    /// Whether the stored status actually changed.
    ///
    /// False when the message was already at or past the requested status;
    /// such calls are idempotent no-ops.
    pub changed: bool,
}

/// Durable append-only store of chat messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message with status `sent` and a store-assigned identity
    /// and creation timestamp.
    async fn append(&self, new: NewMessage) -> AppResult<Message>;

    /// Full history of the conversation between `a` and `b` (matched in
    /// either sender/receiver order), ascending by creation time.
    async fn history(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>>;

    /// Advance a message's status, never regressing it.
    ///
    /// `delivered` is applied only from `sent`; `read` from `sent` or
    /// `delivered`. An equal-or-behind request succeeds without changing
    /// the row. Returns a not-found error for an unknown id.
    async fn advance_status(&self, id: MessageId, status: MessageStatus)
        -> AppResult<StatusAdvance>;

    /// Fetch a single message by id.
    async fn get(&self, id: MessageId) -> AppResult<Option<Message>>;
}

/// User account store (external collaborator; lookup and presence only).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Whether an account with this id exists.
    async fn exists(&self, id: UserId) -> AppResult<bool>;

    /// Fetch an account by id.
    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>>;

    /// Persist the online flag and last-seen timestamp.
    ///
    /// Best-effort on the presence path: callers log failures and continue.
    async fn set_presence(
        &self,
        id: UserId,
        online: bool,
        last_seen: Option<DateTime<Utc>>,
    ) -> AppResult<()>;
}
