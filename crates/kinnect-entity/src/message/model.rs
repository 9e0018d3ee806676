//! Chat message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use kinnect_core::types::{MessageId, UserId};

use super::kind::MessageKind;
use super::status::MessageStatus;

/// A persisted chat message.
///
/// The identity is assigned by the store on append; clients correlate their
/// optimistic copies with the durable record through the send acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier (store-assigned).
    pub id: MessageId,
    /// The sending user.
    pub sender_id: UserId,
    /// The receiving user.
    pub receiver_id: UserId,
    /// Message body text (or media URL for media messages).
    pub body: String,
    /// Content kind.
    pub kind: MessageKind,
    /// Delivery status. Monotonically non-decreasing.
    pub status: MessageStatus,
    /// The message this one replies to, if any.
    pub reply_to: Option<MessageId>,
    /// When the store persisted the message. Authoritative conversation order.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether this message belongs to the conversation between `a` and `b`
    /// (unordered pair).
    pub fn in_conversation(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Payload for appending a new message to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// The sending user.
    pub sender_id: UserId,
    /// The receiving user.
    pub receiver_id: UserId,
    /// Message body text.
    pub body: String,
    /// Content kind.
    #[serde(default)]
    pub kind: MessageKind,
    /// The message this one replies to, if any.
    #[serde(default)]
    pub reply_to: Option<MessageId>,
}
