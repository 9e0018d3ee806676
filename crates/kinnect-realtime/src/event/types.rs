//! Inbound and outbound event type definitions.
//!
//! Events travel as JSON text frames with a `type` tag and camelCase
//! payload fields, e.g.:
//!
//! ```json
//! {"type":"sendMessage","tempId":"t-1","senderId":"…","receiverId":"…","message":"hi"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kinnect_core::types::{MessageId, UserId};
use kinnect_entity::message::{Message, MessageKind, MessageStatus};

/// Events sent by the client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Bind this connection to a user identity.
    Join {
        /// The joining user.
        user_id: UserId,
    },
    /// Send a chat message. Acknowledged with a `sendAck` carrying the
    /// same `temp_id`.
    SendMessage {
        /// Client-generated correlation id for the optimistic copy.
        temp_id: String,
        /// The sending user. Must match the bound identity.
        sender_id: UserId,
        /// The receiving user.
        receiver_id: UserId,
        /// Message body.
        message: String,
        /// Content kind.
        #[serde(default)]
        kind: MessageKind,
        /// The message this one replies to, if any.
        #[serde(default)]
        reply_to: Option<MessageId>,
    },
    /// The client received a pushed message (conversation not necessarily
    /// open).
    MessageDelivered {
        /// The delivered message.
        message_id: MessageId,
    },
    /// The client viewed a message in an open conversation.
    MessageRead {
        /// The read message.
        message_id: MessageId,
    },
    /// The sender is typing. Fire-and-forget; never persisted.
    Typing {
        /// The typing user.
        sender_id: UserId,
        /// The counterparty to notify.
        receiver_id: UserId,
    },
}

/// Events sent by the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Join confirmed; the connection is bound.
    Joined {
        /// The bound user.
        user_id: UserId,
    },
    /// Synchronous acknowledgement of a `sendMessage` event.
    SendAck {
        /// Echo of the client's correlation id.
        temp_id: String,
        /// Whether the message was persisted.
        success: bool,
        /// The durable message, on success.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<Message>,
        /// Failure details, on error.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<ErrorBody>,
    },
    /// A message pushed to the receiver's sessions and the sender's other
    /// sessions.
    ReceiveMessage {
        /// The full durable message.
        message: Message,
    },
    /// A delivery-state change, pushed to the sender's sessions.
    ///
    /// Carries only the id and new status; the client already holds the
    /// message by its durable identity.
    MessageStatusUpdate {
        /// The affected message.
        message_id: MessageId,
        /// The new status.
        status: MessageStatus,
    },
    /// A typing signal forwarded to the receiver's sessions.
    Typing {
        /// The typing user.
        sender_id: UserId,
    },
    /// A user's presence set became non-empty.
    UserOnline {
        /// The user who came online.
        user_id: UserId,
    },
    /// A user's presence set became empty.
    UserOffline {
        /// The user who went offline.
        user_id: UserId,
        /// Stamped at the moment the last session closed.
        last_seen: DateTime<Utc>,
    },
    /// An error push (rejected event, malformed frame).
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}

/// Structured failure payload carried inside a `sendAck`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}
