//! Message delivery status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Delivery lifecycle state of a chat message.
///
/// States are ordered and only ever advance: sent → delivered → read.
/// A message never regresses to an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Persisted by the server; the receiver has not acknowledged it yet.
    Sent,
    /// The receiver's client acknowledged receipt.
    Delivered,
    /// The receiver viewed the message in an open conversation.
    Read,
}

impl MessageStatus {
    /// Position in the lifecycle (higher = further along).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Sent => 0,
            Self::Delivered => 1,
            Self::Read => 2,
        }
    }

    /// Whether advancing to `next` is a forward transition.
    ///
    /// Equal or backward transitions are not advances; callers treat them
    /// as idempotent no-ops rather than errors.
    pub fn can_advance_to(&self, next: MessageStatus) -> bool {
        next.rank() > self.rank()
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = kinnect_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            _ => Err(kinnect_core::AppError::validation(format!(
                "Invalid message status: '{s}'. Expected one of: sent, delivered, read"
            ))),
        }
    }
}
