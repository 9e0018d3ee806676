//! Request DTOs.

use serde::{Deserialize, Serialize};

use kinnect_entity::message::MessageStatus;

/// Body of `PATCH /api/messages/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    /// The status to advance to.
    pub status: MessageStatus,
}

/// Query parameter for WebSocket authentication.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    pub token: String,
}
