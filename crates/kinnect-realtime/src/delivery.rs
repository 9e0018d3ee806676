//! Delivery state machine: advances message status and notifies senders.

use std::sync::Arc;

use tracing::debug;

use kinnect_core::result::AppResult;
use kinnect_core::types::MessageId;
use kinnect_entity::message::MessageStatus;
use kinnect_entity::store::{MessageStore, StatusAdvance};

use crate::event::ServerEvent;
use crate::presence::registry::PresenceRegistry;

/// Drives the sent → delivered → read lifecycle.
///
/// Status never regresses: the store applies a conditional write, and a
/// request that does not advance the stored status is an idempotent no-op.
/// Status-update pushes go to the **sender's** sessions, and only when the
/// stored status actually changed.
pub struct DeliveryTracker {
    registry: Arc<PresenceRegistry>,
    messages: Arc<dyn MessageStore>,
}

impl DeliveryTracker {
    /// Create a new delivery tracker.
    pub fn new(registry: Arc<PresenceRegistry>, messages: Arc<dyn MessageStore>) -> Self {
        Self { registry, messages }
    }

    /// The receiving client acknowledged receipt of a pushed message.
    pub async fn mark_delivered(&self, message_id: MessageId) -> AppResult<StatusAdvance> {
        self.advance(message_id, MessageStatus::Delivered).await
    }

    /// The receiving client viewed the message in an open conversation.
    pub async fn mark_read(&self, message_id: MessageId) -> AppResult<StatusAdvance> {
        self.advance(message_id, MessageStatus::Read).await
    }

    async fn advance(
        &self,
        message_id: MessageId,
        status: MessageStatus,
    ) -> AppResult<StatusAdvance> {
        let advance = self.messages.advance_status(message_id, status).await?;

        if advance.changed {
            debug!(
                message_id = %message_id,
                status = %advance.message.status,
                "Message status advanced"
            );
            for session in self.registry.sessions_for(advance.message.sender_id) {
                session.send(ServerEvent::MessageStatusUpdate {
                    message_id,
                    status: advance.message.status,
                });
            }
        } else {
            debug!(
                message_id = %message_id,
                requested = %status,
                current = %advance.message.status,
                "Status advance was a no-op"
            );
        }

        Ok(advance)
    }
}
