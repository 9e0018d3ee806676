//! Conversation channel router: persist-then-fan-out message delivery.

use std::sync::Arc;

use tracing::{debug, warn};

use kinnect_core::error::{AppError, ErrorKind};
use kinnect_core::types::UserId;
use kinnect_entity::message::NewMessage;
use kinnect_entity::store::{MessageStore, UserStore};

use crate::event::{ErrorBody, ServerEvent};
use crate::presence::registry::PresenceRegistry;
use crate::session::handle::SessionHandle;

/// Routes outbound chat events to the session handles of the users they
/// address.
///
/// The send path is persist-first: a message only reaches any session after
/// the store has assigned it a durable identity. When the receiver has no
/// live sessions delivery is simply skipped; the message stays durable and
/// is picked up by the receiver's next history load.
pub struct ChatRouter {
    registry: Arc<PresenceRegistry>,
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserStore>,
}

impl ChatRouter {
    /// Create a new router over the given registry and stores.
    pub fn new(
        registry: Arc<PresenceRegistry>,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            registry,
            messages,
            users,
        }
    }

    /// Handle a send: validate, persist, fan out, acknowledge.
    ///
    /// The acknowledgement always goes to the originating session, carrying
    /// either the durable message or a structured failure. Failures are
    /// never silent.
    pub async fn send(&self, origin: &SessionHandle, temp_id: String, new: NewMessage) {
        if let Err(err) = self.validate_recipient(new.receiver_id).await {
            warn!(
                session_id = %origin.id,
                receiver_id = %new.receiver_id,
                error = %err,
                "Rejected send"
            );
            origin.send(failed_ack(temp_id, &err));
            return;
        }

        let message = match self.messages.append(new).await {
            Ok(message) => message,
            Err(err) => {
                warn!(session_id = %origin.id, error = %err, "Failed to persist message");
                origin.send(failed_ack(temp_id, &err));
                return;
            }
        };

        debug!(
            message_id = %message.id,
            sender_id = %message.sender_id,
            receiver_id = %message.receiver_id,
            "Message persisted"
        );

        // Receiver's sessions. None online → the message waits in history.
        for session in self.registry.sessions_for(message.receiver_id) {
            session.send(ServerEvent::ReceiveMessage {
                message: message.clone(),
            });
        }

        // Sender's *other* sessions (multi-tab sync). The originating
        // session reconciles through the ack instead.
        if message.sender_id != message.receiver_id {
            for session in self
                .registry
                .sessions_except(message.sender_id, origin.id)
            {
                session.send(ServerEvent::ReceiveMessage {
                    message: message.clone(),
                });
            }
        }

        origin.send(ServerEvent::SendAck {
            temp_id,
            success: true,
            message: Some(message),
            error: None,
        });
    }

    /// Forward a typing signal to the receiver's sessions.
    ///
    /// Fire-and-forget: no persistence, no acknowledgement.
    pub fn typing(&self, sender_id: UserId, receiver_id: UserId) {
        for session in self.registry.sessions_for(receiver_id) {
            session.send(ServerEvent::Typing { sender_id });
        }
    }

    /// Receiver must exist. Self-messages are allowed (self-notes).
    async fn validate_recipient(&self, receiver_id: UserId) -> Result<(), AppError> {
        match self.users.exists(receiver_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::new(
                ErrorKind::InvalidRecipient,
                format!("Receiver {receiver_id} does not exist"),
            )),
            Err(err) => Err(err),
        }
    }
}

/// Build a failure acknowledgement from an application error.
fn failed_ack(temp_id: String, err: &AppError) -> ServerEvent {
    let code = match err.kind {
        ErrorKind::InvalidRecipient => "INVALID_RECIPIENT".to_string(),
        ErrorKind::Database => "PERSISTENCE_FAILURE".to_string(),
        _ => err.code(),
    };
    ServerEvent::SendAck {
        temp_id,
        success: false,
        message: None,
        error: Some(ErrorBody {
            code,
            message: err.message.clone(),
        }),
    }
}
