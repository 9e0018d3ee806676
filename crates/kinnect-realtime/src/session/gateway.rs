//! Session gateway: connection lifecycle and inbound event dispatch.
//!
//! Each connection moves through Connecting → Unbound → Bound → Closed.
//! Transport-level authentication happens before the gateway sees the
//! connection; identity binding happens on the `join` event.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use kinnect_core::config::realtime::RealtimeConfig;
use kinnect_core::error::ErrorKind;
use kinnect_core::types::UserId;
use kinnect_entity::message::NewMessage;
use kinnect_entity::store::UserStore;

use crate::delivery::DeliveryTracker;
use crate::event::{ClientEvent, ServerEvent};
use crate::presence::registry::PresenceRegistry;
use crate::router::ChatRouter;

use super::handle::SessionHandle;

/// Accepts connections, binds them to identities, and dispatches inbound
/// events to the router and delivery tracker.
pub struct SessionGateway {
    registry: Arc<PresenceRegistry>,
    router: Arc<ChatRouter>,
    delivery: Arc<DeliveryTracker>,
    users: Arc<dyn UserStore>,
    config: RealtimeConfig,
}

impl SessionGateway {
    /// Create a new gateway.
    pub fn new(
        registry: Arc<PresenceRegistry>,
        router: Arc<ChatRouter>,
        delivery: Arc<DeliveryTracker>,
        users: Arc<dyn UserStore>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            registry,
            router,
            delivery,
            users,
            config,
        }
    }

    /// Open a new unbound session.
    ///
    /// Returns the handle and the receiver end of its outbound event
    /// channel. The connection can receive nothing until it joins.
    pub fn open(&self) -> (Arc<SessionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(SessionHandle::new(tx));
        info!(session_id = %handle.id, "Session opened");
        (handle, rx)
    }

    /// Process one inbound text frame from a connection.
    pub async fn handle_frame(&self, handle: &Arc<SessionHandle>, raw: &str) {
        let event: ClientEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                handle.send(ServerEvent::Error {
                    code: "INVALID_MESSAGE".to_string(),
                    message: format!("Failed to parse event: {e}"),
                });
                return;
            }
        };

        self.handle_event(handle, event).await;
    }

    /// Dispatch a parsed inbound event.
    pub async fn handle_event(&self, handle: &Arc<SessionHandle>, event: ClientEvent) {
        if let ClientEvent::Join { user_id } = event {
            self.join(handle, user_id).await;
            return;
        }

        // Everything except join requires a bound identity.
        let Some(bound) = handle.bound_user() else {
            debug!(session_id = %handle.id, "Rejected event from unbound session");
            handle.send(ServerEvent::Error {
                code: ErrorKind::Authentication.to_string(),
                message: "Join before sending events".to_string(),
            });
            return;
        };

        match event {
            ClientEvent::Join { .. } => unreachable!("handled above"),
            ClientEvent::SendMessage {
                temp_id,
                sender_id,
                receiver_id,
                message,
                kind,
                reply_to,
            } => {
                if sender_id != bound {
                    handle.send(ServerEvent::Error {
                        code: ErrorKind::Authentication.to_string(),
                        message: "senderId does not match the bound identity".to_string(),
                    });
                    return;
                }
                let new = NewMessage {
                    sender_id,
                    receiver_id,
                    body: message,
                    kind,
                    reply_to,
                };
                self.router.send(handle, temp_id, new).await;
            }
            ClientEvent::MessageDelivered { message_id } => {
                if let Err(e) = self.delivery.mark_delivered(message_id).await {
                    self.log_status_failure(handle, "messageDelivered", &e);
                }
            }
            ClientEvent::MessageRead { message_id } => {
                if let Err(e) = self.delivery.mark_read(message_id).await {
                    self.log_status_failure(handle, "messageRead", &e);
                }
            }
            ClientEvent::Typing {
                sender_id,
                receiver_id,
            } => {
                self.router.typing(sender_id, receiver_id);
            }
        }
    }

    /// Bind a connection to a user identity and register presence.
    ///
    /// Idempotent for a repeated join with the same id; a join with a
    /// different id migrates the registration (last join wins).
    pub async fn join(&self, handle: &Arc<SessionHandle>, user_id: UserId) {
        let previous = handle.bind(user_id);

        if let Some(prev) = previous {
            if prev != user_id {
                // The session is still registered under the old identity;
                // tear that registration down first.
                if let Some(unreg) = self.registry.unregister(handle.id) {
                    if let Some(at) = unreg.went_offline_at {
                        self.broadcast_offline(unreg.user_id, at).await;
                    }
                }
                info!(
                    session_id = %handle.id,
                    from = %prev,
                    to = %user_id,
                    "Session rebound to a new identity"
                );
            }
        }

        let came_online = self.registry.register(user_id, handle.clone());

        self.enforce_session_limit(user_id, handle);

        if came_online {
            for session in self.registry.sessions_excluding_user(user_id) {
                session.send(ServerEvent::UserOnline { user_id });
            }
            // Best-effort: presence persistence never blocks the join.
            if let Err(e) = self.users.set_presence(user_id, true, None).await {
                warn!(user_id = %user_id, error = %e, "Failed to persist online state");
            }
            info!(user_id = %user_id, session_id = %handle.id, "User came online");
        } else {
            debug!(user_id = %user_id, session_id = %handle.id, "Additional session joined");
        }

        handle.send(ServerEvent::Joined { user_id });
    }

    /// Tear down a session on transport disconnect.
    ///
    /// Safe to call for sessions that never joined.
    pub async fn close(&self, handle: &Arc<SessionHandle>) {
        handle.mark_closed();

        let Some(unreg) = self.registry.unregister(handle.id) else {
            info!(session_id = %handle.id, "Unbound session closed");
            return;
        };

        info!(
            session_id = %handle.id,
            user_id = %unreg.user_id,
            "Session closed"
        );

        if let Some(at) = unreg.went_offline_at {
            self.broadcast_offline(unreg.user_id, at).await;
        }
    }

    async fn broadcast_offline(&self, user_id: UserId, last_seen: chrono::DateTime<chrono::Utc>) {
        for session in self.registry.sessions_excluding_user(user_id) {
            session.send(ServerEvent::UserOffline { user_id, last_seen });
        }
        // Best-effort: a persistence failure must not block teardown.
        if let Err(e) = self
            .users
            .set_presence(user_id, false, Some(last_seen))
            .await
        {
            warn!(user_id = %user_id, error = %e, "Failed to persist offline state");
        }
        info!(user_id = %user_id, "User went offline");
    }

    /// Evict the oldest session when a user exceeds the per-user limit.
    fn enforce_session_limit(&self, user_id: UserId, newest: &Arc<SessionHandle>) {
        let sessions = self.registry.sessions_for(user_id);
        if sessions.len() <= self.config.max_connections_per_user {
            return;
        }

        let oldest = sessions
            .iter()
            .filter(|s| s.id != newest.id)
            .min_by_key(|s| s.connected_at);
        if let Some(oldest) = oldest {
            warn!(
                user_id = %user_id,
                session_id = %oldest.id,
                count = sessions.len(),
                max = self.config.max_connections_per_user,
                "User over session limit, evicting oldest"
            );
            oldest.mark_closed();
            self.registry.unregister(oldest.id);
        }
    }

    fn log_status_failure(
        &self,
        handle: &SessionHandle,
        event: &str,
        err: &kinnect_core::AppError,
    ) {
        // Unknown ids are logged and swallowed: nothing is pushed and the
        // stored status stays where it was.
        if err.kind == ErrorKind::NotFound {
            warn!(session_id = %handle.id, event, error = %err, "Status update for unknown message");
        } else {
            warn!(session_id = %handle.id, event, error = %err, "Status update failed");
        }
    }
}
