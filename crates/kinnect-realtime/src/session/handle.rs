//! Individual connection session handle.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use kinnect_core::types::{SessionId, UserId};

use crate::event::ServerEvent;

/// A handle to a single live connection.
///
/// Holds the sender channel for pushing events to the client, the identity
/// the connection is bound to (none until a `join`), and liveness state.
/// Owned by the session gateway for the connection's lifetime.
#[derive(Debug)]
pub struct SessionHandle {
    /// Unique session id.
    pub id: SessionId,
    /// Bound user identity; `None` while the connection is unbound.
    user_id: RwLock<Option<UserId>>,
    /// Sender for outbound events.
    sender: mpsc::Sender<ServerEvent>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
}

impl SessionHandle {
    /// Create a new unbound session handle.
    pub fn new(sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: SessionId::new(),
            user_id: RwLock::new(None),
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// The currently bound user, if any.
    pub fn bound_user(&self) -> Option<UserId> {
        *self.user_id.read().expect("user_id lock poisoned")
    }

    /// Bind the handle to a user identity, returning the previous binding.
    ///
    /// Last join wins: callers use the returned value to migrate presence
    /// registration when the identity changes.
    pub fn bind(&self, user_id: UserId) -> Option<UserId> {
        self.user_id
            .write()
            .expect("user_id lock poisoned")
            .replace(user_id)
    }

    /// Push an event to this connection.
    ///
    /// Returns false when the event was dropped (dead connection or full
    /// buffer). A closed channel marks the handle dead.
    pub fn send(&self, event: ServerEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session_id = %self.id, "Session send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                false
            }
        }
    }

    /// Check if the connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection as closed.
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
