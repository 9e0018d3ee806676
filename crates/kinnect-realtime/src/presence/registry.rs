//! Presence registry: maps user identities to their live session handles.
//!
//! The one piece of shared mutable state in the chat core. A single owned
//! instance is injected into the gateway and router; multiple independent
//! instances (e.g. in tests) never collide.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use kinnect_core::types::{SessionId, UserId};

use crate::session::handle::SessionHandle;

/// Result of removing a session from the registry.
#[derive(Debug, Clone)]
pub struct Unregistered {
    /// The user the session was registered under.
    pub user_id: UserId,
    /// Set when this was the user's last session (the 1→0 transition),
    /// stamped at the moment the set became empty.
    pub went_offline_at: Option<DateTime<Utc>>,
}

/// Thread-safe registry of all bound sessions, indexed by user.
///
/// A user is online iff their session set is non-empty. Only the
/// empty↔non-empty transitions are reported to callers, so presence
/// broadcasts fire exactly once regardless of how many simultaneous
/// sessions a user holds.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    /// User id → live session handles (multi-tab / multi-device).
    by_user: DashMap<UserId, Vec<Arc<SessionHandle>>>,
    /// Session id → the user it is registered under.
    by_id: DashMap<SessionId, UserId>,
    /// Stamped when a user's session set becomes empty.
    last_seen: DashMap<UserId, DateTime<Utc>>,
}

impl PresenceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under a user.
    ///
    /// Returns true on the empty→non-empty transition (the user came
    /// online). Re-registering the same session for the same user is
    /// idempotent.
    pub fn register(&self, user_id: UserId, handle: Arc<SessionHandle>) -> bool {
        self.by_id.insert(handle.id, user_id);

        let mut sessions = self.by_user.entry(user_id).or_default();
        let came_online = sessions.is_empty();
        if !sessions.iter().any(|s| s.id == handle.id) {
            sessions.push(handle);
        }
        came_online
    }

    /// Remove a session from the registry.
    ///
    /// Returns `None` for sessions that were never registered (connections
    /// that never joined). On the 1→0 transition the user's last-seen time
    /// is stamped and reported.
    pub fn unregister(&self, session_id: SessionId) -> Option<Unregistered> {
        let (_, user_id) = self.by_id.remove(&session_id)?;

        let mut went_offline_at = None;
        if let Some(mut sessions) = self.by_user.get_mut(&user_id) {
            sessions.retain(|s| s.id != session_id);
            if sessions.is_empty() {
                let now = Utc::now();
                self.last_seen.insert(user_id, now);
                went_offline_at = Some(now);
                drop(sessions);
                self.by_user.remove_if(&user_id, |_, v| v.is_empty());
            }
        }

        Some(Unregistered {
            user_id,
            went_offline_at,
        })
    }

    /// Whether the user has at least one live session.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.by_user
            .get(&user_id)
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }

    /// All live sessions for a user.
    pub fn sessions_for(&self, user_id: UserId) -> Vec<Arc<SessionHandle>> {
        self.by_user
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// A user's sessions excluding one (the originating connection).
    pub fn sessions_except(&self, user_id: UserId, except: SessionId) -> Vec<Arc<SessionHandle>> {
        self.sessions_for(user_id)
            .into_iter()
            .filter(|s| s.id != except)
            .collect()
    }

    /// All sessions not belonging to the given user (presence broadcast
    /// audience).
    pub fn sessions_excluding_user(&self, user_id: UserId) -> Vec<Arc<SessionHandle>> {
        self.by_user
            .iter()
            .filter(|entry| *entry.key() != user_id)
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    /// When the user's last session closed, if known to this process.
    pub fn last_seen(&self, user_id: UserId) -> Option<DateTime<Utc>> {
        self.last_seen.get(&user_id).map(|entry| *entry.value())
    }

    /// Ids of all currently online users.
    pub fn online_user_ids(&self) -> Vec<UserId> {
        self.by_user.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of currently online users.
    pub fn online_count(&self) -> usize {
        self.by_user.len()
    }

    /// Total number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.by_id.len()
    }
}
