//! Shared test helpers: in-memory stores and an engine harness.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;

use kinnect_core::error::AppError;
use kinnect_core::result::AppResult;
use kinnect_core::types::{MessageId, UserId};
use kinnect_entity::message::{Message, MessageStatus, NewMessage};
use kinnect_entity::store::{MessageStore, StatusAdvance, UserStore};
use kinnect_entity::user::User;
use kinnect_realtime::event::ServerEvent;
use kinnect_realtime::session::handle::SessionHandle;
use kinnect_realtime::ChatEngine;

/// In-memory [`MessageStore`] with strictly increasing creation times.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: Mutex<Vec<Message>>,
    clock: AtomicI64,
    fail_next_append: AtomicBool,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next append fail with a database error.
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }

    pub fn stored(&self, id: MessageId) -> Option<Message> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        Utc::now() + Duration::microseconds(tick)
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(&self, new: NewMessage) -> AppResult<Message> {
        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(AppError::database("append failed (injected)"));
        }
        let message = Message {
            id: MessageId::new(),
            sender_id: new.sender_id,
            receiver_id: new.receiver_id,
            body: new.body,
            kind: new.kind,
            status: MessageStatus::Sent,
            reply_to: new.reply_to,
            created_at: self.next_timestamp(),
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn history(&self, a: UserId, b: UserId) -> AppResult<Vec<Message>> {
        let mut result: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.in_conversation(a, b))
            .cloned()
            .collect();
        result.sort_by_key(|m| m.created_at);
        Ok(result)
    }

    async fn advance_status(
        &self,
        id: MessageId,
        status: MessageStatus,
    ) -> AppResult<StatusAdvance> {
        let mut messages = self.messages.lock().unwrap();
        let message = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::not_found(format!("Message {id} not found")))?;

        let changed = message.status.can_advance_to(status);
        if changed {
            message.status = status;
        }
        Ok(StatusAdvance {
            message: message.clone(),
            changed,
        })
    }

    async fn get(&self, id: MessageId) -> AppResult<Option<Message>> {
        Ok(self.stored(id))
    }
}

/// In-memory [`UserStore`] recording presence writes for assertions.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account and return its id.
    pub fn add_user(&self, username: &str) -> UserId {
        let id = UserId::new();
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                username: username.to_string(),
                email: format!("{username}@example.com"),
                avatar: None,
                is_online: false,
                last_seen: None,
                created_at: Utc::now(),
            },
        );
        id
    }

    /// The persisted (online, last_seen) pair for a user.
    pub fn presence_of(&self, id: UserId) -> Option<(bool, Option<DateTime<Utc>>)> {
        self.users
            .lock()
            .unwrap()
            .get(&id)
            .map(|u| (u.is_online, u.last_seen))
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn exists(&self, id: UserId) -> AppResult<bool> {
        Ok(self.users.lock().unwrap().contains_key(&id))
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn set_presence(
        &self,
        id: UserId,
        online: bool,
        last_seen: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        user.is_online = online;
        if last_seen.is_some() {
            user.last_seen = last_seen;
        }
        Ok(())
    }
}

/// A chat engine over in-memory stores.
pub struct TestEngine {
    pub engine: ChatEngine,
    pub messages: Arc<MemoryMessageStore>,
    pub users: Arc<MemoryUserStore>,
}

impl TestEngine {
    pub fn new() -> Self {
        let messages = Arc::new(MemoryMessageStore::new());
        let users = Arc::new(MemoryUserStore::new());
        let engine = ChatEngine::new(
            kinnect_core::config::realtime::RealtimeConfig::default(),
            messages.clone(),
            users.clone(),
        );
        Self {
            engine,
            messages,
            users,
        }
    }

    /// Open a connection and join as the given user.
    pub async fn connect(
        &self,
        user_id: UserId,
    ) -> (Arc<SessionHandle>, mpsc::Receiver<ServerEvent>) {
        let (handle, mut rx) = self.engine.gateway.open();
        self.engine.gateway.join(&handle, user_id).await;
        // Swallow the join confirmation so tests see only what they caused.
        match rx.try_recv() {
            Ok(ServerEvent::Joined { .. }) => {}
            other => panic!("expected join confirmation, got {other:?}"),
        }
        (handle, rx)
    }
}

/// Drain everything currently buffered on a session's receiver.
pub fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
