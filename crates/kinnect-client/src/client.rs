//! The client-side chat state machine.
//!
//! Transport-agnostic: callers feed in decoded [`ServerEvent`]s and ship
//! out the [`ClientEvent`]s this returns. All reconciliation, unread, and
//! typing state lives here so a UI layer only renders.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::warn;

use kinnect_core::types::{MessageId, UserId};
use kinnect_entity::message::{Message, MessageKind, MessageStatus};
use kinnect_realtime::event::{ClientEvent, ServerEvent};

use crate::transcript::Transcript;
use crate::typing::TypingIndicator;
use crate::unread::UnreadCounters;

/// Client state for one signed-in user across all their conversations.
pub struct ChatClient {
    user_id: UserId,
    active: Option<UserId>,
    in_view: bool,
    transcripts: HashMap<UserId, Transcript>,
    unread: UnreadCounters,
    typing: TypingIndicator,
    online: HashSet<UserId>,
    last_seen: HashMap<UserId, DateTime<Utc>>,
}

impl ChatClient {
    /// Create a client for the given signed-in user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            active: None,
            in_view: false,
            transcripts: HashMap::new(),
            unread: UnreadCounters::new(),
            typing: TypingIndicator::default(),
            online: HashSet::new(),
            last_seen: HashMap::new(),
        }
    }

    /// The signed-in user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The event that binds a fresh connection to this identity.
    pub fn join_event(&self) -> ClientEvent {
        ClientEvent::Join {
            user_id: self.user_id,
        }
    }

    /// Open the conversation with a counterparty, clearing its unread count.
    pub fn open_conversation(&mut self, peer: UserId) {
        self.active = Some(peer);
        self.in_view = true;
        self.unread.clear(peer);
    }

    /// Close the active conversation.
    pub fn close_conversation(&mut self) {
        self.active = None;
        self.in_view = false;
    }

    /// Whether the open conversation is actually on screen. Controls the
    /// delivered-vs-read acknowledgement for incoming pushes.
    pub fn set_in_view(&mut self, in_view: bool) {
        self.in_view = in_view;
    }

    /// Send a text message, recording the optimistic entry.
    pub fn send_text(&mut self, receiver: UserId, body: impl Into<String>) -> ClientEvent {
        self.send(receiver, body, MessageKind::Text, None)
    }

    /// Send a reply to an existing message.
    pub fn send_reply(
        &mut self,
        receiver: UserId,
        body: impl Into<String>,
        reply_to: MessageId,
    ) -> ClientEvent {
        self.send(receiver, body, MessageKind::Text, Some(reply_to))
    }

    fn send(
        &mut self,
        receiver: UserId,
        body: impl Into<String>,
        kind: MessageKind,
        reply_to: Option<MessageId>,
    ) -> ClientEvent {
        let sender = self.user_id;
        let (_temp_id, event) =
            self.transcript_mut(receiver)
                .send(sender, receiver, body, kind, reply_to);
        event
    }

    /// The typing signal to emit while the user composes.
    pub fn typing_event(&self, receiver: UserId) -> ClientEvent {
        ClientEvent::Typing {
            sender_id: self.user_id,
            receiver_id: receiver,
        }
    }

    /// Mark a send as locally failed (transport timeout before any ack).
    pub fn mark_send_failed(&mut self, temp_id: &str) {
        for transcript in self.transcripts.values_mut() {
            if transcript.mark_failed(temp_id) {
                return;
            }
        }
    }

    /// Apply one server event, returning any protocol reactions to send.
    pub fn handle_event(&mut self, event: ServerEvent, now: Instant) -> Vec<ClientEvent> {
        match event {
            ServerEvent::Joined { .. } => Vec::new(),
            ServerEvent::SendAck {
                temp_id,
                success,
                message,
                error,
            } => {
                match (success, message) {
                    (true, Some(message)) => {
                        let peer = self.counterparty(&message);
                        self.transcript_mut(peer).apply_ack(&temp_id, message);
                    }
                    _ => {
                        if let Some(error) = error {
                            warn!(temp_id, code = %error.code, "Send rejected");
                        }
                        self.mark_send_failed(&temp_id);
                    }
                }
                Vec::new()
            }
            ServerEvent::ReceiveMessage { message } => self.handle_push(message),
            ServerEvent::MessageStatusUpdate { message_id, status } => {
                for transcript in self.transcripts.values_mut() {
                    if transcript.apply_status(message_id, status) {
                        break;
                    }
                }
                Vec::new()
            }
            ServerEvent::Typing { sender_id } => {
                self.typing.note_typing(sender_id, now);
                Vec::new()
            }
            ServerEvent::UserOnline { user_id } => {
                self.online.insert(user_id);
                Vec::new()
            }
            ServerEvent::UserOffline { user_id, last_seen } => {
                self.online.remove(&user_id);
                self.last_seen.insert(user_id, last_seen);
                self.typing.clear(user_id);
                Vec::new()
            }
            ServerEvent::Error { code, message } => {
                warn!(code, message, "Server rejected an event");
                Vec::new()
            }
        }
    }

    /// Merge a freshly fetched history for a conversation and replay any
    /// sends still awaiting an ack (reconnect path).
    ///
    /// Fetched messages the server still holds at `sent` are acknowledged
    /// as delivered, so a receiver that was offline for the push catches
    /// up; read receipts follow when the conversation is on screen.
    pub fn resync(&mut self, peer: UserId, history: Vec<Message>) -> Vec<ClientEvent> {
        let me = self.user_id;
        let on_screen = self.active == Some(peer) && self.in_view;

        let transcript = self.transcript_mut(peer);
        transcript.merge_history(history);

        let mut reactions = Vec::new();
        for entry in transcript.entries() {
            if entry.sender_id == me || entry.status != MessageStatus::Sent {
                continue;
            }
            let Some(message_id) = entry.id else { continue };
            reactions.push(ClientEvent::MessageDelivered { message_id });
            if on_screen {
                reactions.push(ClientEvent::MessageRead { message_id });
            }
        }
        reactions.extend(transcript.take_replayable());
        reactions
    }

    fn handle_push(&mut self, message: Message) -> Vec<ClientEvent> {
        let peer = self.counterparty(&message);
        let incoming = message.sender_id != self.user_id;
        let message_id = message.id;

        let added = self.transcript_mut(peer).apply_push(message);
        if !incoming || !added {
            // Self-echo from another tab, or a duplicate: nothing to ack.
            return Vec::new();
        }

        // A real message supersedes the typing indicator.
        self.typing.clear(peer);

        // Receipt is acknowledged even when the conversation is closed;
        // only the read receipt depends on what is on screen.
        let mut reactions = vec![ClientEvent::MessageDelivered { message_id }];
        if self.active == Some(peer) {
            if self.in_view {
                reactions.push(ClientEvent::MessageRead { message_id });
            }
        } else {
            self.unread.bump(peer);
        }
        reactions
    }

    /// The transcript for a conversation, if any messages exist.
    pub fn transcript(&self, peer: UserId) -> Option<&Transcript> {
        self.transcripts.get(&peer)
    }

    /// The unread count for a counterparty.
    pub fn unread_count(&self, peer: UserId) -> u32 {
        self.unread.count(peer)
    }

    /// Total unread across all conversations.
    pub fn unread_total(&self) -> u32 {
        self.unread.total()
    }

    /// Whether the counterparty is currently typing.
    pub fn is_typing(&mut self, peer: UserId, now: Instant) -> bool {
        self.typing.is_typing(peer, now)
    }

    /// Whether the counterparty is known to be online.
    pub fn is_online(&self, peer: UserId) -> bool {
        self.online.contains(&peer)
    }

    /// When the counterparty was last seen, if known.
    pub fn last_seen(&self, peer: UserId) -> Option<DateTime<Utc>> {
        self.last_seen.get(&peer).copied()
    }

    fn counterparty(&self, message: &Message) -> UserId {
        if message.sender_id == self.user_id {
            message.receiver_id
        } else {
            message.sender_id
        }
    }

    fn transcript_mut(&mut self, peer: UserId) -> &mut Transcript {
        self.transcripts.entry(peer).or_default()
    }
}
