//! Optimistic conversation transcript.
//!
//! The transcript shows sent messages immediately, before the server
//! acknowledges them, and reconciles each optimistic entry with its durable
//! record when the ack arrives. Pushes and acks for the same durable id may
//! arrive in either order; the transcript deduplicates so each message
//! appears exactly once.

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use kinnect_core::types::{MessageId, UserId};
use kinnect_entity::message::{Message, MessageKind, MessageStatus};
use kinnect_realtime::event::ClientEvent;

/// Reconciliation state of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Optimistic, awaiting the server's acknowledgement.
    Pending,
    /// The send failed. The entry stays visible so the user can see what
    /// was lost; it is never retried automatically.
    Failed,
    /// Backed by a durable server record.
    Durable,
}

/// One visible message in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    /// Client-generated correlation id. Kept after reconciliation.
    pub temp_id: Option<String>,
    /// Durable identity, once known.
    pub id: Option<MessageId>,
    /// The sending user.
    pub sender_id: UserId,
    /// The receiving user.
    pub receiver_id: UserId,
    /// Message body.
    pub body: String,
    /// Content kind.
    pub kind: MessageKind,
    /// The message this one replies to, if any.
    pub reply_to: Option<MessageId>,
    /// Current delivery status.
    pub status: MessageStatus,
    /// Reconciliation state.
    pub state: EntryState,
    /// Local clock until the ack swaps in the store-assigned time.
    pub created_at: DateTime<Utc>,
    replayed: bool,
}

impl TranscriptEntry {
    fn from_durable(message: Message) -> Self {
        Self {
            temp_id: None,
            id: Some(message.id),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            body: message.body,
            kind: message.kind,
            reply_to: message.reply_to,
            status: message.status,
            state: EntryState::Durable,
            created_at: message.created_at,
            replayed: false,
        }
    }
}

/// An ordered, deduplicated view of one conversation.
///
/// Entries are kept ascending by `created_at`; optimistic entries carry the
/// local clock until their ack swaps in the authoritative time.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// The entries in display order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Number of visible entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an optimistic entry and build the wire event for it.
    ///
    /// The returned `temp_id` correlates the eventual ack with this entry.
    pub fn send(
        &mut self,
        sender_id: UserId,
        receiver_id: UserId,
        body: impl Into<String>,
        kind: MessageKind,
        reply_to: Option<MessageId>,
    ) -> (String, ClientEvent) {
        let temp_id = format!("tmp-{}", Uuid::new_v4());
        let body = body.into();

        self.entries.push(TranscriptEntry {
            temp_id: Some(temp_id.clone()),
            id: None,
            sender_id,
            receiver_id,
            body: body.clone(),
            kind,
            reply_to,
            status: MessageStatus::Sent,
            state: EntryState::Pending,
            created_at: Utc::now(),
            replayed: false,
        });

        let event = ClientEvent::SendMessage {
            temp_id: temp_id.clone(),
            sender_id,
            receiver_id,
            message: body,
            kind,
            reply_to,
        };
        (temp_id, event)
    }

    /// Reconcile a successful ack with its optimistic entry.
    ///
    /// When the push for the same durable id raced ahead of the ack, the
    /// optimistic entry is dropped instead of swapped, leaving one entry.
    pub fn apply_ack(&mut self, temp_id: &str, message: Message) {
        if self.contains(message.id) {
            debug!(temp_id, message_id = %message.id, "Push raced ahead of ack, dropping optimistic entry");
            self.entries
                .retain(|e| e.temp_id.as_deref() != Some(temp_id));
            return;
        }

        match self
            .entries
            .iter_mut()
            .find(|e| e.temp_id.as_deref() == Some(temp_id))
        {
            Some(entry) => {
                entry.id = Some(message.id);
                entry.body = message.body;
                entry.kind = message.kind;
                entry.reply_to = message.reply_to;
                entry.status = message.status;
                entry.state = EntryState::Durable;
                entry.created_at = message.created_at;
                self.sort();
            }
            // Ack for an entry this transcript never held (e.g. another
            // tab's send). Treat it like a push.
            None => {
                self.apply_push(message);
            }
        }
    }

    /// Mark an optimistic entry failed (failure ack or local send timeout).
    pub fn mark_failed(&mut self, temp_id: &str) -> bool {
        match self
            .entries
            .iter_mut()
            .find(|e| e.temp_id.as_deref() == Some(temp_id))
        {
            Some(entry) if entry.state == EntryState::Pending => {
                entry.state = EntryState::Failed;
                true
            }
            _ => false,
        }
    }

    /// Insert a pushed message, deduplicating by durable id.
    ///
    /// Returns true when the push added a new entry. A duplicate push can
    /// still advance the stored status.
    pub fn apply_push(&mut self, message: Message) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == Some(message.id)) {
            if entry.status.can_advance_to(message.status) {
                entry.status = message.status;
            }
            return false;
        }
        self.entries.push(TranscriptEntry::from_durable(message));
        self.sort();
        true
    }

    /// Advance the status of a durable entry. Never regresses.
    pub fn apply_status(&mut self, id: MessageId, status: MessageStatus) -> bool {
        match self.entries.iter_mut().find(|e| e.id == Some(id)) {
            Some(entry) if entry.status.can_advance_to(status) => {
                entry.status = status;
                true
            }
            _ => false,
        }
    }

    /// Replace the durable entries with a freshly fetched history.
    ///
    /// Optimistic entries survive the merge; they reconcile through their
    /// acks as usual.
    pub fn merge_history(&mut self, history: Vec<Message>) {
        self.entries.retain(|e| e.state != EntryState::Durable);
        for message in history {
            if !self.contains(message.id) {
                self.entries.push(TranscriptEntry::from_durable(message));
            }
        }
        self.sort();
    }

    /// Re-emit send events for entries still awaiting an ack.
    ///
    /// Each entry is replayed at most once per transcript lifetime and
    /// reuses its original `temp_id`, so a late ack for either transmission
    /// reconciles the same entry. Failed entries are terminal and excluded.
    pub fn take_replayable(&mut self) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        for entry in &mut self.entries {
            if entry.state != EntryState::Pending || entry.replayed {
                continue;
            }
            let Some(temp_id) = entry.temp_id.clone() else {
                continue;
            };
            entry.replayed = true;
            events.push(ClientEvent::SendMessage {
                temp_id,
                sender_id: entry.sender_id,
                receiver_id: entry.receiver_id,
                message: entry.body.clone(),
                kind: entry.kind,
                reply_to: entry.reply_to,
            });
        }
        events
    }

    fn contains(&self, id: MessageId) -> bool {
        self.entries.iter().any(|e| e.id == Some(id))
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn durable(sender: UserId, receiver: UserId, body: &str) -> Message {
        Message {
            id: MessageId::new(),
            sender_id: sender,
            receiver_id: receiver,
            body: body.to_string(),
            kind: MessageKind::Text,
            status: MessageStatus::Sent,
            reply_to: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ack_swaps_the_optimistic_entry_in_place() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let mut transcript = Transcript::new();

        let (temp_id, _event) = transcript.send(alice, bob, "hi", MessageKind::Text, None);
        assert_eq!(transcript.entries()[0].state, EntryState::Pending);

        let message = durable(alice, bob, "hi");
        transcript.apply_ack(&temp_id, message.clone());

        assert_eq!(transcript.len(), 1);
        let entry = &transcript.entries()[0];
        assert_eq!(entry.state, EntryState::Durable);
        assert_eq!(entry.id, Some(message.id));
        assert_eq!(entry.temp_id.as_deref(), Some(temp_id.as_str()));
        assert_eq!(entry.created_at, message.created_at);
    }

    #[test]
    fn push_racing_ahead_of_ack_leaves_one_entry() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let mut transcript = Transcript::new();

        let (temp_id, _event) = transcript.send(alice, bob, "hi", MessageKind::Text, None);
        let message = durable(alice, bob, "hi");

        // Self-echo push from another tab arrives first.
        assert!(transcript.apply_push(message.clone()));
        assert_eq!(transcript.len(), 2);

        transcript.apply_ack(&temp_id, message.clone());
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.entries()[0].id, Some(message.id));
    }

    #[test]
    fn duplicate_pushes_are_deduplicated() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let mut transcript = Transcript::new();

        let message = durable(bob, alice, "hello");
        assert!(transcript.apply_push(message.clone()));
        assert!(!transcript.apply_push(message.clone()));
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn entries_stay_ordered_by_created_at() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let mut transcript = Transcript::new();

        let mut early = durable(bob, alice, "first");
        early.created_at = Utc::now() - chrono::Duration::minutes(5);
        let late = durable(bob, alice, "second");

        transcript.apply_push(late);
        transcript.apply_push(early);

        let bodies: Vec<_> = transcript.entries().iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }

    #[test]
    fn failed_sends_stay_visible_and_are_not_replayed() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let mut transcript = Transcript::new();

        let (temp_id, _event) = transcript.send(alice, bob, "lost", MessageKind::Text, None);
        assert!(transcript.mark_failed(&temp_id));
        assert!(!transcript.mark_failed(&temp_id), "already failed");

        assert_eq!(transcript.entries()[0].state, EntryState::Failed);
        assert!(transcript.take_replayable().is_empty());
    }

    #[test]
    fn status_updates_never_regress() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let mut transcript = Transcript::new();

        let message = durable(alice, bob, "hi");
        let id = message.id;
        transcript.apply_push(message);

        assert!(transcript.apply_status(id, MessageStatus::Read));
        assert!(!transcript.apply_status(id, MessageStatus::Delivered));
        assert_eq!(transcript.entries()[0].status, MessageStatus::Read);
    }

    #[test]
    fn history_merge_keeps_optimistic_entries() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let mut transcript = Transcript::new();

        transcript.apply_push(durable(bob, alice, "old view"));
        let (_temp_id, _event) = transcript.send(alice, bob, "unacked", MessageKind::Text, None);

        let fresh = vec![durable(bob, alice, "from server")];
        transcript.merge_history(fresh);

        assert_eq!(transcript.len(), 2);
        let states: Vec<_> = transcript.entries().iter().map(|e| e.state).collect();
        assert!(states.contains(&EntryState::Pending));
        assert!(states.contains(&EntryState::Durable));
        assert!(!transcript.entries().iter().any(|e| e.body == "old view"));
    }

    #[test]
    fn replay_emits_each_pending_entry_once_with_its_temp_id() {
        let (alice, bob) = (UserId::new(), UserId::new());
        let mut transcript = Transcript::new();

        let (temp_id, _event) = transcript.send(alice, bob, "unacked", MessageKind::Text, None);

        let replayed = transcript.take_replayable();
        assert_eq!(replayed.len(), 1);
        match &replayed[0] {
            ClientEvent::SendMessage { temp_id: replay_id, message, .. } => {
                assert_eq!(replay_id, &temp_id);
                assert_eq!(message, "unacked");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        assert!(transcript.take_replayable().is_empty(), "replayed once");
    }
}
