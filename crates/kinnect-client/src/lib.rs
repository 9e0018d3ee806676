//! Transport-agnostic client runtime for Kinnect chat.
//!
//! Mirrors the server's wire protocol from the other side: optimistic
//! sends reconciled against acks and pushes, per-conversation unread
//! counters, and expiring typing indicators. A UI layer owns the socket
//! and rendering; this crate owns the state.

pub mod client;
pub mod transcript;
pub mod typing;
pub mod unread;

pub use client::ChatClient;
pub use transcript::{EntryState, Transcript, TranscriptEntry};
pub use typing::TypingIndicator;
pub use unread::UnreadCounters;
