//! Domain entity models for Kinnect.
//!
//! Plain data structures shared by the database, realtime, and API crates,
//! plus the storage interfaces ([`store::MessageStore`], [`store::UserStore`])
//! that decouple the realtime engine from any concrete backend.

pub mod message;
pub mod store;
pub mod user;

pub use message::{Message, MessageKind, MessageStatus, NewMessage};
pub use user::User;
