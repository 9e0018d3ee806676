//! Shared primitive types.

pub mod id;

pub use id::{MessageId, SessionId, UserId};
