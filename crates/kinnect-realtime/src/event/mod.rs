//! Wire protocol for the bidirectional event channel.

pub mod types;

pub use types::{ClientEvent, ErrorBody, ServerEvent};
