//! Chat message entity and related enums.

pub mod kind;
pub mod model;
pub mod status;

pub use kind::MessageKind;
pub use model::{Message, NewMessage};
pub use status::MessageStatus;
