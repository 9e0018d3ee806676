//! HTTP and WebSocket handlers.

pub mod health;
pub mod message;
pub mod user;
pub mod ws;
