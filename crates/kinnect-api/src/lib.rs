//! HTTP API layer for Kinnect built on Axum.
//!
//! REST endpoints for history, presence, and status fallbacks; the
//! WebSocket upgrade for the realtime channel; and the error mapping
//! from [`kinnect_core::error::AppError`] to HTTP responses.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
