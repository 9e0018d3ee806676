//! Real-time chat engine for Kinnect.
//!
//! Reconciles the durable message store, the live presence registry, and
//! each client's optimistic local state over a reconnecting bidirectional
//! event channel:
//!
//! - [`presence::registry::PresenceRegistry`]: who is online, on which
//!   session handles.
//! - [`session::gateway::SessionGateway`]: per-connection lifecycle and
//!   inbound event dispatch.
//! - [`router::ChatRouter`]: persist-then-fan-out message delivery and
//!   typing forwarding.
//! - [`delivery::DeliveryTracker`]: the sent → delivered → read status
//!   machine.
//! - [`server::ChatEngine`]: the aggregate wiring it all together.

pub mod delivery;
pub mod event;
pub mod presence;
pub mod router;
pub mod server;
pub mod session;

pub use server::ChatEngine;
