//! Connection-scoped session handling.

pub mod gateway;
pub mod handle;

pub use gateway::SessionGateway;
pub use handle::SessionHandle;
