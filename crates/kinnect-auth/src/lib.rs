//! JWT-based identity verification.
//!
//! The chat core treats authentication as a collaborator: the HTTP layer
//! verifies a token before a connection is admitted, and hands the verified
//! user identity to the session gateway.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{JwtDecoder, JwtEncoder};
