//! JWT claim set.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kinnect_core::types::UserId;

/// Claims carried by a Kinnect access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: Uuid,
    /// Username, cached for display and logging.
    pub username: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Unique token id.
    pub jti: Uuid,
}

impl Claims {
    /// The verified user identity.
    pub fn user_id(&self) -> UserId {
        UserId::from_uuid(self.sub)
    }
}
