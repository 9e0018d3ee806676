//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// JWT authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify tokens.
    pub jwt_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: i64,
    /// Token issuer claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_access_ttl() -> i64 {
    60
}

fn default_issuer() -> String {
    "kinnect".to_string()
}
