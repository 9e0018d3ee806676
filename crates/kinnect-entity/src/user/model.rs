//! User account entity model.
//!
//! The account store is an external collaborator of the chat core; only the
//! fields the messaging subsystem reads (identity, presence) are modeled
//! here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use kinnect_core::types::UserId;

/// A user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Avatar URL, if set.
    pub avatar: Option<String>,
    /// Whether the user currently has at least one live session.
    pub is_online: bool,
    /// Stamped when the user's last session closed.
    pub last_seen: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}
