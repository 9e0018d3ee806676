//! Real-time chat engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) chat engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Outbound channel buffer size per connection.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum simultaneous WebSocket connections per user.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Client-side typing indicator window in milliseconds.
    ///
    /// The indicator clears this long after the last typing event with no
    /// renewal.
    #[serde(default = "default_typing_window")]
    pub typing_window_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            max_connections_per_user: default_max_connections_per_user(),
            typing_window_ms: default_typing_window(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_connections_per_user() -> usize {
    5
}

fn default_typing_window() -> u64 {
    1500
}
