//! Per-counterparty typing indicator with an expiring window.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use kinnect_core::types::UserId;

/// Default typing window, matching the server's `typing_window_ms`.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1500);

/// Tracks "user is typing" state per counterparty.
///
/// Each typing event renews that user's deadline to now + window. Callers
/// pass `now` explicitly so the window is testable without sleeping.
#[derive(Debug)]
pub struct TypingIndicator {
    window: Duration,
    deadlines: HashMap<UserId, Instant>,
}

impl Default for TypingIndicator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl TypingIndicator {
    /// Create an indicator with the given window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadlines: HashMap::new(),
        }
    }

    /// Record a typing event from a counterparty, renewing their window.
    pub fn note_typing(&mut self, user_id: UserId, now: Instant) {
        self.deadlines.insert(user_id, now + self.window);
    }

    /// Whether the counterparty's window is still open. Expired windows are
    /// cleared on observation.
    pub fn is_typing(&mut self, user_id: UserId, now: Instant) -> bool {
        match self.deadlines.get(&user_id) {
            Some(deadline) if *deadline > now => true,
            Some(_) => {
                self.deadlines.remove(&user_id);
                false
            }
            None => false,
        }
    }

    /// Drop all expired windows.
    pub fn sweep(&mut self, now: Instant) {
        self.deadlines.retain(|_, deadline| *deadline > now);
    }

    /// Forget a counterparty entirely (e.g. they went offline).
    pub fn clear(&mut self, user_id: UserId) {
        self.deadlines.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_expires_after_the_configured_duration() {
        let mut typing = TypingIndicator::default();
        let user = UserId::new();
        let start = Instant::now();

        typing.note_typing(user, start);
        assert!(typing.is_typing(user, start + Duration::from_millis(1499)));
        assert!(!typing.is_typing(user, start + Duration::from_millis(1500)));
    }

    #[test]
    fn renewal_extends_the_window() {
        let mut typing = TypingIndicator::default();
        let user = UserId::new();
        let start = Instant::now();

        typing.note_typing(user, start);
        typing.note_typing(user, start + Duration::from_millis(1000));
        assert!(typing.is_typing(user, start + Duration::from_millis(2000)));
        assert!(!typing.is_typing(user, start + Duration::from_millis(2500)));
    }

    #[test]
    fn counterparties_are_independent() {
        let mut typing = TypingIndicator::default();
        let (a, b) = (UserId::new(), UserId::new());
        let start = Instant::now();

        typing.note_typing(a, start);
        assert!(typing.is_typing(a, start));
        assert!(!typing.is_typing(b, start));
    }
}
