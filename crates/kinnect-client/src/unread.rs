//! Per-counterparty unread message counters.

use std::collections::HashMap;

use kinnect_core::types::UserId;

/// Unread counts keyed by counterparty.
///
/// Bumped for pushes into closed conversations; cleared when a conversation
/// opens.
#[derive(Debug, Default)]
pub struct UnreadCounters {
    counts: HashMap<UserId, u32>,
}

impl UnreadCounters {
    /// Create an empty counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one unread message from a counterparty.
    pub fn bump(&mut self, from: UserId) {
        *self.counts.entry(from).or_insert(0) += 1;
    }

    /// Clear a counterparty's count, returning what it was.
    pub fn clear(&mut self, from: UserId) -> u32 {
        self.counts.remove(&from).unwrap_or(0)
    }

    /// The unread count for one counterparty.
    pub fn count(&self, from: UserId) -> u32 {
        self.counts.get(&from).copied().unwrap_or(0)
    }

    /// Total unread across all conversations (badge count).
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_and_clear_per_counterparty() {
        let mut unread = UnreadCounters::new();
        let (a, b) = (UserId::new(), UserId::new());

        unread.bump(a);
        unread.bump(a);
        unread.bump(b);

        assert_eq!(unread.count(a), 2);
        assert_eq!(unread.count(b), 1);
        assert_eq!(unread.total(), 3);

        assert_eq!(unread.clear(a), 2);
        assert_eq!(unread.count(a), 0);
        assert_eq!(unread.total(), 1);
    }
}
