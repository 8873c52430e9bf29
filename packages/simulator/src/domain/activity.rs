//! Per-connection activity timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

/// Last-seen timestamps of one connection (Unix milliseconds, 0 = never).
///
/// Written only by the owning connection's message callback and read only by
/// the owning connection's liveness monitor.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    last_message_at: AtomicI64,
    last_ping_at: AtomicI64,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an incoming frame received at `at`.
    ///
    /// Every frame refreshes `last_message_at`; ping frames also refresh
    /// `last_ping_at`.
    pub fn record_message(&self, at: i64, is_ping: bool) {
        if is_ping {
            self.last_ping_at.store(at, Ordering::Release);
        }
        self.last_message_at.store(at, Ordering::Release);
    }

    pub fn last_message_at(&self) -> i64 {
        self.last_message_at.load(Ordering::Acquire)
    }

    pub fn last_ping_at(&self) -> i64 {
        self.last_ping_at.load(Ordering::Acquire)
    }

    /// Whether both a regular message and a ping have been observed
    pub fn is_warmed_up(&self) -> bool {
        self.last_message_at() != 0 && self.last_ping_at() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tracker_is_zeroed() {
        // テスト項目: 作成直後のタイムスタンプは 0
        // given (前提条件):
        let tracker = ActivityTracker::new();

        // when (操作):

        // then (期待する結果):
        assert_eq!(tracker.last_message_at(), 0);
        assert_eq!(tracker.last_ping_at(), 0);
        assert!(!tracker.is_warmed_up());
    }

    #[test]
    fn test_regular_message_only_updates_last_message() {
        // テスト項目: 通常メッセージは last_message_at のみ更新する
        // given (前提条件):
        let tracker = ActivityTracker::new();

        // when (操作):
        tracker.record_message(1000, false);

        // then (期待する結果):
        assert_eq!(tracker.last_message_at(), 1000);
        assert_eq!(tracker.last_ping_at(), 0);
        assert!(!tracker.is_warmed_up());
    }

    #[test]
    fn test_ping_updates_both_timestamps() {
        // テスト項目: ping は両方のタイムスタンプを更新する
        // given (前提条件):
        let tracker = ActivityTracker::new();
        tracker.record_message(1000, false);

        // when (操作):
        tracker.record_message(2000, true);

        // then (期待する結果):
        assert_eq!(tracker.last_message_at(), 2000);
        assert_eq!(tracker.last_ping_at(), 2000);
        assert!(tracker.is_warmed_up());
    }
}
