//! Operator-facing progress output.

use nigiwai_shared::time::{get_timestamp_millis, timestamp_to_clock_time};

/// Sink for operator-facing messages
pub trait Reporter: Send + Sync {
    /// Per-user progress; shown only in verbose mode
    fn progress(&self, message: &str);

    /// Run-level messages (summaries); always shown
    fn announce(&self, message: &str);
}

/// Prints to stdout with a `[HH:MM:SS]` prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn progress(&self, message: &str) {
        tracing::debug!("{}", message);
        if self.verbose {
            println!("{}", format_line(get_timestamp_millis(), message));
        }
    }

    fn announce(&self, message: &str) {
        tracing::info!("{}", message);
        println!("{}", format_line(get_timestamp_millis(), message));
    }
}

/// How a user is named in progress output (numbered from 1)
pub fn user_label(user_index: usize) -> String {
    format!("User {}", user_index + 1)
}

/// Format one output line
pub fn format_line(timestamp_millis: i64, message: &str) -> String {
    format!("[{}] {}", timestamp_to_clock_time(timestamp_millis), message)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_prefixes_clock_time() {
        // テスト項目: 出力行に [HH:MM:SS] のプレフィックスが付く
        // given (前提条件):
        let timestamp = 1_672_498_800_000; // 2022-12-31T15:00:00Z

        // when (操作):
        let line = format_line(timestamp, "Active connections: 2/2");

        // then (期待する結果):
        assert_eq!(line, "[15:00:00] Active connections: 2/2");
    }

    #[test]
    fn test_user_label_counts_from_one() {
        // テスト項目: 進捗メッセージ上のユーザー番号は 1 から始まる
        // given (前提条件):
        let indices = [0, 9];

        // when (操作):
        let labels: Vec<String> = indices.into_iter().map(user_label).collect();

        // then (期待する結果):
        assert_eq!(labels, vec!["User 1".to_string(), "User 10".to_string()]);
    }
}
