// Student ACID Lab - Transaction Log
// Timestamped, tone-tagged lines shown next to the balances

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// Colour tag of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    Neutral,
    /// Transaction opened or connection re-established
    Begin,
    /// Uncommitted change applied
    Pending,
    /// Change applied outside any transaction
    Caution,
    Success,
    /// Errors, rollbacks and crashes
    Failure,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub tone: Tone,
    pub message: String,
}

impl LogEntry {
    pub fn clock(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.clock(), self.message)
    }
}

#[derive(Debug, Default, Clone)]
pub struct TxLog {
    entries: Vec<LogEntry>,
}

impl TxLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line and mirror it to the diagnostic log
    pub fn push(&mut self, tone: Tone, message: impl Into<String>) {
        let message = message.into();
        match tone {
            Tone::Failure | Tone::Caution => tracing::warn!(target: "student_acid::txlog", "{message}"),
            _ => tracing::info!(target: "student_acid::txlog", "{message}"),
        }

        self.entries.push(LogEntry {
            timestamp: Local::now(),
            tone,
            message,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, tone: Tone) -> usize {
        self.entries.iter().filter(|e| e.tone == tone).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order_and_tone() {
        let mut log = TxLog::new();
        log.push(Tone::Begin, "BEGIN TRANSACTION");
        log.push(Tone::Failure, "Commit error: boom");

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].message, "BEGIN TRANSACTION");
        assert_eq!(log.last().unwrap().tone, Tone::Failure);
        assert_eq!(log.count(Tone::Failure), 1);
    }

    #[test]
    fn test_display_has_clock_prefix() {
        let mut log = TxLog::new();
        log.push(Tone::Neutral, "hello");

        let line = log.last().unwrap().to_string();
        // "[HH:MM:SS] hello"
        assert_eq!(line.len(), "[00:00:00] hello".len());
        assert!(line.starts_with('['));
        assert!(line.ends_with("] hello"));
    }
}
