//! Bounded, newest-first operator log.
//!
//! Each entry is stamped with simulated session time and mirrored to
//! `tracing` at the matching level, so the same events reach both the
//! operator view and the process log.

use std::collections::VecDeque;

use serde::Serialize;

use crate::util::format_timestamp;

/// Maximum number of retained entries; older ones are discarded.
pub const LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub at_ms: u64,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    /// Rendered form: `[HH:MM:SS.mmm] [TAG] message`, tag omitted for info.
    pub fn line(&self) -> String {
        let ts = format_timestamp(self.at_ms);
        match self.severity {
            Severity::Info => format!("[{ts}] {}", self.message),
            Severity::Warn => format!("[{ts}] [WARN] {}", self.message),
            Severity::Error => format!("[{ts}] [ERROR] {}", self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    pub fn push(&mut self, at_ms: u64, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => tracing::info!(at_ms, "{message}"),
            Severity::Warn => tracing::warn!(at_ms, "{message}"),
            Severity::Error => tracing::error!(at_ms, "{message}"),
        }
        self.entries.push_front(LogEntry {
            at_ms,
            severity,
            message,
        });
        self.entries.truncate(LOG_CAPACITY);
    }

    pub fn info(&mut self, at_ms: u64, message: impl Into<String>) {
        self.push(at_ms, Severity::Info, message);
    }

    pub fn warn(&mut self, at_ms: u64, message: impl Into<String>) {
        self.push(at_ms, Severity::Warn, message);
    }

    pub fn error(&mut self, at_ms: u64, message: impl Into<String>) {
        self.push(at_ms, Severity::Error, message);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Rendered lines, newest first.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(LogEntry::line).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
