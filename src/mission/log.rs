//! Append-only action log for one mission run.
//!
//! The log is an explicit value handed to each stage; entries are mirrored to
//! `tracing` so live progress and the final transcript never diverge.
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// Timestamp format used when rendering the log for display.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.at.format(LOG_TIMESTAMP_FORMAT),
            self.message
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MissionLog {
    entries: Vec<LogEntry>,
}

impl MissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message.into());
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count entries at `level`.
    pub fn count(&self, level: LogLevel) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    /// True when any entry at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.level == level && entry.message.contains(needle))
    }

    /// Render as newline-separated `[timestamp] message` lines.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&entry.to_string());
            text.push('\n');
        }
        text
    }

    fn push(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => tracing::info!(target: "mission", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "mission", "{message}"),
            LogLevel::Error => tracing::error!(target: "mission", "{message}"),
        }
        self.entries.push(LogEntry {
            at: Local::now(),
            level,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_in_order_and_counts_levels() {
        let mut log = MissionLog::new();
        log.info("start");
        log.warn("careful");
        log.error("boom");
        log.error("again");

        assert_eq!(log.len(), 4);
        assert_eq!(log.entries()[0].message, "start");
        assert_eq!(log.count(LogLevel::Error), 2);
        assert!(log.contains(LogLevel::Warn, "care"));
        assert!(!log.contains(LogLevel::Info, "boom"));
    }

    #[test]
    fn renders_timestamped_lines() {
        let mut log = MissionLog::new();
        log.info("first");
        log.info("second");
        let rendered = log.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] first"));
        // "[YYYY-mm-dd HH:MM:SS] " is 22 bytes.
        assert_eq!(lines[1].find(']'), Some(20));
    }
}
