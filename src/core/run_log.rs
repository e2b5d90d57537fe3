//! Human-readable trace of a single engine run.
//!
//! Every component receives `&mut RunLog` instead of writing to a shared
//! buffer; the entry point renders it into the `log` field of its response.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub elapsed_ms: i64,
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RunLog {
    started: Instant,
    entries: Vec<LogEntry>,
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            entries: vec![],
        }
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Debug => tracing::debug!(target: "deckorder::run", "{message}"),
            LogLevel::Info => tracing::info!(target: "deckorder::run", "{message}"),
            LogLevel::Warn => tracing::warn!(target: "deckorder::run", "{message}"),
            LogLevel::Error => tracing::error!(target: "deckorder::run", "{message}"),
        }
        self.entries.push(LogEntry {
            elapsed_ms: self.started.elapsed().as_millis() as i64,
            at: Utc::now(),
            level,
            message,
        });
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LogLevel::Error, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| entry.message.contains(needle))
    }

    pub fn count_at(&self, level: LogLevel) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.level == level)
            .count()
    }

    pub fn render(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&format!("[{}ms] {}\n", entry.elapsed_ms, entry.message));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::{LogLevel, RunLog};

    #[test]
    fn render_prefixes_every_line_with_elapsed_time() {
        let mut log = RunLog::new();
        log.info("phase one");
        log.warn("unmapped entry");

        let rendered = log.render();
        let lines = rendered.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('[') && lines[0].ends_with("phase one"));
        assert!(lines[1].contains("ms] unmapped entry"));
        assert_eq!(log.count_at(LogLevel::Warn), 1);
    }
}
