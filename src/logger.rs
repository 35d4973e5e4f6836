//! Per-client log sink
//!
//! Each [`LineClient`](crate::LineClient) carries its own logger instead of a
//! process-wide one, so tests and embedders can capture what a single client
//! writes.

use parking_lot::Mutex;

/// A sink for the client's diagnostic lines.
pub trait Logger: Send + Sync {
    /// Write one log line.
    fn log_line(&self, line: &str);
}

/// Default logger, forwards to `tracing` at info level.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log_line(&self, line: &str) {
        tracing::info!(target: "line_bot_api", "{}", line);
    }
}

/// Logger that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }
}

impl Logger for MemoryLogger {
    fn log_line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
