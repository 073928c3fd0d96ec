//! Dispatch log: one entry per handler invocation.

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::Phase;

/// A record written immediately before a handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Phase the handler runs in.
    pub phase: Phase,

    /// Full name of the handler.
    pub handler: String,

    /// The rendered log line.
    pub message: String,
}

impl LogEntry {
    /// Creates the entry announcing that `handler` is about to run.
    pub fn about_to_run(phase: Phase, handler: &str) -> Self {
        Self {
            phase,
            handler: handler.to_string(),
            message: format!("About to run a {phase} event handler {handler}."),
        }
    }
}

/// Receives dispatch log entries in the order handlers are invoked.
pub trait LogSink: Send + Sync {
    /// Records an entry.
    fn record(&self, entry: LogEntry);
}

/// Forwards every entry to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn record(&self, entry: LogEntry) {
        tracing::info!(
            phase = %entry.phase,
            handler = %entry.handler,
            "{}",
            entry.message
        );
    }
}

/// Keeps entries in memory so callers can inspect the dispatch order.
///
/// Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogSink {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryLogSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Returns the recorded messages.
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }

    /// Returns the number of recorded entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes all recorded entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for MemoryLogSink {
    fn record(&self, entry: LogEntry) {
        self.lock().push(entry);
    }
}
