// src/watch/sink.rs

//! Where consumed records get echoed.

use std::io::Write;

use owo_colors::OwoColorize;

use crate::log::LogRecord;
use crate::types::NodeRole;

/// Receives every record a watcher consumes, in stream order.
pub trait RecordSink: Send + Sync {
    fn emit(&self, role: NodeRole, record: &LogRecord);
}

/// Echo to the harness's stdout, one JSON line per record, flushed
/// immediately. Bootstrap lines are white, replicator lines yellow.
#[derive(Debug, Clone, Copy)]
pub struct StdoutSink {
    color: bool,
}

impl StdoutSink {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Render the line written for `record`, without trailing newline.
    pub fn render(&self, role: NodeRole, record: &LogRecord) -> String {
        let line = format!("[{role}] {}", record.to_json_line());
        if !self.color {
            return line;
        }
        match role {
            NodeRole::Bootstrap => line.white().to_string(),
            NodeRole::Replicator => line.yellow().to_string(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl RecordSink for StdoutSink {
    fn emit(&self, role: NodeRole, record: &LogRecord) {
        let line = self.render(role, record);
        let mut out = std::io::stdout().lock();
        // A closed stdout must not take the run down with it.
        let _ = writeln!(out, "{line}").and_then(|()| out.flush());
    }
}
