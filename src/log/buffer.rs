// src/log/buffer.rs

//! Pure chunk-to-record splitting.
//!
//! [`DecodeBuffer`] is the synchronous heart of the decoder: it is fed raw
//! stdout chunks and hands back every record that became complete. It does
//! no IO, so the reassembly rules can be tested without Tokio.
//!
//! Rules, per chunk:
//! - split on `\n`, skip empty lines;
//! - a pending fragment is prepended to the next non-empty line;
//! - a line that is not yet well-formed JSON becomes the new pending
//!   fragment and the rest of the chunk is dropped.
//!
//! The last rule means a fragment that can never become valid JSON stalls
//! the stream until it closes. The async shell logs the discarded fragment
//! at end-of-stream.

use serde_json::error::Category;

use super::record::LogRecord;

/// A line that was complete, well-formed JSON but not a usable log record.
#[derive(Debug, thiserror::Error)]
#[error("log line is not a valid record: {source}; line: {line}")]
pub struct RecordSchemaError {
    pub line: String,
    #[source]
    pub source: serde_json::Error,
}

/// Per-stream accumulator for a record split across reads.
#[derive(Debug, Default)]
pub struct DecodeBuffer {
    partial: Vec<u8>,
}

impl DecodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the currently buffered fragment (0 when none).
    pub fn pending_len(&self) -> usize {
        self.partial.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.partial.is_empty()
    }

    /// Drop the pending fragment, returning it.
    pub fn take_pending(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.partial)
    }

    /// Feed one chunk, returning the records it completed in stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<LogRecord, RecordSchemaError>> {
        let mut out = Vec::new();

        for line in chunk.split(|b| *b == b'\n') {
            if line.is_empty() {
                continue;
            }

            let candidate = if self.partial.is_empty() {
                line.to_vec()
            } else {
                let mut joined = std::mem::take(&mut self.partial);
                joined.extend_from_slice(line);
                joined
            };

            match serde_json::from_slice::<LogRecord>(&candidate) {
                Ok(record) => out.push(Ok(record)),
                Err(err) if err.classify() == Category::Data => {
                    out.push(Err(RecordSchemaError {
                        line: String::from_utf8_lossy(&candidate).into_owned(),
                        source: err,
                    }));
                }
                Err(_) => {
                    // Incomplete or malformed: wait for the next chunk.
                    self.partial = candidate;
                    break;
                }
            }
        }

        out
    }
}
