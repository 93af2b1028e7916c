// src/log/decoder.rs

//! Async shell around [`DecodeBuffer`].
//!
//! Reads raw chunks from a child's stdout and yields decoded records one at
//! a time. The sequence ends (for good) when the reader hits end-of-stream.

use std::collections::VecDeque;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{trace, warn};

use super::buffer::{DecodeBuffer, RecordSchemaError};
use super::record::LogRecord;

/// Default read size per chunk.
pub const DEFAULT_CHUNK_CAPACITY: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("reading log stream: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Schema(#[from] RecordSchemaError),
}

/// Lazily decodes newline-delimited JSON log records from `R`.
#[derive(Debug)]
pub struct LogDecoder<R> {
    reader: R,
    buffer: DecodeBuffer,
    ready: VecDeque<Result<LogRecord, RecordSchemaError>>,
    chunk: Vec<u8>,
    finished: bool,
}

impl<R: AsyncRead + Unpin> LogDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_chunk_capacity(reader, DEFAULT_CHUNK_CAPACITY)
    }

    pub fn with_chunk_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader,
            buffer: DecodeBuffer::new(),
            ready: VecDeque::new(),
            chunk: vec![0; capacity.max(1)],
            finished: false,
        }
    }

    /// True once end-of-stream was reached and every decoded record handed out.
    pub fn is_finished(&self) -> bool {
        self.finished && self.ready.is_empty()
    }

    /// Next record, or `Ok(None)` at end-of-stream.
    ///
    /// Cancel safe: if the future is dropped while waiting for a chunk, no
    /// data is lost and the next call picks up where this one left off.
    pub async fn next_record(&mut self) -> Result<Option<LogRecord>, DecodeError> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return item.map(Some).map_err(DecodeError::from);
            }
            if self.finished {
                return Ok(None);
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                self.finished = true;
                if self.buffer.has_pending() {
                    let fragment = self.buffer.take_pending();
                    warn!(
                        bytes = fragment.len(),
                        fragment = %String::from_utf8_lossy(&fragment),
                        "log stream closed with an incomplete record; discarding it"
                    );
                }
                continue;
            }

            trace!(bytes = n, "read log chunk");
            self.ready.extend(self.buffer.feed(&self.chunk[..n]));
        }
    }
}
