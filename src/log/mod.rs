// src/log/mod.rs

//! Structured log ingestion.
//!
//! - [`record`] defines [`LogRecord`] and [`Severity`].
//! - [`buffer`] holds the pure chunk reassembly logic.
//! - [`decoder`] is the async reader that turns a child's stdout into a
//!   sequence of records.

pub mod buffer;
pub mod decoder;
pub mod record;

pub use buffer::{DecodeBuffer, RecordSchemaError};
pub use decoder::{DecodeError, LogDecoder, DEFAULT_CHUNK_CAPACITY};
pub use record::{LogRecord, Severity};
