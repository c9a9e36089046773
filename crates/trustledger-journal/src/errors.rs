use thiserror::Error;
use trustledger_canonical::EventIdError;

/// Errors that can occur during journal operations.
#[derive(Error, Debug)]
pub enum JournalError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid file header (magic, version, or flags).
    #[error("invalid journal header: {0}")]
    InvalidHeader(String),
    /// Invalid frame structure (reserved bytes or length).
    #[error("invalid frame at offset {offset}: {reason}")]
    InvalidFrame {
        /// Byte offset where the frame starts.
        offset: u64,
        /// Reason for invalidity.
        reason: String,
    },
    /// Payload exceeds the per-frame limit.
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge {
        /// Actual payload size.
        size: u64,
        /// Maximum allowed size.
        max: u32,
    },
    /// Payload is not UTF-8.
    #[error("invalid UTF-8 in notification payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// Payload is not a notification record.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    /// Record is structurally valid JSON but not a sealed record.
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    /// Sealing or recomputing a record id failed.
    #[error("event id: {0}")]
    EventId(#[from] EventIdError),
    /// Existing file is too short to hold a header.
    #[error("file is not empty; cannot initialize header")]
    FileNotEmpty,
    /// Truncated frame detected in strict mode.
    #[error("truncated frame at offset {offset}")]
    TruncatedFrame {
        /// Byte offset where truncation occurred.
        offset: u64,
    },
}
