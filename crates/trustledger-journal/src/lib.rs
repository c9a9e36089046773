//! Append-only journal of sealed trustledger notifications.
//!
//! This crate provides:
//! - Framed, append-only storage for notification records
//! - Reader/writer APIs with strict and permissive modes
//! - Event id checks for stored records
//!
//! ## Format
//!
//! A 16-byte header (`TLJ1`, version 1, zero flags and reserved bytes)
//! followed by frames: kind (1), reserved (3), payload length u32 LE (4),
//! payload. Kind `0x01` carries the JSON of a [`NotificationRecord`]. Readers
//! skip kinds they do not know.
//!
//! ```rust,no_run
//! use trustledger_canonical::{AccountId, Canonicalizer, ProductId, Timestamp};
//! use trustledger_core::Notification;
//! use trustledger_journal::{verify_record, JournalReader, JournalWriter, ReadMode, WriteOptions};
//!
//! let mut writer = JournalWriter::open("ledger.tlj", WriteOptions::default())?;
//! writer.append_notification(Notification::Paused {
//!     by: AccountId::from_bytes([1; 20]),
//!     at: Timestamp(1_700_000_000),
//! })?;
//! writer.finish()?;
//!
//! let canonicalizer = Canonicalizer::ledger();
//! let mut reader = JournalReader::open("ledger.tlj", ReadMode::Strict)?;
//! while let Some(record) = reader.read_record()? {
//!     assert!(verify_record(&record, &canonicalizer)?);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`NotificationRecord`]: trustledger_core::NotificationRecord

#![deny(missing_docs)]

/// Error types for journal operations.
pub mod errors;
/// Frame structure and serialization.
pub mod frame;
/// Journal reader implementation.
pub mod reader;
/// Verification helpers for journal records.
pub mod verification;
/// Journal writer implementation.
pub mod writer;

pub use errors::JournalError;
pub use frame::{FrameKind, JournalHeader, RecordFrame, MAX_PAYLOAD_SIZE};
pub use reader::{JournalReader, ReadMode};
pub use verification::{verify_record, verify_value};
pub use writer::{JournalWriter, WriteOptions};
