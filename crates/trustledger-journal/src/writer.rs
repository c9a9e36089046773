//! Journal writer implementation.

use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, HEADER_SIZE};
use crate::reader::{JournalReader, ReadMode};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use trustledger_canonical::Canonicalizer;
use trustledger_core::{Notification, NotificationRecord};

/// Options for journal writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to fsync after each append (default: false).
    pub sync: bool,
    /// Whether to create the file if it doesn't exist (default: true).
    pub create: bool,
    /// Whether to keep existing records (default: true). When false the
    /// journal is truncated to its header.
    pub append: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            sync: false,
            create: true,
            append: true,
        }
    }
}

/// Append-only writer that seals notifications into numbered records.
///
/// Sequence numbers continue from the last record already in the file, so a
/// journal reopened for appending keeps a gapless `seq`.
///
/// # Example
///
/// ```rust,no_run
/// use trustledger_canonical::{AccountId, ProductId, Timestamp};
/// use trustledger_core::Notification;
/// use trustledger_journal::{JournalWriter, WriteOptions};
///
/// let mut writer = JournalWriter::open("ledger.tlj", WriteOptions::default())?;
/// let record = writer.append_notification(Notification::ProductCreated {
///     product_id: ProductId::from_label("widget"),
///     vendor: AccountId::from_bytes([7; 20]),
///     at: Timestamp(1_700_000_000),
/// })?;
/// println!("sealed {} as {}", record.seq, record.event_id.b64);
/// writer.finish()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalWriter {
    file: File,
    sync: bool,
    next_seq: u64,
    canonicalizer: Canonicalizer,
}

impl JournalWriter {
    /// Opens or creates a journal.
    ///
    /// An existing journal must have a valid header and, when appending, must
    /// read cleanly to the end so the next sequence number is known.
    pub fn open<P: AsRef<Path>>(path: P, options: WriteOptions) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .create(options.create)
            .write(true)
            .read(true)
            .open(path)?;

        let len = file.metadata()?.len();
        let mut next_seq = 0;
        if len == 0 {
            file.write_all(&JournalHeader::new().to_bytes())?;
            file.flush()?;
            if options.sync {
                file.sync_all()?;
            }
        } else if len < HEADER_SIZE as u64 {
            return Err(JournalError::FileNotEmpty);
        } else {
            let mut header_bytes = [0u8; HEADER_SIZE];
            file.seek(io::SeekFrom::Start(0))?;
            file.read_exact(&mut header_bytes)?;
            JournalHeader::from_bytes(&header_bytes)?;

            if options.append {
                next_seq = Self::scan_next_seq(path)?;
                file.seek(io::SeekFrom::End(0))?;
            } else {
                file.set_len(HEADER_SIZE as u64)?;
                file.seek(io::SeekFrom::Start(HEADER_SIZE as u64))?;
            }
        }

        tracing::debug!(path = %path.display(), next_seq, "journal opened");
        Ok(Self {
            file,
            sync: options.sync,
            next_seq,
            canonicalizer: Canonicalizer::ledger(),
        })
    }

    fn scan_next_seq(path: &Path) -> Result<u64, JournalError> {
        let mut reader = JournalReader::open(path, ReadMode::Strict)?;
        let mut next = 0;
        while let Some(record) = reader.read_record()? {
            next = record.seq + 1;
        }
        Ok(next)
    }

    /// Sequence number the next record will get.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Seals `notification` with the next sequence number and appends it.
    pub fn append_notification(
        &mut self,
        notification: Notification,
    ) -> Result<NotificationRecord, JournalError> {
        let record = NotificationRecord::seal(self.next_seq, notification, &self.canonicalizer)?;
        self.append_record(&record)?;
        Ok(record)
    }

    /// Appends an already sealed record. Its `seq` must be the next one.
    pub fn append_record(&mut self, record: &NotificationRecord) -> Result<(), JournalError> {
        if record.seq != self.next_seq {
            return Err(JournalError::InvalidRecord(format!(
                "record seq {} does not follow {}",
                record.seq, self.next_seq
            )));
        }
        let payload = serde_json::to_vec(record)?;
        self.append_raw(FrameKind::Notification, &payload)?;
        self.next_seq += 1;
        tracing::debug!(seq = record.seq, kind = record.notification.kind(), "record appended");
        Ok(())
    }

    /// Appends a raw frame with the given kind and payload.
    pub fn append_raw(&mut self, kind: FrameKind, payload: &[u8]) -> Result<(), JournalError> {
        let frame = RecordFrame::new(kind, payload.len())?;
        let mut bytes = Vec::with_capacity(frame.to_bytes().len() + payload.len());
        bytes.extend_from_slice(&frame.to_bytes());
        bytes.extend_from_slice(payload);

        self.file.write_all(&bytes)?;
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    /// Flushes and closes the journal.
    pub fn finish(mut self) -> Result<(), JournalError> {
        self.file.flush()?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        let _ = self.file.flush();
        if self.sync {
            let _ = self.file.sync_all();
        }
    }
}
