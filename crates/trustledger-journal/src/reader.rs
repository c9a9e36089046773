//! Journal reader implementation.

use crate::errors::JournalError;
use crate::frame::{FrameKind, JournalHeader, RecordFrame, FRAME_HEADER_SIZE, HEADER_SIZE};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use trustledger_core::NotificationRecord;

/// How truncation at the tail of a journal is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// A truncated frame is an error.
    Strict,
    /// A truncated frame is treated as end-of-file.
    Permissive,
}

/// Sequential reader over a journal file.
///
/// # Example
///
/// ```rust,no_run
/// use trustledger_journal::{JournalReader, ReadMode};
///
/// let mut reader = JournalReader::open("ledger.tlj", ReadMode::Strict)?;
/// while let Some(record) = reader.read_record()? {
///     println!("{} {}", record.seq, record.notification.kind());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JournalReader {
    input: BufReader<File>,
    mode: ReadMode,
    position: u64,
}

impl JournalReader {
    /// Opens a journal and validates its header.
    pub fn open<P: AsRef<Path>>(path: P, mode: ReadMode) -> Result<Self, JournalError> {
        let mut input = BufReader::new(File::open(path)?);
        let mut header_bytes = [0u8; HEADER_SIZE];
        input.read_exact(&mut header_bytes).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                JournalError::InvalidHeader("file shorter than header".to_string())
            } else {
                e.into()
            }
        })?;
        JournalHeader::from_bytes(&header_bytes)?;

        Ok(Self {
            input,
            mode,
            position: HEADER_SIZE as u64,
        })
    }

    /// Byte offset of the next frame.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next frame of any kind.
    ///
    /// Returns `Ok(None)` at end-of-file, and on truncation in permissive mode.
    pub fn read_frame(&mut self) -> Result<Option<(FrameKind, Vec<u8>)>, JournalError> {
        let frame_offset = self.position;
        let mut header = [0u8; FRAME_HEADER_SIZE];
        match read_full(&mut self.input, &mut header)? {
            0 => return Ok(None),
            n if n < FRAME_HEADER_SIZE => return self.truncated(frame_offset),
            _ => {}
        }
        let frame = RecordFrame::from_bytes(&header, frame_offset)?;

        let mut payload = vec![0u8; frame.len as usize];
        if read_full(&mut self.input, &mut payload)? < payload.len() {
            return self.truncated(frame_offset);
        }

        self.position += (FRAME_HEADER_SIZE + payload.len()) as u64;
        Ok(Some((frame.kind, payload)))
    }

    /// Reads the next notification payload as untyped JSON.
    ///
    /// Skips unknown frame kinds.
    pub fn read_value(&mut self) -> Result<Option<Value>, JournalError> {
        loop {
            match self.read_frame()? {
                None => return Ok(None),
                Some((FrameKind::Notification, payload)) => {
                    let text = std::str::from_utf8(&payload)?;
                    return Ok(Some(serde_json::from_str(text)?));
                }
                Some((FrameKind::Unknown(kind), _)) => {
                    tracing::debug!(kind, offset = self.position, "skipping unknown frame");
                }
            }
        }
    }

    /// Reads the next sealed notification record.
    pub fn read_record(&mut self) -> Result<Option<NotificationRecord>, JournalError> {
        match self.read_value()? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| JournalError::InvalidRecord(e.to_string())),
        }
    }

    fn truncated<T>(&self, offset: u64) -> Result<Option<T>, JournalError> {
        match self.mode {
            ReadMode::Permissive => {
                tracing::warn!(offset, "truncated frame treated as end of journal");
                Ok(None)
            }
            ReadMode::Strict => Err(JournalError::TruncatedFrame { offset }),
        }
    }
}

// Like `read_exact`, but reports how much was read instead of failing on EOF.
fn read_full(input: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
