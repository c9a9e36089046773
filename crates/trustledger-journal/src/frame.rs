use crate::errors::JournalError;

/// Journal file magic bytes: `b"TLJ1"`.
pub const MAGIC: &[u8; 4] = b"TLJ1";

/// Current journal format version.
pub const VERSION: u16 = 0x0001;

/// Header size in bytes.
pub const HEADER_SIZE: usize = 16;

/// Frame header size in bytes.
pub const FRAME_HEADER_SIZE: usize = 8;

/// Largest payload a single frame may carry: 1 MiB.
pub const MAX_PAYLOAD_SIZE: u32 = 1024 * 1024;

/// Frame kind byte for a sealed notification record.
pub const FRAME_KIND_NOTIFICATION: u8 = 0x01;

/// Journal file header.
///
/// Layout: magic (4) | version u16 LE (2) | flags u16 LE (2) | reserved (8).
/// Flags and reserved bytes are written as zero and must read back as zero,
/// so only the version is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    /// Format version.
    pub version: u16,
}

impl JournalHeader {
    /// Header for the current format version.
    pub fn new() -> Self {
        Self { version: VERSION }
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        let (magic, rest) = bytes.split_at_mut(MAGIC.len());
        magic.copy_from_slice(MAGIC);
        rest[..2].copy_from_slice(&self.version.to_le_bytes());
        bytes
    }

    /// Parses and validates a header.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, JournalError> {
        let invalid = |reason: String| Err(JournalError::InvalidHeader(reason));
        let Some(bytes) = bytes.get(..HEADER_SIZE) else {
            return invalid(format!("header too short: {} bytes", bytes.len()));
        };
        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC {
            return invalid(format!("invalid magic: {:?}, expected {:?}", magic, MAGIC));
        }
        let version = u16::from_le_bytes([rest[0], rest[1]]);
        if version != VERSION {
            return invalid(format!(
                "unsupported version: 0x{:04x}, expected 0x{:04x}",
                version, VERSION
            ));
        }
        if let Some(pos) = rest[2..].iter().position(|b| *b != 0) {
            let field = if pos < 2 { "flags" } else { "reserved bytes" };
            return invalid(format!("non-zero {} at byte {}", field, MAGIC.len() + 2 + pos));
        }
        Ok(Self { version })
    }
}

impl Default for JournalHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Record frame kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// UTF-8 JSON of a sealed notification record.
    Notification,
    /// Kind written by a newer tool; readers skip it.
    Unknown(u8),
}

impl FrameKind {
    /// Decodes a kind byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            FRAME_KIND_NOTIFICATION => FrameKind::Notification,
            _ => FrameKind::Unknown(byte),
        }
    }

    /// Encodes the kind byte.
    pub fn to_byte(self) -> u8 {
        match self {
            FrameKind::Notification => FRAME_KIND_NOTIFICATION,
            FrameKind::Unknown(b) => b,
        }
    }
}

/// Record frame header.
///
/// Layout: kind (1) | three zero bytes | payload length u32 LE (4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFrame {
    /// Frame kind.
    pub kind: FrameKind,
    /// Payload length in bytes, at most [`MAX_PAYLOAD_SIZE`].
    pub len: u32,
}

impl RecordFrame {
    /// Frame header for a payload of `len` bytes.
    pub fn new(kind: FrameKind, len: usize) -> Result<Self, JournalError> {
        match u32::try_from(len) {
            Ok(len) if len <= MAX_PAYLOAD_SIZE => Ok(Self { kind, len }),
            _ => Err(JournalError::PayloadTooLarge {
                size: len as u64,
                max: MAX_PAYLOAD_SIZE,
            }),
        }
    }

    /// Serializes the frame header.
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let [a, b, c, d] = self.len.to_le_bytes();
        [self.kind.to_byte(), 0, 0, 0, a, b, c, d]
    }

    /// Parses a frame header found at byte `offset`.
    pub fn from_bytes(bytes: &[u8], offset: u64) -> Result<Self, JournalError> {
        let invalid = |reason: String| Err(JournalError::InvalidFrame { offset, reason });
        let &[kind, r0, r1, r2, a, b, c, d] = bytes else {
            return invalid(format!(
                "frame header must be {} bytes, got {}",
                FRAME_HEADER_SIZE,
                bytes.len()
            ));
        };
        if [r0, r1, r2] != [0; 3] {
            return invalid("non-zero reserved bytes".to_string());
        }
        let len = u32::from_le_bytes([a, b, c, d]);
        if len > MAX_PAYLOAD_SIZE {
            return invalid(format!(
                "payload size {} exceeds maximum {}",
                len, MAX_PAYLOAD_SIZE
            ));
        }
        Ok(Self {
            kind: FrameKind::from_byte(kind),
            len,
        })
    }
}
