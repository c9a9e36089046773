use std::fs;
use std::io::{Seek, SeekFrom, Write};
use tempfile::TempDir;
use trustledger_canonical::{AccountId, Timestamp};
use trustledger_core::Notification;
use trustledger_journal::{
    FrameKind, JournalError, JournalReader, JournalWriter, ReadMode, WriteOptions,
    MAX_PAYLOAD_SIZE,
};

fn paused(at: u64) -> Notification {
    Notification::Paused {
        by: AccountId::from_bytes([0x0A; 20]),
        at: Timestamp(at),
    }
}

fn two_record_journal(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("ledger.tlj");
    let mut writer = JournalWriter::open(&path, WriteOptions::default()).unwrap();
    writer.append_notification(paused(1)).unwrap();
    writer.append_notification(paused(2)).unwrap();
    writer.finish().unwrap();
    path
}

#[test]
fn oversized_payload_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.tlj");
    let mut writer = JournalWriter::open(&path, WriteOptions::default()).unwrap();

    let err = writer
        .append_raw(FrameKind::Notification, &vec![b' '; MAX_PAYLOAD_SIZE as usize + 1])
        .unwrap_err();
    match err {
        JournalError::PayloadTooLarge { size, max } => {
            assert_eq!(size, u64::from(MAX_PAYLOAD_SIZE) + 1);
            assert_eq!(max, MAX_PAYLOAD_SIZE);
        }
        other => panic!("expected PayloadTooLarge, got {:?}", other),
    }
    writer.finish().unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), 16);
}

#[test]
fn truncated_tail_strict_vs_permissive() {
    let dir = TempDir::new().unwrap();
    let path = two_record_journal(&dir);

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    reader.read_record().unwrap().unwrap();
    let first_end = reader.position();

    // Cut the second frame in half.
    let full = fs::metadata(&path).unwrap().len();
    let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(first_end + (full - first_end) / 2).unwrap();
    drop(file);

    let mut strict = JournalReader::open(&path, ReadMode::Strict).unwrap();
    assert_eq!(strict.read_record().unwrap().unwrap().seq, 0);
    assert!(matches!(
        strict.read_record(),
        Err(JournalError::TruncatedFrame { offset }) if offset == first_end
    ));

    let mut permissive = JournalReader::open(&path, ReadMode::Permissive).unwrap();
    assert_eq!(permissive.read_record().unwrap().unwrap().seq, 0);
    assert!(permissive.read_record().unwrap().is_none());

    // Appending after a damaged tail would break the sequence.
    assert!(JournalWriter::open(&path, WriteOptions::default()).is_err());
}

#[test]
fn truncated_frame_header() {
    let dir = TempDir::new().unwrap();
    let path = two_record_journal(&dir);

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    reader.read_record().unwrap();
    let first_end = reader.position();

    let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(first_end + 3).unwrap();
    drop(file);

    let mut strict = JournalReader::open(&path, ReadMode::Strict).unwrap();
    strict.read_record().unwrap();
    assert!(matches!(
        strict.read_frame(),
        Err(JournalError::TruncatedFrame { .. })
    ));
}

#[test]
fn corrupted_frame_reserved_bytes() {
    let dir = TempDir::new().unwrap();
    let path = two_record_journal(&dir);

    let mut file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(16 + 1)).unwrap();
    file.write_all(&[0x01]).unwrap();
    drop(file);

    let mut reader = JournalReader::open(&path, ReadMode::Permissive).unwrap();
    assert!(matches!(
        reader.read_frame(),
        Err(JournalError::InvalidFrame { offset: 16, .. })
    ));
}

#[test]
fn corrupted_header_is_rejected_by_reader_and_writer() {
    let dir = TempDir::new().unwrap();
    let path = two_record_journal(&dir);

    let mut file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(8)).unwrap();
    file.write_all(&[0xFF; 8]).unwrap();
    drop(file);

    assert!(matches!(
        JournalReader::open(&path, ReadMode::Strict),
        Err(JournalError::InvalidHeader(_))
    ));
    assert!(matches!(
        JournalWriter::open(&path, WriteOptions::default()),
        Err(JournalError::InvalidHeader(_))
    ));
}

#[test]
fn short_file_is_not_a_journal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.tlj");
    fs::write(&path, b"TLJ").unwrap();

    assert!(matches!(
        JournalWriter::open(&path, WriteOptions::default()),
        Err(JournalError::FileNotEmpty)
    ));
    assert!(matches!(
        JournalReader::open(&path, ReadMode::Permissive),
        Err(JournalError::InvalidHeader(_))
    ));
}

#[test]
fn non_record_payload_is_invalid_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.tlj");
    let mut writer = JournalWriter::open(&path, WriteOptions::default()).unwrap();
    writer
        .append_raw(FrameKind::Notification, br#"{"kind":"paused"}"#)
        .unwrap();
    writer.append_raw(FrameKind::Notification, b"\xff\xfe").unwrap();
    writer.finish().unwrap();

    let mut reader = JournalReader::open(&path, ReadMode::Strict).unwrap();
    assert!(matches!(
        reader.read_record(),
        Err(JournalError::InvalidRecord(_))
    ));
    assert!(matches!(
        reader.read_record(),
        Err(JournalError::InvalidUtf8(_))
    ));
}

#[test]
fn missing_file_without_create_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.tlj");
    let result = JournalWriter::open(
        &path,
        WriteOptions {
            create: false,
            ..WriteOptions::default()
        },
    );
    assert!(matches!(result, Err(JournalError::Io(_))));
}
