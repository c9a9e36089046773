//! Verification helpers for journal records.

use crate::errors::JournalError;
use serde_json::Value;
use trustledger_canonical::{compute_event_id, Canonicalizer, Digest};
use trustledger_core::NotificationRecord;

/// Checks a typed record against its claimed `event_id`.
pub fn verify_record(
    record: &NotificationRecord,
    canonicalizer: &Canonicalizer,
) -> Result<bool, JournalError> {
    Ok(record.verify(canonicalizer)?)
}

/// Checks a raw payload against its claimed `event_id`.
///
/// Works on the JSON as stored, so members a typed decode would ignore still
/// count towards the id.
pub fn verify_value(value: &Value, canonicalizer: &Canonicalizer) -> Result<bool, JournalError> {
    let claimed_id = value
        .get("event_id")
        .and_then(|v| serde_json::from_value::<Digest>(v.clone()).ok())
        .ok_or_else(|| JournalError::InvalidRecord("missing or invalid event_id".to_string()))?;

    let computed_id = compute_event_id(value, canonicalizer)?;
    Ok(claimed_id == computed_id)
}
