//! Content-derived identifiers with domain-separated hashing.
//!
//! Notification ids are computed as
//! `sha256(NOTIFICATION_DOMAIN_SEPARATOR || canonical_bytes(record))`
//! where the `event_id` field is excluded from the hash input.

use crate::{CanonicalizationError, Canonicalizer, Digest, ValidationError};
use serde::Serialize;
use serde_json::Value;

/// Domain separator for notification ids.
pub const NOTIFICATION_DOMAIN_SEPARATOR: &[u8] = b"trustledger:notification:v1\0";

/// Domain separator for broadcast snapshot payload digests.
pub const SNAPSHOT_DOMAIN_SEPARATOR: &[u8] = b"trustledger:snapshot:v1\0";

/// Error during id computation.
#[derive(thiserror::Error, Debug)]
pub enum EventIdError {
    /// Serialization failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
    /// Canonicalization failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    /// Digest construction failed.
    #[error("digest construction failed: {0}")]
    Digest(#[from] ValidationError),
}

/// Computes the id of a notification record.
///
/// The record is serialized, its `event_id` member removed, every number
/// turned into a string, and the canonical bytes hashed under
/// [`NOTIFICATION_DOMAIN_SEPARATOR`].
///
/// ```rust
/// use trustledger_canonical::{compute_event_id, Canonicalizer};
/// use serde_json::json;
///
/// let record = json!({"seq": 0, "kind": "product_created"});
/// let id = compute_event_id(&record, &Canonicalizer::ledger())?;
/// assert_eq!(id.b64.len(), 43);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn compute_event_id<T: Serialize>(
    record: &T,
    canonicalizer: &Canonicalizer,
) -> Result<Digest, EventIdError> {
    let mut value: Value =
        serde_json::to_value(record).map_err(|e| EventIdError::Serialization(e.to_string()))?;

    if let Value::Object(map) = &mut value {
        map.remove("event_id");
    }

    // Ids must not depend on how a reader's JSON stack represents integers.
    stringify_numbers(&mut value);

    let result = canonicalizer.canonicalize(&value)?;
    Ok(Digest::sha256_with_domain(
        NOTIFICATION_DOMAIN_SEPARATOR,
        &result.bytes,
    ))
}

/// Returns `true` if the claimed id matches the recomputed one.
pub fn verify_event_id<T: Serialize>(
    record: &T,
    claimed_id: &Digest,
    canonicalizer: &Canonicalizer,
) -> Result<bool, EventIdError> {
    let computed_id = compute_event_id(record, canonicalizer)?;
    Ok(claimed_id == &computed_id)
}

fn stringify_numbers(value: &mut Value) {
    match value {
        Value::Number(n) => {
            let s = n.to_string();
            *value = Value::String(s);
        }
        Value::Array(arr) => {
            for v in arr {
                stringify_numbers(v);
            }
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                stringify_numbers(v);
            }
        }
        _ => {}
    }
}
