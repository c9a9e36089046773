//! Canonical primitives for trustledger: identifiers, digests and the
//! deterministic encoding used for broadcast payloads and notification ids.
//!
//! Every byte string that is hashed or sent across a domain boundary is
//! produced by [`Canonicalizer`] so that independent implementations agree
//! on it bit for bit.
//!
#![deny(missing_docs)]

/// Canonicalization helpers for deterministic hashing.
pub mod canonicalizer;
/// Digest primitives.
pub mod digest;
/// Content-derived notification ids.
pub mod event_id;
/// Hygiene report types emitted during canonicalization.
pub mod hygiene;
/// Fixed-width identifiers, domains and timestamps.
pub mod identifiers;
/// Validation errors for canonical types.
pub mod validation;

pub use canonicalizer::{
    CanonicalizationError, CanonicalizationResult, Canonicalizer, LEDGER_PROFILE,
    MAX_SAFE_INTEGER,
};
pub use digest::{sha256_raw, Digest, DigestAlg};
pub use event_id::{
    compute_event_id, verify_event_id, EventIdError, NOTIFICATION_DOMAIN_SEPARATOR,
    SNAPSHOT_DOMAIN_SEPARATOR,
};
pub use hygiene::{HygieneReport, HygieneStatus, HygieneWarning};
pub use identifiers::{
    AccountId, DomainId, MessageId, ProductId, ProfileId, Timestamp, TransactionId,
};
pub use validation::ValidationError;
