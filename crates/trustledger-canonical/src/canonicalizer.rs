use canonical_json::to_string;
use serde_json::Value;

use crate::hygiene::{HygieneReport, HygieneStatus, HygieneWarning};
use crate::identifiers::ProfileId;
use std::fmt;

/// Largest integer that survives a round trip through an IEEE-754 double.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Profile used for every ledger payload and notification.
pub const LEDGER_PROFILE: &str = "trustledger-canonical-v1";

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Fractional or exponent-form number; ledger payloads are integer-only.
    #[error("non-integer number at {0}")]
    NonIntegerNumber(String),
    /// Negative number; ledger quantities are unsigned.
    #[error("negative number at {0}")]
    NegativeNumber(String),
    /// Serializer failure.
    #[error("other error: {0}")]
    Other(String),
}

/// Result of canonicalization.
#[derive(Debug)]
pub struct CanonicalizationResult {
    /// Canonical UTF-8 bytes for the input value.
    pub bytes: Vec<u8>,
    /// Hygiene report describing strict-mode validation.
    pub report: HygieneReport,
}

#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push(&self, segment: String) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

/// Canonicalizer that emits deterministic RFC 8785 bytes.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    profile: ProfileId,
}

impl Canonicalizer {
    /// Creates a new canonicalizer for the provided profile.
    pub fn new(profile: ProfileId) -> Self {
        Self { profile }
    }

    /// Canonicalizer for the ledger profile.
    pub fn ledger() -> Self {
        // LEDGER_PROFILE is a constant that matches the profile pattern.
        Self::new(ProfileId::parse(LEDGER_PROFILE).expect("ledger profile id is valid"))
    }

    /// Profile in use.
    pub fn profile(&self) -> &ProfileId {
        &self.profile
    }

    /// Produces canonical bytes + hygiene report.
    pub fn canonicalize(
        &self,
        value: &Value,
    ) -> Result<CanonicalizationResult, CanonicalizationError> {
        let mut report = HygieneReport::clean(self.profile.clone());
        if let Err(e) = validate(value, Path::root(), &mut report) {
            report.status = HygieneStatus::Invalid;
            return Err(e);
        }

        let canonical =
            to_string(value).map_err(|err| CanonicalizationError::Other(err.to_string()))?;

        Ok(CanonicalizationResult {
            bytes: canonical.into_bytes(),
            report,
        })
    }
}

fn validate(
    value: &Value,
    path: Path,
    report: &mut HygieneReport,
) -> Result<(), CanonicalizationError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                validate(child, path.push(key.clone()), report)?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                validate(item, path.push(format!("[{}]", idx)), report)?;
            }
            Ok(())
        }
        Value::Number(num) => {
            if num.is_f64() {
                report.bump("non_integer_numbers");
                return Err(CanonicalizationError::NonIntegerNumber(path.to_string()));
            }
            if num.is_i64() && num.as_i64().is_some_and(|n| n < 0) {
                report.bump("negative_numbers");
                return Err(CanonicalizationError::NegativeNumber(path.to_string()));
            }
            if num.as_u64().is_some_and(|n| n > MAX_SAFE_INTEGER) {
                report.warnings.push(HygieneWarning::new("UnsafeInteger"));
                report.bump("unsafe_integers");
                report.status = HygieneStatus::Lossy;
            }
            Ok(())
        }
        Value::String(_) | Value::Bool(_) | Value::Null => Ok(()),
    }
}
