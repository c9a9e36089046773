use crate::identifiers::ProfileId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hygiene status for canonicalization attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HygieneStatus {
    /// The input was canonicalizable without issues.
    Ok,
    /// The input was accepted but some integers exceed the interoperable
    /// range; warnings should be inspected.
    Lossy,
    /// The input was invalid and must be rejected.
    Invalid,
}

/// Stable warning code emitted by canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HygieneWarning(String);

impl HygieneWarning {
    /// Creates a warning from a literal code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The warning code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

/// Report produced alongside canonical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HygieneReport {
    /// Overall hygiene status.
    pub status: HygieneStatus,
    /// Stable warning codes.
    pub warnings: Vec<HygieneWarning>,
    /// Counters keyed by metric name.
    pub metrics: BTreeMap<String, u64>,
    /// Profile that produced the bytes.
    pub profile_id: ProfileId,
}

impl HygieneReport {
    pub(crate) fn clean(profile_id: ProfileId) -> Self {
        Self {
            status: HygieneStatus::Ok,
            warnings: Vec::new(),
            metrics: BTreeMap::new(),
            profile_id,
        }
    }

    pub(crate) fn bump(&mut self, metric: &str) {
        *self.metrics.entry(metric.to_string()).or_insert(0) += 1;
    }
}
