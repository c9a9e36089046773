use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};

use crate::validation::ValidationError;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// SHA-256.
    #[serde(rename = "sha-256")]
    Sha256,
}

/// Algorithm + bytes digest, encoded as base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base64URL (no padding) digest bytes.
    #[serde(rename = "b64")]
    pub b64: String,
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, b64: impl Into<String>) -> Result<Self, ValidationError> {
        let b64 = b64.into();
        let re = Regex::new(r"^[A-Za-z0-9_-]{43}$").expect("invalid regex");
        if !re.is_match(&b64) {
            return Err(ValidationError::PatternMismatch {
                field: "digest",
                value: b64,
            });
        }
        Ok(Digest { alg, b64 })
    }

    /// Hashes `domain || bytes` with SHA-256.
    ///
    /// Every hash in the ledger is domain-separated so that a notification id
    /// can never collide with a snapshot digest over identical bytes.
    pub fn sha256_with_domain(domain: &[u8], bytes: &[u8]) -> Self {
        let raw = sha256_raw(domain, bytes);
        Digest {
            alg: DigestAlg::Sha256,
            b64: base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(raw),
        }
    }

    /// Decodes the digest bytes.
    pub fn to_bytes(&self) -> Result<[u8; 32], ValidationError> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(&self.b64)
            .map_err(|_| ValidationError::PatternMismatch {
                field: "digest",
                value: self.b64.clone(),
            })?;
        decoded
            .try_into()
            .map_err(|_| ValidationError::PatternMismatch {
                field: "digest",
                value: self.b64.clone(),
            })
    }
}

/// Raw SHA-256 over `domain || bytes`.
pub fn sha256_raw(domain: &[u8], bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(bytes);
    hasher.finalize().into()
}
