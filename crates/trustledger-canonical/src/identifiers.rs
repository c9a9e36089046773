use crate::digest::sha256_raw;
use crate::validation::ValidationError;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! fixed_id {
    ($name:ident, $len:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Width of the identifier in bytes.
            pub const LEN: usize = $len;

            /// The all-zero identifier. Never a valid live reference.
            pub const ZERO: Self = Self([0u8; $len]);

            /// Wraps raw bytes without validation.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Returns the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// True for the zero/null identity.
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }

            /// Parses a `0x`-prefixed hex string of exactly the identifier width.
            pub fn parse(value: impl AsRef<str>) -> Result<Self, ValidationError> {
                let s = value.as_ref();
                let pattern = format!(r"^0x[0-9a-fA-F]{{{}}}$", $len * 2);
                if !Regex::new(&pattern).expect("invalid regex").is_match(s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s.to_string(),
                    });
                }
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(&s[2..], &mut bytes).map_err(|_| {
                    ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s.to_string(),
                    }
                })?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(de::Error::custom)
            }
        }
    };
}

fixed_id!(
    ProductId,
    32,
    "Opaque 32-byte product identifier. Non-zero once registered."
);
fixed_id!(
    TransactionId,
    32,
    "Opaque 32-byte proof-of-purchase identifier, consumable exactly once."
);
fixed_id!(
    MessageId,
    32,
    "Correlation identifier issued by a messaging gateway for an outbound message."
);
fixed_id!(
    AccountId,
    20,
    "20-byte account identity (callers, vendors, reviewers, remote receivers)."
);

macro_rules! derive_from_label {
    ($($name:ident),*) => {
        $(
            impl $name {
                /// Derives an identifier by hashing a human-readable label.
                ///
                /// Used by tooling and scripts that name products and receipts
                /// instead of spelling out 64 hex digits.
                pub fn from_label(label: &str) -> Self {
                    Self(sha256_raw(concat!(stringify!($name), "\0").as_bytes(), label.as_bytes()))
                }
            }
        )*
    };
}

derive_from_label!(ProductId, TransactionId, MessageId);

/// Identifier of a remote execution domain (chain selector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainId(pub u64);

impl DomainId {
    /// Unset domain.
    pub const ZERO: Self = Self(0);

    /// True when no domain is selected.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host-supplied time of a transition, in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    /// Seconds since the unix epoch.
    pub fn as_secs(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match i64::try_from(self.0)
            .ok()
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "@{}", self.0),
        }
    }
}

/// Identifier for canonicalization profiles (pattern: `[A-Za-z0-9_-]{16,128}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Parses a validated profile identifier.
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if !Regex::new(r"^[A-Za-z0-9_-]{16,128}$")
            .expect("invalid regex")
            .is_match(&s)
        {
            return Err(ValidationError::PatternMismatch {
                field: "ProfileId",
                value: s,
            });
        }
        Ok(Self(s))
    }
}

impl AsRef<str> for ProfileId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
