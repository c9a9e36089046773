//! Ledger configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use trustledger_canonical::AccountId;

use crate::gateway::GatewayConfig;

/// Errors loading or validating a [`LedgerConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid configuration JSON.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// Values are well-formed but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Initial state of a ledger.
///
/// ```json
/// {
///   "admin": "0x00000000000000000000000000000000000000a1",
///   "product_managers": [],
///   "broadcasters": [],
///   "start_paused": false,
///   "gateway": { "min_fee": 0, "allowed_domains": [] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Account holding every role at genesis.
    pub admin: AccountId,
    /// Extra product managers.
    #[serde(default)]
    pub product_managers: Vec<AccountId>,
    /// Extra broadcasters.
    #[serde(default)]
    pub broadcasters: Vec<AccountId>,
    /// Start with the pause gate engaged.
    #[serde(default)]
    pub start_paused: bool,
    /// Policy for the in-memory gateway used by tooling.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl LedgerConfig {
    /// Minimal configuration with a single admin.
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            product_managers: Vec::new(),
            broadcasters: Vec::new(),
            start_paused: false,
            gateway: GatewayConfig::default(),
        }
    }

    /// Parses and validates configuration JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Rejects zero accounts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.is_zero() {
            return Err(ConfigError::Invalid("admin is zero".to_string()));
        }
        let zero_member = self
            .product_managers
            .iter()
            .chain(self.broadcasters.iter())
            .any(AccountId::is_zero);
        if zero_member {
            return Err(ConfigError::Invalid("role member is zero".to_string()));
        }
        Ok(())
    }
}
