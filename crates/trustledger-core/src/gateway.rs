//! Messaging gateway boundary.
//!
//! The ledger builds an [`OutboundMessage`] and hands it to a
//! [`MessagingGateway`]. Delivery, relaying, ordering and fee settlement are
//! the gateway's business; a successful `send` only means the gateway
//! accepted the message and issued a correlation id.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trustledger_canonical::{sha256_raw, AccountId, DomainId, MessageId};

/// Domain separator for message ids issued by [`InMemoryGateway`].
const MESSAGE_DOMAIN_SEPARATOR: &[u8] = b"trustledger:message:v1\0";

/// Message handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination domain selector.
    pub destination_domain: DomainId,
    /// Receiver on the destination domain.
    pub destination_address: AccountId,
    /// Token the fee is paid in. Zero selects the native token.
    pub fee_token: AccountId,
    /// Fee offered.
    pub fee_amount: u128,
    /// Execution gas budget on the destination.
    pub gas_budget: u64,
    /// Opaque payload.
    pub payload: Vec<u8>,
}

/// Reasons a gateway refuses a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Offered fee below the gateway's quote.
    #[error("insufficient fee: offered {offered}, required {required}")]
    InsufficientFee {
        /// Fee offered.
        offered: u128,
        /// Fee required.
        required: u128,
    },
    /// No route to the destination domain.
    #[error("unsupported destination domain {0}")]
    UnsupportedDestination(DomainId),
    /// Gas budget above the gateway's per-message limit.
    #[error("gas budget {budget} exceeds limit {limit}")]
    GasLimitExceeded {
        /// Requested budget.
        budget: u64,
        /// Gateway limit.
        limit: u64,
    },
    /// Any other refusal.
    #[error("{0}")]
    Rejected(String),
}

/// Outbound side of a cross-domain messaging gateway.
pub trait MessagingGateway {
    /// Accepts a message for delivery and returns its correlation id.
    fn send(&mut self, message: &OutboundMessage) -> Result<MessageId, GatewayError>;
}

/// Acceptance policy for [`InMemoryGateway`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Minimum fee accepted for any message.
    #[serde(default)]
    pub min_fee: u128,
    /// Routable destinations; empty means any.
    #[serde(default)]
    pub allowed_domains: Vec<DomainId>,
    /// Per-message gas ceiling.
    #[serde(default)]
    pub max_gas_budget: Option<u64>,
}

/// Gateway that accepts messages into memory.
///
/// Issues deterministic message ids and keeps every accepted message so that
/// tests and tooling can inspect what would have been sent.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    config: GatewayConfig,
    sent: Vec<(MessageId, OutboundMessage)>,
}

impl InMemoryGateway {
    /// Creates a gateway with the given policy.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            sent: Vec::new(),
        }
    }

    /// Accepted messages in send order.
    pub fn sent(&self) -> &[(MessageId, OutboundMessage)] {
        &self.sent
    }

    fn check(&self, message: &OutboundMessage) -> Result<(), GatewayError> {
        if !self.config.allowed_domains.is_empty()
            && !self
                .config
                .allowed_domains
                .contains(&message.destination_domain)
        {
            return Err(GatewayError::UnsupportedDestination(
                message.destination_domain,
            ));
        }
        if message.fee_amount < self.config.min_fee {
            return Err(GatewayError::InsufficientFee {
                offered: message.fee_amount,
                required: self.config.min_fee,
            });
        }
        if let Some(limit) = self.config.max_gas_budget {
            if message.gas_budget > limit {
                return Err(GatewayError::GasLimitExceeded {
                    budget: message.gas_budget,
                    limit,
                });
            }
        }
        Ok(())
    }
}

impl MessagingGateway for InMemoryGateway {
    fn send(&mut self, message: &OutboundMessage) -> Result<MessageId, GatewayError> {
        self.check(message)?;

        let mut material = Vec::with_capacity(36 + message.payload.len());
        material.extend_from_slice(&(self.sent.len() as u64).to_le_bytes());
        material.extend_from_slice(&message.destination_domain.0.to_le_bytes());
        material.extend_from_slice(message.destination_address.as_bytes());
        material.extend_from_slice(&message.payload);
        let id = MessageId::from_bytes(sha256_raw(MESSAGE_DOMAIN_SEPARATOR, &material));

        self.sent.push((id, message.clone()));
        Ok(id)
    }
}
