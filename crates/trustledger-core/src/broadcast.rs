//! Cross-domain broadcast adapter: snapshot encoding and gateway hand-off.

use serde::{Deserialize, Serialize};
use trustledger_canonical::{
    AccountId, Canonicalizer, Digest, DomainId, MessageId, ProductId, Timestamp,
    SNAPSHOT_DOMAIN_SEPARATOR,
};

use crate::aggregator::TrustScore;
use crate::errors::LedgerError;
use crate::gateway::{MessagingGateway, OutboundMessage};

/// Fixed-shape payload describing a product's score at broadcast time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoreSnapshot {
    /// Product the score belongs to.
    pub product_id: ProductId,
    /// Scaled average rating.
    pub average_rating: u16,
    /// Accepted reviews.
    pub total_reviews: u64,
    /// Last recomputation time.
    pub last_updated: Timestamp,
}

impl ScoreSnapshot {
    /// Snapshot of a cached score.
    pub fn of(product_id: ProductId, score: &TrustScore) -> Self {
        Self {
            product_id,
            average_rating: score.average_rating,
            total_reviews: score.total_reviews,
            last_updated: score.last_updated,
        }
    }

    /// Canonical JSON bytes of the snapshot.
    pub fn encode(&self, canonicalizer: &Canonicalizer) -> Result<Vec<u8>, LedgerError> {
        let value =
            serde_json::to_value(self).map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        let result = canonicalizer
            .canonicalize(&value)
            .map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        Ok(result.bytes)
    }

    /// Decodes a payload on the receiving side.
    ///
    /// Bytes that parse but are not in canonical form are rejected so that a
    /// payload digest identifies exactly one snapshot.
    pub fn decode(bytes: &[u8], canonicalizer: &Canonicalizer) -> Result<Self, LedgerError> {
        let snapshot: ScoreSnapshot =
            serde_json::from_slice(bytes).map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        if snapshot.encode(canonicalizer)? != bytes {
            return Err(LedgerError::Snapshot(
                "payload is not in canonical form".to_string(),
            ));
        }
        Ok(snapshot)
    }

    /// Domain-separated digest of an encoded payload.
    pub fn payload_digest(payload: &[u8]) -> Digest {
        Digest::sha256_with_domain(SNAPSHOT_DOMAIN_SEPARATOR, payload)
    }
}

/// Routing and fee parameters for a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    /// Destination domain selector. Must be non-zero.
    pub destination_domain: DomainId,
    /// Receiver on the destination. Must be non-zero.
    pub destination_address: AccountId,
    /// Execution gas budget on the destination.
    pub gas_budget: u64,
    /// Fee token; zero selects the native token.
    #[serde(default)]
    pub fee_token: AccountId,
    /// Fee offered to the gateway.
    #[serde(default)]
    pub fee_amount: u128,
}

/// A message ready to hand to the gateway, with its payload digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBroadcast {
    /// Snapshot encoded in the payload.
    pub snapshot: ScoreSnapshot,
    /// Digest of the payload bytes.
    pub payload_digest: Digest,
    /// The outbound message.
    pub message: OutboundMessage,
}

/// Packages snapshots into outbound messages.
#[derive(Debug, Clone)]
pub struct BroadcastAdapter {
    canonicalizer: Canonicalizer,
}

impl Default for BroadcastAdapter {
    fn default() -> Self {
        Self::new(Canonicalizer::ledger())
    }
}

impl BroadcastAdapter {
    /// Creates an adapter using the given canonicalizer for payloads.
    pub fn new(canonicalizer: Canonicalizer) -> Self {
        Self { canonicalizer }
    }

    /// Validates routing and encodes the payload. Does not contact the gateway.
    pub fn prepare(
        &self,
        snapshot: ScoreSnapshot,
        request: &BroadcastRequest,
    ) -> Result<PreparedBroadcast, LedgerError> {
        if request.destination_domain.is_zero() {
            return Err(LedgerError::InvalidInput(
                "destination domain is zero".to_string(),
            ));
        }
        if request.destination_address.is_zero() {
            return Err(LedgerError::InvalidInput(
                "destination address is zero".to_string(),
            ));
        }
        let payload = snapshot.encode(&self.canonicalizer)?;
        Ok(PreparedBroadcast {
            snapshot,
            payload_digest: ScoreSnapshot::payload_digest(&payload),
            message: OutboundMessage {
                destination_domain: request.destination_domain,
                destination_address: request.destination_address,
                fee_token: request.fee_token,
                fee_amount: request.fee_amount,
                gas_budget: request.gas_budget,
                payload,
            },
        })
    }

    /// Hands the message to the gateway. A refusal becomes `RemoteSendFailure`.
    pub fn dispatch<G: MessagingGateway + ?Sized>(
        &self,
        gateway: &mut G,
        prepared: &PreparedBroadcast,
    ) -> Result<MessageId, LedgerError> {
        Ok(gateway.send(&prepared.message)?)
    }
}
