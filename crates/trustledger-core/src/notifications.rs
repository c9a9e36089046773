//! Notifications emitted by committed transitions.
//!
//! Each notification carries identifiers and post-transition values, never
//! deltas, so an observer can index the latest state from any single record.

use serde::{Deserialize, Serialize};
use trustledger_canonical::{
    compute_event_id, AccountId, Canonicalizer, Digest, DomainId, EventIdError, MessageId,
    ProductId, Timestamp, TransactionId,
};

use crate::guards::Role;

/// A state change observable by external indexers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// A product was registered.
    ProductCreated {
        /// New product.
        product_id: ProductId,
        /// Its vendor.
        vendor: AccountId,
        /// Registration time.
        at: Timestamp,
    },
    /// A product's review gate changed.
    ProductStatusChanged {
        /// Product.
        product_id: ProductId,
        /// New gate state.
        is_active: bool,
        /// Transition time.
        at: Timestamp,
    },
    /// A review was accepted.
    ReviewPosted {
        /// Assigned review id.
        review_id: u64,
        /// Reviewed product.
        product_id: ProductId,
        /// Submitter.
        reviewer: AccountId,
        /// Consumed proof.
        transaction_id: TransactionId,
        /// Rating.
        rating: u8,
        /// Creation time.
        at: Timestamp,
    },
    /// A cached score was recomputed.
    TrustScoreUpdated {
        /// Product.
        product_id: ProductId,
        /// New scaled average.
        average_rating: u16,
        /// New review count.
        total_reviews: u64,
        /// Recomputation time.
        at: Timestamp,
    },
    /// A score snapshot was handed to the messaging gateway.
    TrustScoreBroadcast {
        /// Gateway correlation id.
        message_id: MessageId,
        /// Product.
        product_id: ProductId,
        /// Destination domain.
        destination_domain: DomainId,
        /// Destination receiver.
        destination_address: AccountId,
        /// Broadcast scaled average.
        average_rating: u16,
        /// Broadcast review count.
        total_reviews: u64,
        /// Score time carried in the payload.
        last_updated: Timestamp,
        /// Digest of the payload bytes.
        payload_digest: Digest,
        /// Hand-off time.
        at: Timestamp,
    },
    /// A role was granted.
    RoleGranted {
        /// Role.
        role: Role,
        /// New member.
        account: AccountId,
        /// Granting admin.
        by: AccountId,
        /// Transition time.
        at: Timestamp,
    },
    /// A role was revoked.
    RoleRevoked {
        /// Role.
        role: Role,
        /// Former member.
        account: AccountId,
        /// Revoking admin.
        by: AccountId,
        /// Transition time.
        at: Timestamp,
    },
    /// The pause gate was engaged.
    Paused {
        /// Admin.
        by: AccountId,
        /// Transition time.
        at: Timestamp,
    },
    /// The pause gate was released.
    Unpaused {
        /// Admin.
        by: AccountId,
        /// Transition time.
        at: Timestamp,
    },
}

impl Notification {
    /// Serialized `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ProductCreated { .. } => "product_created",
            Notification::ProductStatusChanged { .. } => "product_status_changed",
            Notification::ReviewPosted { .. } => "review_posted",
            Notification::TrustScoreUpdated { .. } => "trust_score_updated",
            Notification::TrustScoreBroadcast { .. } => "trust_score_broadcast",
            Notification::RoleGranted { .. } => "role_granted",
            Notification::RoleRevoked { .. } => "role_revoked",
            Notification::Paused { .. } => "paused",
            Notification::Unpaused { .. } => "unpaused",
        }
    }

    /// Product the notification concerns, if any.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            Notification::ProductCreated { product_id, .. }
            | Notification::ProductStatusChanged { product_id, .. }
            | Notification::ReviewPosted { product_id, .. }
            | Notification::TrustScoreUpdated { product_id, .. }
            | Notification::TrustScoreBroadcast { product_id, .. } => Some(*product_id),
            _ => None,
        }
    }

    /// Time of the transition that emitted the notification.
    pub fn at(&self) -> Timestamp {
        match self {
            Notification::ProductCreated { at, .. }
            | Notification::ProductStatusChanged { at, .. }
            | Notification::ReviewPosted { at, .. }
            | Notification::TrustScoreUpdated { at, .. }
            | Notification::TrustScoreBroadcast { at, .. }
            | Notification::RoleGranted { at, .. }
            | Notification::RoleRevoked { at, .. }
            | Notification::Paused { at, .. }
            | Notification::Unpaused { at, .. } => *at,
        }
    }
}

/// A notification with its position in a stream and a content-derived id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// `sha256(domain || canonical(record without event_id))`.
    pub event_id: Digest,
    /// Position in the stream, from 0.
    pub seq: u64,
    /// The notification.
    #[serde(flatten)]
    pub notification: Notification,
}

#[derive(Serialize)]
struct UnsealedRecord<'a> {
    seq: u64,
    #[serde(flatten)]
    notification: &'a Notification,
}

impl NotificationRecord {
    /// Assigns the id for `notification` at position `seq`.
    pub fn seal(
        seq: u64,
        notification: Notification,
        canonicalizer: &Canonicalizer,
    ) -> Result<Self, EventIdError> {
        let event_id = compute_event_id(
            &UnsealedRecord {
                seq,
                notification: &notification,
            },
            canonicalizer,
        )?;
        Ok(Self {
            event_id,
            seq,
            notification,
        })
    }

    /// Recomputes the id and compares it with the stored one.
    pub fn verify(&self, canonicalizer: &Canonicalizer) -> Result<bool, EventIdError> {
        trustledger_canonical::verify_event_id(self, &self.event_id, canonicalizer)
    }
}
