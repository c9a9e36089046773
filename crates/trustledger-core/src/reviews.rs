//! Append-only review ledger.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trustledger_canonical::{AccountId, ProductId, Timestamp, TransactionId};

use crate::errors::LedgerError;

/// An accepted review. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Sequential id, starting at 0, system-wide.
    pub review_id: u64,
    /// Submitter.
    pub reviewer: AccountId,
    /// Reviewed product.
    pub product_id: ProductId,
    /// Purchase proof consumed by this review.
    pub transaction_id: TransactionId,
    /// Rating on the 1..=100 scale.
    pub rating: u8,
    /// Creation time.
    pub timestamp: Timestamp,
}

/// Owns every [`Review`]. The vector index is the review id, so ids are
/// gapless and only advance on an accepted append.
#[derive(Debug, Default)]
pub struct ReviewLedger {
    reviews: Vec<Review>,
    by_product: HashMap<ProductId, Vec<u64>>,
}

impl ReviewLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next append will receive.
    pub fn next_id(&self) -> u64 {
        self.reviews.len() as u64
    }

    /// Stores a review and returns its id. Callers validate beforehand.
    pub fn append(
        &mut self,
        product_id: ProductId,
        reviewer: AccountId,
        transaction_id: TransactionId,
        rating: u8,
        timestamp: Timestamp,
    ) -> u64 {
        let review_id = self.next_id();
        self.reviews.push(Review {
            review_id,
            reviewer,
            product_id,
            transaction_id,
            rating,
            timestamp,
        });
        self.by_product.entry(product_id).or_default().push(review_id);
        review_id
    }

    /// Looks up a review by id.
    pub fn get(&self, review_id: u64) -> Result<&Review, LedgerError> {
        usize::try_from(review_id)
            .ok()
            .and_then(|idx| self.reviews.get(idx))
            .ok_or_else(|| LedgerError::not_found("review", review_id))
    }

    /// Number of reviews ever appended.
    pub fn count(&self) -> u64 {
        self.reviews.len() as u64
    }

    /// Review ids for a product, in append order.
    pub fn reviews_for_product(&self, product_id: ProductId) -> &[u64] {
        self.by_product
            .get(&product_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All reviews in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Review> {
        self.reviews.iter()
    }
}
