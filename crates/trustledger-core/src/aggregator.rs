//! Trust score aggregator: the cached average rating per product.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trustledger_canonical::{ProductId, Timestamp};

use crate::errors::LedgerError;
use crate::registry::CounterUpdate;
use crate::shared::SCORE_SCALE;

/// Cached score for one product.
///
/// `average_rating` is the mean rating times [`SCORE_SCALE`], floored:
/// 8000 reads as 80.00.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustScore {
    /// Accepted reviews.
    pub total_reviews: u64,
    /// Scaled floor of the mean rating; zero while there are no reviews.
    pub average_rating: u16,
    /// Time of the last recomputation (or registration, for a seed).
    pub last_updated: Timestamp,
}

impl TrustScore {
    /// Zero-valued score for a freshly registered product.
    pub fn seed(at: Timestamp) -> Self {
        Self {
            total_reviews: 0,
            average_rating: 0,
            last_updated: at,
        }
    }
}

/// `floor(sum_of_ratings * SCORE_SCALE / total_reviews)` with hard bounds.
pub fn scaled_average(sum_of_ratings: u128, total_reviews: u64) -> Result<u16, LedgerError> {
    if total_reviews == 0 {
        return Err(LedgerError::Invariant(
            "average requested for a product without reviews".to_string(),
        ));
    }
    let scaled = sum_of_ratings
        .checked_mul(SCORE_SCALE)
        .ok_or(LedgerError::Overflow("average_rating"))?;
    let average = scaled / u128::from(total_reviews);
    u16::try_from(average).map_err(|_| LedgerError::Overflow("average_rating"))
}

/// Owns the score cache. The only writer to it.
#[derive(Debug, Default)]
pub struct TrustScoreAggregator {
    scores: HashMap<ProductId, TrustScore>,
}

impl TrustScoreAggregator {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the zero-valued score for a new product.
    pub fn seed(&mut self, product_id: ProductId, at: Timestamp) {
        self.scores.insert(product_id, TrustScore::seed(at));
    }

    /// Derives the score for staged counters. Does not write.
    pub fn recompute(
        &self,
        counters: &CounterUpdate,
        at: Timestamp,
    ) -> Result<TrustScore, LedgerError> {
        let average_rating = scaled_average(counters.sum_of_ratings, counters.total_reviews)?;
        Ok(TrustScore {
            total_reviews: counters.total_reviews,
            average_rating,
            last_updated: at,
        })
    }

    /// Overwrites the cached score.
    pub fn store(&mut self, product_id: ProductId, score: TrustScore) {
        self.scores.insert(product_id, score);
    }

    /// Cached score for a registered product.
    pub fn get(&self, product_id: ProductId) -> Result<TrustScore, LedgerError> {
        self.scores
            .get(&product_id)
            .copied()
            .ok_or_else(|| LedgerError::not_found("product", product_id))
    }

    /// Cached scores for many products; unknown ids yield a zero-valued score.
    pub fn get_many(&self, product_ids: &[ProductId]) -> Vec<TrustScore> {
        product_ids
            .iter()
            .map(|id| self.scores.get(id).copied().unwrap_or_default())
            .collect()
    }
}
