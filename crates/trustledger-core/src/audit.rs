//! Offline replay of a notification stream.
//!
//! [`ScoreAudit`] rebuilds per-product counters from `ReviewPosted`
//! notifications and checks every derived value the stream claims against
//! them. It trusts nothing but the review records themselves.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use trustledger_canonical::{AccountId, ProductId, TransactionId};

use crate::aggregator::scaled_average;
use crate::notifications::Notification;
use crate::shared::{MAX_RATING, MIN_RATING};

/// A consistency failure found while replaying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum AuditViolation {
    /// Review ids skipped or repeated.
    ReviewIdGap {
        /// Expected id.
        expected: u64,
        /// Id found.
        found: u64,
    },
    /// Two reviews consumed the same proof.
    DuplicateTransaction {
        /// The proof.
        transaction_id: TransactionId,
        /// Second review using it.
        review_id: u64,
    },
    /// A product was registered twice.
    DuplicateProduct {
        /// The product.
        product_id: ProductId,
    },
    /// A notification references an unregistered product.
    UnknownProduct {
        /// The product.
        product_id: ProductId,
        /// Kind of the offending notification.
        kind: String,
    },
    /// A review landed on an inactive product.
    InactiveProduct {
        /// The product.
        product_id: ProductId,
        /// The review.
        review_id: u64,
    },
    /// A rating outside the accepted scale.
    RatingOutOfRange {
        /// The review.
        review_id: u64,
        /// The rating.
        rating: u8,
    },
    /// A vendor reviewed its own product.
    VendorReview {
        /// The product.
        product_id: ProductId,
        /// The review.
        review_id: u64,
    },
    /// A claimed score disagrees with the replayed counters.
    ScoreMismatch {
        /// The product.
        product_id: ProductId,
        /// Kind of the offending notification.
        kind: String,
        /// Replayed review count.
        expected_total: u64,
        /// Claimed review count.
        found_total: u64,
        /// Replayed scaled average.
        expected_average: u16,
        /// Claimed scaled average.
        found_average: u16,
    },
    /// A review was not followed by a score update.
    MissingScoreUpdate {
        /// The product.
        product_id: ProductId,
        /// The review.
        review_id: u64,
    },
}

/// Replayed state for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditedProduct {
    /// Vendor from registration.
    pub vendor: AccountId,
    /// Gate state at the end of the stream.
    pub is_active: bool,
    /// Replayed review count.
    pub total_reviews: u64,
    /// Replayed rating sum.
    pub sum_of_ratings: u128,
    /// Scaled average derived from the replayed counters.
    pub average_rating: u16,
    /// Broadcasts observed.
    pub broadcasts: u64,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    /// Notifications consumed.
    pub notifications: u64,
    /// Reviews replayed.
    pub reviews: u64,
    /// Per-product replayed state.
    pub products: BTreeMap<ProductId, AuditedProduct>,
    /// Violations in stream order.
    pub violations: Vec<AuditViolation>,
}

impl AuditReport {
    /// True when no violation was found.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Streaming replay auditor.
#[derive(Debug, Default)]
pub struct ScoreAudit {
    report: AuditReport,
    next_review_id: u64,
    spent: HashMap<TransactionId, u64>,
    // Review awaiting its TrustScoreUpdated.
    pending: Option<(ProductId, u64)>,
}

impl ScoreAudit {
    /// Creates an auditor for an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next notification in stream order.
    pub fn observe(&mut self, notification: &Notification) {
        self.report.notifications += 1;

        if let Some((product_id, review_id)) = self.pending.take() {
            let follows = matches!(
                notification,
                Notification::TrustScoreUpdated { product_id: p, .. } if *p == product_id
            );
            if !follows {
                self.report
                    .violations
                    .push(AuditViolation::MissingScoreUpdate {
                        product_id,
                        review_id,
                    });
            }
        }

        match notification {
            Notification::ProductCreated {
                product_id, vendor, ..
            } => {
                if self.report.products.contains_key(product_id) {
                    self.report
                        .violations
                        .push(AuditViolation::DuplicateProduct {
                            product_id: *product_id,
                        });
                    return;
                }
                self.report.products.insert(
                    *product_id,
                    AuditedProduct {
                        vendor: *vendor,
                        is_active: true,
                        total_reviews: 0,
                        sum_of_ratings: 0,
                        average_rating: 0,
                        broadcasts: 0,
                    },
                );
            }
            Notification::ProductStatusChanged {
                product_id,
                is_active,
                ..
            } => {
                if let Some(product) = self.product_mut(*product_id, notification.kind()) {
                    product.is_active = *is_active;
                }
            }
            Notification::ReviewPosted {
                review_id,
                product_id,
                reviewer,
                transaction_id,
                rating,
                ..
            } => self.observe_review(*review_id, *product_id, *reviewer, *transaction_id, *rating),
            Notification::TrustScoreUpdated {
                product_id,
                average_rating,
                total_reviews,
                ..
            }
            | Notification::TrustScoreBroadcast {
                product_id,
                average_rating,
                total_reviews,
                ..
            } => {
                let kind = notification.kind();
                let is_broadcast = matches!(notification, Notification::TrustScoreBroadcast { .. });
                let Some(product) = self.product_mut(*product_id, kind) else {
                    return;
                };
                if is_broadcast {
                    product.broadcasts += 1;
                }
                let (expected_total, expected_average) =
                    (product.total_reviews, product.average_rating);
                if expected_total != *total_reviews || expected_average != *average_rating {
                    self.report.violations.push(AuditViolation::ScoreMismatch {
                        product_id: *product_id,
                        kind: kind.to_string(),
                        expected_total,
                        found_total: *total_reviews,
                        expected_average,
                        found_average: *average_rating,
                    });
                }
            }
            Notification::RoleGranted { .. }
            | Notification::RoleRevoked { .. }
            | Notification::Paused { .. }
            | Notification::Unpaused { .. } => {}
        }
    }

    fn observe_review(
        &mut self,
        review_id: u64,
        product_id: ProductId,
        reviewer: AccountId,
        transaction_id: TransactionId,
        rating: u8,
    ) {
        self.report.reviews += 1;
        if review_id != self.next_review_id {
            self.report.violations.push(AuditViolation::ReviewIdGap {
                expected: self.next_review_id,
                found: review_id,
            });
        }
        self.next_review_id = review_id.saturating_add(1);

        if self.spent.insert(transaction_id, review_id).is_some() {
            self.report
                .violations
                .push(AuditViolation::DuplicateTransaction {
                    transaction_id,
                    review_id,
                });
        }
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            self.report
                .violations
                .push(AuditViolation::RatingOutOfRange { review_id, rating });
        }

        let mut violations = Vec::new();
        let Some(product) = self.product_mut(product_id, "review_posted") else {
            return;
        };
        if !product.is_active {
            violations.push(AuditViolation::InactiveProduct {
                product_id,
                review_id,
            });
        }
        if product.vendor == reviewer {
            violations.push(AuditViolation::VendorReview {
                product_id,
                review_id,
            });
        }
        product.total_reviews = product.total_reviews.saturating_add(1);
        product.sum_of_ratings = product.sum_of_ratings.saturating_add(u128::from(rating));
        // Saturate so an absurd stream still yields a report.
        product.average_rating =
            scaled_average(product.sum_of_ratings, product.total_reviews).unwrap_or(u16::MAX);

        self.report.violations.extend(violations);
        self.pending = Some((product_id, review_id));
    }

    fn product_mut(&mut self, product_id: ProductId, kind: &str) -> Option<&mut AuditedProduct> {
        if !self.report.products.contains_key(&product_id) {
            self.report.violations.push(AuditViolation::UnknownProduct {
                product_id,
                kind: kind.to_string(),
            });
        }
        self.report.products.get_mut(&product_id)
    }

    /// Ends the replay.
    pub fn finish(mut self) -> AuditReport {
        if let Some((product_id, review_id)) = self.pending.take() {
            self.report
                .violations
                .push(AuditViolation::MissingScoreUpdate {
                    product_id,
                    review_id,
                });
        }
        self.report
    }
}
