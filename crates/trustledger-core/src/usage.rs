//! Transaction-usage guard: the spent-set of purchase proofs.

use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use trustledger_canonical::TransactionId;

use crate::errors::LedgerError;

/// Spent flag and consuming review for one proof.
///
/// `review_id` is meaningless while `spent` is false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionUsage {
    /// Whether the proof backs a review.
    pub spent: bool,
    /// Review that consumed the proof.
    pub review_id: u64,
}

/// Owns the set of consumed purchase proofs. Entries are permanent.
#[derive(Debug, Default)]
pub struct UsageGuard {
    spent: HashMap<TransactionId, u64>,
}

impl UsageGuard {
    /// Creates an empty guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only check used while validating a transition.
    pub fn ensure_unused(&self, transaction_id: TransactionId) -> Result<(), LedgerError> {
        if transaction_id.is_zero() {
            return Err(LedgerError::InvalidInput(
                "transaction id is zero".to_string(),
            ));
        }
        match self.spent.get(&transaction_id) {
            Some(&review_id) => Err(LedgerError::AlreadyUsed {
                transaction_id,
                review_id,
            }),
            None => Ok(()),
        }
    }

    /// Marks the proof spent by `review_id`.
    ///
    /// Check and mark happen on a single map entry, so no caller can observe
    /// the proof as unspent after another caller has marked it.
    pub fn check_and_consume(
        &mut self,
        transaction_id: TransactionId,
        review_id: u64,
    ) -> Result<(), LedgerError> {
        if transaction_id.is_zero() {
            return Err(LedgerError::InvalidInput(
                "transaction id is zero".to_string(),
            ));
        }
        match self.spent.entry(transaction_id) {
            Entry::Occupied(entry) => Err(LedgerError::AlreadyUsed {
                transaction_id,
                review_id: *entry.get(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(review_id);
                Ok(())
            }
        }
    }

    /// Spent state of a proof. Never fails.
    pub fn lookup(&self, transaction_id: TransactionId) -> TransactionUsage {
        match self.spent.get(&transaction_id) {
            Some(&review_id) => TransactionUsage {
                spent: true,
                review_id,
            },
            None => TransactionUsage::default(),
        }
    }

    /// Number of consumed proofs.
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    /// True when no proof has been consumed.
    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
