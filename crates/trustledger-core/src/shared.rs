use serde::{Deserialize, Serialize};
use trustledger_canonical::{AccountId, Timestamp};

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating.
pub const MAX_RATING: u8 = 100;

/// Fixed-point factor applied to averages: 8000 reads as 80.00.
pub const SCORE_SCALE: u128 = 100;

/// Host transaction context for a mutating call.
///
/// The host authenticates `caller` and sequences transactions; the ledger
/// only reads these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxContext {
    /// Authenticated caller.
    pub caller: AccountId,
    /// Block/transaction time.
    pub timestamp: Timestamp,
}

impl TxContext {
    /// Creates a context.
    pub fn new(caller: AccountId, timestamp: Timestamp) -> Self {
        Self { caller, timestamp }
    }
}
