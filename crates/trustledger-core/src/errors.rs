use thiserror::Error;
use trustledger_canonical::{ProductId, TransactionId};

use crate::gateway::GatewayError;

/// Errors returned by ledger transitions and accessors.
///
/// Every failed transition aborts with no persisted effect; callers decide
/// whether to retry with corrected input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or zero argument, or an operation against the wrong state.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Unknown identifier.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record looked up.
        entity: &'static str,
        /// Identifier that was not found.
        id: String,
    },
    /// Duplicate product registration.
    #[error("product already exists: {0}")]
    AlreadyExists(ProductId),
    /// Purchase proof already consumed.
    #[error("transaction {transaction_id} already used by review {review_id}")]
    AlreadyUsed {
        /// The spent proof.
        transaction_id: TransactionId,
        /// Review that consumed it.
        review_id: u64,
    },
    /// Rating outside the accepted scale.
    #[error("rating {rating} outside {min}..={max}")]
    OutOfRange {
        /// Offending rating.
        rating: u8,
        /// Lowest accepted rating.
        min: u8,
        /// Highest accepted rating.
        max: u8,
    },
    /// Missing role, or a vendor reviewing their own product.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Mutating call while the pause gate is engaged.
    #[error("ledger is paused")]
    PausedState,
    /// An accumulator or derived value would exceed its bound.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
    /// The messaging gateway rejected the outbound message.
    #[error("remote send failed: {0}")]
    RemoteSendFailure(#[from] GatewayError),
    /// A mutating entry point was entered while another was in progress.
    #[error("reentrant call into {0}")]
    Reentrancy(&'static str),
    /// Internal precondition breach. Unreachable in correct usage.
    #[error("internal invariant violated: {0}")]
    Invariant(String),
    /// Snapshot payload could not be encoded or decoded.
    #[error("snapshot encoding failed: {0}")]
    Snapshot(String),
}

impl LedgerError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidInput(_) => "INVALID_INPUT",
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::AlreadyExists(_) => "ALREADY_EXISTS",
            LedgerError::AlreadyUsed { .. } => "ALREADY_USED",
            LedgerError::OutOfRange { .. } => "OUT_OF_RANGE",
            LedgerError::Unauthorized(_) => "UNAUTHORIZED",
            LedgerError::PausedState => "PAUSED",
            LedgerError::Overflow(_) => "OVERFLOW",
            LedgerError::RemoteSendFailure(_) => "REMOTE_SEND_FAILURE",
            LedgerError::Reentrancy(_) => "REENTRANCY",
            LedgerError::Invariant(_) => "INVARIANT",
            LedgerError::Snapshot(_) => "SNAPSHOT",
        }
    }
}
