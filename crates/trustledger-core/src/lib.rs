//! Purchase-gated product reviews with cached trust scores.
//!
//! This crate provides:
//! - A product registry with an active/inactive review gate
//! - Single-use purchase proofs that admit exactly one review each
//! - An append-only review ledger with sequential ids
//! - Per-product trust scores, recomputed on every accepted review
//! - Snapshot broadcast of a score to a remote domain via a messaging gateway
//! - Offline replay audit of the emitted notification stream
//!
//! Core invariants:
//! - A failed transition leaves no trace: no counters, no proof, no notification
//! - `total_reviews` and `sum_of_ratings` always move together
//! - `average_rating == floor(sum_of_ratings * 100 / total_reviews)`
//! - Accepted reviews are never edited or deleted
//!
#![deny(missing_docs)]

/// Score cache and the fixed-point average.
pub mod aggregator;
/// Notification-stream replay audit.
pub mod audit;
/// Snapshot payloads and outbound message assembly.
pub mod broadcast;
/// Genesis configuration for a ledger.
pub mod config;
/// Error types for ledger operations.
pub mod errors;
/// Messaging gateway capability and an in-memory implementation.
pub mod gateway;
/// Access control, pause and reentrancy guards.
pub mod guards;
/// The ledger façade and its shared handle.
pub mod ledger;
/// Notifications emitted by committed transitions.
pub mod notifications;
/// Product records and counters.
pub mod registry;
/// Append-only review storage.
pub mod reviews;
/// Constants and the per-call context.
pub mod shared;
/// Purchase proof consumption.
pub mod usage;

pub use aggregator::{scaled_average, TrustScore, TrustScoreAggregator};
pub use audit::{AuditReport, AuditViolation, AuditedProduct, ScoreAudit};
pub use broadcast::{BroadcastAdapter, BroadcastRequest, PreparedBroadcast, ScoreSnapshot};
pub use config::{ConfigError, LedgerConfig};
pub use errors::LedgerError;
pub use gateway::{GatewayConfig, GatewayError, InMemoryGateway, MessagingGateway, OutboundMessage};
pub use guards::{AccessControl, PauseGate, ReentrancyGuard, ReentrancyLock, Role};
pub use ledger::{SharedLedger, TrustLedger};
pub use notifications::{Notification, NotificationRecord};
pub use registry::{CounterUpdate, Product, ProductRegistry};
pub use reviews::{Review, ReviewLedger};
pub use shared::{TxContext, MAX_RATING, MIN_RATING, SCORE_SCALE};
pub use usage::{TransactionUsage, UsageGuard};
