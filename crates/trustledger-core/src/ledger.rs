//! The ledger façade: guard pipeline plus atomic composite transitions.

use std::sync::{Arc, RwLock};
use trustledger_canonical::{AccountId, MessageId, ProductId, TransactionId};

use crate::aggregator::{TrustScore, TrustScoreAggregator};
use crate::broadcast::{BroadcastAdapter, BroadcastRequest, ScoreSnapshot};
use crate::config::LedgerConfig;
use crate::errors::LedgerError;
use crate::gateway::MessagingGateway;
use crate::guards::{AccessControl, PauseGate, ReentrancyGuard, Role};
use crate::notifications::Notification;
use crate::registry::{Product, ProductRegistry};
use crate::reviews::{Review, ReviewLedger};
use crate::shared::{TxContext, MAX_RATING, MIN_RATING};
use crate::usage::{TransactionUsage, UsageGuard};

/// Purchase-gated review ledger.
///
/// Every mutating method runs its guards, then validates and stages all
/// fallible computations, and only then writes. A returned error therefore
/// means nothing changed. Notifications from a committed transition are
/// queued in an outbox until [`TrustLedger::drain_notifications`].
///
/// # Example
///
/// ```rust
/// use trustledger_canonical::{AccountId, ProductId, Timestamp, TransactionId};
/// use trustledger_core::{TrustLedger, TxContext};
///
/// let admin = AccountId::from_bytes([1; 20]);
/// let vendor = AccountId::from_bytes([2; 20]);
/// let buyer = AccountId::from_bytes([3; 20]);
/// let product = ProductId::from_label("espresso-machine");
///
/// let mut ledger = TrustLedger::new(admin);
/// ledger.add_product(TxContext::new(admin, Timestamp(10)), product, vendor)?;
/// let review_id = ledger.post_review(
///     TxContext::new(buyer, Timestamp(20)),
///     product,
///     TransactionId::from_label("order-1"),
///     80,
/// )?;
/// assert_eq!(review_id, 0);
/// assert_eq!(ledger.trust_score(product)?.average_rating, 8000);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct TrustLedger {
    access: AccessControl,
    pause: PauseGate,
    reentrancy: ReentrancyGuard,
    registry: ProductRegistry,
    usage: UsageGuard,
    reviews: ReviewLedger,
    scores: TrustScoreAggregator,
    adapter: BroadcastAdapter,
    outbox: Vec<Notification>,
}

impl TrustLedger {
    /// Empty ledger whose `admin` holds every role.
    pub fn new(admin: AccountId) -> Self {
        Self {
            access: AccessControl::with_admin(admin),
            pause: PauseGate::default(),
            reentrancy: ReentrancyGuard::new(),
            registry: ProductRegistry::new(),
            usage: UsageGuard::new(),
            reviews: ReviewLedger::new(),
            scores: TrustScoreAggregator::new(),
            adapter: BroadcastAdapter::default(),
            outbox: Vec::new(),
        }
    }

    /// Empty ledger with the configured role grants and pause state.
    pub fn from_config(config: &LedgerConfig) -> Self {
        let mut ledger = Self::new(config.admin);
        for account in &config.product_managers {
            ledger.access.grant(Role::ProductManager, *account);
        }
        for account in &config.broadcasters {
            ledger.access.grant(Role::Broadcaster, *account);
        }
        ledger.pause = PauseGate::new(config.start_paused);
        ledger
    }

    // ---- administration ----

    /// Grants `role` to `account`. Admin only. Returns `false` if already held.
    pub fn grant_role(
        &mut self,
        ctx: TxContext,
        role: Role,
        account: AccountId,
    ) -> Result<bool, LedgerError> {
        self.access.require_role(Role::Admin, ctx.caller)?;
        if account.is_zero() {
            return Err(LedgerError::InvalidInput("account is zero".to_string()));
        }
        let granted = self.access.grant(role, account);
        if granted {
            tracing::info!(%role, %account, by = %ctx.caller, "role granted");
            self.outbox.push(Notification::RoleGranted {
                role,
                account,
                by: ctx.caller,
                at: ctx.timestamp,
            });
        }
        Ok(granted)
    }

    /// Revokes `role` from `account`. Admin only. Returns `false` if not held.
    ///
    /// An admin may not revoke their own admin role, so the ledger always
    /// keeps at least one admin.
    pub fn revoke_role(
        &mut self,
        ctx: TxContext,
        role: Role,
        account: AccountId,
    ) -> Result<bool, LedgerError> {
        self.access.require_role(Role::Admin, ctx.caller)?;
        if role == Role::Admin && account == ctx.caller {
            return Err(LedgerError::InvalidInput(
                "admin cannot revoke its own admin role".to_string(),
            ));
        }
        let revoked = self.access.revoke(role, account);
        if revoked {
            tracing::info!(%role, %account, by = %ctx.caller, "role revoked");
            self.outbox.push(Notification::RoleRevoked {
                role,
                account,
                by: ctx.caller,
                at: ctx.timestamp,
            });
        }
        Ok(revoked)
    }

    /// Whether `account` holds `role`.
    pub fn has_role(&self, role: Role, account: AccountId) -> bool {
        self.access.has_role(role, account)
    }

    /// Engages the pause gate. Admin only.
    pub fn pause(&mut self, ctx: TxContext) -> Result<(), LedgerError> {
        self.access.require_role(Role::Admin, ctx.caller)?;
        self.pause.pause()?;
        tracing::info!(by = %ctx.caller, "ledger paused");
        self.outbox.push(Notification::Paused {
            by: ctx.caller,
            at: ctx.timestamp,
        });
        Ok(())
    }

    /// Releases the pause gate. Admin only.
    pub fn unpause(&mut self, ctx: TxContext) -> Result<(), LedgerError> {
        self.access.require_role(Role::Admin, ctx.caller)?;
        self.pause.unpause()?;
        tracing::info!(by = %ctx.caller, "ledger unpaused");
        self.outbox.push(Notification::Unpaused {
            by: ctx.caller,
            at: ctx.timestamp,
        });
        Ok(())
    }

    /// Whether the pause gate is engaged.
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    // ---- product registry ----

    /// Registers a product and seeds its zero-valued score.
    pub fn add_product(
        &mut self,
        ctx: TxContext,
        product_id: ProductId,
        vendor: AccountId,
    ) -> Result<(), LedgerError> {
        let result = self.add_product_inner(ctx, product_id, vendor);
        match &result {
            Ok(()) => tracing::info!(%product_id, %vendor, "product added"),
            Err(e) => tracing::warn!(%product_id, code = e.code(), error = %e, "add_product rejected"),
        }
        result
    }

    fn add_product_inner(
        &mut self,
        ctx: TxContext,
        product_id: ProductId,
        vendor: AccountId,
    ) -> Result<(), LedgerError> {
        self.pause.require_not_paused()?;
        self.access.require_role(Role::ProductManager, ctx.caller)?;

        self.registry.add(product_id, vendor, ctx.timestamp)?;
        self.scores.seed(product_id, ctx.timestamp);
        self.outbox.push(Notification::ProductCreated {
            product_id,
            vendor,
            at: ctx.timestamp,
        });
        Ok(())
    }

    /// Opens or closes a product for new reviews.
    pub fn set_product_active(
        &mut self,
        ctx: TxContext,
        product_id: ProductId,
        is_active: bool,
    ) -> Result<(), LedgerError> {
        let result = self.set_product_active_inner(ctx, product_id, is_active);
        match &result {
            Ok(()) => tracing::info!(%product_id, is_active, "product status changed"),
            Err(e) => tracing::warn!(
                %product_id,
                is_active,
                code = e.code(),
                error = %e,
                "set_product_active rejected"
            ),
        }
        result
    }

    fn set_product_active_inner(
        &mut self,
        ctx: TxContext,
        product_id: ProductId,
        is_active: bool,
    ) -> Result<(), LedgerError> {
        self.pause.require_not_paused()?;
        self.access.require_role(Role::ProductManager, ctx.caller)?;

        self.registry.set_active(product_id, is_active)?;
        self.outbox.push(Notification::ProductStatusChanged {
            product_id,
            is_active,
            at: ctx.timestamp,
        });
        Ok(())
    }

    /// Looks up a product.
    pub fn product(&self, product_id: ProductId) -> Result<&Product, LedgerError> {
        self.registry.get(product_id)
    }

    /// Whether a product is registered.
    pub fn product_exists(&self, product_id: ProductId) -> bool {
        self.registry.exists(product_id)
    }

    /// Registered product ids in ascending order.
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.registry.product_ids()
    }

    // ---- reviews ----

    /// Posts a review backed by a single-use purchase proof.
    ///
    /// Checks, in order: pause gate, reentrancy, product registered, product
    /// active, proof non-zero, proof unspent, rating in range, caller is not
    /// the vendor. Counters and the new score are then staged; any overflow
    /// aborts before the first write.
    pub fn post_review(
        &mut self,
        ctx: TxContext,
        product_id: ProductId,
        transaction_id: TransactionId,
        rating: u8,
    ) -> Result<u64, LedgerError> {
        let result = self.post_review_inner(ctx, product_id, transaction_id, rating);
        match &result {
            Ok(review_id) => tracing::info!(
                review_id,
                %product_id,
                %transaction_id,
                rating,
                "review posted"
            ),
            Err(e) => tracing::warn!(
                %product_id,
                %transaction_id,
                code = e.code(),
                error = %e,
                "post_review rejected"
            ),
        }
        result
    }

    fn post_review_inner(
        &mut self,
        ctx: TxContext,
        product_id: ProductId,
        transaction_id: TransactionId,
        rating: u8,
    ) -> Result<u64, LedgerError> {
        self.pause.require_not_paused()?;
        let _lock = self.reentrancy.enter("post_review")?;

        let product = self.registry.get(product_id)?;
        if !product.is_active {
            return Err(LedgerError::InvalidInput(format!(
                "product {} is inactive",
                product_id
            )));
        }
        self.usage.ensure_unused(transaction_id)?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(LedgerError::OutOfRange {
                rating,
                min: MIN_RATING,
                max: MAX_RATING,
            });
        }
        if ctx.caller == product.vendor {
            return Err(LedgerError::Unauthorized(
                "vendor cannot review own product".to_string(),
            ));
        }

        let counters = self.registry.stage_rating(product_id, rating)?;
        let score = self.scores.recompute(&counters, ctx.timestamp)?;
        let review_id = self.reviews.next_id();

        // Commit. Only the proof consumption can refuse, so it goes first.
        self.usage.check_and_consume(transaction_id, review_id)?;
        let appended = self.reviews.append(
            product_id,
            ctx.caller,
            transaction_id,
            rating,
            ctx.timestamp,
        );
        debug_assert_eq!(appended, review_id);
        self.registry.apply(counters);
        self.scores.store(product_id, score);

        self.outbox.push(Notification::ReviewPosted {
            review_id,
            product_id,
            reviewer: ctx.caller,
            transaction_id,
            rating,
            at: ctx.timestamp,
        });
        self.outbox.push(Notification::TrustScoreUpdated {
            product_id,
            average_rating: score.average_rating,
            total_reviews: score.total_reviews,
            at: ctx.timestamp,
        });
        Ok(review_id)
    }

    /// Looks up a review.
    pub fn review(&self, review_id: u64) -> Result<&Review, LedgerError> {
        self.reviews.get(review_id)
    }

    /// Reviews ever accepted.
    pub fn review_count(&self) -> u64 {
        self.reviews.count()
    }

    /// Review ids for a product, in acceptance order.
    pub fn reviews_for_product(&self, product_id: ProductId) -> &[u64] {
        self.reviews.reviews_for_product(product_id)
    }

    /// Spent state of a purchase proof.
    pub fn transaction_usage(&self, transaction_id: TransactionId) -> TransactionUsage {
        self.usage.lookup(transaction_id)
    }

    // ---- trust scores ----

    /// Cached score of a registered product.
    pub fn trust_score(&self, product_id: ProductId) -> Result<TrustScore, LedgerError> {
        self.scores.get(product_id)
    }

    /// Cached scores; unknown ids map to a zero-valued score.
    pub fn trust_scores(&self, product_ids: &[ProductId]) -> Vec<TrustScore> {
        self.scores.get_many(product_ids)
    }

    // ---- broadcast ----

    /// Hands a snapshot of the product's cached score to `gateway`.
    ///
    /// Returns the gateway's message id. Acceptance by the gateway says
    /// nothing about delivery or execution on the destination.
    pub fn broadcast<G: MessagingGateway + ?Sized>(
        &mut self,
        ctx: TxContext,
        gateway: &mut G,
        product_id: ProductId,
        request: BroadcastRequest,
    ) -> Result<MessageId, LedgerError> {
        let result = self.broadcast_inner(ctx, gateway, product_id, request);
        match &result {
            Ok(message_id) => tracing::info!(
                %product_id,
                %message_id,
                destination_domain = %request.destination_domain,
                "trust score broadcast"
            ),
            Err(e) => tracing::warn!(
                %product_id,
                code = e.code(),
                error = %e,
                "broadcast rejected"
            ),
        }
        result
    }

    fn broadcast_inner<G: MessagingGateway + ?Sized>(
        &mut self,
        ctx: TxContext,
        gateway: &mut G,
        product_id: ProductId,
        request: BroadcastRequest,
    ) -> Result<MessageId, LedgerError> {
        self.pause.require_not_paused()?;
        self.access.require_role(Role::Broadcaster, ctx.caller)?;
        let _lock = self.reentrancy.enter("broadcast")?;

        let product = self.registry.get(product_id)?;
        if !product.is_active {
            return Err(LedgerError::InvalidInput(format!(
                "product {} is inactive",
                product_id
            )));
        }
        let score = self.scores.get(product_id)?;
        if score.total_reviews == 0 {
            return Err(LedgerError::InvalidInput(format!(
                "product {} has no reviews to broadcast",
                product_id
            )));
        }

        let prepared = self
            .adapter
            .prepare(ScoreSnapshot::of(product_id, &score), &request)?;
        let message_id = self.adapter.dispatch(gateway, &prepared)?;

        self.outbox.push(Notification::TrustScoreBroadcast {
            message_id,
            product_id,
            destination_domain: request.destination_domain,
            destination_address: request.destination_address,
            average_rating: prepared.snapshot.average_rating,
            total_reviews: prepared.snapshot.total_reviews,
            last_updated: prepared.snapshot.last_updated,
            payload_digest: prepared.payload_digest,
            at: ctx.timestamp,
        });
        Ok(message_id)
    }

    // ---- notifications ----

    /// Notifications queued since the last drain, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.outbox
    }

    /// Takes every queued notification.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }
}

/// Thread-safe handle that totally orders transitions from many callers.
///
/// Transitions take the write lock one at a time. Readers share the read
/// lock and only wait while a transition is running.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<TrustLedger>>,
}

impl SharedLedger {
    /// Wraps a ledger.
    pub fn new(ledger: TrustLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Runs `f` with exclusive access. Transitions never interleave.
    pub fn transact<R>(
        &self,
        f: impl FnOnce(&mut TrustLedger) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let mut ledger = self
            .inner
            .write()
            .map_err(|_| LedgerError::Invariant("ledger lock poisoned".to_string()))?;
        f(&mut ledger)
    }

    /// Runs a read-only closure against a consistent snapshot.
    pub fn read<R>(&self, f: impl FnOnce(&TrustLedger) -> R) -> Result<R, LedgerError> {
        let ledger = self
            .inner
            .read()
            .map_err(|_| LedgerError::Invariant("ledger lock poisoned".to_string()))?;
        Ok(f(&ledger))
    }
}
