//! Ledger scripts: a JSON list of operations applied in order.
//!
//! ```json
//! {
//!   "config": { "admin": "0x0101010101010101010101010101010101010101" },
//!   "operations": [
//!     { "op": "add_product", "caller": "0x0101…", "at": 100, "product": "kettle", "vendor": "0x0202…" },
//!     { "op": "post_review", "caller": "0x0303…", "at": 110, "product": "kettle", "transaction": "order-1", "rating": 80 }
//!   ]
//! }
//! ```
//!
//! Products and transactions are written either as `0x` hex or as a label
//! that is hashed into an id.

use serde::Deserialize;
use std::path::Path;
use trustledger_canonical::{AccountId, DomainId, ProductId, Timestamp, TransactionId};
use trustledger_core::{
    BroadcastRequest, LedgerConfig, LedgerError, MessagingGateway, Role, TrustLedger, TxContext,
};

use crate::errors::CliError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub config: Option<LedgerConfig>,
    pub operations: Vec<ScriptOp>,
}

impl Script {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::Script(format!("failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| CliError::Script(format!("invalid script {}: {}", path.display(), e)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum ScriptOp {
    AddProduct {
        caller: AccountId,
        at: Option<Timestamp>,
        product: String,
        vendor: AccountId,
    },
    SetActive {
        caller: AccountId,
        at: Option<Timestamp>,
        product: String,
        active: bool,
    },
    PostReview {
        caller: AccountId,
        at: Option<Timestamp>,
        product: String,
        transaction: String,
        rating: u8,
    },
    Broadcast {
        caller: AccountId,
        at: Option<Timestamp>,
        product: String,
        destination_domain: DomainId,
        destination_address: AccountId,
        gas_budget: u64,
        #[serde(default)]
        fee_token: AccountId,
        // u64 here: internally tagged enums cannot buffer u128.
        #[serde(default)]
        fee_amount: u64,
    },
    Pause {
        caller: AccountId,
        at: Option<Timestamp>,
    },
    Unpause {
        caller: AccountId,
        at: Option<Timestamp>,
    },
    GrantRole {
        caller: AccountId,
        at: Option<Timestamp>,
        role: Role,
        account: AccountId,
    },
    RevokeRole {
        caller: AccountId,
        at: Option<Timestamp>,
        role: Role,
        account: AccountId,
    },
}

impl ScriptOp {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptOp::AddProduct { .. } => "add_product",
            ScriptOp::SetActive { .. } => "set_active",
            ScriptOp::PostReview { .. } => "post_review",
            ScriptOp::Broadcast { .. } => "broadcast",
            ScriptOp::Pause { .. } => "pause",
            ScriptOp::Unpause { .. } => "unpause",
            ScriptOp::GrantRole { .. } => "grant_role",
            ScriptOp::RevokeRole { .. } => "revoke_role",
        }
    }

    fn context(&self) -> TxContext {
        let (caller, at) = match self {
            ScriptOp::AddProduct { caller, at, .. }
            | ScriptOp::SetActive { caller, at, .. }
            | ScriptOp::PostReview { caller, at, .. }
            | ScriptOp::Broadcast { caller, at, .. }
            | ScriptOp::Pause { caller, at }
            | ScriptOp::Unpause { caller, at }
            | ScriptOp::GrantRole { caller, at, .. }
            | ScriptOp::RevokeRole { caller, at, .. } => (*caller, *at),
        };
        TxContext::new(caller, at.unwrap_or_else(Timestamp::now))
    }

    /// Applies the operation and describes what it did.
    pub fn apply<G: MessagingGateway + ?Sized>(
        &self,
        ledger: &mut TrustLedger,
        gateway: &mut G,
    ) -> Result<String, LedgerError> {
        let ctx = self.context();
        match self {
            ScriptOp::AddProduct {
                product, vendor, ..
            } => {
                let product_id = product_ref(product)?;
                ledger.add_product(ctx, product_id, *vendor)?;
                Ok(format!("product {}", product_id))
            }
            ScriptOp::SetActive {
                product, active, ..
            } => {
                let product_id = product_ref(product)?;
                ledger.set_product_active(ctx, product_id, *active)?;
                Ok(format!("product {} active={}", product_id, active))
            }
            ScriptOp::PostReview {
                product,
                transaction,
                rating,
                ..
            } => {
                let product_id = product_ref(product)?;
                let review_id =
                    ledger.post_review(ctx, product_id, transaction_ref(transaction)?, *rating)?;
                let score = ledger.trust_score(product_id)?;
                Ok(format!(
                    "review {} average={} total={}",
                    review_id, score.average_rating, score.total_reviews
                ))
            }
            ScriptOp::Broadcast {
                product,
                destination_domain,
                destination_address,
                gas_budget,
                fee_token,
                fee_amount,
                ..
            } => {
                let product_id = product_ref(product)?;
                let request = BroadcastRequest {
                    destination_domain: *destination_domain,
                    destination_address: *destination_address,
                    gas_budget: *gas_budget,
                    fee_token: *fee_token,
                    fee_amount: u128::from(*fee_amount),
                };
                let message_id = ledger.broadcast(ctx, gateway, product_id, request)?;
                Ok(format!("message {}", message_id))
            }
            ScriptOp::Pause { .. } => {
                ledger.pause(ctx)?;
                Ok("paused".to_string())
            }
            ScriptOp::Unpause { .. } => {
                ledger.unpause(ctx)?;
                Ok("unpaused".to_string())
            }
            ScriptOp::GrantRole { role, account, .. } => {
                let changed = ledger.grant_role(ctx, *role, *account)?;
                Ok(format!("{} {} granted={}", role, account, changed))
            }
            ScriptOp::RevokeRole { role, account, .. } => {
                let changed = ledger.revoke_role(ctx, *role, *account)?;
                Ok(format!("{} {} revoked={}", role, account, changed))
            }
        }
    }
}

fn product_ref(value: &str) -> Result<ProductId, LedgerError> {
    if value.starts_with("0x") {
        ProductId::parse(value).map_err(|e| LedgerError::InvalidInput(e.to_string()))
    } else {
        Ok(ProductId::from_label(value))
    }
}

fn transaction_ref(value: &str) -> Result<TransactionId, LedgerError> {
    if value.starts_with("0x") {
        TransactionId::parse(value).map_err(|e| LedgerError::InvalidInput(e.to_string()))
    } else {
        Ok(TransactionId::from_label(value))
    }
}
