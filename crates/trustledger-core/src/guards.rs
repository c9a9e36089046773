//! Precondition guards run at the start of mutating entry points.
//!
//! Authorization, pausing and reentrancy are modelled as explicit objects
//! invoked in a fixed order rather than as behavior inherited by the ledger.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use trustledger_canonical::AccountId;

use crate::errors::LedgerError;

/// Roles recognised by [`AccessControl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages roles and the pause gate.
    Admin,
    /// Registers products and toggles their activation.
    ProductManager,
    /// Broadcasts trust scores to remote domains.
    Broadcaster,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::ProductManager => "product_manager",
            Role::Broadcaster => "broadcaster",
        };
        f.write_str(name)
    }
}

/// Role membership table.
#[derive(Debug, Default, Clone)]
pub struct AccessControl {
    members: BTreeMap<Role, BTreeSet<AccountId>>,
}

impl AccessControl {
    /// Table with `admin` holding every role.
    pub fn with_admin(admin: AccountId) -> Self {
        let mut access = Self::default();
        for role in [Role::Admin, Role::ProductManager, Role::Broadcaster] {
            access.grant(role, admin);
        }
        access
    }

    /// Whether `account` holds `role`.
    pub fn has_role(&self, role: Role, account: AccountId) -> bool {
        self.members
            .get(&role)
            .is_some_and(|members| members.contains(&account))
    }

    /// Fails with `Unauthorized` unless `caller` holds `role`.
    pub fn require_role(&self, role: Role, caller: AccountId) -> Result<(), LedgerError> {
        tracing::debug!(%role, %caller, "checking role");
        if self.has_role(role, caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(format!(
                "{} lacks role {}",
                caller, role
            )))
        }
    }

    /// Adds a member. Returns `false` if it already held the role.
    pub fn grant(&mut self, role: Role, account: AccountId) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Removes a member. Returns `false` if it did not hold the role.
    pub fn revoke(&mut self, role: Role, account: AccountId) -> bool {
        self.members
            .get_mut(&role)
            .is_some_and(|members| members.remove(&account))
    }

    /// Members of a role.
    pub fn members(&self, role: Role) -> impl Iterator<Item = AccountId> + '_ {
        self.members.get(&role).into_iter().flatten().copied()
    }
}

/// Global switch over every mutating entry point.
#[derive(Debug, Default, Clone)]
pub struct PauseGate {
    paused: bool,
}

impl PauseGate {
    /// Gate in the given state.
    pub fn new(paused: bool) -> Self {
        Self { paused }
    }

    /// Whether the gate is engaged.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fails with `PausedState` while engaged.
    pub fn require_not_paused(&self) -> Result<(), LedgerError> {
        if self.paused {
            Err(LedgerError::PausedState)
        } else {
            Ok(())
        }
    }

    /// Engages the gate.
    pub fn pause(&mut self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::PausedState);
        }
        self.paused = true;
        Ok(())
    }

    /// Releases the gate.
    pub fn unpause(&mut self) -> Result<(), LedgerError> {
        if !self.paused {
            return Err(LedgerError::InvalidInput("ledger is not paused".to_string()));
        }
        self.paused = false;
        Ok(())
    }
}

/// Mutual exclusion over state-mutating entry points.
#[derive(Debug, Default, Clone)]
pub struct ReentrancyGuard {
    entered: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    /// Creates an unheld guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the guard for `scope`. Released when the lock drops.
    pub fn enter(&self, scope: &'static str) -> Result<ReentrancyLock, LedgerError> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| LedgerError::Reentrancy(scope))?;
        Ok(ReentrancyLock {
            entered: Arc::clone(&self.entered),
        })
    }

    /// Whether some entry point currently holds the guard.
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Held [`ReentrancyGuard`]; releases on drop, including on early return.
#[derive(Debug)]
pub struct ReentrancyLock {
    entered: Arc<AtomicBool>,
}

impl Drop for ReentrancyLock {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}
