//! Account-related types for the EFT engine
//!
//! An `Account` is a single ledger entry whose balance lives behind its own
//! mutex. The mutex is the only way to reach the balance, so every read or
//! write happens while the lock is held.

use super::transfer::{AccountId, Balance};
use parking_lot::{Mutex, MutexGuard};

/// Bank account shared by every worker
///
/// The id is fixed at creation. The balance can only be observed or changed
/// through the guard returned by [`Account::lock`].
#[derive(Debug)]
pub struct Account {
    /// The account id
    id: AccountId,

    /// Current balance, guarded by the account lock
    balance: Mutex<Balance>,
}

impl Account {
    /// Create a new account with the given id and opening balance
    pub fn new(id: AccountId, balance: Balance) -> Self {
        Account {
            id,
            balance: Mutex::new(balance),
        }
    }

    /// The account id
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Acquire the account lock, blocking until it is available
    ///
    /// The lock is released when the returned guard is dropped.
    pub fn lock(&self) -> MutexGuard<'_, Balance> {
        self.balance.lock()
    }

    /// Acquire the account lock without blocking
    ///
    /// Returns `None` if another context currently holds it.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Balance>> {
        self.balance.try_lock()
    }

    /// Read the balance under a short-lived lock
    pub fn balance(&self) -> Balance {
        *self.lock()
    }
}
