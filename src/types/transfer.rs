//! Transfer-related types for the EFT engine
//!
//! This module defines the identifier aliases and the two transfer shapes used
//! in the system: the unassigned `Transfer` produced by the input reader, and
//! the `TransferRequest` that the dispatcher places on a worker's queue.

/// Account identifier
pub type AccountId = i64;

/// Account balance. Balances may go negative; debits are unconditional.
pub type Balance = i64;

/// Amount moved by a single transfer
pub type Amount = i64;

/// Worker identifier (index into the coordinator's worker set)
pub type WorkerId = usize;

/// Account id that marks "no more work". Never a valid account.
pub const SENTINEL_ACCOUNT: AccountId = -1;

/// A transfer read from the input, not yet assigned to a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Account debited by `amount`
    pub from_account: AccountId,

    /// Account credited by `amount`
    pub to_account: AccountId,

    /// Amount to move
    pub amount: Amount,
}

impl Transfer {
    /// Create a transfer of `amount` from `from_account` to `to_account`
    pub fn new(from_account: AccountId, to_account: AccountId, amount: Amount) -> Self {
        Transfer {
            from_account,
            to_account,
            amount,
        }
    }

    /// Returns true if either side carries the sentinel id
    pub fn is_sentinel(&self) -> bool {
        self.from_account == SENTINEL_ACCOUNT || self.to_account == SENTINEL_ACCOUNT
    }
}

/// One unit of work on a worker queue
///
/// Immutable once built by the dispatcher. A request whose `from_account` or
/// `to_account` is [`SENTINEL_ACCOUNT`] is the termination sentinel and is
/// never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    /// The worker this request was assigned to
    pub worker_id: WorkerId,

    /// Account debited by `amount`
    pub from_account: AccountId,

    /// Account credited by `amount`
    pub to_account: AccountId,

    /// Amount to move
    pub amount: Amount,
}

impl TransferRequest {
    /// Bind a transfer to the worker that will apply it
    pub fn assign(transfer: Transfer, worker_id: WorkerId) -> Self {
        TransferRequest {
            worker_id,
            from_account: transfer.from_account,
            to_account: transfer.to_account,
            amount: transfer.amount,
        }
    }

    /// The termination sentinel for `worker_id`
    pub fn sentinel(worker_id: WorkerId) -> Self {
        TransferRequest {
            worker_id,
            from_account: SENTINEL_ACCOUNT,
            to_account: SENTINEL_ACCOUNT,
            amount: 0,
        }
    }

    /// Returns true if this request tells the worker to stop
    pub fn is_sentinel(&self) -> bool {
        self.from_account == SENTINEL_ACCOUNT || self.to_account == SENTINEL_ACCOUNT
    }

    /// The canonical lock order for this request's account pair
    ///
    /// Always `(smaller id, larger id)`, regardless of transfer direction.
    pub fn lock_order(&self) -> (AccountId, AccountId) {
        if self.from_account < self.to_account {
            (self.from_account, self.to_account)
        } else {
            (self.to_account, self.from_account)
        }
    }
}
