//! Transfer worker
//!
//! This module provides the `Worker`, the unit of execution that drains one
//! [`WorkQueue`] and applies each transfer to the shared [`AccountStore`].
//!
//! # Lock ordering
//!
//! A transfer needs both account locks at once. Two workers moving money
//! between the same pair in opposite directions would deadlock if each took
//! its `from` lock first. [`apply_transfer`] instead always locks the smaller
//! account id first and the larger second, so every worker acquires any pair
//! in the same global order and no cycle of waiters can form. Locks are
//! released in reverse order (larger id, then smaller id).
//!
//! # Lifecycle
//!
//! ```text
//! RUNNING --pop() returns sentinel--> TERMINATED
//! RUNNING --apply fails--> DRAINING --pop() returns sentinel--> TERMINATED
//! ```
//!
//! A worker that fails keeps popping and discarding requests until its exit
//! signal, so the dispatcher never blocks on a queue nobody consumes.
//!
//! The worker does not own a thread; an execution strategy decides where
//! [`Worker::run`] executes.

use super::account_store::AccountStore;
use super::work_queue::WorkQueue;
use crate::types::{EftError, TransferRequest, WorkerId};
use std::sync::Arc;
use tracing::{debug, error};

/// Outcome of a worker that reached TERMINATED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    /// The worker id
    pub worker_id: WorkerId,

    /// Number of transfers applied before termination
    pub transfers_applied: u64,
}

/// An execution context's state: its id, its queue and the shared store
#[derive(Debug)]
pub struct Worker {
    id: WorkerId,
    queue: Arc<WorkQueue>,
    store: Arc<AccountStore>,
}

impl Worker {
    /// Create a worker consuming `queue` and mutating `store`
    pub fn new(id: WorkerId, queue: Arc<WorkQueue>, store: Arc<AccountStore>) -> Self {
        Worker { id, queue, store }
    }

    /// The worker id
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Handle to this worker's queue
    pub fn queue(&self) -> Arc<WorkQueue> {
        Arc::clone(&self.queue)
    }

    /// Run until the termination sentinel is popped
    ///
    /// Every request pushed before the exit signal is applied before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolViolation` if a request names an unknown account.
    /// Nothing after that request is applied, but the queue is still drained
    /// up to the exit signal before this returns.
    pub fn run(self) -> Result<WorkerReport, EftError> {
        debug!(worker = self.id, "worker running");
        let mut transfers_applied = 0u64;

        loop {
            let request = self.queue.pop();
            if request.is_sentinel() {
                break;
            }

            if let Err(e) = apply_transfer(&self.store, &request) {
                error!(worker = self.id, error = %e, "worker aborted");
                let discarded = self.discard_until_exit();
                debug!(worker = self.id, discarded, "queue drained after abort");
                return Err(e);
            }
            transfers_applied += 1;
        }

        debug!(worker = self.id, transfers_applied, "worker terminated");
        Ok(WorkerReport {
            worker_id: self.id,
            transfers_applied,
        })
    }

    /// Pop and drop requests until the sentinel, returning how many were dropped
    fn discard_until_exit(&self) -> u64 {
        let mut discarded = 0;
        while !self.queue.pop().is_sentinel() {
            discarded += 1;
        }
        discarded
    }
}

/// Apply one transfer atomically with respect to both accounts
///
/// Locks the smaller account id first, reads both balances, writes
/// `from - amount` and `to + amount`, then releases the larger id's lock
/// followed by the smaller id's lock. There is no sufficiency check; debits
/// may drive a balance negative. Arithmetic wraps so the operation cannot fail
/// once both locks are held.
///
/// A transfer from an account to itself takes the lock once and leaves the
/// balance unchanged.
///
/// # Errors
///
/// Returns `ProtocolViolation` if either account id is not in the store.
pub fn apply_transfer(store: &AccountStore, request: &TransferRequest) -> Result<(), EftError> {
    let from = store
        .get(request.from_account)
        .ok_or_else(|| EftError::protocol_violation(request.from_account))?;
    let to = store
        .get(request.to_account)
        .ok_or_else(|| EftError::protocol_violation(request.to_account))?;

    if from.id() == to.id() {
        let _held = from.lock();
        return Ok(());
    }

    let (lower_id, _) = request.lock_order();
    let from_is_lower = from.id() == lower_id;
    let (lower, higher) = if from_is_lower { (from, to) } else { (to, from) };

    let mut lower_guard = lower.lock();
    let mut higher_guard = higher.lock();

    {
        let (from_balance, to_balance) = if from_is_lower {
            (&mut *lower_guard, &mut *higher_guard)
        } else {
            (&mut *higher_guard, &mut *lower_guard)
        };

        let (old_from, old_to) = (*from_balance, *to_balance);
        *from_balance = old_from.wrapping_sub(request.amount);
        *to_balance = old_to.wrapping_add(request.amount);
    }

    drop(higher_guard);
    drop(lower_guard);

    debug!(
        worker = request.worker_id,
        from = request.from_account,
        to = request.to_account,
        amount = request.amount,
        "transfer applied"
    );
    Ok(())
}
