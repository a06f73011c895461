//! Round-robin dispatcher
//!
//! The `Dispatcher` assigns incoming transfers to worker queues in strict
//! round-robin order and, at end of input, sends each worker its exit signal.
//!
//! # Assignment
//!
//! The first transfer goes to worker 0, the next to worker 1, and so on,
//! wrapping at the worker count. Assignment ignores load. Pushes block while
//! the target queue is full.
//!
//! # Shutdown
//!
//! [`Dispatcher::finish`] walks the workers starting at the one after the last
//! assignment and requests exit on each exactly once, ending back at the last
//! assigned worker. If nothing was ever assigned it sends nothing; the caller
//! decides how to release idle workers in that case.

use super::account_store::AccountStore;
use super::work_queue::WorkQueue;
use crate::types::{EftError, Transfer, TransferRequest, WorkerId, SENTINEL_ACCOUNT};
use std::sync::Arc;
use tracing::debug;

/// Round-robin assignment of transfers to worker queues
#[derive(Debug)]
pub struct Dispatcher<'a> {
    queues: &'a [Arc<WorkQueue>],
    store: &'a AccountStore,
    last_assigned: Option<WorkerId>,
    dispatched: u64,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher over `queues`, validating transfers against `store`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `queues` is empty.
    pub fn new(queues: &'a [Arc<WorkQueue>], store: &'a AccountStore) -> Result<Self, EftError> {
        if queues.is_empty() {
            return Err(EftError::config_error(
                "dispatcher needs at least one worker queue",
            ));
        }

        Ok(Dispatcher {
            queues,
            store,
            last_assigned: None,
            dispatched: 0,
        })
    }

    /// The worker that received the most recent transfer
    pub fn last_assigned(&self) -> Option<WorkerId> {
        self.last_assigned
    }

    /// Number of transfers dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// The worker the next transfer will go to
    pub fn next_worker(&self) -> WorkerId {
        self.last_assigned
            .map_or(0, |worker| (worker + 1) % self.queues.len())
    }

    /// Assign `transfer` to the next worker and push it onto that queue
    ///
    /// Blocks while the target queue is full. Returns the chosen worker.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolViolation` if the transfer carries the sentinel id or
    /// names an account that is not in the store. Nothing is enqueued and the
    /// round-robin position does not advance.
    pub fn dispatch(&mut self, transfer: Transfer) -> Result<WorkerId, EftError> {
        if transfer.is_sentinel() {
            return Err(EftError::protocol_violation(SENTINEL_ACCOUNT));
        }
        for account in [transfer.from_account, transfer.to_account] {
            if !self.store.contains(account) {
                return Err(EftError::protocol_violation(account));
            }
        }

        let worker = self.next_worker();
        self.queues[worker].push(TransferRequest::assign(transfer, worker));
        self.last_assigned = Some(worker);
        self.dispatched += 1;

        Ok(worker)
    }

    /// Request exit on every worker, starting after the last assignment
    ///
    /// Returns the number of exit requests sent: the worker count, or zero if
    /// no transfer was ever dispatched.
    pub fn finish(&mut self) -> usize {
        let Some(last) = self.last_assigned else {
            debug!("no transfers dispatched; no exit requests sent");
            return 0;
        };

        let workers = self.queues.len();
        let mut worker = last;
        let mut sent = 0;
        loop {
            worker = (worker + 1) % workers;
            self.queues[worker].request_exit();
            sent += 1;
            if worker == last {
                break;
            }
        }

        debug!(sent, "exit requested on all workers");
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountId;
    use rstest::rstest;

    fn store_with(ids: &[AccountId]) -> AccountStore {
        let mut store = AccountStore::with_capacity(ids.len() as i64).unwrap();
        for &id in ids {
            store.add(id, 100).unwrap();
        }
        store
    }

    fn queues(count: usize) -> Vec<Arc<WorkQueue>> {
        (0..count)
            .map(|id| Arc::new(WorkQueue::new(id, 16).unwrap()))
            .collect()
    }

    #[test]
    fn test_new_rejects_no_queues() {
        let store = store_with(&[1]);
        assert!(matches!(
            Dispatcher::new(&[], &store),
            Err(EftError::ConfigError { .. })
        ));
    }

    #[rstest]
    #[case::one_worker(1, vec![0, 0, 0, 0])]
    #[case::two_workers(2, vec![0, 1, 0, 1])]
    #[case::three_workers(3, vec![0, 1, 2, 0])]
    #[case::more_workers_than_work(8, vec![0, 1, 2, 3])]
    fn test_round_robin_assignment(#[case] workers: usize, #[case] expected: Vec<WorkerId>) {
        let store = store_with(&[1, 2]);
        let queues = queues(workers);
        let mut dispatcher = Dispatcher::new(&queues, &store).unwrap();

        let assigned: Vec<WorkerId> = (0..4)
            .map(|_| dispatcher.dispatch(Transfer::new(1, 2, 5)).unwrap())
            .collect();

        assert_eq!(assigned, expected);
        assert_eq!(dispatcher.dispatched(), 4);
        assert_eq!(dispatcher.last_assigned(), expected.last().copied());
    }

    #[test]
    fn test_dispatch_tags_request_with_worker() {
        let store = store_with(&[1, 2]);
        let queues = queues(2);
        let mut dispatcher = Dispatcher::new(&queues, &store).unwrap();

        dispatcher.dispatch(Transfer::new(1, 2, 5)).unwrap();
        dispatcher.dispatch(Transfer::new(2, 1, 7)).unwrap();

        let first = queues[0].pop();
        let second = queues[1].pop();
        assert_eq!((first.worker_id, first.amount), (0, 5));
        assert_eq!((second.worker_id, second.amount), (1, 7));
    }

    #[rstest]
    #[case::unknown_from(Transfer::new(9, 2, 1), 9)]
    #[case::unknown_to(Transfer::new(1, 9, 1), 9)]
    #[case::sentinel(Transfer::new(SENTINEL_ACCOUNT, 2, 1), SENTINEL_ACCOUNT)]
    #[case::sentinel_to(Transfer::new(1, SENTINEL_ACCOUNT, 1), SENTINEL_ACCOUNT)]
    fn test_dispatch_rejects_invalid_accounts(
        #[case] transfer: Transfer,
        #[case] account: AccountId,
    ) {
        let store = store_with(&[1, 2]);
        let queues = queues(2);
        let mut dispatcher = Dispatcher::new(&queues, &store).unwrap();

        assert_eq!(
            dispatcher.dispatch(transfer),
            Err(EftError::ProtocolViolation { account })
        );
        assert_eq!(dispatcher.last_assigned(), None);
        assert_eq!(dispatcher.next_worker(), 0);
        assert!(queues.iter().all(|q| q.is_empty()));
    }

    #[test]
    fn test_finish_without_dispatch_sends_nothing() {
        let store = store_with(&[1, 2]);
        let queues = queues(3);
        let mut dispatcher = Dispatcher::new(&queues, &store).unwrap();

        assert_eq!(dispatcher.finish(), 0);
        assert!(queues.iter().all(|q| !q.exit_requested()));
    }

    #[rstest]
    #[case::wraps_after_last(3, 2)]
    #[case::last_is_final_worker(3, 3)]
    #[case::single_worker(1, 5)]
    #[case::fewer_transfers_than_workers(4, 1)]
    fn test_finish_signals_every_worker_once(#[case] workers: usize, #[case] transfers: usize) {
        let store = store_with(&[1, 2]);
        let queues = queues(workers);
        let mut dispatcher = Dispatcher::new(&queues, &store).unwrap();

        for _ in 0..transfers {
            dispatcher.dispatch(Transfer::new(1, 2, 1)).unwrap();
        }

        assert_eq!(dispatcher.finish(), workers);
        assert!(queues.iter().all(|q| q.exit_requested()));

        // Each queue yields its real requests, then exactly one sentinel
        for queue in &queues {
            let real = queue.len();
            for _ in 0..real {
                assert!(!queue.pop().is_sentinel());
            }
            assert!(queue.pop().is_sentinel());
        }
    }
}
