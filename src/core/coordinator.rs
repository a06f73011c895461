//! Run coordinator
//!
//! The `Coordinator` owns the account store for the duration of a run and
//! drives the run lifecycle:
//!
//! 1. Validate the worker count
//! 2. Create one [`WorkQueue`] per worker
//! 3. Launch the workers through the configured [`ExecutionStrategy`]
//! 4. Dispatch the transfer stream round-robin on the calling thread
//! 5. Signal every worker to exit once its queue drains
//! 6. Join all workers
//!
//! Final balances are read only after step 6, since a worker may mutate
//! balances until it observes its exit condition.
//!
//! # Idle workers
//!
//! The dispatcher sends no exit requests when no transfer was dispatched. In
//! that case the coordinator requests exit on every queue itself
//! (`RunReport::idle_shutdown`), so a run with no transfers still terminates.

use super::account_store::AccountStore;
use super::dispatcher::Dispatcher;
use super::work_queue::WorkQueue;
use super::worker::{Worker, WorkerReport};
use crate::strategy::{create_strategy, validate_worker_count, EngineConfig, ExecutionStrategy};
use crate::types::{AccountId, Balance, EftError, Transfer};
use std::sync::Arc;
use tracing::{error, info};

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Transfers pushed onto worker queues
    pub transfers_dispatched: u64,

    /// Exit requests sent by the dispatcher
    pub exit_requests_sent: usize,

    /// True if workers were released by the idle shutdown
    pub idle_shutdown: bool,

    /// Per-worker results, in worker id order
    pub workers: Vec<WorkerReport>,
}

impl RunReport {
    /// Total transfers applied across all workers
    pub fn transfers_applied(&self) -> u64 {
        self.workers.iter().map(|w| w.transfers_applied).sum()
    }
}

/// Owns the account store and runs workers against it
pub struct Coordinator {
    store: Arc<AccountStore>,
    strategy: Box<dyn ExecutionStrategy>,
    queue_capacity: usize,
}

impl Coordinator {
    /// Create a coordinator using the strategy and queue depth from `config`
    pub fn new(store: AccountStore, config: &EngineConfig) -> Self {
        Self::with_strategy(store, create_strategy(config.mode), config.queue_capacity)
    }

    /// Create a coordinator with an explicit execution strategy
    pub fn with_strategy(
        store: AccountStore,
        strategy: Box<dyn ExecutionStrategy>,
        queue_capacity: usize,
    ) -> Self {
        Coordinator {
            store: Arc::new(store),
            strategy,
            queue_capacity,
        }
    }

    /// The shared account store
    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Final balances in account insertion order
    pub fn snapshot(&self) -> Vec<(AccountId, Balance)> {
        self.store.snapshot()
    }

    /// Run `worker_count` workers over `transfers` and wait for them to finish
    ///
    /// Transfers are consumed lazily on the calling thread, which blocks
    /// whenever the next worker's queue is full.
    ///
    /// # Errors
    ///
    /// - `ConfigError` if `worker_count` is invalid (nothing is spawned)
    /// - `FatalInit` if a worker context cannot be started
    /// - `ProtocolViolation` if a transfer names an unknown account; dispatch
    ///   stops there, but every worker is still shut down and joined first
    /// - any error reported by a worker when joined
    pub fn run<I>(&self, worker_count: usize, transfers: I) -> Result<RunReport, EftError>
    where
        I: IntoIterator<Item = Transfer>,
    {
        validate_worker_count(worker_count)?;

        let queues = (0..worker_count)
            .map(|id| WorkQueue::new(id, self.queue_capacity).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        let workers = queues
            .iter()
            .map(|queue| Worker::new(queue.worker_id(), Arc::clone(queue), Arc::clone(&self.store)))
            .collect();

        let mut dispatcher = Dispatcher::new(&queues, &self.store)?;

        let group = self.strategy.launch(workers)?;
        info!(
            workers = worker_count,
            strategy = self.strategy.name(),
            queue_capacity = self.queue_capacity,
            "workers launched"
        );

        let mut dispatch_result = Ok(());
        for transfer in transfers {
            if let Err(e) = dispatcher.dispatch(transfer) {
                error!(error = %e, "dispatch aborted");
                dispatch_result = Err(e);
                break;
            }
        }

        let transfers_dispatched = dispatcher.dispatched();
        let exit_requests_sent = dispatcher.finish();
        let idle_shutdown = exit_requests_sent == 0;
        if idle_shutdown {
            info!("no transfers dispatched; shutting down idle workers");
            for queue in &queues {
                queue.request_exit();
            }
        }

        let joined = group.join();
        dispatch_result?;
        let workers = joined?;

        info!(
            transfers_dispatched,
            exit_requests_sent, idle_shutdown, "all workers terminated"
        );
        Ok(RunReport {
            transfers_dispatched,
            exit_requests_sent,
            idle_shutdown,
            workers,
        })
    }
}
