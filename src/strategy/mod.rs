//! Execution strategy module for worker contexts
//!
//! This module defines the Strategy pattern for launching workers. The worker
//! loop, queue and locking protocol are identical in every mode; a strategy
//! only decides what kind of execution context each worker runs in, selected
//! at runtime:
//!
//! - [`ThreadStrategy`]: one named OS thread per worker
//! - [`TaskStrategy`]: one blocking task per worker on a tokio runtime

use crate::cli::ExecutionMode;
use crate::core::{Worker, WorkerReport, DEFAULT_QUEUE_CAPACITY};
use crate::types::EftError;
use tracing::warn;

pub mod tasks;
pub mod threads;

pub use tasks::TaskStrategy;
pub use threads::ThreadStrategy;

/// Largest accepted worker count
pub const MAX_WORKERS: usize = 10_000;

/// Engine configuration
///
/// Controls how many workers run, how deep each worker queue is, and which
/// execution strategy launches them.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Number of workers (1..=MAX_WORKERS)
    pub worker_count: usize,
    /// Slots in each worker queue
    pub queue_capacity: usize,
    /// Execution context for workers
    pub mode: ExecutionMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get().clamp(1, MAX_WORKERS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mode: ExecutionMode::Threads,
        }
    }
}

impl EngineConfig {
    /// Create a validated EngineConfig
    ///
    /// A zero queue capacity falls back to the default with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `worker_count` is outside `1..=MAX_WORKERS`.
    pub fn new(
        worker_count: usize,
        queue_capacity: usize,
        mode: ExecutionMode,
    ) -> Result<Self, EftError> {
        validate_worker_count(worker_count)?;

        let queue_capacity = if queue_capacity == 0 {
            warn!(
                "Invalid queue_capacity ({}), using default ({})",
                queue_capacity, DEFAULT_QUEUE_CAPACITY
            );
            DEFAULT_QUEUE_CAPACITY
        } else {
            queue_capacity
        };

        Ok(Self {
            worker_count,
            queue_capacity,
            mode,
        })
    }
}

/// Check that `worker_count` is within `1..=MAX_WORKERS`
pub fn validate_worker_count(worker_count: usize) -> Result<(), EftError> {
    if worker_count == 0 || worker_count > MAX_WORKERS {
        return Err(EftError::config_error(&format!(
            "invalid number of workers: {}, expected 1 to {}",
            worker_count, MAX_WORKERS
        )));
    }
    Ok(())
}

/// Strategy trait for launching worker execution contexts
pub trait ExecutionStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Start every worker in its own execution context
    ///
    /// On success all workers are running and blocked on their queues. If any
    /// context fails to start, the ones already started are asked to exit and
    /// joined before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `FatalInit` if an execution context cannot be created.
    fn launch(&self, workers: Vec<Worker>) -> Result<Box<dyn WorkerGroup>, EftError>;
}

/// Handle to a set of running workers
pub trait WorkerGroup: Send {
    /// Number of workers in the group
    fn len(&self) -> usize;

    /// Returns true if the group has no workers
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every worker to reach TERMINATED
    ///
    /// Always waits for all workers, even after one fails. Reports are in
    /// worker id order.
    ///
    /// # Errors
    ///
    /// Returns the first worker error, or `WorkerPanicked` for a worker whose
    /// context terminated abnormally.
    fn join(self: Box<Self>) -> Result<Vec<WorkerReport>, EftError>;
}

/// Create an execution strategy for the specified mode
pub fn create_strategy(mode: ExecutionMode) -> Box<dyn ExecutionStrategy> {
    match mode {
        ExecutionMode::Threads => Box::new(ThreadStrategy),
        ExecutionMode::Tasks => Box::new(TaskStrategy),
    }
}

/// Fold per-worker results into reports, keeping the first error
fn collect_reports<I>(results: I) -> Result<Vec<WorkerReport>, EftError>
where
    I: IntoIterator<Item = Result<WorkerReport, EftError>>,
{
    let mut reports = Vec::new();
    let mut first_error = None;

    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(reports),
    }
}
