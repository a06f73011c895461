//! Blocking-task execution strategy
//!
//! Each worker runs as a blocking task on a dedicated multi-threaded tokio
//! runtime. Workers block on queue semaphores and account locks, so they go
//! to the blocking pool (`spawn_blocking`) rather than the async scheduler.
//! The pool is sized to hold every worker at once; a smaller pool would leave
//! queued workers unstarted while the dispatcher blocks on their full queues.

use super::{collect_reports, ExecutionStrategy, WorkerGroup};
use crate::core::{Worker, WorkerReport};
use crate::types::{EftError, WorkerId};
use futures::future::join_all;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::info;

/// Launches each worker as a blocking task on a tokio runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStrategy;

/// Running worker tasks and the runtime that owns them
struct TaskGroup {
    runtime: Runtime,
    tasks: Vec<(WorkerId, JoinHandle<Result<WorkerReport, EftError>>)>,
}

impl ExecutionStrategy for TaskStrategy {
    fn name(&self) -> &'static str {
        "tasks"
    }

    fn launch(&self, workers: Vec<Worker>) -> Result<Box<dyn WorkerGroup>, EftError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers.len().max(1))
            .thread_name("eft-worker")
            .build()
            .map_err(|e| EftError::fatal_init("tokio runtime", &e.to_string()))?;

        let tasks = workers
            .into_iter()
            .map(|worker| {
                let id = worker.id();
                (id, runtime.spawn_blocking(move || worker.run()))
            })
            .collect::<Vec<_>>();

        info!(workers = tasks.len(), "worker tasks started");
        Ok(Box::new(TaskGroup { runtime, tasks }))
    }
}

impl WorkerGroup for TaskGroup {
    fn len(&self) -> usize {
        self.tasks.len()
    }

    fn join(self: Box<Self>) -> Result<Vec<WorkerReport>, EftError> {
        let TaskGroup { runtime, tasks } = *self;
        let (ids, handles): (Vec<WorkerId>, Vec<_>) = tasks.into_iter().unzip();

        let results = runtime.block_on(join_all(handles));

        collect_reports(
            ids.into_iter()
                .zip(results)
                .map(|(id, joined)| joined.unwrap_or_else(|_| Err(EftError::worker_panicked(id)))),
        )
    }
}
