//! Thread-per-worker execution strategy
//!
//! Each worker runs on its own named OS thread (`eft-worker-<id>`). All
//! threads share the account store through an `Arc`; account locks and queue
//! semaphores are ordinary in-process primitives.

use super::{collect_reports, ExecutionStrategy, WorkerGroup};
use crate::core::{Worker, WorkQueue, WorkerReport};
use crate::types::{EftError, WorkerId};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// Launches each worker on a dedicated OS thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadStrategy;

type WorkerThread = (WorkerId, JoinHandle<Result<WorkerReport, EftError>>);

/// Running worker threads
#[derive(Debug)]
struct ThreadGroup {
    threads: Vec<WorkerThread>,
}

impl ExecutionStrategy for ThreadStrategy {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn launch(&self, workers: Vec<Worker>) -> Result<Box<dyn WorkerGroup>, EftError> {
        let mut threads: Vec<WorkerThread> = Vec::with_capacity(workers.len());
        let mut queues: Vec<Arc<WorkQueue>> = Vec::with_capacity(workers.len());

        for worker in workers {
            let id = worker.id();
            let queue = worker.queue();

            let spawned = thread::Builder::new()
                .name(format!("eft-worker-{}", id))
                .spawn(move || worker.run());

            match spawned {
                Ok(handle) => {
                    threads.push((id, handle));
                    queues.push(queue);
                }
                Err(e) => {
                    error!(worker = id, error = %e, "failed to spawn worker thread");
                    // Release the workers that did start
                    for queue in &queues {
                        queue.request_exit();
                    }
                    let _ = Box::new(ThreadGroup { threads }).join();
                    return Err(EftError::fatal_init(
                        &format!("worker thread {}", id),
                        &e.to_string(),
                    ));
                }
            }
        }

        info!(workers = threads.len(), "worker threads started");
        Ok(Box::new(ThreadGroup { threads }))
    }
}

impl WorkerGroup for ThreadGroup {
    fn len(&self) -> usize {
        self.threads.len()
    }

    fn join(self: Box<Self>) -> Result<Vec<WorkerReport>, EftError> {
        collect_reports(self.threads.into_iter().map(|(id, handle)| {
            handle
                .join()
                .unwrap_or_else(|_| Err(EftError::worker_panicked(id)))
        }))
    }
}
