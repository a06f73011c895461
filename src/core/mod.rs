//! Core transfer-processing module
//!
//! This module contains the concurrent engine components:
//! - `account_store` - AVL tree of lock-guarded accounts
//! - `semaphore` - Counting semaphore used by the work queues
//! - `work_queue` - Bounded blocking queue, one per worker
//! - `worker` - Worker loop and the deadlock-free transfer protocol
//! - `dispatcher` - Round-robin assignment and shutdown signalling
//! - `coordinator` - Run lifecycle: spawn, dispatch, join

pub mod account_store;
pub mod coordinator;
pub mod dispatcher;
pub mod semaphore;
pub mod work_queue;
pub mod worker;

pub use account_store::AccountStore;
pub use coordinator::{Coordinator, RunReport};
pub use dispatcher::Dispatcher;
pub use semaphore::Semaphore;
pub use work_queue::{WorkQueue, DEFAULT_QUEUE_CAPACITY};
pub use worker::{apply_transfer, Worker, WorkerReport};
