//! EFT Engine Library
//! # Overview
//!
//! This library applies electronic funds transfers concurrently against a
//! shared, in-memory set of bank accounts. Transfers are fanned out
//! round-robin to a pool of workers, each draining its own bounded queue,
//! with no lost updates, no deadlocks and an orderly shutdown once all work
//! is consumed.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, TransferRequest, EftError, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - The concurrent engine:
//!   - [`core::account_store`] - AVL tree of lock-guarded accounts
//!   - [`core::work_queue`] - Bounded blocking queue per worker
//!   - [`core::worker`] - Worker loop and deadlock-free transfer application
//!   - [`core::dispatcher`] - Round-robin assignment and exit signalling
//!   - [`core::coordinator`] - Run lifecycle
//! - [`strategy`] - Execution contexts workers run in (threads or tokio tasks)
//! - [`io`] - Input file reader and balance report writer
//! - [`pipeline`] - File-to-report processing
//! - [`logging`] - Tracing subscriber setup
//!
//! # Input Format
//!
//! ```text
//! 3            maximum number of accounts
//! 1 100        <account_id> <initial_balance>
//! 2 50
//! 3 0
//! T 1 2 30     T <from_account> <to_account> <amount>
//! T 2 3 10
//! ```
//!
//! # Transfer Semantics
//!
//! - A transfer debits `from` and credits `to` by `amount`, with no
//!   sufficiency check; balances may go negative
//! - Both account locks are taken in ascending id order, so opposing
//!   transfers between the same pair cannot deadlock
//! - Total balance is conserved by every transfer
//! - Final balances are reported in the order accounts were first listed

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod strategy;
pub mod types;

pub use crate::core::{AccountStore, Coordinator, RunReport, WorkQueue, Worker, WorkerReport};
pub use io::write_balances;
pub use pipeline::process_file;
pub use strategy::EngineConfig;
pub use types::{
    Account, AccountId, Amount, Balance, EftError, Transfer, TransferRequest, WorkerId,
};
