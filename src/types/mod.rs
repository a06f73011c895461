//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: The lock-guarded ledger entry shared between workers
//! - `transfer`: Transfer requests and identifier aliases
//! - `error`: Error types for the EFT engine

pub mod account;
pub mod error;
pub mod transfer;

pub use account::Account;
pub use error::EftError;
pub use transfer::{
    AccountId, Amount, Balance, Transfer, TransferRequest, WorkerId, SENTINEL_ACCOUNT,
};
