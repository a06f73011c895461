//! End-to-end processing of one input file
//!
//! [`process_file`] wires the pieces together:
//!
//! 1. Open the input and read the account capacity
//! 2. Load every account into a new [`AccountStore`]
//! 3. Stream the transfer lines through the [`Coordinator`]
//! 4. Write the final balances in first-insertion order
//!
//! Malformed transfer lines and transfers naming an unknown account are
//! logged and skipped. I/O failures are fatal.

use crate::core::{AccountStore, Coordinator, RunReport};
use crate::io::{write_balances, InputReader};
use crate::strategy::EngineConfig;
use crate::types::{AccountId, EftError, Transfer};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Process the input at `input_path` and write final balances to `output`
///
/// # Errors
///
/// - `FileNotFound` or `IoError` if the input cannot be opened or read
/// - `ConfigError` if the first line is not a valid account capacity or the
///   worker count in `config` is invalid
/// - `StoreFull` if there are more distinct accounts than declared
/// - `FatalInit` if a worker cannot be started
/// - `IoError` if the report cannot be written
pub fn process_file(
    input_path: &Path,
    config: &EngineConfig,
    output: &mut dyn Write,
) -> Result<RunReport, EftError> {
    let mut reader = InputReader::open(input_path)?;

    let capacity = reader.read_capacity()?;
    let mut store = AccountStore::with_capacity(capacity)?;
    let summary = reader.load_accounts(&mut store)?;
    info!(
        capacity,
        accounts = summary.added,
        duplicates = summary.duplicates,
        skipped = summary.skipped,
        "accounts loaded"
    );

    let coordinator = Coordinator::new(store, config);
    let mut read_error = None;

    let report = {
        let store = coordinator.store();
        let transfers = reader.transfers().filter_map(|result| match result {
            Ok(transfer) => match unknown_account(store, &transfer) {
                None => Some(transfer),
                Some(account) => {
                    warn!(
                        from = transfer.from_account,
                        to = transfer.to_account,
                        account,
                        "skipping transfer with unknown account"
                    );
                    None
                }
            },
            Err(e @ EftError::IoError { .. }) => {
                read_error.get_or_insert(e);
                None
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed transfer");
                None
            }
        });

        coordinator.run(config.worker_count, transfers)?
    };

    if let Some(e) = read_error {
        return Err(e);
    }

    info!(
        transfers = report.transfers_dispatched,
        workers = report.workers.len(),
        "run complete"
    );
    write_balances(&coordinator.snapshot(), output)?;

    Ok(report)
}

/// The first account of `transfer` that is not in `store`
fn unknown_account(store: &AccountStore, transfer: &Transfer) -> Option<AccountId> {
    [transfer.from_account, transfer.to_account]
        .into_iter()
        .find(|&account| !store.contains(account))
}
