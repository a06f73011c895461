//! Balance report writer
//!
//! Writes one `<account_id> <balance>` line per account, in the order the
//! accounts were first added to the store.

use crate::types::{AccountId, Balance, EftError};
use csv::WriterBuilder;
use std::io::Write;

/// Write final balances to `output`
///
/// # Errors
///
/// Returns `IoError` if writing or flushing fails.
pub fn write_balances(
    balances: &[(AccountId, Balance)],
    output: &mut dyn Write,
) -> Result<(), EftError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(output);

    for &(account, balance) in balances {
        writer.serialize((account, balance)).map_err(|e| {
            write_error(&format!("failed to write account {}: {}", account, e))
        })?;
    }

    writer
        .flush()
        .map_err(|e| write_error(&format!("failed to flush output: {}", e)))?;

    Ok(())
}

fn write_error(message: &str) -> EftError {
    EftError::IoError {
        message: message.to_string(),
    }
}
