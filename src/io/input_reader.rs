//! Input file reader
//!
//! Reads the line-oriented input format in three phases, in file order:
//!
//! ```text
//! 5                 <- maximum number of accounts
//! 1 100             <- <account_id> <initial_balance>
//! 2 50
//! -1                <- optional end of accounts
//! T 1 2 30          <- T <from_account> <to_account> <amount>
//! T -1 -1 0         <- optional end of transfers
//! ```
//!
//! Account lines end at a line whose id is `-1`, at the first line starting
//! with `T`, or at end of file. Transfer lines end at the first line whose
//! `from` or `to` account is `-1`, or at end of file.
//!
//! # Tokenisation
//!
//! Lines are read by the `csv` reader configured with a space delimiter, no
//! headers, no quoting and flexible field counts. Each field is then split on
//! any whitespace and empty pieces are dropped before a line is deserialized
//! into its row type, so `1   100`, `1\t100` and `1 100` read the same.
//!
//! # Error Handling
//!
//! - Open failures are returned from [`InputReader::open`]
//! - A bad first line is a `ConfigError`
//! - Malformed account lines are logged and skipped by `load_accounts`
//! - Malformed transfer lines are yielded as `ParseError` with the line number
//! - Underlying I/O errors end reading and are returned as `IoError`

use crate::core::AccountStore;
use crate::types::{AccountId, Amount, Balance, EftError, Transfer, SENTINEL_ACCOUNT};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// `<account_id> <initial_balance>`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
struct AccountRow {
    id: AccountId,
    balance: Balance,
}

/// `T <from_account> <to_account> <amount>`
#[derive(Debug, Deserialize, Clone, PartialEq)]
struct TransferRow {
    tag: String,
    from_account: AccountId,
    to_account: AccountId,
    amount: Amount,
}

/// A non-blank input line with its blanks removed
#[derive(Debug, Clone)]
struct InputLine {
    number: u64,
    fields: StringRecord,
}

impl InputLine {
    fn first(&self) -> &str {
        self.fields.get(0).unwrap_or_default()
    }

    fn starts_transfers(&self) -> bool {
        self.first().starts_with('T')
    }

    /// True if the field at `index` is the `-1` sentinel id
    fn is_sentinel_at(&self, index: usize) -> bool {
        self.fields
            .get(index)
            .is_some_and(|field| field.parse::<AccountId>() == Ok(SENTINEL_ACCOUNT))
    }

    fn parse_error(&self, message: &str) -> EftError {
        EftError::parse_error(self.number, message)
    }
}

/// Counts reported by [`InputReader::load_accounts`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Accounts inserted into the store
    pub added: usize,
    /// Lines whose id was already in the store
    pub duplicates: usize,
    /// Malformed lines that were skipped
    pub skipped: usize,
}

/// Streaming reader over an input file
#[derive(Debug)]
pub struct InputReader {
    reader: csv::Reader<File>,
    /// First transfer line, seen while loading accounts
    pending: Option<InputLine>,
    finished: bool,
}

impl InputReader {
    /// Open the input file at `path`
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if the file does not exist
    /// - `IoError` for any other open failure
    pub fn open(path: &Path) -> Result<Self, EftError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EftError::file_not_found(&path.display().to_string()),
            _ => EftError::IoError {
                message: format!("failed to open '{}': {}", path.display(), e),
            },
        })?;

        let reader = ReaderBuilder::new()
            .delimiter(b' ')
            .quoting(false)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(InputReader {
            reader,
            pending: None,
            finished: false,
        })
    }

    /// Read the declared maximum number of accounts from the first line
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is empty or the first line is not an
    /// integer of at least 1.
    pub fn read_capacity(&mut self) -> Result<i64, EftError> {
        let line = match self.next_line() {
            Some(line) => line?,
            None => return Err(EftError::config_error("input file is empty")),
        };

        match line.first().parse::<i64>() {
            Ok(capacity) if capacity >= 1 => {
                debug!(capacity, "account capacity read");
                Ok(capacity)
            }
            _ => Err(EftError::config_error(&format!(
                "first line should be max number of accounts, got '{}' at line {}",
                line.first(),
                line.number
            ))),
        }
    }

    /// Add every account line to `store`
    ///
    /// Stops at an account id of `-1`, at the first transfer line (which is
    /// kept for [`InputReader::transfers`]) or at end of file. Duplicate ids
    /// are ignored by the store and counted. Malformed lines are logged and
    /// skipped.
    ///
    /// # Errors
    ///
    /// - `IoError` if the file cannot be read
    /// - any error from [`AccountStore::add`], such as `StoreFull`
    pub fn load_accounts(&mut self, store: &mut AccountStore) -> Result<LoadSummary, EftError> {
        let mut summary = LoadSummary::default();

        while let Some(line) = self.next_line() {
            let line = match line {
                Ok(line) => line,
                Err(e @ EftError::IoError { .. }) => return Err(e),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable account line");
                    summary.skipped += 1;
                    continue;
                }
            };

            if line.starts_transfers() {
                self.pending = Some(line);
                break;
            }

            match parse_account(&line) {
                Ok(None) => break,
                Ok(Some(row)) => {
                    if store.add(row.id, row.balance)? {
                        summary.added += 1;
                    } else {
                        summary.duplicates += 1;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "skipping malformed account line");
                    summary.skipped += 1;
                }
            }
        }

        debug!(
            added = summary.added,
            duplicates = summary.duplicates,
            skipped = summary.skipped,
            "accounts loaded"
        );
        Ok(summary)
    }

    /// Iterate over the remaining transfer lines
    ///
    /// Should be called after [`InputReader::load_accounts`].
    pub fn transfers(&mut self) -> Transfers<'_> {
        Transfers { reader: self }
    }

    /// Next non-blank line, or `None` at end of input
    fn next_line(&mut self) -> Option<Result<InputLine, EftError>> {
        if let Some(line) = self.pending.take() {
            return Some(Ok(line));
        }

        let mut record = StringRecord::new();
        while !self.finished {
            match self.reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => {
                    self.finished = true;
                    break;
                }
                Err(e) if e.is_io_error() => {
                    self.finished = true;
                    return Some(Err(EftError::IoError {
                        message: e.to_string(),
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            }

            let number = record.position().map_or(0, |p| p.line());
            let fields: StringRecord = record.iter().flat_map(str::split_whitespace).collect();
            if !fields.is_empty() {
                return Some(Ok(InputLine { number, fields }));
            }
        }

        None
    }
}

/// Iterator over transfer lines, see [`InputReader::transfers`]
#[derive(Debug)]
pub struct Transfers<'a> {
    reader: &'a mut InputReader,
}

impl Iterator for Transfers<'_> {
    type Item = Result<Transfer, EftError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.reader.next_line()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };

        match parse_transfer(&line) {
            Ok(None) => {
                debug!(line = line.number, "end of transfers");
                self.reader.finished = true;
                None
            }
            Ok(Some(transfer)) => Some(Ok(transfer)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Parse an account line; `None` for the `-1` end marker
fn parse_account(line: &InputLine) -> Result<Option<AccountRow>, EftError> {
    if line.first().parse::<AccountId>() == Ok(SENTINEL_ACCOUNT) {
        return Ok(None);
    }

    line.fields
        .deserialize::<AccountRow>(None)
        .map(Some)
        .map_err(|e| line.parse_error(&format!("invalid account line: {}", e)))
}

/// Parse a transfer line; `None` for a line naming account `-1`
///
/// The sentinel check runs before the full row is read, so `T -1 -1` with no
/// amount still ends the transfers.
fn parse_transfer(line: &InputLine) -> Result<Option<Transfer>, EftError> {
    if !line.starts_transfers() {
        return Err(line.parse_error(&format!(
            "expected a transfer line starting with 'T', got '{}'",
            line.first()
        )));
    }

    if line.is_sentinel_at(1) || line.is_sentinel_at(2) {
        return Ok(None);
    }

    let row = line
        .fields
        .deserialize::<TransferRow>(None)
        .map_err(|e| line.parse_error(&format!("invalid transfer line: {}", e)))?;

    Ok(Some(Transfer::new(row.from_account, row.to_account, row.amount)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary input file for testing
    fn create_temp_input(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    /// Read a whole file, returning the store and every transfer result
    fn read_all(content: &str) -> (AccountStore, LoadSummary, Vec<Result<Transfer, EftError>>) {
        let file = create_temp_input(content);
        let mut reader = InputReader::open(file.path()).unwrap();
        let mut store = AccountStore::with_capacity(reader.read_capacity().unwrap()).unwrap();
        let summary = reader.load_accounts(&mut store).unwrap();
        let transfers = reader.transfers().collect();
        (store, summary, transfers)
    }

    #[test]
    fn test_open_missing_file() {
        let result = InputReader::open(Path::new("does/not/exist.txt"));
        assert_eq!(
            result.unwrap_err(),
            EftError::FileNotFound {
                path: "does/not/exist.txt".to_string()
            }
        );
    }

    #[test]
    fn test_reads_accounts_and_transfers() {
        let (store, summary, transfers) = read_all("2\n1 100\n2 50\nT 1 2 30\n");

        assert_eq!(store.snapshot(), vec![(1, 100), (2, 50)]);
        assert_eq!(
            summary,
            LoadSummary {
                added: 2,
                duplicates: 0,
                skipped: 0
            }
        );
        assert_eq!(transfers, vec![Ok(Transfer::new(1, 2, 30))]);
    }

    #[test]
    fn test_account_sentinel_ends_accounts() {
        let (store, _, transfers) = read_all("3\n1 10\n-1\nT 1 1 5\n");

        assert_eq!(store.snapshot(), vec![(1, 10)]);
        assert_eq!(transfers, vec![Ok(Transfer::new(1, 1, 5))]);
    }

    #[test]
    fn test_transfer_sentinel_ends_transfers() {
        let (_, _, transfers) = read_all("2\n1 10\n2 0\nT 1 2 1\nT -1 -1 0\nT 2 1 9\n");
        assert_eq!(transfers, vec![Ok(Transfer::new(1, 2, 1))]);
    }

    #[rstest]
    #[case::from_sentinel("T -1 2 5")]
    #[case::to_sentinel("T 1 -1 5")]
    #[case::without_amount("T -1 -1")]
    fn test_transfer_sentinel_forms(#[case] sentinel: &str) {
        let content = format!("2\n1 10\n2 0\n{}\nT 1 2 3\n", sentinel);
        let (_, _, transfers) = read_all(&content);
        assert!(transfers.is_empty());
    }

    #[test]
    fn test_sentinel_without_amount_stops_later_transfers() {
        let (_, _, transfers) = read_all("2\n1 100\n2 50\nT 1 2 30\nT -1 -1\nT 2 1 5\n");
        assert_eq!(transfers, vec![Ok(Transfer::new(1, 2, 30))]);
    }

    #[test]
    fn test_stray_quote_does_not_swallow_lines() {
        let (store, summary, transfers) = read_all("3\n1 \"100\n2 50\n3 7\nT 2 3 30\n");

        assert_eq!(store.snapshot(), vec![(2, 50), (3, 7)]);
        assert_eq!(summary.skipped, 1);
        assert_eq!(transfers, vec![Ok(Transfer::new(2, 3, 30))]);
    }

    #[rstest]
    #[case::tabs("2\n1\t100\n2\t50\nT\t1\t2\t30\n")]
    #[case::mixed("2\n1 \t 100\n\t2 50\nT 1\t2  30\t\n")]
    #[case::trailing_tab_line("2\n1 100\n2 50\n\t\nT 1 2 30\n")]
    fn test_any_whitespace_separates_fields(#[case] content: &str) {
        let (store, summary, transfers) = read_all(content);

        assert_eq!(store.snapshot(), vec![(1, 100), (2, 50)]);
        assert_eq!(summary.skipped, 0);
        assert_eq!(transfers, vec![Ok(Transfer::new(1, 2, 30))]);
    }

    #[test]
    fn test_duplicate_accounts_are_counted_and_ignored() {
        let (store, summary, _) = read_all("3\n7 100\n7 999\n8 1\n");

        assert_eq!(store.snapshot(), vec![(7, 100), (8, 1)]);
        assert_eq!(summary.added, 2);
        assert_eq!(summary.duplicates, 1);
    }

    #[test]
    fn test_malformed_account_line_is_skipped() {
        let (store, summary, _) = read_all("3\n1 100\nabc 5\n2\n3 30\n");

        assert_eq!(store.snapshot(), vec![(1, 100), (3, 30)]);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn test_malformed_transfer_line_reports_line_number() {
        let (_, _, transfers) = read_all("2\n1 100\n2 50\nT 1 2 x\nT 2 1 5\n");

        assert_eq!(transfers.len(), 2);
        match &transfers[0] {
            Err(EftError::ParseError { line, .. }) => assert_eq!(*line, Some(4)),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert_eq!(transfers[1], Ok(Transfer::new(2, 1, 5)));
    }

    #[test]
    fn test_non_transfer_line_in_transfer_section() {
        let (_, _, transfers) = read_all("2\n1 100\n2 50\nT 1 2 1\n5 6 7\n");

        assert_eq!(transfers[0], Ok(Transfer::new(1, 2, 1)));
        assert!(matches!(transfers[1], Err(EftError::ParseError { .. })));
    }

    #[test]
    fn test_missing_amount_is_parse_error() {
        let (_, _, transfers) = read_all("2\n1 100\n2 50\nT 1 2\n");
        assert!(matches!(
            transfers.as_slice(),
            [Err(EftError::ParseError { .. })]
        ));
    }

    #[test]
    fn test_blank_lines_and_repeated_spaces() {
        let (store, _, transfers) = read_all("\n2\n\n1    100\n  2 50  \n\nT  1   2  30\n\n");

        assert_eq!(store.snapshot(), vec![(1, 100), (2, 50)]);
        assert_eq!(transfers, vec![Ok(Transfer::new(1, 2, 30))]);
    }

    #[test]
    fn test_accounts_to_end_of_file() {
        let (store, _, transfers) = read_all("2\n1 -5\n2 0\n");

        assert_eq!(store.snapshot(), vec![(1, -5), (2, 0)]);
        assert!(transfers.is_empty());
    }

    #[test]
    fn test_negative_and_large_values() {
        let (_, _, transfers) = read_all("1\n1 0\nT 1 1 -9223372036854775808\n");
        assert_eq!(transfers, vec![Ok(Transfer::new(1, 1, i64::MIN))]);
    }

    #[rstest]
    #[case::empty_file("")]
    #[case::blank_lines("\n\n")]
    #[case::not_a_number("many\n1 10\n")]
    #[case::zero("0\n1 10\n")]
    #[case::negative("-3\n1 10\n")]
    fn test_invalid_capacity_line(#[case] content: &str) {
        let file = create_temp_input(content);
        let mut reader = InputReader::open(file.path()).unwrap();
        assert!(matches!(
            reader.read_capacity(),
            Err(EftError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_more_accounts_than_capacity_is_store_full() {
        let file = create_temp_input("1\n1 10\n2 20\n");
        let mut reader = InputReader::open(file.path()).unwrap();
        let mut store = AccountStore::with_capacity(reader.read_capacity().unwrap()).unwrap();

        assert_eq!(
            reader.load_accounts(&mut store),
            Err(EftError::StoreFull { capacity: 1 })
        );
    }
}
