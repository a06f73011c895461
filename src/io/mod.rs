//! I/O module
//!
//! Handles reading the input file and writing the balance report.
//!
//! # Components
//!
//! - `input_reader` - Streaming reader for the capacity line, account lines and transfer lines
//! - `report` - Final balance output

pub mod input_reader;
pub mod report;

pub use input_reader::{InputReader, LoadSummary, Transfers};
pub use report::write_balances;
