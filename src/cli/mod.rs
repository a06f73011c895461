// CLI module
// Command-line interface and argument parsing

mod args;

pub use args::{CliArgs, ExecutionMode};

use clap::Parser;

/// Parse command-line arguments using clap
///
/// If parsing fails (missing input file or worker count, unknown mode, or
/// `--help`), clap prints the usage or error text and exits the process.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
