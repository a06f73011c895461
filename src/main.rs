//! EFT Engine CLI
//!
//! Command-line interface for applying transfers from an input file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- input.txt 4 > balances.txt
//! cargo run -- --mode tasks input.txt 4 > balances.txt
//! cargo run -- --queue-capacity 64 --log-level info input.txt 16 > balances.txt
//! ```
//!
//! The program reads the account list and transfer requests from the input
//! file, applies the transfers with the requested number of workers, and
//! prints each account's final balance to stdout.
//!
//! # Execution Modes
//!
//! - **threads**: one OS thread per worker (default)
//! - **tasks**: one blocking task per worker on a tokio runtime
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid worker count, file not found, malformed first line, etc.)

use eft_engine::{cli, logging, pipeline};
use std::process;
use tracing::error;

fn main() {
    // Parse command-line arguments using clap
    let args = cli::parse_args();
    logging::init_logging(&args.log_level);

    let config = match args.to_engine_config() {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    // Output goes to stdout
    let stdout = std::io::stdout();
    let mut output = stdout.lock();
    if let Err(e) = pipeline::process_file(&args.input_file, &config, &mut output) {
        fail(&e);
    }
}

fn fail(e: &eft_engine::EftError) -> ! {
    error!(error = %e, "run failed");
    eprintln!("Error: {}", e);
    process::exit(1);
}
