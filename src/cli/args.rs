use crate::strategy::EngineConfig;
use crate::types::EftError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Apply electronic funds transfers concurrently across a pool of workers
#[derive(Parser, Debug)]
#[command(name = "transfprog")]
#[command(about = "Apply electronic funds transfers concurrently across a pool of workers", long_about = None)]
pub struct CliArgs {
    /// Input file containing the account list and transfer requests
    #[arg(value_name = "INPUT", help = "Path to the input file")]
    pub input_file: PathBuf,

    /// Number of workers applying transfers
    #[arg(
        value_name = "WORKERS",
        help = "Number of workers (1 to 10000)"
    )]
    pub workers: usize,

    /// Execution context each worker runs in
    #[arg(
        long = "mode",
        value_name = "MODE",
        default_value = "threads",
        help = "Execution mode: 'threads' for OS threads or 'tasks' for tokio blocking tasks"
    )]
    pub mode: ExecutionMode,

    /// Slots in each worker queue
    #[arg(
        long = "queue-capacity",
        value_name = "SLOTS",
        help = "Number of requests each worker queue can hold (default: 16)"
    )]
    pub queue_capacity: Option<usize>,

    /// Log verbosity, overridden by RUST_LOG
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        default_value = "warn",
        help = "Log level written to stderr: error, warn, info, debug or trace"
    )]
    pub log_level: String,
}

/// Available execution contexts for workers
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    Threads,
    Tasks,
}

impl CliArgs {
    /// Create an EngineConfig from CLI arguments
    ///
    /// A missing queue capacity uses the default; a zero capacity falls back
    /// to the default with a warning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the worker count is out of range.
    pub fn to_engine_config(&self) -> Result<EngineConfig, EftError> {
        let default = EngineConfig::default();
        EngineConfig::new(
            self.workers,
            self.queue_capacity.unwrap_or(default.queue_capacity),
            self.mode,
        )
    }
}
