//! CLI module for lagroute
//!
//! Provides command-line interface for:
//! - validate: Parse and validate a configuration file
//! - demo: Walk one routing pattern through an in-memory lagging cluster
//! - bench: Compare the three policies over the same workload

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{bench, demo, run_command, validate};
pub use errors::{CliError, CliErrorCode, CliResult};

/// Parse arguments and run the selected command.
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}
