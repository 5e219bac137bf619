//! CLI argument definitions using clap
//!
//! Commands:
//! - lagroute validate --config <path>
//! - lagroute demo --policy <kind>
//! - lagroute bench [--sessions N] [--writes N] [--reads N]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// lagroute - consistency-aware read/write routing for primary-replica stores
#[derive(Parser, Debug)]
#[command(name = "lagroute")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a configuration file without contacting any node
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./lagroute.json")]
        config: PathBuf,
    },

    /// Walk one routing pattern through an in-memory lagging cluster
    Demo {
        /// Policy to demonstrate: time_window, log_position or sticky_hash
        #[arg(long, default_value = "log_position")]
        policy: String,
    },

    /// Compare the three policies' latency over the same workload
    Bench {
        /// Number of concurrent logical sessions
        #[arg(long, default_value_t = 8)]
        sessions: usize,

        /// Writes issued per session
        #[arg(long, default_value_t = 5)]
        writes: usize,

        /// Reads issued per session
        #[arg(long, default_value_t = 20)]
        reads: usize,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
