//! CLI argument definitions using clap
//!
//! Commands:
//! - idchain init --config <path>
//! - idchain start --config <path>
//! - idchain inspect --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// idchain - deterministic state machine for a permissioned identity chain
#[derive(Parser, Debug)]
#[command(name = "idchain")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory and an empty ledger
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./idchain.json")]
        config: PathBuf,
    },

    /// Open the ledger and drive it from JSON lines on stdin
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./idchain.json")]
        config: PathBuf,
    },

    /// Print the last committed checkpoint and exit
    Inspect {
        /// Path to configuration file
        #[arg(long, default_value = "./idchain.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
