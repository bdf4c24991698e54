//! CLI module for idchain
//!
//! Provides command-line interface for:
//! - init: Create the data directory and ledger log
//! - start: Open the ledger and serve JSON lines on stdin
//! - inspect: Print the last committed checkpoint

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, inspect, open_app, run, run_command, serve, start};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{DriverRequest, TxEnvelope};
