//! CLI-specific error types
//!
//! All CLI errors end the process except `InvalidRequest`, which only fails
//! the offending input line.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Already initialized
    AlreadyInitialized,
    /// Not initialized
    NotInitialized,
    /// Ledger could not be opened
    BootFailed,
    /// Malformed input line
    InvalidRequest,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "IDC_CLI_CONFIG_ERROR",
            Self::IoError => "IDC_CLI_IO_ERROR",
            Self::AlreadyInitialized => "IDC_CLI_ALREADY_INITIALIZED",
            Self::NotInitialized => "IDC_CLI_NOT_INITIALIZED",
            Self::BootFailed => "IDC_CLI_BOOT_FAILED",
            Self::InvalidRequest => "IDC_CLI_INVALID_REQUEST",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized() -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            "Data directory already initialized",
        )
    }

    pub fn not_initialized() -> Self {
        Self::new(
            CliErrorCode::NotInitialized,
            "Data directory not initialized. Run 'idchain init' first.",
        )
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BootFailed, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
