//! Storage error types
//!
//! Error codes:
//! - IDC_STORAGE_IO_ERROR (ERROR severity)
//! - IDC_STORAGE_WRITE_FAILED (ERROR severity)
//! - IDC_STORAGE_READ_FAILED (ERROR severity)
//! - IDC_DATA_CORRUPTION (FATAL severity)
//!
//! Every storage error is fatal to the enclosing transaction. FATAL errors
//! are additionally fatal to the process: the ledger cannot be trusted.

use std::fmt;
use std::io;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, node continues
    Error,
    /// Node must stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure
    IdcStorageIoError,
    /// Batch write or fsync failed
    IdcStorageWriteFailed,
    /// Record read failed
    IdcStorageReadFailed,
    /// Checksum failure or malformed record
    IdcDataCorruption,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::IdcStorageIoError => "IDC_STORAGE_IO_ERROR",
            StorageErrorCode::IdcStorageWriteFailed => "IDC_STORAGE_WRITE_FAILED",
            StorageErrorCode::IdcStorageReadFailed => "IDC_STORAGE_READ_FAILED",
            StorageErrorCode::IdcDataCorruption => "IDC_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::IdcDataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with code, message and optional context.
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StorageError {
    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::IdcStorageIoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::IdcStorageWriteFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::IdcStorageReadFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new data corruption error (FATAL)
    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::IdcDataCorruption,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Data corruption with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::IdcDataCorruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// Data corruption in a stored value, with the key as context
    pub fn corruption_for_key(key: &[u8], reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::IdcDataCorruption,
            message: reason.into(),
            details: Some(format!("key: {}", String::from_utf8_lossy(key))),
            source: None,
        }
    }

    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error requires the node to stop
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StorageErrorCode::IdcStorageIoError.code(), "IDC_STORAGE_IO_ERROR");
        assert_eq!(StorageErrorCode::IdcStorageWriteFailed.code(), "IDC_STORAGE_WRITE_FAILED");
        assert_eq!(StorageErrorCode::IdcStorageReadFailed.code(), "IDC_STORAGE_READ_FAILED");
        assert_eq!(StorageErrorCode::IdcDataCorruption.code(), "IDC_DATA_CORRUPTION");
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StorageError::data_corruption("checksum mismatch").is_fatal());
        let err = StorageError::write_failed("disk full", io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_display_contains_context() {
        let err = StorageError::corruption_for_key(b"Request:r1", "bad record");
        let display = err.to_string();
        assert!(display.contains("IDC_DATA_CORRUPTION"));
        assert!(display.contains("FATAL"));
        assert!(display.contains("key: Request:r1"));
    }
}
