//! Codec error types

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Failures while decoding canonical bytes.
///
/// Encoding is infallible; every error here describes malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,

    #[error("invalid tag {tag} for {field}")]
    InvalidTag { field: &'static str, tag: u8 },

    #[error("invalid decimal: {0}")]
    InvalidDecimal(String),

    #[error("unsupported record format version {0}")]
    UnsupportedVersion(u8),

    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
}
