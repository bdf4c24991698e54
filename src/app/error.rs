//! Transaction errors
//!
//! One variant per failure category. Every variant maps to a stable
//! `ResultCode`; storage failures always map to `AppStateError`.

use thiserror::Error;

use crate::storage::StorageError;

use super::result::ResultCode;

#[derive(Debug, Error)]
pub enum TxError {
    /// Envelope or parameters could not be decoded
    #[error("unmarshal error: {0}")]
    Unmarshal(String),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Caller lacks registration, activation, role or a valid signature
    #[error("{message}")]
    Permission { code: ResultCode, message: String },

    /// Domain rule violation
    #[error("{message}")]
    Application { code: ResultCode, message: String },

    #[error("app state error: {0}")]
    AppState(#[from] StorageError),
}

impl TxError {
    pub fn permission(code: ResultCode, message: impl Into<String>) -> Self {
        TxError::Permission {
            code,
            message: message.into(),
        }
    }

    pub fn application(code: ResultCode, message: impl Into<String>) -> Self {
        TxError::Application {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ResultCode {
        match self {
            TxError::Unmarshal(_) => ResultCode::UnmarshalError,
            TxError::UnknownMethod(_) => ResultCode::UnknownMethod,
            TxError::Permission { code, .. } | TxError::Application { code, .. } => *code,
            TxError::AppState(_) => ResultCode::AppStateError,
        }
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, TxError::AppState(_))
    }
}

pub type TxResult<T> = Result<T, TxError>;
