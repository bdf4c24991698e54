//! Observable lifecycle and transaction events
//!
//! Events are explicit and typed; their string forms are stable and appear
//! as the `event` field of every log line.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & lifecycle
    BootStart,
    BootComplete,
    ConfigLoaded,
    LedgerOpened,

    // Transactions
    /// Admission accepted a transaction
    TxChecked,
    /// Admission rejected a transaction
    TxRejected,
    /// Delivery finished with code 0
    TxDelivered,
    /// Delivery finished with a non-zero code
    TxFailed,
    /// Domain mutation applied but the fee could not be charged
    FeeDebitFailed,

    // Blocks
    BlockCommitted,

    // Storage
    /// A storage error aborted a transaction or commit
    StorageFailure,
    /// Persisted bytes failed validation (FATAL)
    DataCorruption,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "IDCHAIN_STARTUP_BEGIN",
            Event::BootComplete => "IDCHAIN_STARTUP_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::LedgerOpened => "LEDGER_OPENED",

            Event::TxChecked => "TX_CHECKED",
            Event::TxRejected => "TX_REJECTED",
            Event::TxDelivered => "TX_DELIVERED",
            Event::TxFailed => "TX_FAILED",
            Event::FeeDebitFailed => "FEE_DEBIT_FAILED",

            Event::BlockCommitted => "BLOCK_COMMITTED",

            Event::StorageFailure => "STORAGE_FAILURE",
            Event::DataCorruption => "DATA_CORRUPTION",
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::DataCorruption)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_events_have_string_representation() {
        let events = [
            Event::BootStart,
            Event::BootComplete,
            Event::ConfigLoaded,
            Event::LedgerOpened,
            Event::TxChecked,
            Event::TxRejected,
            Event::TxDelivered,
            Event::TxFailed,
            Event::FeeDebitFailed,
            Event::BlockCommitted,
            Event::StorageFailure,
            Event::DataCorruption,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::DataCorruption.is_fatal());
        assert!(!Event::StorageFailure.is_fatal());
        assert!(!Event::TxFailed.is_fatal());
    }
}
