//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Counters
//! - Typed lifecycle and transaction events
//!
//! Observability is read-only: nothing here feeds the state hash, and a
//! failure to write a log line never fails a transaction.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log an event at its default severity.
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log an event with fields at its default severity.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = default_severity(event);
    Logger::log(severity, event.as_str(), fields);
}

fn default_severity(event: Event) -> Severity {
    match event {
        Event::DataCorruption => Severity::Fatal,
        Event::StorageFailure => Severity::Error,
        Event::FeeDebitFailed => Severity::Warn,
        Event::TxChecked
        | Event::TxRejected
        | Event::TxDelivered
        | Event::TxFailed => Severity::Trace,
        _ => Severity::Info,
    }
}
