//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one `App` instance.
///
/// Counters use atomics so admission, which only holds `&App`, can still
/// count.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    checks: AtomicU64,
    check_rejections: AtomicU64,
    deliveries: AtomicU64,
    delivery_failures: AtomicU64,
    fee_failures: AtomicU64,
    storage_failures: AtomicU64,
    blocks_committed: AtomicU64,
    /// Ledger mutations flushed by commits
    ledger_writes: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_checks(&self) {
        self.checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_check_rejections(&self) {
        self.check_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deliveries(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_delivery_failures(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_fee_failures(&self) {
        self.fee_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_storage_failures(&self) {
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_blocks_committed(&self) {
        self.blocks_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_ledger_writes(&self, count: u64) {
        self.ledger_writes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            checks: self.checks.load(Ordering::Relaxed),
            check_rejections: self.check_rejections.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            fee_failures: self.fee_failures.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            blocks_committed: self.blocks_committed.load(Ordering::Relaxed),
            ledger_writes: self.ledger_writes.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub checks: u64,
    pub check_rejections: u64,
    pub deliveries: u64,
    pub delivery_failures: u64,
    pub fee_failures: u64,
    pub storage_failures: u64,
    pub blocks_committed: u64,
    pub ledger_writes: u64,
}
