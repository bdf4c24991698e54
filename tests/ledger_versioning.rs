//! Versioned key tests
//!
//! Covers:
//! - point-in-time reads resolve to the newest version at or below the height
//! - reads never return a value written above the requested height
//! - presence is monotonic in height
//! - the external key layout `key|versions` / `key|<height>`
//! - history survives a restart of a file-backed ledger

use idchain::codec::{from_canonical_bytes, to_canonical_bytes};
use idchain::ledger::{keys, Ledger, VersionIndex};
use idchain::storage::{FileBackend, MemoryBackend};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn memory_ledger() -> Ledger {
    Ledger::open(Box::new(MemoryBackend::new())).unwrap()
}

/// Commits empty blocks until the next block to execute is `height`.
fn advance_to(ledger: &mut Ledger, height: u64) {
    while ledger.height() < height {
        ledger.save().unwrap();
    }
}

fn write_at(ledger: &mut Ledger, key: &[u8], height: u64, value: &str) {
    advance_to(ledger, height);
    ledger.set_versioned(key, value.as_bytes().to_vec()).unwrap();
    ledger.save().unwrap();
}

fn read_at(ledger: &Ledger, key: &[u8], height: u64) -> Option<String> {
    ledger
        .get_versioned(key, height, true)
        .unwrap()
        .map(|v| String::from_utf8(v).unwrap())
}

// =============================================================================
// Point-in-time reads
// =============================================================================

#[test]
fn test_read_between_versions_returns_older() {
    let mut ledger = memory_ledger();
    let key = keys::request("r1");
    write_at(&mut ledger, &key, 3, "v3");
    write_at(&mut ledger, &key, 7, "v7");
    write_at(&mut ledger, &key, 12, "v12");

    assert_eq!(read_at(&ledger, &key, 10).as_deref(), Some("v7"));
    assert_eq!(read_at(&ledger, &key, 7).as_deref(), Some("v7"));
    assert_eq!(read_at(&ledger, &key, 6).as_deref(), Some("v3"));
    assert_eq!(read_at(&ledger, &key, 2), None);
    assert_eq!(read_at(&ledger, &key, 0).as_deref(), Some("v12"));
    assert_eq!(read_at(&ledger, &key, 1000).as_deref(), Some("v12"));
}

#[test]
fn test_never_returns_future_value_and_presence_is_monotonic() {
    let mut ledger = memory_ledger();
    let key = keys::request("r1");
    let writes = [(4u64, "a"), (5, "b"), (9, "c")];
    for (h, v) in writes {
        write_at(&mut ledger, &key, h, v);
    }

    let mut seen_present = false;
    for h in 1..=12u64 {
        let got = read_at(&ledger, &key, h);
        let expected = writes.iter().rev().find(|(wh, _)| *wh <= h).map(|(_, v)| v.to_string());
        assert_eq!(got, expected, "height {}", h);
        if seen_present {
            assert!(got.is_some(), "value disappeared at height {}", h);
        }
        seen_present |= got.is_some();
    }
}

#[test]
fn test_last_write_in_block_wins() {
    let mut ledger = memory_ledger();
    let key = keys::request("r1");
    advance_to(&mut ledger, 2);
    ledger.set_versioned(&key, b"first".to_vec()).unwrap();
    ledger.set_versioned(&key, b"second".to_vec()).unwrap();

    // Working view sees the pending version, committed view sees nothing.
    assert_eq!(ledger.get_versioned(&key, 0, false).unwrap(), Some(b"second".to_vec()));
    assert_eq!(ledger.get_versioned(&key, 0, true).unwrap(), None);

    ledger.save().unwrap();
    let index = ledger.version_index(&key, true).unwrap();
    assert_eq!(index.heights(), &[2]);
    assert_eq!(read_at(&ledger, &key, 2).as_deref(), Some("second"));
}

// =============================================================================
// Key layout
// =============================================================================

#[test]
fn test_external_key_layout() {
    let mut ledger = memory_ledger();
    let key = keys::request("r1");
    write_at(&mut ledger, &key, 3, "v3");
    write_at(&mut ledger, &key, 5, "v5");

    assert_eq!(key, b"Request:r1".to_vec());
    assert_eq!(keys::versions_key(&key), b"Request:r1|versions".to_vec());
    assert_eq!(keys::version_key(&key, 5), b"Request:r1|5".to_vec());

    let raw_index = ledger.get(&keys::versions_key(&key), true).unwrap().unwrap();
    let index: VersionIndex = from_canonical_bytes(&raw_index).unwrap();
    assert_eq!(index.heights(), &[3, 5]);
    assert_eq!(to_canonical_bytes(&index), raw_index);

    assert_eq!(
        ledger.get(&keys::version_key(&key, 3), true).unwrap(),
        Some(b"v3".to_vec())
    );
}

#[test]
fn test_rollback_discards_pending_version() {
    let mut ledger = memory_ledger();
    let key = keys::request("r1");
    write_at(&mut ledger, &key, 2, "v2");

    let sp = ledger.savepoint();
    ledger.set_versioned(&key, b"v3".to_vec()).unwrap();
    ledger.rollback_to(sp);
    assert_eq!(ledger.pending_len(), 0);

    let cp = ledger.save().unwrap();
    assert_eq!(ledger.version_index(&key, true).unwrap().heights(), &[2]);
    assert_eq!(cp.height, 3);
}

// =============================================================================
// Durability
// =============================================================================

#[test]
fn test_history_survives_restart() {
    let dir = TempDir::new().unwrap();
    let key = keys::request("r1");
    let checkpoint = {
        let mut ledger = Ledger::open(Box::new(FileBackend::open(dir.path()).unwrap())).unwrap();
        write_at(&mut ledger, &key, 3, "v3");
        write_at(&mut ledger, &key, 7, "v7");
        ledger.last_checkpoint()
    };

    let ledger = Ledger::open(Box::new(FileBackend::open(dir.path()).unwrap())).unwrap();
    assert_eq!(ledger.last_checkpoint(), checkpoint);
    assert_eq!(ledger.height(), 8);
    assert_eq!(read_at(&ledger, &key, 5).as_deref(), Some("v3"));
    assert_eq!(read_at(&ledger, &key, 0).as_deref(), Some("v7"));
}
