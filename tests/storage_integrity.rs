//! Storage integrity tests
//!
//! Covers:
//! - committed blocks survive a reopen, pending mutations do not
//! - a corrupted or truncated ledger log never opens
//! - a corrupted checkpoint record never opens
//! - the CLI refuses to boot on corrupted data

mod common;

use std::fs;
use std::path::Path;

use common::Chain;
use idchain::cli::open_app;
use idchain::config::{BackendKind, Config};
use idchain::ledger::{Ledger, CHECKPOINT_KEY};
use idchain::storage::{FileBackend, KvBackend};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn log_path(dir: &Path) -> std::path::PathBuf {
    dir.join("state").join("ledger.dat")
}

fn file_chain(dir: &Path) -> Chain {
    Chain::with_backend(Box::new(FileBackend::open(dir).unwrap()))
}

fn config_for(dir: &Path) -> Config {
    Config {
        data_dir: dir.to_string_lossy().into_owned(),
        chain_id: "integrity".into(),
        backend: BackendKind::File,
        log_level: "error".into(),
    }
}

// =============================================================================
// Durability
// =============================================================================

#[test]
fn test_committed_state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let checkpoint = {
        let mut chain = file_chain(dir.path());
        chain.bootstrap();
        chain.app.last_checkpoint()
    };

    let chain = file_chain(dir.path());
    assert_eq!(chain.app.last_checkpoint(), checkpoint);
    let node = chain.query("GetNodeInfo", json!({"node_id": "as1"}));
    assert_eq!(node["role"], json!("AS"));
    assert_eq!(chain.balance("rp1"), "100");
}

#[test]
fn test_uncommitted_block_is_lost() {
    let dir = TempDir::new().unwrap();
    let checkpoint = {
        let mut chain = file_chain(dir.path());
        chain.bootstrap();
        chain.deliver_ok("ndid1", "AddService", json!({"service_id": "s2", "service_name": "S2"}));
        chain.app.last_checkpoint()
    };

    let chain = file_chain(dir.path());
    assert_eq!(chain.app.last_checkpoint(), checkpoint);
    assert!(!chain.app.query("GetServiceDetail", br#"{"service_id":"s2"}"#).is_ok());
}

// =============================================================================
// Corruption is never ignored
// =============================================================================

#[test]
fn test_flipped_byte_refuses_to_open() {
    let dir = TempDir::new().unwrap();
    {
        let mut chain = file_chain(dir.path());
        chain.bootstrap();
    }

    let path = log_path(dir.path());
    let mut contents = fs::read(&path).unwrap();
    let mid = contents.len() / 2;
    contents[mid] ^= 0xFF;
    fs::write(&path, contents).unwrap();

    match FileBackend::open(dir.path()) {
        Ok(_) => panic!("corrupted ledger log must not open"),
        Err(e) => assert!(e.is_fatal(), "expected fatal corruption, got {}", e),
    }
}

#[test]
fn test_torn_tail_refuses_to_open() {
    let dir = TempDir::new().unwrap();
    {
        let mut chain = file_chain(dir.path());
        chain.bootstrap();
    }

    let path = log_path(dir.path());
    let contents = fs::read(&path).unwrap();
    fs::write(&path, &contents[..contents.len() - 3]).unwrap();

    assert!(FileBackend::open(dir.path()).is_err());
}

#[test]
fn test_bad_checkpoint_record_refuses_to_open() {
    let dir = TempDir::new().unwrap();
    {
        let mut backend = FileBackend::open(dir.path()).unwrap();
        backend.set(CHECKPOINT_KEY, b"not a checkpoint").unwrap();
    }

    let backend = FileBackend::open(dir.path()).unwrap();
    match Ledger::open(Box::new(backend)) {
        Ok(_) => panic!("ledger must not open over a bad checkpoint"),
        Err(e) => assert!(e.is_fatal()),
    }
}

#[test]
fn test_cli_boot_fails_on_corruption() {
    let dir = TempDir::new().unwrap();
    {
        let mut chain = file_chain(dir.path());
        chain.bootstrap();
    }
    let config = config_for(dir.path());
    assert!(open_app(&config).is_ok());

    let path = log_path(dir.path());
    let mut contents = fs::read(&path).unwrap();
    let last = contents.len() - 1;
    contents[last] ^= 0x01;
    fs::write(&path, contents).unwrap();

    let err = open_app(&config).err().expect("boot must fail");
    assert_eq!(err.code_str(), "IDC_CLI_BOOT_FAILED");
}
