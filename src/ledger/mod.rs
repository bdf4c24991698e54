//! Key/value ledger with an in-block overlay
//!
//! The ledger is the single owner of persisted bytes. It exposes two views:
//!
//! - committed (`committed = true`): durable state as of the last commit,
//!   used by admission checks
//! - working (`committed = false`): the in-block overlay first, falling back
//!   to durable state, used by delivery
//!
//! Mutations only touch the overlay and the hash accumulator. `save` flushes
//! the overlay and the new checkpoint to the backend as one atomic batch.
//!
//! # Invariants
//!
//! - Within a block each key has one current value (last write wins)
//! - Durable state changes only in `save`
//! - The accumulator sees every mutation in call order
//! - A rolled-back savepoint leaves no trace in the overlay or the digest

mod accumulator;
mod checkpoint;
pub mod keys;
mod versioned;

pub use accumulator::{to_hex, HashAccumulator, StateHash, GENESIS_HASH};
pub use checkpoint::{Checkpoint, CheckpointView, CHECKPOINT_KEY};
pub use versioned::VersionIndex;

use std::collections::BTreeMap;

use crate::codec::{from_canonical_bytes, to_canonical_bytes, Canonical};
use crate::storage::{KvBackend, StorageError, StorageResult, WriteBatch};

/// Overlay value: `None` records a deletion.
type Pending = Option<Vec<u8>>;

/// Undo entry: key and the overlay slot it replaced (`None` if the key had
/// no overlay entry yet).
type Undo = (Vec<u8>, Option<Pending>);

/// Restore point inside a block.
#[derive(Debug, Clone)]
pub struct Savepoint {
    undo_len: usize,
    accumulator: HashAccumulator,
}

/// The ledger: durable backend plus in-block overlay.
pub struct Ledger {
    backend: Box<dyn KvBackend>,
    overlay: BTreeMap<Vec<u8>, Pending>,
    undo: Vec<Undo>,
    accumulator: HashAccumulator,
    last_checkpoint: Checkpoint,
}

impl Ledger {
    /// Opens a ledger over `backend`, resuming after the stored checkpoint.
    pub fn open(backend: Box<dyn KvBackend>) -> StorageResult<Self> {
        let last_checkpoint = match backend.get(CHECKPOINT_KEY)? {
            Some(bytes) => from_canonical_bytes::<Checkpoint>(&bytes).map_err(|e| {
                StorageError::corruption_for_key(CHECKPOINT_KEY, e.to_string())
            })?,
            None => Checkpoint::genesis(),
        };

        Ok(Self {
            backend,
            overlay: BTreeMap::new(),
            undo: Vec::new(),
            accumulator: HashAccumulator::new(last_checkpoint.state_hash),
            last_checkpoint,
        })
    }

    /// Height of the block currently being executed.
    pub fn height(&self) -> u64 {
        self.last_checkpoint.height + 1
    }

    pub fn last_checkpoint(&self) -> Checkpoint {
        self.last_checkpoint
    }

    /// Number of distinct keys touched in the current block.
    pub fn pending_len(&self) -> usize {
        self.overlay.len()
    }

    /// Number of mutations hashed in the current block.
    pub fn pending_updates(&self) -> u64 {
        self.accumulator.updates()
    }

    pub fn get(&self, key: &[u8], committed: bool) -> StorageResult<Option<Vec<u8>>> {
        if !committed {
            if let Some(pending) = self.overlay.get(key) {
                return Ok(pending.clone());
            }
        }
        self.backend.get(key)
    }

    pub fn has(&self, key: &[u8], committed: bool) -> StorageResult<bool> {
        if !committed {
            if let Some(pending) = self.overlay.get(key) {
                return Ok(pending.is_some());
            }
        }
        self.backend.has(key)
    }

    /// Records a write (`Some`) or deletion (`None`) in the overlay.
    pub fn set(&mut self, key: &[u8], value: Option<Vec<u8>>) {
        match &value {
            Some(v) => self.accumulator.record_set(key, v),
            None => self.accumulator.record_delete(key),
        }
        let previous = self.overlay.insert(key.to_vec(), value);
        self.undo.push((key.to_vec(), previous));
    }

    pub fn put(&mut self, key: &[u8], value: Vec<u8>) {
        self.set(key, Some(value));
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.set(key, None);
    }

    /// Reads and decodes a canonical record. A decode failure is corruption.
    pub fn get_record<T: Canonical>(&self, key: &[u8], committed: bool) -> StorageResult<Option<T>> {
        match self.get(key, committed)? {
            Some(bytes) => decode_record(key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub fn put_record<T: Canonical>(&mut self, key: &[u8], record: &T) {
        self.put(key, to_canonical_bytes(record));
    }

    pub fn savepoint(&self) -> Savepoint {
        Savepoint {
            undo_len: self.undo.len(),
            accumulator: self.accumulator.clone(),
        }
    }

    /// Discards every mutation made after `savepoint`.
    pub fn rollback_to(&mut self, savepoint: Savepoint) {
        while self.undo.len() > savepoint.undo_len {
            if let Some((key, previous)) = self.undo.pop() {
                match previous {
                    Some(pending) => {
                        self.overlay.insert(key, pending);
                    }
                    None => {
                        self.overlay.remove(&key);
                    }
                }
            }
        }
        self.accumulator = savepoint.accumulator;
    }

    /// Flushes the overlay and the new checkpoint atomically.
    ///
    /// On failure the overlay is left untouched so the caller can decide
    /// whether to retry or halt.
    pub fn save(&mut self) -> StorageResult<Checkpoint> {
        let checkpoint = Checkpoint {
            height: self.height(),
            state_hash: self.accumulator.finalize(),
        };

        let mut batch = WriteBatch::new(checkpoint.height);
        for (key, pending) in &self.overlay {
            match pending {
                Some(value) => batch.set(key.clone(), value.clone()),
                None => batch.delete(key.clone()),
            }
        }
        batch.set(CHECKPOINT_KEY.to_vec(), to_canonical_bytes(&checkpoint));

        self.backend.write_batch(&batch)?;

        self.overlay.clear();
        self.undo.clear();
        self.accumulator = HashAccumulator::new(checkpoint.state_hash);
        self.last_checkpoint = checkpoint;

        Ok(checkpoint)
    }
}

pub(crate) fn decode_record<T: Canonical>(key: &[u8], bytes: &[u8]) -> StorageResult<T> {
    from_canonical_bytes(bytes).map_err(|e| StorageError::corruption_for_key(key, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn ledger() -> Ledger {
        Ledger::open(Box::new(MemoryBackend::new())).unwrap()
    }

    #[test]
    fn test_overlay_visible_only_to_working_view() {
        let mut ledger = ledger();
        ledger.put(b"k", b"v".to_vec());

        assert_eq!(ledger.get(b"k", false).unwrap(), Some(b"v".to_vec()));
        assert_eq!(ledger.get(b"k", true).unwrap(), None);
        assert!(ledger.has(b"k", false).unwrap());
        assert!(!ledger.has(b"k", true).unwrap());
    }

    #[test]
    fn test_delete_shadows_committed_value() {
        let mut ledger = ledger();
        ledger.put(b"k", b"v".to_vec());
        ledger.save().unwrap();

        ledger.delete(b"k");
        assert_eq!(ledger.get(b"k", false).unwrap(), None);
        assert_eq!(ledger.get(b"k", true).unwrap(), Some(b"v".to_vec()));

        ledger.save().unwrap();
        assert_eq!(ledger.get(b"k", true).unwrap(), None);
    }

    #[test]
    fn test_last_write_wins_in_block() {
        let mut ledger = ledger();
        ledger.put(b"k", b"1".to_vec());
        ledger.put(b"k", b"2".to_vec());
        assert_eq!(ledger.get(b"k", false).unwrap(), Some(b"2".to_vec()));
        assert_eq!(ledger.pending_len(), 1);
        assert_eq!(ledger.pending_updates(), 2);
    }

    #[test]
    fn test_save_advances_height_and_checkpoint() {
        let mut ledger = ledger();
        assert_eq!(ledger.height(), 1);
        ledger.put(b"k", b"v".to_vec());
        let cp = ledger.save().unwrap();

        assert_eq!(cp.height, 1);
        assert_ne!(cp.state_hash, GENESIS_HASH);
        assert_eq!(ledger.height(), 2);
        assert_eq!(ledger.pending_len(), 0);
        assert_eq!(ledger.last_checkpoint(), cp);
    }

    #[test]
    fn test_empty_block_keeps_hash() {
        let mut ledger = ledger();
        ledger.put(b"k", b"v".to_vec());
        let first = ledger.save().unwrap();
        let second = ledger.save().unwrap();
        assert_eq!(second.height, 2);
        assert_eq!(second.state_hash, first.state_hash);
    }

    #[test]
    fn test_rollback_restores_overlay_and_digest() {
        let mut ledger = ledger();
        ledger.put(b"a", b"1".to_vec());
        let expected_hash = {
            let mut reference = self::ledger();
            reference.put(b"a", b"1".to_vec());
            reference.save().unwrap().state_hash
        };

        let sp = ledger.savepoint();
        ledger.put(b"a", b"2".to_vec());
        ledger.put(b"b", b"x".to_vec());
        ledger.delete(b"a");
        ledger.rollback_to(sp);

        assert_eq!(ledger.get(b"a", false).unwrap(), Some(b"1".to_vec()));
        assert_eq!(ledger.get(b"b", false).unwrap(), None);
        assert_eq!(ledger.save().unwrap().state_hash, expected_hash);
    }

    #[test]
    fn test_reopen_resumes_from_checkpoint() {
        use crate::storage::FileBackend;
        let temp_dir = tempfile::TempDir::new().unwrap();

        let cp = {
            let backend = FileBackend::open(temp_dir.path()).unwrap();
            let mut ledger = Ledger::open(Box::new(backend)).unwrap();
            ledger.put(b"k", b"v".to_vec());
            ledger.save().unwrap()
        };

        let backend = FileBackend::open(temp_dir.path()).unwrap();
        let reopened = Ledger::open(Box::new(backend)).unwrap();
        assert_eq!(reopened.last_checkpoint(), cp);
        assert_eq!(reopened.height(), 2);
        assert_eq!(reopened.get(b"k", true).unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_corrupt_record_is_storage_error() {
        let mut ledger = ledger();
        ledger.put(b"k", vec![1, 2, 3]);
        let err = ledger.get_record::<u64>(b"k", false).unwrap_err();
        assert!(err.is_fatal());
    }
}
