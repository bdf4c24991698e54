//! Backend trait and the in-memory backend

use std::collections::BTreeMap;

use super::errors::StorageResult;

/// A single mutation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl BatchOp {
    pub fn key(&self) -> &[u8] {
        match self {
            BatchOp::Set { key, .. } | BatchOp::Delete { key } => key,
        }
    }
}

/// Ordered set of mutations applied atomically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    /// Block height the batch belongs to (0 for administrative writes)
    pub height: u64,
    pub ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new(height: u64) -> Self {
        Self {
            height,
            ops: Vec::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Set {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Durable key/value store consumed by the ledger.
///
/// Implementations must apply `write_batch` atomically: after a crash either
/// every op of the batch is visible or none is.
pub trait KvBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    fn has(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn write_batch(&mut self, batch: &WriteBatch) -> StorageResult<()>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let mut batch = WriteBatch::new(0);
        batch.set(key, value);
        self.write_batch(&batch)
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        let mut batch = WriteBatch::new(0);
        batch.delete(key);
        self.write_batch(&batch)
    }
}

/// Applies a batch to an ordered map in op order (last write wins).
pub(crate) fn apply_batch(map: &mut BTreeMap<Vec<u8>, Vec<u8>>, batch: &WriteBatch) {
    for op in &batch.ops {
        match op {
            BatchOp::Set { key, value } => {
                map.insert(key.clone(), value.clone());
            }
            BatchOp::Delete { key } => {
                map.remove(key);
            }
        }
    }
}

/// Volatile backend backed by a `BTreeMap`.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in key order.
    pub fn entries(&self) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        &self.entries
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write_batch(&mut self, batch: &WriteBatch) -> StorageResult<()> {
        apply_batch(&mut self.entries, batch);
        Ok(())
    }
}
