//! File-backed ledger storage
//!
//! Committed state is the replay of every batch record in the log, in file
//! order. The replayed map is kept in memory; reads never touch the disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::backend::{apply_batch, KvBackend, WriteBatch};
use super::errors::{StorageError, StorageResult};
use super::reader::BatchReader;
use super::writer::BatchWriter;

/// Durable backend over an append-only batch log.
pub struct FileBackend {
    writer: BatchWriter,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    batches_replayed: u64,
}

impl FileBackend {
    /// Opens the backend under `data_dir`, replaying the existing log.
    ///
    /// # Errors
    ///
    /// `IDC_DATA_CORRUPTION` (FATAL) if any record fails validation.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let writer = BatchWriter::open(data_dir)?;
        let mut entries = BTreeMap::new();
        let mut batches_replayed = 0;

        let len = fs::metadata(writer.path())
            .map_err(|e| StorageError::read_failed("Failed to read ledger log metadata", e))?
            .len();

        if len > 0 {
            let mut reader = BatchReader::open(writer.path())?;
            while let Some(record) = reader.read_next()? {
                apply_batch(&mut entries, &record.batch);
                batches_replayed += 1;
            }
        }

        Ok(Self {
            writer,
            entries,
            batches_replayed,
        })
    }

    /// Number of batch records replayed at open.
    pub fn batches_replayed(&self) -> u64 {
        self.batches_replayed
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    /// Durable first, then visible: the in-memory map is only updated once
    /// the record is fsynced.
    fn write_batch(&mut self, batch: &WriteBatch) -> StorageResult<()> {
        self.writer.append(batch)?;
        apply_batch(&mut self.entries, batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reopen_restores_state() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut backend = FileBackend::open(temp_dir.path()).unwrap();
            let mut b1 = WriteBatch::new(1);
            b1.set(b"a".to_vec(), b"1".to_vec());
            b1.set(b"b".to_vec(), b"2".to_vec());
            backend.write_batch(&b1).unwrap();

            let mut b2 = WriteBatch::new(2);
            b2.delete(b"a".to_vec());
            b2.set(b"b".to_vec(), b"3".to_vec());
            backend.write_batch(&b2).unwrap();
        }

        let backend = FileBackend::open(temp_dir.path()).unwrap();
        assert_eq!(backend.batches_replayed(), 2);
        assert_eq!(backend.get(b"a").unwrap(), None);
        assert_eq!(backend.get(b"b").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn test_corrupted_log_halts_open() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut backend = FileBackend::open(temp_dir.path()).unwrap();
            backend.set(b"key", b"value").unwrap();
        }

        let log_path = temp_dir.path().join("state").join("ledger.dat");
        let mut contents = fs::read(&log_path).unwrap();
        let mid = contents.len() / 2;
        contents[mid] ^= 0xFF;
        fs::write(&log_path, contents).unwrap();

        let err = match FileBackend::open(temp_dir.path()) {
            Ok(_) => panic!("corrupted log must not open"),
            Err(e) => e,
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn test_torn_tail_is_corruption() {
        let temp_dir = TempDir::new().unwrap();
        {
            let mut backend = FileBackend::open(temp_dir.path()).unwrap();
            backend.set(b"key", b"value").unwrap();
            backend.set(b"key2", b"value2").unwrap();
        }

        let log_path = temp_dir.path().join("state").join("ledger.dat");
        let contents = fs::read(&log_path).unwrap();
        fs::write(&log_path, &contents[..contents.len() - 5]).unwrap();

        assert!(FileBackend::open(temp_dir.path()).is_err());
    }
}
