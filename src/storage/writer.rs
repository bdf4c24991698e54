//! Batch log writer with fsync enforcement
//!
//! A batch is acknowledged only after its record is written and fsynced.
//! The log is append-only; records are never rewritten in place. A failed
//! append is cut back off the end of the log so a retry starts on a record
//! boundary.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::backend::WriteBatch;
use super::errors::{StorageError, StorageResult};
use super::record::BatchRecord;

/// Appends batch records to `<data_dir>/state/ledger.dat`.
pub struct BatchWriter {
    log_path: PathBuf,
    file: File,
    current_offset: u64,
}

impl BatchWriter {
    /// Opens or creates the batch log, creating parent directories if needed.
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        let state_dir = data_dir.join("state");
        let log_path = state_dir.join("ledger.dat");

        if !state_dir.exists() {
            fs::create_dir_all(&state_dir).map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to create state directory: {}", state_dir.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                StorageError::write_failed(
                    format!("Failed to open ledger log: {}", log_path.display()),
                    e,
                )
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::write_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            log_path,
            file,
            current_offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends one batch record and fsyncs.
    ///
    /// Returns the byte offset the record was written at. On a write or
    /// fsync error the log is truncated back to that offset.
    pub fn append(&mut self, batch: &WriteBatch) -> StorageResult<u64> {
        let serialized = BatchRecord::new(batch.clone()).serialize();
        let offset = self.current_offset;

        append_record(&mut self.file, offset, &serialized, batch.height)?;

        self.current_offset += serialized.len() as u64;
        Ok(offset)
    }
}

/// What the writer needs from the log file.
trait LogFile: Write {
    fn sync(&mut self) -> io::Result<()>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }

    /// The file is in append mode, so later writes follow the new end.
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.sync_all()
    }
}

fn append_record<F: LogFile>(file: &mut F, offset: u64, bytes: &[u8], height: u64) -> StorageResult<()> {
    let written = file.write_all(bytes).map_err(|e| {
        StorageError::write_failed(format!("Failed to write batch for height {}", height), e)
    });

    // fsync - mandatory before the batch counts as committed
    let synced = written.and_then(|()| {
        file.sync().map_err(|e| {
            StorageError::write_failed(format!("fsync failed after batch for height {}", height), e)
        })
    });

    let Err(err) = synced else {
        return Ok(());
    };

    match file.truncate(offset) {
        Ok(()) => Err(err),
        // A partial record left at the tail would fail the next replay.
        Err(e) => Err(StorageError::corruption_at_offset(
            offset,
            format!("{}; truncating the partial record failed: {}", err, e),
        )),
    }
}
