//! Sequential batch log reader with strict corruption detection
//!
//! - Every read validates the record checksum
//! - Any malformed or truncated record is FATAL corruption

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::{BatchRecord, MIN_RECORD_SIZE};

/// Reader for replaying the batch log from the start.
pub struct BatchReader {
    log_path: PathBuf,
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl BatchReader {
    /// Opens the batch log for reading.
    pub fn open(log_path: &Path) -> StorageResult<Self> {
        let file = File::open(log_path).map_err(|e| {
            StorageError::read_failed(
                format!("Failed to open ledger log: {}", log_path.display()),
                e,
            )
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StorageError::read_failed("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            log_path: log_path.to_path_buf(),
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next batch record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of file
    /// - `Err(IDC_DATA_CORRUPTION)` on checksum failure or truncation
    pub fn read_next(&mut self) -> StorageResult<Option<BatchRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;

        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Truncated ledger log: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if record_length > remaining {
            return Err(StorageError::corruption_at_offset(
                self.current_offset,
                format!(
                    "Record length {} exceeds remaining file size {}",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[0..4].copy_from_slice(&len_buf);

        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StorageError::corruption_at_offset(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, bytes_consumed) = BatchRecord::deserialize(&record_buf)
            .map_err(|e| StorageError::corruption_at_offset(self.current_offset, e.to_string()))?;

        self.current_offset += bytes_consumed as u64;

        Ok(Some(record))
    }

    /// Reads all records. Any corruption causes immediate failure.
    pub fn read_all(&mut self) -> StorageResult<Vec<BatchRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}
