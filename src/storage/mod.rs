//! Durable key/value storage for idchain
//!
//! The ledger reaches committed state only through the [`KvBackend`] trait.
//! Two backends are provided:
//!
//! - [`MemoryBackend`]: ordered in-memory map, used by tests and the
//!   `memory` config backend
//! - [`FileBackend`]: append-only log of checksummed batch records, one per
//!   committed block, replayed into memory on open
//!
//! # Design Principles
//!
//! - A block's writes land in one batch record, or not at all
//! - fsync after every batch append
//! - Checksum verified on every record read
//! - Halt on corruption: a bad record is a FATAL error, never skipped

mod backend;
mod checksum;
mod errors;
mod file;
mod reader;
mod record;
mod writer;

pub use backend::{BatchOp, KvBackend, MemoryBackend, WriteBatch};
pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use file::FileBackend;
pub use reader::BatchReader;
pub use record::BatchRecord;
pub use writer::BatchWriter;
