//! CRC32 checksums for batch records
//!
//! Uses CRC32 (IEEE polynomial). A mismatch on read is data corruption.

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies that the computed checksum matches the expected checksum.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}
