//! Batch record format
//!
//! One record holds every mutation of one committed block:
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record including this field)
//! +------------------+
//! | Height           | (u64 LE)
//! +------------------+
//! | Op Count         | (u32 LE)
//! +------------------+
//! | Ops              | tag u8 (1 = set, 2 = delete)
//! |                  | key (u32 LE length + bytes)
//! |                  | value (u32 LE length + bytes, empty for delete)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself.

use std::io::{self, Cursor, Read};

use super::backend::{BatchOp, WriteBatch};

const TAG_SET: u8 = 1;
const TAG_DELETE: u8 = 2;

/// Length + height + op count + checksum
pub(crate) const MIN_RECORD_SIZE: usize = 4 + 8 + 4 + 4;

/// A committed batch as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub batch: WriteBatch,
}

impl BatchRecord {
    pub fn new(batch: WriteBatch) -> Self {
        Self { batch }
    }

    fn serialize_body(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.batch.height.to_le_bytes());
        buf.extend_from_slice(&(self.batch.ops.len() as u32).to_le_bytes());

        for op in &self.batch.ops {
            let (tag, key, value): (u8, &[u8], &[u8]) = match op {
                BatchOp::Set { key, value } => (TAG_SET, key.as_slice(), value.as_slice()),
                BatchOp::Delete { key } => (TAG_DELETE, key.as_slice(), &[][..]),
            };
            buf.push(tag);
            buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
            buf.extend_from_slice(key);
            buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
            buf.extend_from_slice(value);
        }

        buf
    }

    /// Serialize the complete record: length, body, checksum.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.serialize_body();
        let record_length = (4 + body.len() + 4) as u32;

        let mut record = Vec::with_capacity(record_length as usize);
        record.extend_from_slice(&record_length.to_le_bytes());
        record.extend_from_slice(&body);
        let checksum = super::checksum::compute_checksum(&record);
        record.extend_from_slice(&checksum.to_le_bytes());

        record
    }

    /// Deserialize a record from bytes, verifying checksum.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8]) -> io::Result<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Record too short",
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;

        if record_length < MIN_RECORD_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if data.len() < record_length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Record truncated: expected {} bytes, got {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored_checksum = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed_checksum = super::checksum::compute_checksum(&data[0..checksum_offset]);

        if computed_checksum != stored_checksum {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Checksum mismatch: computed {:08x}, stored {:08x}",
                    computed_checksum, stored_checksum
                ),
            ));
        }

        let mut cursor = Cursor::new(&data[4..checksum_offset]);

        fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
            let mut buf = [0u8; 4];
            reader.read_exact(&mut buf)?;
            Ok(u32::from_le_bytes(buf))
        }

        fn read_bytes<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
            let len = read_u32(reader)? as usize;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            Ok(buf)
        }

        let mut height_buf = [0u8; 8];
        cursor.read_exact(&mut height_buf)?;
        let height = u64::from_le_bytes(height_buf);

        let op_count = read_u32(&mut cursor)?;
        let mut batch = WriteBatch::new(height);

        for _ in 0..op_count {
            let mut tag = [0u8; 1];
            cursor.read_exact(&mut tag)?;
            let key = read_bytes(&mut cursor)?;
            let value = read_bytes(&mut cursor)?;
            match tag[0] {
                TAG_SET => batch.ops.push(BatchOp::Set { key, value }),
                TAG_DELETE => batch.ops.push(BatchOp::Delete { key }),
                other => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("Invalid op tag: {}", other),
                    ))
                }
            }
        }

        if cursor.position() as usize != checksum_offset - 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Record body has trailing bytes",
            ));
        }

        Ok((Self { batch }, record_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> BatchRecord {
        let mut batch = WriteBatch::new(12);
        batch.set(b"NodeID:rp1".to_vec(), b"node".to_vec());
        batch.delete(b"Nonce:old".to_vec());
        BatchRecord::new(batch)
    }

    #[test]
    fn test_record_roundtrip() {
        let record = sample_record();
        let serialized = record.serialize();
        let (deserialized, consumed) = BatchRecord::deserialize(&serialized).unwrap();
        assert_eq!(record, deserialized);
        assert_eq!(consumed, serialized.len());
    }

    #[test]
    fn test_empty_batch_roundtrip() {
        let record = BatchRecord::new(WriteBatch::new(3));
        let serialized = record.serialize();
        assert_eq!(serialized.len(), MIN_RECORD_SIZE);
        let (deserialized, _) = BatchRecord::deserialize(&serialized).unwrap();
        assert!(deserialized.batch.is_empty());
        assert_eq!(deserialized.batch.height, 3);
    }

    #[test]
    fn test_checksum_detects_corruption() {
        let mut serialized = sample_record().serialize();
        let mid = serialized.len() / 2;
        serialized[mid] ^= 0xFF;

        let err = BatchRecord::deserialize(&serialized).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_truncated_record_rejected() {
        let serialized = sample_record().serialize();
        let err = BatchRecord::deserialize(&serialized[..serialized.len() - 3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_deterministic_serialization() {
        assert_eq!(sample_record().serialize(), sample_record().serialize());
    }
}
