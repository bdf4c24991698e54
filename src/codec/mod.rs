//! Canonical record encoding for idchain
//!
//! Every structured value written to the ledger goes through this module.
//! Two replicas holding semantically identical state must produce identical
//! bytes, otherwise their state hashes diverge and the network forks.
//!
//! # Format
//!
//! - Integers: fixed width, little-endian
//! - Booleans: one byte, 0 or 1
//! - Strings and byte strings: u32 LE length prefix, then raw bytes
//! - Options: one tag byte (0 = none, 1 = some), then the value
//! - Sequences: u32 LE element count, then each element
//! - Decimals: normalized decimal string
//!
//! Records open with a single format version byte (`FORMAT_VERSION`).
//! Field order is fixed by each record's `Canonical` impl and never depends
//! on map iteration order.

mod decoder;
mod encoder;
mod errors;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use errors::{CodecError, CodecResult};

/// Current record format version.
pub const FORMAT_VERSION: u8 = 1;

/// A value with a single canonical byte representation.
pub trait Canonical: Sized {
    /// Append the canonical encoding of `self` to the encoder.
    fn encode(&self, enc: &mut Encoder);

    /// Read one value from the decoder.
    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self>;
}

/// Encode a record, prefixed with the format version.
pub fn to_canonical_bytes<T: Canonical>(value: &T) -> Vec<u8> {
    let mut enc = Encoder::new();
    enc.put_u8(FORMAT_VERSION);
    value.encode(&mut enc);
    enc.into_bytes()
}

/// Decode a record written by [`to_canonical_bytes`].
///
/// Fails on an unknown format version or on trailing bytes.
pub fn from_canonical_bytes<T: Canonical>(data: &[u8]) -> CodecResult<T> {
    let mut dec = Decoder::new(data);
    let version = dec.get_u8()?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let value = T::decode(&mut dec)?;
    dec.finish()?;
    Ok(value)
}

impl Canonical for u64 {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u64(*self);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        dec.get_u64()
    }
}

impl Canonical for String {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(self);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        dec.get_string()
    }
}

impl<T: Canonical> Canonical for Vec<T> {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_seq(self, |enc, item| item.encode(enc));
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        dec.get_seq(T::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_prefix() {
        let bytes = to_canonical_bytes(&7u64);
        assert_eq!(bytes[0], FORMAT_VERSION);
        assert_eq!(bytes.len(), 9);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut bytes = to_canonical_bytes(&7u64);
        bytes[0] = 9;
        let err = from_canonical_bytes::<u64>(&bytes).unwrap_err();
        assert_eq!(err, CodecError::UnsupportedVersion(9));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = to_canonical_bytes(&String::from("abc"));
        bytes.push(0);
        assert!(matches!(
            from_canonical_bytes::<String>(&bytes),
            Err(CodecError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_sequence_encoding_is_order_stable() {
        let heights: Vec<u64> = vec![3, 7, 12];
        let a = to_canonical_bytes(&heights);
        let b = to_canonical_bytes(&heights.clone());
        assert_eq!(a, b);
        assert_eq!(from_canonical_bytes::<Vec<u64>>(&a).unwrap(), heights);
    }
}
