//! Canonical decoder

use std::str::FromStr;

use rust_decimal::Decimal;

use super::errors::{CodecError, CodecResult};

/// Cursor over canonical bytes.
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, needed: usize) -> CodecResult<&'a [u8]> {
        let remaining = self.data.len() - self.pos;
        if needed > remaining {
            return Err(CodecError::UnexpectedEof { needed, remaining });
        }
        let slice = &self.data[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    pub fn get_u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn get_bool(&mut self) -> CodecResult<bool> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(CodecError::InvalidTag { field: "bool", tag }),
        }
    }

    pub fn get_u32(&mut self) -> CodecResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_u64(&mut self) -> CodecResult<u64> {
        let b = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn get_i32(&mut self) -> CodecResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_bytes(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.get_u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn get_string(&mut self) -> CodecResult<String> {
        String::from_utf8(self.get_bytes()?).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn get_decimal(&mut self) -> CodecResult<Decimal> {
        let s = self.get_string()?;
        Decimal::from_str(&s).map_err(|_| CodecError::InvalidDecimal(s))
    }

    pub fn get_opt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Option<T>> {
        match self.get_u8()? {
            0 => Ok(None),
            1 => Ok(Some(f(self)?)),
            tag => Err(CodecError::InvalidTag { field: "option", tag }),
        }
    }

    pub fn get_seq<T>(
        &mut self,
        mut f: impl FnMut(&mut Self) -> CodecResult<T>,
    ) -> CodecResult<Vec<T>> {
        let count = self.get_u32()? as usize;
        // Bound the allocation by what the input could possibly hold.
        let mut items = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            items.push(f(self)?);
        }
        Ok(items)
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Succeeds only when every byte has been consumed.
    pub fn finish(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encoder;

    #[test]
    fn test_truncated_input() {
        let mut dec = Decoder::new(&[1, 0]);
        assert_eq!(
            dec.get_u32(),
            Err(CodecError::UnexpectedEof { needed: 4, remaining: 2 })
        );
    }

    #[test]
    fn test_invalid_bool_tag() {
        let mut dec = Decoder::new(&[2]);
        assert!(matches!(dec.get_bool(), Err(CodecError::InvalidTag { .. })));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut enc = Encoder::new();
        enc.put_bytes(&[0xff, 0xfe]);
        let bytes = enc.into_bytes();
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get_string(), Err(CodecError::InvalidUtf8));
    }

    #[test]
    fn test_huge_sequence_count_fails_cleanly() {
        let mut dec = Decoder::new(&[0xff, 0xff, 0xff, 0xff]);
        let result = dec.get_seq(|d| d.get_u64());
        assert!(matches!(result, Err(CodecError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_mixed_fields() {
        let mut enc = Encoder::new();
        enc.put_str("node");
        enc.put_bool(true);
        enc.put_i32(-5);
        enc.put_opt(Some(&"x".to_string()), |e, s| e.put_str(s));
        let bytes = enc.into_bytes();

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.get_string().unwrap(), "node");
        assert!(dec.get_bool().unwrap());
        assert_eq!(dec.get_i32().unwrap(), -5);
        assert_eq!(dec.get_opt(|d| d.get_string()).unwrap(), Some("x".to_string()));
        assert!(dec.finish().is_ok());
    }
}
