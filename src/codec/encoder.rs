//! Canonical encoder

use rust_decimal::Decimal;

/// Append-only byte builder with fixed field encodings.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(if value { 1 } else { 0 });
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Length-prefixed raw bytes.
    pub fn put_bytes(&mut self, value: &[u8]) {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value);
    }

    /// Length-prefixed UTF-8 string.
    pub fn put_str(&mut self, value: &str) {
        self.put_bytes(value.as_bytes());
    }

    /// Decimal as its normalized string, so `1.50` and `1.5` encode the same.
    pub fn put_decimal(&mut self, value: &Decimal) {
        self.put_str(&value.normalize().to_string());
    }

    pub fn put_opt<T>(&mut self, value: Option<&T>, mut f: impl FnMut(&mut Self, &T)) {
        match value {
            None => self.put_u8(0),
            Some(v) => {
                self.put_u8(1);
                f(self, v);
            }
        }
    }

    /// Element count followed by each element in slice order.
    pub fn put_seq<T>(&mut self, items: &[T], mut f: impl FnMut(&mut Self, &T)) {
        self.put_u32(items.len() as u32);
        for item in items {
            f(self, item);
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_length_prefix_little_endian() {
        let mut enc = Encoder::new();
        enc.put_str("ab");
        assert_eq!(enc.into_bytes(), vec![2, 0, 0, 0, b'a', b'b']);
    }

    #[test]
    fn test_decimal_normalized() {
        let mut a = Encoder::new();
        a.put_decimal(&Decimal::from_str("1.500").unwrap());
        let mut b = Encoder::new();
        b.put_decimal(&Decimal::from_str("1.5").unwrap());
        assert_eq!(a.into_bytes(), b.into_bytes());
    }

    #[test]
    fn test_option_tags() {
        let mut enc = Encoder::new();
        enc.put_opt(None::<&u64>, |e, v| e.put_u64(*v));
        enc.put_opt(Some(&5u64), |e, v| e.put_u64(*v));
        assert_eq!(enc.into_bytes(), vec![0, 1, 5, 0, 0, 0, 0, 0, 0, 0]);
    }
}
