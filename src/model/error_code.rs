//! Error code catalogue entries

use serde::Serialize;

use crate::codec::{Canonical, CodecResult, Decoder, Encoder};

/// A registered error code that responders may answer with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCodeEntry {
    pub error_code: i32,
    pub description: String,
}

impl Canonical for ErrorCodeEntry {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_i32(self.error_code);
        enc.put_str(&self.description);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            error_code: dec.get_i32()?,
            description: dec.get_string()?,
        })
    }
}
