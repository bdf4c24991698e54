//! Transaction envelope

use crate::codec::{Encoder, FORMAT_VERSION};

/// One transaction as handed over by the consensus engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub method: String,
    /// JSON-encoded method parameters
    pub params: Vec<u8>,
    pub nonce: Vec<u8>,
    pub signature: Vec<u8>,
    pub caller_id: String,
}

impl Transaction {
    /// Builds an unsigned transaction from JSON parameters.
    pub fn new(
        method: impl Into<String>,
        params: &serde_json::Value,
        nonce: impl Into<Vec<u8>>,
        caller_id: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            params: params.to_string().into_bytes(),
            nonce: nonce.into(),
            signature: Vec::new(),
            caller_id: caller_id.into(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<Vec<u8>>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Bytes covered by the caller's signature: method, params and nonce.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.put_u8(FORMAT_VERSION);
        enc.put_str(&self.method);
        enc.put_bytes(&self.params);
        enc.put_bytes(&self.nonce);
        enc.into_bytes()
    }
}
