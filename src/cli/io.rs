//! JSON-lines I/O for the CLI driver
//!
//! - Input: one JSON object per line
//! - Output: one JSON object per line, `{"status": "ok", "data": ..}` or
//!   `{"status": "error", "code": .., "message": ..}`
//! - UTF-8 only
//!
//! Binary envelope fields (`nonce`, `signature`) travel as standard base64.

use std::io::{BufRead, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::app::Transaction;

use super::errors::{CliError, CliResult};

/// One input line of the `start` driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DriverRequest {
    Check { tx: TxEnvelope },
    Deliver { tx: TxEnvelope },
    Commit,
    Query {
        name: String,
        #[serde(default)]
        params: Value,
    },
    Metrics,
}

/// Wire form of a transaction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TxEnvelope {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    /// base64
    pub nonce: String,
    /// base64
    #[serde(default)]
    pub signature: String,
    pub caller_id: String,
}

impl TxEnvelope {
    pub fn into_transaction(self) -> CliResult<Transaction> {
        let nonce = decode_base64("nonce", &self.nonce)?;
        let signature = decode_base64("signature", &self.signature)?;
        Ok(Transaction::new(self.method, &self.params, nonce, self.caller_id).with_signature(signature))
    }
}

fn decode_base64(field: &str, value: &str) -> CliResult<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| CliError::invalid_request(format!("{} is not valid base64: {}", field, e)))
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Parses one input line.
pub fn parse_request(line: &str) -> CliResult<DriverRequest> {
    serde_json::from_str(line).map_err(|e| CliError::invalid_request(format!("bad request: {}", e)))
}

/// Iterates over non-empty input lines. I/O errors end the iteration.
pub fn read_lines<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<String>> {
    input
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
}

/// Write a success response
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Write an error response
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
