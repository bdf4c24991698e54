//! Shared harness for integration tests
//!
//! `Chain` wraps an `App` the way a consensus engine drives it and hands out
//! deterministic nonces, so two chains fed the same calls are identical.

#![allow(dead_code)]

use idchain::app::{App, ResultCode, Transaction, TxResponse};
use idchain::ledger::{Checkpoint, Ledger};
use idchain::storage::{KvBackend, MemoryBackend};
use serde_json::{json, Value};

pub const SERVICE: &str = "bank_statement";
pub const ERROR_CODE: i32 = 1000;
pub const RESPONDERS: [&str; 3] = ["as1", "as2", "as3"];

pub struct Chain {
    pub app: App,
    nonce: u64,
}

impl Chain {
    pub fn new() -> Self {
        Self::with_backend(Box::new(MemoryBackend::new()))
    }

    pub fn with_backend(backend: Box<dyn KvBackend>) -> Self {
        let ledger = Ledger::open(backend).expect("open ledger");
        Self {
            app: App::new(ledger, "test-chain"),
            nonce: 0,
        }
    }

    pub fn nonces_used(&self) -> u64 {
        self.nonce
    }

    /// Continues the nonce sequence of an earlier process on the same data.
    pub fn resume_nonces(&mut self, used: u64) {
        self.nonce = used;
    }

    pub fn tx(&mut self, caller: &str, method: &str, params: Value) -> Transaction {
        self.nonce += 1;
        Transaction::new(method, &params, format!("nonce-{}", self.nonce).into_bytes(), caller)
    }

    pub fn deliver(&mut self, caller: &str, method: &str, params: Value) -> TxResponse {
        let tx = self.tx(caller, method, params);
        self.app.deliver(&tx)
    }

    pub fn deliver_ok(&mut self, caller: &str, method: &str, params: Value) -> TxResponse {
        let resp = self.deliver(caller, method, params);
        assert!(
            resp.is_ok(),
            "{} by {} failed: {} ({})",
            method,
            caller,
            resp.code,
            resp.message
        );
        resp
    }

    pub fn check(&mut self, caller: &str, method: &str, params: Value) -> TxResponse {
        let tx = self.tx(caller, method, params);
        self.app.check(&tx)
    }

    pub fn commit(&mut self) -> Checkpoint {
        self.app.commit().expect("commit")
    }

    /// Runs a query and returns its JSON value, panicking on a non-zero code.
    pub fn query(&self, name: &str, params: Value) -> Value {
        let resp = self.app.query(name, params.to_string().as_bytes());
        assert!(resp.is_ok(), "{} failed: {} ({})", name, resp.code, resp.message);
        resp.json().expect("query json")
    }

    pub fn query_code(&self, name: &str, params: Value) -> ResultCode {
        self.app.query(name, params.to_string().as_bytes()).code
    }

    /// NDID, one RP with tokens, three approved AS destinations for
    /// `SERVICE` and one catalogued error code. Everything committed.
    pub fn bootstrap(&mut self) {
        self.deliver_ok("ndid1", "InitNDID", json!({"node_id": "ndid1", "public_key": "ndid-key"}));
        self.deliver_ok(
            "ndid1",
            "RegisterNode",
            json!({"node_id": "rp1", "node_name": "Relying party", "role": "RP", "public_key": "rp1-key"}),
        );
        for id in RESPONDERS {
            self.deliver_ok(
                "ndid1",
                "RegisterNode",
                json!({"node_id": id, "node_name": id, "role": "AS", "public_key": format!("{}-key", id)}),
            );
        }
        self.deliver_ok(
            "ndid1",
            "AddService",
            json!({"service_id": SERVICE, "service_name": "Bank statement"}),
        );
        self.deliver_ok(
            "ndid1",
            "AddErrorCode",
            json!({"error_code": ERROR_CODE, "description": "data unavailable"}),
        );
        for id in ["rp1"].iter().chain(RESPONDERS.iter()) {
            self.deliver_ok("ndid1", "SetNodeToken", json!({"node_id": id, "amount": "100"}));
        }
        for id in RESPONDERS {
            self.deliver_ok("ndid1", "ApproveService", json!({"node_id": id, "service_id": SERVICE}));
        }
        self.commit();

        for id in RESPONDERS {
            self.deliver_ok(id, "RegisterServiceDestination", json!({"service_id": SERVICE}));
        }
        self.commit();
    }

    pub fn create_request(&mut self, request_id: &str, min_as: u32, as_id_list: &[&str]) -> TxResponse {
        self.deliver(
            "rp1",
            "CreateRequest",
            json!({
                "request_id": request_id,
                "min_idp": 0,
                "request_message_hash": format!("hash-{}", request_id),
                "data_request_list": [{
                    "service_id": SERVICE,
                    "as_id_list": as_id_list,
                    "min_as": min_as,
                    "request_params_hash": "params",
                }],
            }),
        )
    }

    pub fn respond_signed(&mut self, as_id: &str, request_id: &str) -> TxResponse {
        self.deliver(
            as_id,
            "CreateAsResponse",
            json!({
                "request_id": request_id,
                "service_id": SERVICE,
                "outcome": {"type": "signed", "signature": format!("sig-{}", as_id)},
            }),
        )
    }

    pub fn respond_error(&mut self, as_id: &str, request_id: &str, error_code: i32) -> TxResponse {
        self.deliver(
            as_id,
            "CreateAsResponse",
            json!({
                "request_id": request_id,
                "service_id": SERVICE,
                "outcome": {"type": "error", "error_code": error_code},
            }),
        )
    }

    pub fn request(&self, request_id: &str) -> Value {
        self.query("GetRequest", json!({"request_id": request_id}))
    }

    pub fn sub_request_status(&self, request_id: &str) -> Value {
        self.request(request_id)["data_request_status"][0]["status"].clone()
    }

    pub fn balance(&self, node_id: &str) -> String {
        self.query("GetNodeToken", json!({"node_id": node_id}))["amount"]
            .as_str()
            .expect("amount is a string")
            .to_string()
    }
}
