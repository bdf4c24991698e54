//! Transaction pipeline
//!
//! The consensus engine drives an `App` through three entry points:
//!
//! - `check`: admission. Decode, replay check, authorization, signature and
//!   stateless validation, all against committed state. Never writes.
//! - `deliver`: execution. Decode, replay check, record the nonce, full
//!   validation on the working view, mutate, then charge the fee.
//! - `commit`: flush the block and return the new checkpoint.
//!
//! # Failure handling
//!
//! Every failure is contained in its transaction. Validation failures leave
//! only the consumed nonce behind. A storage failure rolls the whole
//! transaction back, nonce included. A fee failure keeps the mutation and
//! downgrades the result to `TokenNotEnough` / `TokenAccountNotFound`.
//!
//! Persisted corruption halts the app: every later call fails with
//! `AppStateError` until the process is restarted on repaired data.

mod error;
mod fees;
mod handlers;
mod method;
mod params;
mod permission;
mod query;
mod result;
mod tx;
mod validation;

pub use error::{TxError, TxResult};
pub use fees::DEFAULT_PRICE;
pub use method::{Method, TxParams};
pub use params::*;
pub use permission::{Caller, PermissiveVerifier, SignatureVerifier};
pub use query::Query;
pub use result::{QueryResponse, ResultCode, TxResponse};
pub use tx::Transaction;
pub use validation::{Scope, Validation};

use std::sync::atomic::{AtomicBool, Ordering};

use crate::ledger::{keys, Checkpoint, Ledger};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::storage::{StorageError, StorageResult};

use handlers::ApplyContext;

/// The deterministic state machine.
pub struct App {
    ledger: Ledger,
    chain_id: String,
    verifier: Box<dyn SignatureVerifier>,
    metrics: MetricsRegistry,
    /// Set once persisted data fails validation. Never cleared.
    halted: AtomicBool,
}

impl App {
    /// Creates an app that accepts every signature.
    pub fn new(ledger: Ledger, chain_id: impl Into<String>) -> Self {
        Self {
            ledger,
            chain_id: chain_id.into(),
            verifier: Box::new(PermissiveVerifier),
            metrics: MetricsRegistry::new(),
            halted: AtomicBool::new(false),
        }
    }

    pub fn with_verifier(mut self, verifier: impl SignatureVerifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Height of the block being executed.
    pub fn height(&self) -> u64 {
        self.ledger.height()
    }

    pub fn last_checkpoint(&self) -> Checkpoint {
        self.ledger.last_checkpoint()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Admission. Reads committed state only.
    pub fn check(&self, tx: &Transaction) -> TxResponse {
        self.metrics.increment_checks();

        match self.admit(tx) {
            Ok(()) => {
                log_event_with_fields(
                    Event::TxChecked,
                    &[("method", &tx.method), ("caller", &tx.caller_id)],
                );
                TxResponse::ok(None)
            }
            Err(err) => {
                self.metrics.increment_check_rejections();
                if let TxError::AppState(e) = &err {
                    self.report_storage_failure(e);
                }
                let code = err.code();
                log_event_with_fields(
                    Event::TxRejected,
                    &[
                        ("method", &tx.method),
                        ("caller", &tx.caller_id),
                        ("code", &code.as_u32().to_string()),
                        ("message", &err.to_string()),
                    ],
                );
                TxResponse::error(code, err.to_string())
            }
        }
    }

    fn admit(&self, tx: &Transaction) -> TxResult<()> {
        self.ensure_running()?;
        let (method, params) = decode(tx)?;

        if self.ledger.has(&keys::nonce(&tx.nonce), true)? {
            return Err(duplicate_nonce());
        }

        let v = Validation::ADMISSION;
        let caller = permission::authorize(&self.ledger, v, method, tx, &params)?;
        permission::verify_signature(self.verifier.as_ref(), &caller, tx)?;
        handlers::validate(&self.ledger, v, &caller, &params)
    }

    /// Execution. Reads and writes the working view.
    pub fn deliver(&mut self, tx: &Transaction) -> TxResponse {
        self.metrics.increment_deliveries();
        let savepoint = self.ledger.savepoint();

        let result = self.execute(tx);

        let response = match result {
            Ok(data) => {
                log_event_with_fields(
                    Event::TxDelivered,
                    &[("method", &tx.method), ("caller", &tx.caller_id)],
                );
                return TxResponse::ok(data);
            }
            Err(TxError::AppState(e)) => {
                self.ledger.rollback_to(savepoint);
                self.report_storage_failure(&e);
                let err = TxError::AppState(e);
                TxResponse::error(err.code(), err.to_string())
            }
            Err(err) => TxResponse::error(err.code(), err.to_string()),
        };

        self.metrics.increment_delivery_failures();
        let code = response.code.as_u32().to_string();
        log_event_with_fields(
            Event::TxFailed,
            &[
                ("method", &tx.method),
                ("caller", &tx.caller_id),
                ("code", &code),
                ("message", &response.message),
            ],
        );
        response
    }

    fn execute(&mut self, tx: &Transaction) -> TxResult<Option<Vec<u8>>> {
        self.ensure_running()?;
        let (method, params) = decode(tx)?;

        let nonce_key = keys::nonce(&tx.nonce);
        if self.ledger.has(&nonce_key, false)? {
            return Err(duplicate_nonce());
        }
        self.ledger.put(&nonce_key, Vec::new());

        let v = Validation::DELIVERY;
        let caller = permission::authorize(&self.ledger, v, method, tx, &params)?;
        permission::verify_signature(self.verifier.as_ref(), &caller, tx)?;
        handlers::validate(&self.ledger, v, &caller, &params)?;

        let before_apply = self.ledger.savepoint();
        let ctx = ApplyContext {
            caller: &caller,
            chain_id: &self.chain_id,
        };
        let data = match handlers::apply(&mut self.ledger, ctx, &params) {
            Ok(data) => data,
            Err(err) => {
                // Validation passed, so this is a state the validator missed.
                // Keep the domain state untouched either way.
                self.ledger.rollback_to(before_apply);
                return Err(err);
            }
        };

        if let Err(err) = fees::charge(&mut self.ledger, &caller, method) {
            if !err.is_storage() {
                self.metrics.increment_fee_failures();
                log_event_with_fields(
                    Event::FeeDebitFailed,
                    &[
                        ("method", method.name()),
                        ("caller", &caller.node_id),
                        ("message", &err.to_string()),
                    ],
                );
            }
            return Err(err);
        }

        Ok(data)
    }

    /// Flushes the block. On failure the overlay is kept and the block can
    /// be committed again.
    pub fn commit(&mut self) -> StorageResult<Checkpoint> {
        if self.is_halted() {
            return Err(halted_error());
        }

        let writes = self.ledger.pending_len() as u64;
        match self.ledger.save() {
            Ok(checkpoint) => {
                self.metrics.increment_blocks_committed();
                self.metrics.add_ledger_writes(writes);
                log_event_with_fields(
                    Event::BlockCommitted,
                    &[
                        ("height", &checkpoint.height.to_string()),
                        ("state_hash", &checkpoint.state_hash_hex()),
                        ("writes", &writes.to_string()),
                    ],
                );
                Ok(checkpoint)
            }
            Err(e) => {
                self.report_storage_failure(&e);
                Err(e)
            }
        }
    }

    /// Answers a read-only query from committed state.
    pub fn query(&self, name: &str, params: &[u8]) -> QueryResponse {
        let result = Query::parse(name, params).and_then(|q| query::execute(&self.ledger, &q));
        match result {
            Ok(value) => QueryResponse {
                code: ResultCode::Ok,
                message: "success".to_string(),
                value: value.to_string().into_bytes(),
            },
            Err(err) => QueryResponse {
                code: err.code(),
                message: err.to_string(),
                value: Vec::new(),
            },
        }
    }

    fn ensure_running(&self) -> TxResult<()> {
        if self.is_halted() {
            return Err(TxError::AppState(halted_error()));
        }
        Ok(())
    }

    fn report_storage_failure(&self, e: &StorageError) {
        if self.is_halted() {
            return;
        }
        self.metrics.increment_storage_failures();
        let event = if e.is_fatal() {
            self.halted.store(true, Ordering::SeqCst);
            Event::DataCorruption
        } else {
            Event::StorageFailure
        };
        log_event_with_fields(event, &[("code", e.code().code()), ("message", &e.to_string())]);
    }
}

fn decode(tx: &Transaction) -> TxResult<(Method, TxParams)> {
    let method = Method::from_name(&tx.method).ok_or_else(|| TxError::UnknownMethod(tx.method.clone()))?;
    if tx.nonce.is_empty() {
        return Err(TxError::Unmarshal("nonce must not be empty".to_string()));
    }
    let params = method.decode_params(&tx.params)?;
    Ok((method, params))
}

fn duplicate_nonce() -> TxError {
    TxError::application(ResultCode::DuplicateNonce, "nonce has already been used")
}

fn halted_error() -> StorageError {
    StorageError::data_corruption("app halted after data corruption")
}
