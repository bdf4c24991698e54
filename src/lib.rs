//! idchain - deterministic state store and transaction pipeline for a
//! permissioned identity chain
//!
//! Layering, bottom up:
//!
//! - `storage`: durable key-value backends
//! - `codec`: canonical byte encoding of records
//! - `ledger`: pending overlay, versioned keys, state hash and checkpoints
//! - `model`: nodes, services, tokens, requests
//! - `app`: check / deliver / commit / query
//! - `config`, `observability`, `cli`: the node around it

pub mod app;
pub mod cli;
pub mod codec;
pub mod config;
pub mod ledger;
pub mod model;
pub mod observability;
pub mod storage;
