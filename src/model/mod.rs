//! Persisted domain records
//!
//! Every record here implements `Canonical` and is stored through the
//! ledger. Records also derive `Serialize` so the query surface can render
//! them without a parallel set of view types.

mod error_code;
mod node;
mod request;
mod service;
mod token;

pub use error_code::ErrorCodeEntry;
pub use node::{NodeRecord, Role};
pub use request::{AsResponse, DataRequest, Request, RequestStatus, ResponseOutcome, SubRequestStatus};
pub use service::{ApprovedService, Service, ServiceDestination, ServiceDestinations};
pub use token::{PriceFunc, TokenAccount};
