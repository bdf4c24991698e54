//! Method handlers
//!
//! Each method has a `validate` and an `apply` step:
//!
//! - `validate` reads the view chosen by `Validation` and never writes.
//!   Admission calls it with the stateless scope, delivery with full scope.
//! - `apply` runs only after a full validation succeeded on the working
//!   view. It re-reads what it needs and mutates the ledger.

mod admin;
mod destination;
mod request;
mod response;

use crate::ledger::{keys, Ledger};
use crate::model::{ApprovedService, NodeRecord, Service, ServiceDestinations};
use crate::storage::StorageResult;

use crate::app::error::{TxError, TxResult};
use crate::app::method::TxParams;
use crate::app::permission::Caller;
use crate::app::result::ResultCode;
use crate::app::validation::Validation;

/// Inputs to `apply` beyond the ledger and parameters.
#[derive(Debug, Clone, Copy)]
pub struct ApplyContext<'a> {
    pub caller: &'a Caller,
    pub chain_id: &'a str,
}

pub fn validate(ledger: &Ledger, v: Validation, caller: &Caller, params: &TxParams) -> TxResult<()> {
    match params {
        TxParams::InitNdid(p) => admin::validate_init_ndid(p),
        TxParams::RegisterNode(p) => admin::validate_register_node(ledger, v, p),
        TxParams::SetNodeActive(p) => admin::validate_set_node_active(ledger, v, p),
        TxParams::AddService(p) => admin::validate_add_service(ledger, v, p),
        TxParams::SetServiceActive(p) => admin::validate_set_service_active(ledger, v, p),
        TxParams::ApproveService(p) | TxParams::RevokeService(p) => {
            admin::validate_service_approval(ledger, v, p)
        }
        TxParams::AddErrorCode(p) => admin::validate_add_error_code(ledger, v, p),
        TxParams::SetPriceFunc(p) => admin::validate_set_price_func(p),
        TxParams::SetNodeToken(p) => admin::validate_node_token(ledger, v, p, admin::TokenOp::Set),
        TxParams::AddNodeToken(p) => admin::validate_node_token(ledger, v, p, admin::TokenOp::Add),
        TxParams::ReduceNodeToken(p) => admin::validate_node_token(ledger, v, p, admin::TokenOp::Reduce),
        TxParams::RegisterServiceDestination(p) => {
            destination::validate_register(ledger, v, caller, p)
        }
        TxParams::SetServiceDestinationActive(p) => {
            destination::validate_set_active(ledger, v, caller, p)
        }
        TxParams::CreateRequest(p) => request::validate_create(ledger, v, p),
        TxParams::CloseRequest(p) | TxParams::TimeOutRequest(p) => {
            request::validate_finish(ledger, v, caller, p)
        }
        TxParams::CreateAsResponse(p) => response::validate(ledger, v, caller, p),
    }
}

/// Returns the method's optional return bytes.
pub fn apply(ledger: &mut Ledger, ctx: ApplyContext<'_>, params: &TxParams) -> TxResult<Option<Vec<u8>>> {
    match params {
        TxParams::InitNdid(p) => admin::apply_init_ndid(ledger, p),
        TxParams::RegisterNode(p) => admin::apply_register_node(ledger, p),
        TxParams::SetNodeActive(p) => admin::apply_set_node_active(ledger, p),
        TxParams::AddService(p) => admin::apply_add_service(ledger, p),
        TxParams::SetServiceActive(p) => admin::apply_set_service_active(ledger, p),
        TxParams::ApproveService(p) => admin::apply_service_approval(ledger, p, true),
        TxParams::RevokeService(p) => admin::apply_service_approval(ledger, p, false),
        TxParams::AddErrorCode(p) => admin::apply_add_error_code(ledger, p),
        TxParams::SetPriceFunc(p) => admin::apply_set_price_func(ledger, p),
        TxParams::SetNodeToken(p) => admin::apply_node_token(ledger, p, admin::TokenOp::Set),
        TxParams::AddNodeToken(p) => admin::apply_node_token(ledger, p, admin::TokenOp::Add),
        TxParams::ReduceNodeToken(p) => admin::apply_node_token(ledger, p, admin::TokenOp::Reduce),
        TxParams::RegisterServiceDestination(p) => destination::apply_register(ledger, ctx, p),
        TxParams::SetServiceDestinationActive(p) => destination::apply_set_active(ledger, ctx, p),
        TxParams::CreateRequest(p) => request::apply_create(ledger, ctx, p),
        TxParams::CloseRequest(p) => request::apply_finish(ledger, p, request::Finish::Close),
        TxParams::TimeOutRequest(p) => request::apply_finish(ledger, p, request::Finish::TimeOut),
        TxParams::CreateAsResponse(p) => response::apply(ledger, ctx, p),
    }
}

fn require_identifier(id: &str, what: &str) -> TxResult<()> {
    if keys::is_valid_identifier(id) {
        Ok(())
    } else {
        Err(TxError::application(
            ResultCode::InvalidIdentifier,
            format!("invalid {}: {:?}", what, id),
        ))
    }
}

fn load_node(ledger: &Ledger, node_id: &str, committed: bool) -> TxResult<NodeRecord> {
    ledger
        .get_record::<NodeRecord>(&keys::node(node_id), committed)?
        .ok_or_else(|| {
            TxError::application(ResultCode::NodeIdNotFound, format!("node {} not found", node_id))
        })
}

fn load_service(ledger: &Ledger, service_id: &str, committed: bool) -> TxResult<Service> {
    ledger
        .get_record::<Service>(&keys::service(service_id), committed)?
        .ok_or_else(|| {
            TxError::application(
                ResultCode::ServiceNotFound,
                format!("service {} not found", service_id),
            )
        })
}

fn require_active_service(ledger: &Ledger, service_id: &str, committed: bool) -> TxResult<Service> {
    let service = load_service(ledger, service_id, committed)?;
    if !service.active {
        return Err(TxError::application(
            ResultCode::ServiceIsNotActive,
            format!("service {} is not active", service_id),
        ));
    }
    Ok(service)
}

fn require_approval(ledger: &Ledger, service_id: &str, node_id: &str, committed: bool) -> TxResult<()> {
    let approved = ledger
        .get_record::<ApprovedService>(&keys::approved_service(service_id, node_id), committed)?
        .map(|a| a.active)
        .unwrap_or(false);
    if !approved {
        return Err(TxError::application(
            ResultCode::ServiceNotApproved,
            format!("{} is not approved for service {}", node_id, service_id),
        ));
    }
    Ok(())
}

fn load_destinations(
    ledger: &Ledger,
    service_id: &str,
    committed: bool,
) -> StorageResult<ServiceDestinations> {
    Ok(ledger
        .get_record::<ServiceDestinations>(&keys::service_destinations(service_id), committed)?
        .unwrap_or_default())
}
