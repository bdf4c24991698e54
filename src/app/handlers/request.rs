//! Request lifecycle: creation, closure, timeout
//!
//! Requests are only ever written through `set_versioned`, so every block
//! that touched a request leaves a snapshot behind.

use std::collections::BTreeSet;

use crate::ledger::{keys, Ledger};
use crate::model::{DataRequest, Request};
use crate::storage::StorageResult;

use crate::app::error::{TxError, TxResult};
use crate::app::params::{CreateRequestParams, DataRequestParams, RequestIdParams};
use crate::app::permission::Caller;
use crate::app::result::ResultCode;
use crate::app::validation::Validation;

use super::{load_destinations, require_active_service, require_identifier, ApplyContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    Close,
    TimeOut,
}

/// Latest version of a request in the chosen view.
pub(super) fn load_request(ledger: &Ledger, request_id: &str, committed: bool) -> TxResult<Request> {
    ledger
        .get_versioned_record::<Request>(&keys::request(request_id), 0, committed)?
        .ok_or_else(|| {
            TxError::application(
                ResultCode::RequestNotFound,
                format!("request {} not found", request_id),
            )
        })
}

/// Rejects requests that can no longer take any transaction.
pub(super) fn require_open(request: &Request) -> TxResult<()> {
    if request.closed {
        return Err(TxError::application(
            ResultCode::RequestIsClosed,
            format!("request {} is closed", request.request_id),
        ));
    }
    if request.timed_out {
        return Err(TxError::application(
            ResultCode::RequestIsTimedOut,
            format!("request {} is timed out", request.request_id),
        ));
    }
    Ok(())
}

/// Responder list as given, first occurrence of each id kept.
fn explicit_as_list(dr: &DataRequestParams) -> Vec<String> {
    let mut seen = BTreeSet::new();
    dr.as_id_list
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Responder list after filling an empty list from the service's active
/// destinations.
fn resolve_as_list(ledger: &Ledger, dr: &DataRequestParams, committed: bool) -> StorageResult<Vec<String>> {
    if dr.as_id_list.is_empty() {
        Ok(load_destinations(ledger, &dr.service_id, committed)?.active_node_ids())
    } else {
        Ok(explicit_as_list(dr))
    }
}

fn min_as_too_large(dr: &DataRequestParams, available: usize) -> TxError {
    TxError::application(
        ResultCode::MinAsGreaterThanAsList,
        format!(
            "min_as {} for service {} exceeds {} responders",
            dr.min_as, dr.service_id, available
        ),
    )
}

pub fn validate_create(ledger: &Ledger, v: Validation, p: &CreateRequestParams) -> TxResult<()> {
    require_identifier(&p.request_id, "request id")?;

    if !p.idp_id_list.is_empty() && p.min_idp as usize > p.idp_id_list.len() {
        return Err(TxError::application(
            ResultCode::MinIdpGreaterThanIdpList,
            format!("min_idp {} exceeds {} IdPs", p.min_idp, p.idp_id_list.len()),
        ));
    }

    let mut services = BTreeSet::new();
    for dr in &p.data_request_list {
        require_identifier(&dr.service_id, "service id")?;
        if !services.insert(dr.service_id.as_str()) {
            return Err(TxError::application(
                ResultCode::DuplicateServiceIdInRequest,
                format!("service {} requested twice", dr.service_id),
            ));
        }
        let explicit = explicit_as_list(dr);
        if !explicit.is_empty() && dr.min_as as usize > explicit.len() {
            return Err(min_as_too_large(dr, explicit.len()));
        }
    }

    if !v.is_full() {
        return Ok(());
    }

    if ledger.has_versioned(&keys::request(&p.request_id), v.committed)? {
        return Err(TxError::application(
            ResultCode::DuplicateRequestId,
            format!("request {} already exists", p.request_id),
        ));
    }

    for dr in &p.data_request_list {
        require_active_service(ledger, &dr.service_id, v.committed)?;
        let as_list = resolve_as_list(ledger, dr, v.committed)?;
        if dr.min_as as usize > as_list.len() {
            return Err(min_as_too_large(dr, as_list.len()));
        }
    }

    Ok(())
}

pub fn apply_create(
    ledger: &mut Ledger,
    ctx: ApplyContext<'_>,
    p: &CreateRequestParams,
) -> TxResult<Option<Vec<u8>>> {
    let mut data_requests = Vec::with_capacity(p.data_request_list.len());
    for dr in &p.data_request_list {
        data_requests.push(DataRequest {
            service_id: dr.service_id.clone(),
            as_id_list: resolve_as_list(ledger, dr, false)?,
            min_as: dr.min_as,
            request_params_hash: dr.request_params_hash.clone(),
            responses: Vec::new(),
        });
    }

    let request = Request {
        request_id: p.request_id.clone(),
        requester_id: ctx.caller.node_id.clone(),
        min_idp: p.min_idp,
        idp_id_list: p.idp_id_list.clone(),
        request_message_hash: p.request_message_hash.clone(),
        data_requests,
        closed: false,
        timed_out: false,
        created_height: ledger.height(),
        chain_id: ctx.chain_id.to_string(),
    };

    ledger.set_versioned_record(&keys::request(&p.request_id), &request)?;
    Ok(Some(p.request_id.clone().into_bytes()))
}

pub fn validate_finish(
    ledger: &Ledger,
    v: Validation,
    caller: &Caller,
    p: &RequestIdParams,
) -> TxResult<()> {
    require_identifier(&p.request_id, "request id")?;
    if !v.is_full() {
        return Ok(());
    }
    let request = load_request(ledger, &p.request_id, v.committed)?;
    if request.requester_id != caller.node_id {
        return Err(TxError::application(
            ResultCode::NotRequestOwner,
            format!("{} does not own request {}", caller.node_id, p.request_id),
        ));
    }
    require_open(&request)
}

pub fn apply_finish(ledger: &mut Ledger, p: &RequestIdParams, finish: Finish) -> TxResult<Option<Vec<u8>>> {
    let mut request = load_request(ledger, &p.request_id, false)?;
    match finish {
        Finish::Close => request.closed = true,
        Finish::TimeOut => request.timed_out = true,
    }
    ledger.set_versioned_record(&keys::request(&p.request_id), &request)?;
    Ok(None)
}
