//! AS responses and the per-sub-request quorum
//!
//! Acceptance order matters for determinism and is fixed:
//!
//! 1. request closed / timed out
//! 2. caller is an authorized responder
//! 3. caller has not responded yet
//! 4. quorum: already complete, then cannot be fulfilled
//! 5. error outcome uses a catalogued code (committed view)
//! 6. service active, approval active, destination registered and active
//!
//! Admission only runs the catalogue check; everything else depends on
//! state that earlier transactions of the same block may change.

use crate::ledger::{keys, Ledger};
use crate::model::{AsResponse, DataRequest, ErrorCodeEntry, ResponseOutcome};

use crate::app::error::{TxError, TxResult};
use crate::app::params::{CreateAsResponseParams, OutcomeParams};
use crate::app::permission::Caller;
use crate::app::result::ResultCode;
use crate::app::validation::Validation;

use super::request::{load_request, require_open};
use super::{
    load_destinations, require_active_service, require_approval, require_identifier, ApplyContext,
};

fn outcome_of(p: &CreateAsResponseParams) -> ResponseOutcome {
    match p.outcome {
        OutcomeParams::Signed { .. } => ResponseOutcome::Signed,
        OutcomeParams::Error { error_code } => ResponseOutcome::Error(error_code),
    }
}

/// The catalogue is always read from committed state so admission and
/// delivery agree on it.
fn require_catalogued(ledger: &Ledger, error_code: i32) -> TxResult<()> {
    if ledger
        .get_record::<ErrorCodeEntry>(&keys::error_code(error_code), true)?
        .is_none()
    {
        return Err(TxError::application(
            ResultCode::InvalidErrorCode,
            format!("error code {} is not registered", error_code),
        ));
    }
    Ok(())
}

fn check_quorum(dr: &DataRequest) -> TxResult<()> {
    if dr.min_as == 0 {
        return Ok(());
    }
    if dr.is_completed() {
        return Err(TxError::application(
            ResultCode::DataRequestIsCompleted,
            format!(
                "data request for {} already has {} of {} responses",
                dr.service_id,
                dr.successes(),
                dr.min_as
            ),
        ));
    }
    if dr.is_unfulfillable() {
        return Err(TxError::application(
            ResultCode::DataRequestCannotBeFulfilled,
            format!(
                "data request for {} cannot reach {} responses ({} so far, {} possible)",
                dr.service_id,
                dr.min_as,
                dr.successes(),
                dr.remaining_possible()
            ),
        ));
    }
    Ok(())
}

pub fn validate(
    ledger: &Ledger,
    v: Validation,
    caller: &Caller,
    p: &CreateAsResponseParams,
) -> TxResult<()> {
    require_identifier(&p.request_id, "request id")?;
    require_identifier(&p.service_id, "service id")?;

    if !v.is_full() {
        if let ResponseOutcome::Error(code) = outcome_of(p) {
            require_catalogued(ledger, code)?;
        }
        return Ok(());
    }

    let request = load_request(ledger, &p.request_id, v.committed)?;
    require_open(&request)?;

    let dr = request.data_request(&p.service_id).ok_or_else(|| {
        TxError::application(
            ResultCode::ServiceIdNotFoundInRequest,
            format!("request {} has no data request for {}", p.request_id, p.service_id),
        )
    })?;

    if !dr.is_authorized(&caller.node_id) {
        return Err(TxError::application(
            ResultCode::NodeNotInAsList,
            format!("{} may not answer {} for {}", caller.node_id, p.service_id, p.request_id),
        ));
    }

    if dr.has_responded(&caller.node_id) {
        return Err(TxError::application(
            ResultCode::DuplicateAsResponse,
            format!("{} already answered {} for {}", caller.node_id, p.service_id, p.request_id),
        ));
    }

    check_quorum(dr)?;

    if let ResponseOutcome::Error(code) = outcome_of(p) {
        require_catalogued(ledger, code)?;
    }

    require_active_service(ledger, &p.service_id, v.committed)?;
    require_approval(ledger, &p.service_id, &caller.node_id, v.committed)?;

    let destinations = load_destinations(ledger, &p.service_id, v.committed)?;
    match destinations.find(&caller.node_id) {
        None => Err(TxError::application(
            ResultCode::ServiceDestinationNotFound,
            format!("{} is not a destination of service {}", caller.node_id, p.service_id),
        )),
        Some(d) if !d.active => Err(TxError::application(
            ResultCode::ServiceDestinationIsNotActive,
            format!("destination {} of service {} is not active", caller.node_id, p.service_id),
        )),
        Some(_) => Ok(()),
    }
}

pub fn apply(
    ledger: &mut Ledger,
    ctx: ApplyContext<'_>,
    p: &CreateAsResponseParams,
) -> TxResult<Option<Vec<u8>>> {
    let mut request = load_request(ledger, &p.request_id, false)?;
    let dr = request.data_request_mut(&p.service_id).ok_or_else(|| {
        TxError::application(
            ResultCode::ServiceIdNotFoundInRequest,
            format!("request {} has no data request for {}", p.request_id, p.service_id),
        )
    })?;

    dr.responses.push(AsResponse {
        as_id: ctx.caller.node_id.clone(),
        outcome: outcome_of(p),
    });

    if let OutcomeParams::Signed { signature } = &p.outcome {
        ledger.put(
            &keys::data_signature(&ctx.caller.node_id, &p.service_id, &p.request_id),
            signature.clone().into_bytes(),
        );
    }

    ledger.set_versioned_record(&keys::request(&p.request_id), &request)?;
    Ok(None)
}
