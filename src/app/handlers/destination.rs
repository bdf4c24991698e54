//! AS service destinations

use crate::ledger::{keys, Ledger};
use crate::model::ServiceDestination;

use crate::app::error::{TxError, TxResult};
use crate::app::params::{RegisterServiceDestinationParams, SetServiceDestinationActiveParams};
use crate::app::permission::Caller;
use crate::app::result::ResultCode;
use crate::app::validation::Validation;

use super::{
    load_destinations, load_service, require_active_service, require_approval, require_identifier,
    ApplyContext,
};

fn not_registered(node_id: &str, service_id: &str) -> TxError {
    TxError::application(
        ResultCode::ServiceDestinationNotFound,
        format!("{} is not a destination of service {}", node_id, service_id),
    )
}

pub fn validate_register(
    ledger: &Ledger,
    v: Validation,
    caller: &Caller,
    p: &RegisterServiceDestinationParams,
) -> TxResult<()> {
    require_identifier(&p.service_id, "service id")?;
    if !v.is_full() {
        return Ok(());
    }
    require_active_service(ledger, &p.service_id, v.committed)?;
    require_approval(ledger, &p.service_id, &caller.node_id, v.committed)?;
    let destinations = load_destinations(ledger, &p.service_id, v.committed)?;
    if destinations.find(&caller.node_id).is_some() {
        return Err(TxError::application(
            ResultCode::ServiceDestinationAlreadyRegistered,
            format!("{} already serves {}", caller.node_id, p.service_id),
        ));
    }
    Ok(())
}

pub fn apply_register(
    ledger: &mut Ledger,
    ctx: ApplyContext<'_>,
    p: &RegisterServiceDestinationParams,
) -> TxResult<Option<Vec<u8>>> {
    let mut destinations = load_destinations(ledger, &p.service_id, false)?;
    destinations.nodes.push(ServiceDestination {
        node_id: ctx.caller.node_id.clone(),
        active: true,
    });
    ledger.put_record(&keys::service_destinations(&p.service_id), &destinations);
    Ok(None)
}

pub fn validate_set_active(
    ledger: &Ledger,
    v: Validation,
    caller: &Caller,
    p: &SetServiceDestinationActiveParams,
) -> TxResult<()> {
    require_identifier(&p.service_id, "service id")?;
    if !v.is_full() {
        return Ok(());
    }
    load_service(ledger, &p.service_id, v.committed)?;
    let destinations = load_destinations(ledger, &p.service_id, v.committed)?;
    if destinations.find(&caller.node_id).is_none() {
        return Err(not_registered(&caller.node_id, &p.service_id));
    }
    Ok(())
}

pub fn apply_set_active(
    ledger: &mut Ledger,
    ctx: ApplyContext<'_>,
    p: &SetServiceDestinationActiveParams,
) -> TxResult<Option<Vec<u8>>> {
    let mut destinations = load_destinations(ledger, &p.service_id, false)?;
    let entry = destinations
        .find_mut(&ctx.caller.node_id)
        .ok_or_else(|| not_registered(&ctx.caller.node_id, &p.service_id))?;
    entry.active = p.active;
    ledger.put_record(&keys::service_destinations(&p.service_id), &destinations);
    Ok(None)
}
