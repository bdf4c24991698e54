//! NDID administration: nodes, services, approvals, catalogue, prices, tokens

use rust_decimal::Decimal;

use crate::codec::to_canonical_bytes;
use crate::ledger::{keys, Ledger};
use crate::model::{ApprovedService, ErrorCodeEntry, NodeRecord, PriceFunc, Role, Service, TokenAccount};

use crate::app::error::{TxError, TxResult};
use crate::app::method::Method;
use crate::app::params::*;
use crate::app::result::ResultCode;
use crate::app::validation::Validation;

use super::{load_node, load_service, require_identifier};

/// The single-NDID rule is enforced by `authorize`.
pub fn validate_init_ndid(p: &InitNdidParams) -> TxResult<()> {
    require_identifier(&p.node_id, "node id")
}

pub fn apply_init_ndid(ledger: &mut Ledger, p: &InitNdidParams) -> TxResult<Option<Vec<u8>>> {
    ledger.put(&keys::master_ndid(), to_canonical_bytes(&p.node_id));
    ledger.put_record(
        &keys::node(&p.node_id),
        &NodeRecord {
            node_id: p.node_id.clone(),
            node_name: "NDID".to_string(),
            role: Role::Ndid,
            public_key: p.public_key.clone(),
            active: true,
        },
    );
    Ok(None)
}

fn parse_role(role: &str) -> TxResult<Role> {
    let parsed: Role = role
        .parse()
        .map_err(|e: String| TxError::application(ResultCode::InvalidRole, e))?;
    if parsed == Role::Ndid {
        return Err(TxError::application(
            ResultCode::InvalidRole,
            "NDID can only be created by InitNDID",
        ));
    }
    Ok(parsed)
}

pub fn validate_register_node(ledger: &Ledger, v: Validation, p: &RegisterNodeParams) -> TxResult<()> {
    require_identifier(&p.node_id, "node id")?;
    parse_role(&p.role)?;
    if !v.is_full() {
        return Ok(());
    }
    if ledger.has(&keys::node(&p.node_id), v.committed)? {
        return Err(TxError::application(
            ResultCode::DuplicateNodeId,
            format!("node {} already exists", p.node_id),
        ));
    }
    Ok(())
}

pub fn apply_register_node(ledger: &mut Ledger, p: &RegisterNodeParams) -> TxResult<Option<Vec<u8>>> {
    let role = parse_role(&p.role)?;
    ledger.put_record(
        &keys::node(&p.node_id),
        &NodeRecord {
            node_id: p.node_id.clone(),
            node_name: p.node_name.clone(),
            role,
            public_key: p.public_key.clone(),
            active: true,
        },
    );
    ledger.put_record(&keys::token(&p.node_id), &TokenAccount::new(p.node_id.clone()));
    Ok(None)
}

pub fn validate_set_node_active(ledger: &Ledger, v: Validation, p: &SetNodeActiveParams) -> TxResult<()> {
    require_identifier(&p.node_id, "node id")?;
    if v.is_full() {
        load_node(ledger, &p.node_id, v.committed)?;
    }
    Ok(())
}

pub fn apply_set_node_active(ledger: &mut Ledger, p: &SetNodeActiveParams) -> TxResult<Option<Vec<u8>>> {
    let mut node = load_node(ledger, &p.node_id, false)?;
    node.active = p.active;
    ledger.put_record(&keys::node(&p.node_id), &node);
    Ok(None)
}

pub fn validate_add_service(ledger: &Ledger, v: Validation, p: &AddServiceParams) -> TxResult<()> {
    require_identifier(&p.service_id, "service id")?;
    if !v.is_full() {
        return Ok(());
    }
    if ledger.has(&keys::service(&p.service_id), v.committed)? {
        return Err(TxError::application(
            ResultCode::DuplicateServiceId,
            format!("service {} already exists", p.service_id),
        ));
    }
    Ok(())
}

pub fn apply_add_service(ledger: &mut Ledger, p: &AddServiceParams) -> TxResult<Option<Vec<u8>>> {
    ledger.put_record(
        &keys::service(&p.service_id),
        &Service {
            service_id: p.service_id.clone(),
            service_name: p.service_name.clone(),
            active: true,
        },
    );
    Ok(None)
}

pub fn validate_set_service_active(
    ledger: &Ledger,
    v: Validation,
    p: &SetServiceActiveParams,
) -> TxResult<()> {
    require_identifier(&p.service_id, "service id")?;
    if v.is_full() {
        load_service(ledger, &p.service_id, v.committed)?;
    }
    Ok(())
}

pub fn apply_set_service_active(
    ledger: &mut Ledger,
    p: &SetServiceActiveParams,
) -> TxResult<Option<Vec<u8>>> {
    let mut service = load_service(ledger, &p.service_id, false)?;
    service.active = p.active;
    ledger.put_record(&keys::service(&p.service_id), &service);
    Ok(None)
}

pub fn validate_service_approval(
    ledger: &Ledger,
    v: Validation,
    p: &ServiceApprovalParams,
) -> TxResult<()> {
    require_identifier(&p.service_id, "service id")?;
    require_identifier(&p.node_id, "node id")?;
    if !v.is_full() {
        return Ok(());
    }
    load_service(ledger, &p.service_id, v.committed)?;
    let node = load_node(ledger, &p.node_id, v.committed)?;
    if node.role != Role::As {
        return Err(TxError::application(
            ResultCode::RoleIsNotAs,
            format!("node {} has role {}, not AS", p.node_id, node.role),
        ));
    }
    Ok(())
}

pub fn apply_service_approval(
    ledger: &mut Ledger,
    p: &ServiceApprovalParams,
    active: bool,
) -> TxResult<Option<Vec<u8>>> {
    ledger.put_record(
        &keys::approved_service(&p.service_id, &p.node_id),
        &ApprovedService { active },
    );
    Ok(None)
}

pub fn validate_add_error_code(ledger: &Ledger, v: Validation, p: &AddErrorCodeParams) -> TxResult<()> {
    if p.error_code == 0 {
        return Err(TxError::application(
            ResultCode::InvalidErrorCode,
            "error code 0 is reserved",
        ));
    }
    if !v.is_full() {
        return Ok(());
    }
    if ledger.has(&keys::error_code(p.error_code), v.committed)? {
        return Err(TxError::application(
            ResultCode::DuplicateErrorCode,
            format!("error code {} already exists", p.error_code),
        ));
    }
    Ok(())
}

pub fn apply_add_error_code(ledger: &mut Ledger, p: &AddErrorCodeParams) -> TxResult<Option<Vec<u8>>> {
    ledger.put_record(
        &keys::error_code(p.error_code),
        &ErrorCodeEntry {
            error_code: p.error_code,
            description: p.description.clone(),
        },
    );
    Ok(None)
}

/// Purely stateless: the method registry is fixed.
pub fn validate_set_price_func(p: &SetPriceFuncParams) -> TxResult<()> {
    if Method::from_name(&p.func).is_none() {
        return Err(TxError::UnknownMethod(p.func.clone()));
    }
    if p.price < Decimal::ZERO {
        return Err(TxError::application(
            ResultCode::InvalidPrice,
            format!("price must not be negative: {}", p.price),
        ));
    }
    Ok(())
}

pub fn apply_set_price_func(ledger: &mut Ledger, p: &SetPriceFuncParams) -> TxResult<Option<Vec<u8>>> {
    ledger.put_record(
        &keys::price_func(&p.func),
        &PriceFunc {
            func: p.func.clone(),
            price: p.price,
        },
    );
    Ok(None)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOp {
    Set,
    Add,
    Reduce,
}

fn load_account(ledger: &Ledger, node_id: &str, committed: bool) -> TxResult<TokenAccount> {
    ledger
        .get_record::<TokenAccount>(&keys::token(node_id), committed)?
        .ok_or_else(|| {
            TxError::application(
                ResultCode::TokenAccountNotFound,
                format!("token account of {} not found", node_id),
            )
        })
}

pub fn validate_node_token(
    ledger: &Ledger,
    v: Validation,
    p: &NodeTokenParams,
    op: TokenOp,
) -> TxResult<()> {
    require_identifier(&p.node_id, "node id")?;
    if p.amount < Decimal::ZERO {
        return Err(TxError::application(
            ResultCode::InvalidAmount,
            format!("amount must not be negative: {}", p.amount),
        ));
    }
    if !v.is_full() {
        return Ok(());
    }
    let account = load_account(ledger, &p.node_id, v.committed)?;
    match op {
        TokenOp::Set => Ok(()),
        TokenOp::Add if account.amount.checked_add(p.amount).is_none() => Err(overflow(&account, p)),
        TokenOp::Add => Ok(()),
        TokenOp::Reduce if account.amount < p.amount => Err(TxError::application(
            ResultCode::TokenNotEnough,
            format!("{} has {} tokens, cannot reduce by {}", p.node_id, account.amount, p.amount),
        )),
        TokenOp::Reduce => Ok(()),
    }
}

fn overflow(account: &TokenAccount, p: &NodeTokenParams) -> TxError {
    TxError::application(
        ResultCode::InvalidAmount,
        format!("{} has {} tokens, adding {} overflows", p.node_id, account.amount, p.amount),
    )
}

pub fn apply_node_token(ledger: &mut Ledger, p: &NodeTokenParams, op: TokenOp) -> TxResult<Option<Vec<u8>>> {
    let mut account = load_account(ledger, &p.node_id, false)?;
    match op {
        TokenOp::Set => account.amount = p.amount,
        TokenOp::Add => {
            if !account.credit(p.amount) {
                return Err(overflow(&account, p));
            }
        }
        TokenOp::Reduce => {
            if !account.debit(p.amount) {
                return Err(TxError::application(
                    ResultCode::TokenNotEnough,
                    format!("{} has {} tokens, cannot reduce by {}", p.node_id, account.amount, p.amount),
                ));
            }
        }
    }
    ledger.put_record(&keys::token(&p.node_id), &account);
    Ok(None)
}
