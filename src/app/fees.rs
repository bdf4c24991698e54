//! Per-method fees
//!
//! A method costs `DEFAULT_PRICE` tokens until `SetPriceFunc` says
//! otherwise. The NDID never pays.

use rust_decimal::Decimal;

use crate::ledger::{keys, Ledger};
use crate::model::{PriceFunc, TokenAccount};
use crate::storage::StorageResult;

use super::error::{TxError, TxResult};
use super::method::Method;
use super::permission::Caller;
use super::result::ResultCode;

pub const DEFAULT_PRICE: Decimal = Decimal::ONE;

pub fn price_of(ledger: &Ledger, method: Method, committed: bool) -> StorageResult<Decimal> {
    Ok(ledger
        .get_record::<PriceFunc>(&keys::price_func(method.name()), committed)?
        .map(|p| p.price)
        .unwrap_or(DEFAULT_PRICE))
}

/// Debits the fee for `method` from the caller's account.
///
/// Runs after the domain mutation. A failure leaves the mutation in place
/// and the account untouched.
pub fn charge(ledger: &mut Ledger, caller: &Caller, method: Method) -> TxResult<()> {
    if caller.is_ndid() {
        return Ok(());
    }

    let price = price_of(ledger, method, false)?;
    if price.is_zero() {
        return Ok(());
    }

    let key = keys::token(&caller.node_id);
    let mut account = ledger.get_record::<TokenAccount>(&key, false)?.ok_or_else(|| {
        TxError::application(
            ResultCode::TokenAccountNotFound,
            format!("token account of {} not found", caller.node_id),
        )
    })?;

    if !account.debit(price) {
        return Err(TxError::application(
            ResultCode::TokenNotEnough,
            format!(
                "{} needs {} tokens for {}, has {}",
                caller.node_id,
                price,
                method.name(),
                account.amount
            ),
        ));
    }

    ledger.put_record(&key, &account);
    Ok(())
}
