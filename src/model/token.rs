//! Token accounts and per-method prices

use rust_decimal::Decimal;
use serde::Serialize;

use crate::codec::{Canonical, CodecResult, Decoder, Encoder};

/// Fee balance of one node. The amount never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAccount {
    pub owner_id: String,
    pub amount: Decimal,
}

impl TokenAccount {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            amount: Decimal::ZERO,
        }
    }

    /// Adds `amount` unless the balance would overflow. Fails closed.
    pub fn credit(&mut self, amount: Decimal) -> bool {
        match self.amount.checked_add(amount) {
            Some(total) => {
                self.amount = total;
                true
            }
            None => false,
        }
    }

    /// Subtracts `amount` if the balance covers it. Fails closed otherwise.
    pub fn debit(&mut self, amount: Decimal) -> bool {
        if amount > self.amount {
            return false;
        }
        self.amount -= amount;
        true
    }
}

impl Canonical for TokenAccount {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(&self.owner_id);
        enc.put_decimal(&self.amount);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            owner_id: dec.get_string()?,
            amount: dec.get_decimal()?,
        })
    }
}

/// Fee charged for one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceFunc {
    pub func: String,
    pub price: Decimal,
}

impl Canonical for PriceFunc {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_str(&self.func);
        enc.put_decimal(&self.price);
    }

    fn decode(dec: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(Self {
            func: dec.get_string()?,
            price: dec.get_decimal()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_canonical_bytes, to_canonical_bytes};

    #[test]
    fn test_debit_fails_closed() {
        let mut account = TokenAccount::new("rp1");
        assert!(account.credit(Decimal::from(5)));
        assert!(!account.debit(Decimal::from(10)));
        assert_eq!(account.amount, Decimal::from(5));
        assert!(account.debit(Decimal::from(5)));
        assert_eq!(account.amount, Decimal::ZERO);
    }

    #[test]
    fn test_credit_fails_closed_on_overflow() {
        let mut account = TokenAccount::new("rp1");
        account.amount = Decimal::MAX;
        assert!(!account.credit(Decimal::ONE));
        assert_eq!(account.amount, Decimal::MAX);
        assert!(account.credit(Decimal::ZERO));
    }

    #[test]
    fn test_equal_amounts_encode_identically() {
        let a = TokenAccount {
            owner_id: "rp1".into(),
            amount: Decimal::new(1000, 2),
        };
        let b = TokenAccount {
            owner_id: "rp1".into(),
            amount: Decimal::from(10),
        };
        assert_eq!(to_canonical_bytes(&a), to_canonical_bytes(&b));
        assert_eq!(from_canonical_bytes::<TokenAccount>(&to_canonical_bytes(&a)).unwrap(), b);
    }
}
