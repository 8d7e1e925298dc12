use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;
use crate::domain::Transaction;

/// Magnitude below which a balance counts as settled.
pub const SETTLEMENT_THRESHOLD: f64 = 0.01;

/// Who owes whom, as seen by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceDirection {
    TheyOwe,
    YouOwe,
    Settled,
}

/// Signed balance for one (owner, contact) pair. Positive means the contact owes
/// the owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Balance {
    pub amount: f64,
    pub currency: CurrencyCode,
}

impl Balance {
    pub fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: 0.0,
            currency,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.amount.abs() < SETTLEMENT_THRESHOLD
    }

    pub fn direction(&self) -> BalanceDirection {
        if self.is_settled() {
            BalanceDirection::Settled
        } else if self.amount > 0.0 {
            BalanceDirection::TheyOwe
        } else {
            BalanceDirection::YouOwe
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.amount.abs()
    }
}

/// Derives balances from transaction history. Never cached.
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Left-to-right fold over `transactions`, which must be in creation order.
    /// The first transaction fixes the currency; mixed currencies are summed
    /// as-is.
    pub fn fold<'a, I>(transactions: I, default_currency: &CurrencyCode) -> Balance
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut iter = transactions.into_iter();
        let Some(first) = iter.next() else {
            return Balance::zero(default_currency.clone());
        };
        let currency = first.currency.clone();
        let amount = iter.fold(first.signed_amount(), |acc, txn| acc + txn.signed_amount());
        Balance { amount, currency }
    }
}
