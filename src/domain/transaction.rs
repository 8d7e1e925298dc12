use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{ContactId, Identifiable, Owned, OwnerId, TransactionId};
use crate::currency::CurrencyCode;

/// Direction of money movement relative to the owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Owner gave money; the contact owes more.
    Lend,
    /// Owner received money; the owner owes more.
    Borrow,
}

impl TransactionKind {
    /// Sign applied to the amount when folding a balance.
    pub fn sign(self) -> f64 {
        match self {
            TransactionKind::Lend => 1.0,
            TransactionKind::Borrow => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Lend => "lend",
            TransactionKind::Borrow => "borrow",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable ledger entry. Only a contact cascade ever removes one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner_id: OwnerId,
    pub contact_id: ContactId,
    pub amount: f64,
    pub currency: CurrencyCode,
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the kind's sign applied.
    pub fn signed_amount(&self) -> f64 {
        self.kind.sign() * self.amount
    }
}

impl Identifiable for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }
}

impl Owned for Transaction {
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}
