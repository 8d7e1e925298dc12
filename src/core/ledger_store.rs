//! Append-only transaction log and the balance queries derived from it.

use std::sync::Arc;

use crate::{
    currency::{CurrencyCode, MAX_AMOUNT},
    domain::{
        Contact, ContactId, OwnerId, TenantBook, TenantId, Transaction, TransactionId,
        TransactionKind,
    },
    errors::{LedgerError, Result},
    ledger::{Balance, BalanceCalculator},
    storage::Partitions,
};

/// Rejects zero, negative, non-finite and oversized amounts.
pub fn validate_amount(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 && amount <= MAX_AMOUNT {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount.to_string()))
    }
}

#[derive(Clone)]
pub struct LedgerStore {
    partitions: Arc<Partitions>,
    default_currency: CurrencyCode,
}

impl LedgerStore {
    pub fn new(partitions: Arc<Partitions>, default_currency: CurrencyCode) -> Self {
        Self {
            partitions,
            default_currency,
        }
    }

    pub fn default_currency(&self) -> &CurrencyCode {
        &self.default_currency
    }

    #[allow(clippy::too_many_arguments)]
    pub fn append(
        &self,
        tenant: TenantId,
        owner: OwnerId,
        contact: ContactId,
        amount: f64,
        currency: CurrencyCode,
        kind: TransactionKind,
        note: Option<String>,
    ) -> Result<TransactionId> {
        validate_amount(amount)?;
        let note = clean_note(note);
        let now = self.partitions.clock().now();
        let id = self.partitions.partition(tenant)?.write(|book| {
            ensure_contact(book, owner, contact)?;
            Ok(book.add_transaction(owner, contact, amount, currency.clone(), kind, note, now))
        })?;
        tracing::info!(
            %tenant,
            %owner,
            contact = %contact,
            transaction = %id,
            kind = kind.as_str(),
            amount,
            currency = %currency,
            "transaction recorded"
        );
        Ok(id)
    }

    /// Transactions of the pair, newest first.
    pub fn history(
        &self,
        tenant: TenantId,
        owner: OwnerId,
        contact: ContactId,
    ) -> Result<Vec<Transaction>> {
        self.partitions.partition(tenant)?.read(|book| {
            let mut history: Vec<Transaction> =
                book.transactions_for(owner, contact).cloned().collect();
            history.reverse();
            history
        })
    }

    pub fn balance(&self, tenant: TenantId, owner: OwnerId, contact: ContactId) -> Result<Balance> {
        self.partitions
            .partition(tenant)?
            .read(|book| self.fold(book, owner, contact))
    }

    /// Every contact of `owner` with its current balance, in contact order.
    pub fn balances(&self, tenant: TenantId, owner: OwnerId) -> Result<Vec<(Contact, Balance)>> {
        self.partitions.partition(tenant)?.read(|book| {
            book.contacts_of(owner)
                .into_iter()
                .map(|contact| (contact.clone(), self.fold(book, owner, contact.id)))
                .collect()
        })
    }

    /// Records a payment against the current balance: a `borrow` when the
    /// contact owes the owner, a `lend` otherwise. The balance is read and the
    /// transaction appended in the same partition write. Overshooting flips the
    /// sign of the balance.
    pub fn settle(
        &self,
        tenant: TenantId,
        owner: OwnerId,
        contact: ContactId,
        amount: f64,
        currency: CurrencyCode,
        note: Option<String>,
    ) -> Result<(TransactionId, Balance)> {
        validate_amount(amount)?;
        let note = clean_note(note);
        let now = self.partitions.clock().now();
        let (id, kind, after) = self.partitions.partition(tenant)?.write(|book| {
            ensure_contact(book, owner, contact)?;
            let before = self.fold(book, owner, contact);
            let kind = if before.amount > 0.0 {
                TransactionKind::Borrow
            } else {
                TransactionKind::Lend
            };
            let id =
                book.add_transaction(owner, contact, amount, currency.clone(), kind, note, now);
            Ok((id, kind, self.fold(book, owner, contact)))
        })?;
        tracing::info!(
            %tenant,
            %owner,
            contact = %contact,
            transaction = %id,
            kind = kind.as_str(),
            remaining = after.amount,
            "balance settled"
        );
        Ok((id, after))
    }

    fn fold(&self, book: &TenantBook, owner: OwnerId, contact: ContactId) -> Balance {
        BalanceCalculator::fold(book.transactions_for(owner, contact), &self.default_currency)
    }
}

fn ensure_contact(book: &TenantBook, owner: OwnerId, contact: ContactId) -> Result<()> {
    book.contact(owner, contact)
        .map(|_| ())
        .ok_or_else(|| LedgerError::ContactNotFound(format!("#{}", contact)))
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, FixedClock};
    use crate::storage::MemoryStorage;
    use chrono::{Duration, TimeZone, Utc};

    struct Fixture {
        store: LedgerStore,
        clock: Arc<FixedClock>,
        contact: ContactId,
    }

    const TENANT: TenantId = TenantId(10);
    const OWNER: OwnerId = OwnerId(20);

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        ));
        let partitions = Arc::new(Partitions::new(Arc::new(MemoryStorage::new()), clock.clone()));
        let contact = partitions
            .partition(TENANT)
            .unwrap()
            .write(|book| Ok(book.add_contact(OWNER, "Karim", None, clock.now())))
            .unwrap();
        Fixture {
            store: LedgerStore::new(partitions, CurrencyCode::new("DZD")),
            clock,
            contact,
        }
    }

    fn dzd() -> CurrencyCode {
        CurrencyCode::new("DZD")
    }

    #[test]
    fn lend_then_partial_borrow() {
        let fx = fixture();
        fx.store
            .append(TENANT, OWNER, fx.contact, 1000.0, dzd(), TransactionKind::Lend, None)
            .unwrap();
        fx.store
            .append(TENANT, OWNER, fx.contact, 400.0, dzd(), TransactionKind::Borrow, None)
            .unwrap();
        let balance = fx.store.balance(TENANT, OWNER, fx.contact).unwrap();
        assert_eq!(balance.amount, 600.0);
        assert_eq!(balance.currency, dzd());
    }

    #[test]
    fn invalid_amounts_are_rejected_without_writing() {
        let fx = fixture();
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY, 1e20] {
            let err = fx
                .store
                .append(TENANT, OWNER, fx.contact, amount, dzd(), TransactionKind::Lend, None)
                .unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount(_)));
        }
        assert!(fx.store.history(TENANT, OWNER, fx.contact).unwrap().is_empty());
    }

    #[test]
    fn foreign_contact_is_not_found() {
        let fx = fixture();
        let err = fx
            .store
            .append(TENANT, OwnerId(99), fx.contact, 5.0, dzd(), TransactionKind::Lend, None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ContactNotFound(_)));
    }

    #[test]
    fn history_is_newest_first() {
        let fx = fixture();
        for amount in [1.0, 2.0, 3.0] {
            let note = Some(" ".to_string());
            fx.store
                .append(TENANT, OWNER, fx.contact, amount, dzd(), TransactionKind::Lend, note)
                .unwrap();
            fx.clock.advance(Duration::minutes(1));
        }
        let history = fx.store.history(TENANT, OWNER, fx.contact).unwrap();
        let amounts: Vec<f64> = history.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![3.0, 2.0, 1.0]);
        assert!(history.iter().all(|t| t.note.is_none()));
    }

    #[test]
    fn settle_picks_direction_from_balance() {
        let fx = fixture();
        fx.store
            .append(TENANT, OWNER, fx.contact, 250.0, dzd(), TransactionKind::Borrow, None)
            .unwrap();
        let (_, after) = fx
            .store
            .settle(TENANT, OWNER, fx.contact, 250.0, dzd(), Some("Balance cleared".into()))
            .unwrap();
        assert!(after.is_settled());
        let newest = &fx.store.history(TENANT, OWNER, fx.contact).unwrap()[0];
        assert_eq!(newest.kind, TransactionKind::Lend);
        assert_eq!(newest.note.as_deref(), Some("Balance cleared"));
    }

    #[test]
    fn settle_may_overshoot() {
        let fx = fixture();
        fx.store
            .append(TENANT, OWNER, fx.contact, 100.0, dzd(), TransactionKind::Lend, None)
            .unwrap();
        let (_, after) = fx
            .store
            .settle(TENANT, OWNER, fx.contact, 150.0, dzd(), None)
            .unwrap();
        assert_eq!(after.amount, -50.0);
    }

    #[test]
    fn balances_cover_every_contact() {
        let fx = fixture();
        let balances = fx.store.balances(TENANT, OWNER).unwrap();
        assert_eq!(balances.len(), 1);
        assert!(balances[0].1.is_settled());
        assert_eq!(balances[0].1.currency, dzd());
    }
}
