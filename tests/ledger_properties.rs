mod common;

use chrono::Duration;
use common::{start_time, Harness, OWNER, TENANT};
use markily_core::{
    currency::CurrencyCode,
    domain::{ContactId, OwnerId, TransactionKind},
    errors::LedgerError,
    ledger::{BalanceCalculator, BalanceDirection},
};

fn dzd() -> CurrencyCode {
    CurrencyCode::new("DZD")
}

fn record(harness: &Harness, contact: ContactId, amount: f64, kind: TransactionKind) {
    harness
        .stores
        .ledger
        .append(TENANT, OWNER, contact, amount, dzd(), kind, None)
        .unwrap();
}

#[test]
fn interleaved_contacts_fold_independently() {
    let harness = Harness::new();
    let contacts = &harness.stores.contacts;
    let sara = contacts.create(TENANT, OWNER, "Sara", None).unwrap();
    let karim = contacts.create(TENANT, OWNER, "Karim", None).unwrap();

    let script = [
        (sara, 1000.0, TransactionKind::Lend),
        (karim, 250.0, TransactionKind::Borrow),
        (sara, 400.0, TransactionKind::Borrow),
        (karim, 75.5, TransactionKind::Lend),
        (sara, 12.25, TransactionKind::Lend),
    ];
    for (contact, amount, kind) in script {
        record(&harness, contact, amount, kind);
    }

    for contact in [sara, karim] {
        let expected: f64 = script
            .iter()
            .filter(|(who, _, _)| *who == contact)
            .map(|(_, amount, kind)| amount * kind.sign())
            .sum();
        let balance = harness.stores.ledger.balance(TENANT, OWNER, contact).unwrap();
        assert!((balance.amount - expected).abs() < 1e-9, "{contact}: {balance:?}");

        let mut history = harness.stores.ledger.history(TENANT, OWNER, contact).unwrap();
        history.reverse();
        assert_eq!(BalanceCalculator::fold(&history, &dzd()), balance);
    }
}

#[test]
fn owners_in_one_tenant_do_not_see_each_other() {
    let harness = Harness::new();
    let sara = harness.stores.contacts.create(TENANT, OWNER, "Sara", None).unwrap();
    record(&harness, sara, 100.0, TransactionKind::Lend);

    let other = OwnerId(8);
    assert!(harness.stores.contacts.list(TENANT, other).unwrap().is_empty());
    assert!(matches!(
        harness
            .stores
            .ledger
            .append(TENANT, other, sara, 5.0, dzd(), TransactionKind::Lend, None),
        Err(LedgerError::ContactNotFound(_))
    ));
}

#[test]
fn settling_the_full_balance_lands_within_a_cent() {
    let harness = Harness::new();
    let ledger = &harness.stores.ledger;
    let sara = harness.stores.contacts.create(TENANT, OWNER, "Sara", None).unwrap();
    record(&harness, sara, 1000.10, TransactionKind::Lend);
    record(&harness, sara, 333.37, TransactionKind::Borrow);

    let owed = ledger.balance(TENANT, OWNER, sara).unwrap();
    let (_, after) = ledger
        .settle(TENANT, OWNER, sara, owed.magnitude(), dzd(), None)
        .unwrap();
    assert!(after.amount.abs() < 0.01);
    assert_eq!(after.direction(), BalanceDirection::Settled);

    // overshooting flips who owes whom
    let karim = harness.stores.contacts.create(TENANT, OWNER, "Karim", None).unwrap();
    record(&harness, karim, 100.0, TransactionKind::Lend);
    let (_, flipped) = ledger.settle(TENANT, OWNER, karim, 150.0, dzd(), None).unwrap();
    assert_eq!(flipped.direction(), BalanceDirection::YouOwe);
    assert!((flipped.amount + 50.0).abs() < 1e-9);
}

#[test]
fn non_positive_amounts_are_rejected() {
    let harness = Harness::new();
    let sara = harness.stores.contacts.create(TENANT, OWNER, "Sara", None).unwrap();
    for amount in [0.0, -10.0, f64::NAN] {
        let result = harness
            .stores
            .ledger
            .append(TENANT, OWNER, sara, amount, dzd(), TransactionKind::Lend, None);
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    }
    assert!(harness.stores.ledger.history(TENANT, OWNER, sara).unwrap().is_empty());
}

#[test]
fn fuzzy_lookup_finds_partial_names() {
    let harness = Harness::new();
    let contacts = &harness.stores.contacts;
    contacts.create(TENANT, OWNER, "Amine Khoudor", None).unwrap();
    contacts.create(TENANT, OWNER, "Sara", None).unwrap();

    assert_eq!(contacts.resolve(TENANT, OWNER, "amin").unwrap().name, "Amine Khoudor");
    assert!(matches!(
        contacts.resolve(TENANT, OWNER, "xyz"),
        Err(LedgerError::ContactNotFound(query)) if query == "xyz"
    ));
}

#[test]
fn deleting_a_contact_removes_its_rows() {
    let harness = Harness::new();
    let stores = &harness.stores;
    let sara = stores.contacts.create(TENANT, OWNER, "Sara", None).unwrap();
    let karim = stores.contacts.create(TENANT, OWNER, "Karim", None).unwrap();
    record(&harness, sara, 10.0, TransactionKind::Lend);
    record(&harness, karim, 20.0, TransactionKind::Lend);
    stores
        .reminders
        .create(TENANT, OWNER, sara, start_time() + Duration::hours(1), "")
        .unwrap();

    assert!(stores.contacts.delete(TENANT, OWNER, sara).unwrap());
    assert!(!stores.contacts.delete(TENANT, OWNER, sara).unwrap());

    assert!(stores.ledger.history(TENANT, OWNER, sara).unwrap().is_empty());
    assert!(stores.reminders.active_future(TENANT, OWNER).unwrap().is_empty());
    assert_eq!(stores.ledger.history(TENANT, OWNER, karim).unwrap().len(), 1);
}
