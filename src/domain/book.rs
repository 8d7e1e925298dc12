use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{ContactId, Identifiable, Owned, OwnerId, ReminderId, TenantId, TransactionId};
use super::contact::Contact;
use super::reminder::Reminder;
use super::transaction::{Transaction, TransactionKind};
use crate::currency::CurrencyCode;

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

fn default_schema_version() -> u8 {
    CURRENT_SCHEMA_VERSION
}

fn first_id() -> u64 {
    1
}

/// Everything persisted for one tenant partition.
///
/// Transactions and reminders are kept in insertion order, which is also their
/// creation order; balance folding relies on that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantBook {
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
    pub tenant: TenantId,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default = "first_id")]
    next_contact_id: u64,
    #[serde(default = "first_id")]
    next_transaction_id: u64,
    #[serde(default = "first_id")]
    next_reminder_id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Counts of rows dropped when a contact is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub transactions: usize,
    pub reminders: usize,
}

impl TenantBook {
    pub fn new(tenant: TenantId, now: DateTime<Utc>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            tenant,
            contacts: Vec::new(),
            transactions: Vec::new(),
            reminders: Vec::new(),
            next_contact_id: 1,
            next_transaction_id: 1,
            next_reminder_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn add_contact(
        &mut self,
        owner: OwnerId,
        name: &str,
        phone: Option<String>,
        now: DateTime<Utc>,
    ) -> ContactId {
        let id = ContactId(self.next_contact_id);
        self.next_contact_id += 1;
        self.contacts
            .push(Contact::new(id, owner, name.trim(), phone, now));
        self.touch(now);
        id
    }

    pub fn contact(&self, owner: OwnerId, id: ContactId) -> Option<&Contact> {
        find_owned(&self.contacts, owner, id)
    }

    /// Contacts of `owner`, sorted by name (case-insensitive) then id.
    pub fn contacts_of(&self, owner: OwnerId) -> Vec<&Contact> {
        let mut contacts: Vec<&Contact> = self
            .contacts
            .iter()
            .filter(|contact| contact.is_owned_by(owner))
            .collect();
        contacts.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        contacts
    }

    /// Removes the contact together with every transaction and reminder that
    /// references it. Returns `None` when the contact does not exist.
    pub fn remove_contact(&mut self, owner: OwnerId, id: ContactId) -> Option<CascadeReport> {
        self.contact(owner, id)?;
        let before_txns = self.transactions.len();
        let before_reminders = self.reminders.len();
        self.transactions.retain(|txn| txn.contact_id != id);
        self.reminders.retain(|reminder| reminder.contact_id != id);
        self.contacts.retain(|contact| contact.id != id);
        Some(CascadeReport {
            transactions: before_txns - self.transactions.len(),
            reminders: before_reminders - self.reminders.len(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_transaction(
        &mut self,
        owner: OwnerId,
        contact: ContactId,
        amount: f64,
        currency: CurrencyCode,
        kind: TransactionKind,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> TransactionId {
        let id = TransactionId(self.next_transaction_id);
        self.next_transaction_id += 1;
        self.transactions.push(Transaction {
            id,
            owner_id: owner,
            contact_id: contact,
            amount,
            currency,
            kind,
            note,
            created_at: now,
        });
        self.touch(now);
        id
    }

    /// Transactions of one (owner, contact) pair in creation order.
    pub fn transactions_for(
        &self,
        owner: OwnerId,
        contact: ContactId,
    ) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |txn| txn.is_owned_by(owner) && txn.contact_id == contact)
    }

    pub fn add_reminder(
        &mut self,
        owner: OwnerId,
        contact: ContactId,
        fire_at: DateTime<Utc>,
        note: String,
        now: DateTime<Utc>,
    ) -> ReminderId {
        let id = ReminderId(self.next_reminder_id);
        self.next_reminder_id += 1;
        self.reminders.push(Reminder {
            id,
            owner_id: owner,
            contact_id: contact,
            fire_at,
            note,
            active: true,
            created_at: now,
        });
        self.touch(now);
        id
    }

    pub fn reminder(&self, owner: OwnerId, id: ReminderId) -> Option<&Reminder> {
        find_owned(&self.reminders, owner, id)
    }

    pub fn reminder_mut(&mut self, id: ReminderId) -> Option<&mut Reminder> {
        self.reminders.iter_mut().find(|reminder| reminder.id == id)
    }

    /// Rows whose contact no longer exists. Always empty unless the file was
    /// edited by hand.
    pub fn orphan_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for txn in &self.transactions {
            if !self.contacts.iter().any(|c| c.id == txn.contact_id) {
                warnings.push(format!(
                    "transaction {} references unknown contact {}",
                    txn.id, txn.contact_id
                ));
            }
        }
        for reminder in &self.reminders {
            if !self.contacts.iter().any(|c| c.id == reminder.contact_id) {
                warnings.push(format!(
                    "reminder {} references unknown contact {}",
                    reminder.id, reminder.contact_id
                ));
            }
        }
        warnings
    }
}

fn find_owned<T>(rows: &[T], owner: OwnerId, id: T::Id) -> Option<&T>
where
    T: Identifiable + Owned,
{
    rows.iter().find(|row| row.id() == id && row.is_owned_by(owner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 4, 9, 30, 0).unwrap()
    }

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let mut book = TenantBook::new(TenantId(-100), now());
        let first = book.add_contact(OwnerId(1), "Sara", None, now());
        book.remove_contact(OwnerId(1), first).unwrap();
        let second = book.add_contact(OwnerId(1), "Sara", None, now());
        assert_eq!(first, ContactId(1));
        assert_eq!(second, ContactId(2));
    }

    #[test]
    fn contacts_sort_case_insensitively_per_owner() {
        let mut book = TenantBook::new(TenantId(1), now());
        book.add_contact(OwnerId(1), "zineb", None, now());
        book.add_contact(OwnerId(1), "Amine", None, now());
        book.add_contact(OwnerId(2), "Bilal", None, now());
        let names: Vec<_> = book
            .contacts_of(OwnerId(1))
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Amine", "zineb"]);
    }

    #[test]
    fn remove_contact_cascades() {
        let mut book = TenantBook::new(TenantId(1), now());
        let owner = OwnerId(1);
        let keep = book.add_contact(owner, "Keep", None, now());
        let drop = book.add_contact(owner, "Drop", None, now());
        for contact in [keep, drop] {
            book.add_transaction(
                owner,
                contact,
                10.0,
                CurrencyCode::new("DZD"),
                TransactionKind::Lend,
                None,
                now(),
            );
            book.add_reminder(owner, contact, now() + Duration::days(1), String::new(), now());
        }

        let report = book.remove_contact(owner, drop).expect("contact exists");
        assert_eq!(report.transactions, 1);
        assert_eq!(report.reminders, 1);
        assert!(book.transactions.iter().all(|t| t.contact_id == keep));
        assert!(book.reminders.iter().all(|r| r.contact_id == keep));
        assert!(book.orphan_warnings().is_empty());
        assert!(book.remove_contact(owner, drop).is_none());
    }

    #[test]
    fn other_owners_cannot_remove_contacts() {
        let mut book = TenantBook::new(TenantId(1), now());
        let id = book.add_contact(OwnerId(1), "Sara", None, now());
        assert!(book.remove_contact(OwnerId(2), id).is_none());
        assert_eq!(book.contacts.len(), 1);
    }
}
