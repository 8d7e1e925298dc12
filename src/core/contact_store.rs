//! Contact records per (tenant, owner).

use std::sync::Arc;

use crate::{
    core::matching::best_match,
    domain::{Contact, ContactId, OwnerId, TenantId},
    errors::{LedgerError, Result},
    storage::Partitions,
};

fn contact_name(contact: &Contact) -> &str {
    &contact.name
}

#[derive(Clone)]
pub struct ContactStore {
    partitions: Arc<Partitions>,
}

impl ContactStore {
    pub fn new(partitions: Arc<Partitions>) -> Self {
        Self { partitions }
    }

    /// Adds a contact. Duplicate names are allowed; only a blank name is
    /// rejected here, length rules belong to the caller.
    pub fn create(
        &self,
        tenant: TenantId,
        owner: OwnerId,
        name: &str,
        phone: Option<&str>,
    ) -> Result<ContactId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput("contact name is empty".into()));
        }
        let phone = phone
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let now = self.partitions.clock().now();
        let id = self
            .partitions
            .partition(tenant)?
            .write(|book| Ok(book.add_contact(owner, name, phone, now)))?;
        tracing::info!(%tenant, %owner, contact = %id, "contact created");
        Ok(id)
    }

    /// Owner's contacts sorted by name.
    pub fn list(&self, tenant: TenantId, owner: OwnerId) -> Result<Vec<Contact>> {
        self.partitions
            .partition(tenant)?
            .read(|book| book.contacts_of(owner).into_iter().cloned().collect())
    }

    pub fn get(&self, tenant: TenantId, owner: OwnerId, id: ContactId) -> Result<Option<Contact>> {
        self.partitions
            .partition(tenant)?
            .read(|book| book.contact(owner, id).cloned())
    }

    /// Like [`ContactStore::get`] but a missing contact is an error.
    pub fn require(&self, tenant: TenantId, owner: OwnerId, id: ContactId) -> Result<Contact> {
        self.get(tenant, owner, id)?
            .ok_or_else(|| LedgerError::ContactNotFound(format!("#{}", id)))
    }

    /// Resolves free text to one of the owner's contacts, see
    /// [`best_match`] for the ranking rules.
    pub fn resolve(&self, tenant: TenantId, owner: OwnerId, query: &str) -> Result<Contact> {
        let candidates = self.list(tenant, owner)?;
        best_match(query, &candidates, contact_name)
            .cloned()
            .ok_or_else(|| LedgerError::ContactNotFound(query.trim().to_string()))
    }

    /// Deletes the contact and, in the same partition write, every transaction
    /// and reminder that references it. Returns whether the contact existed.
    pub fn delete(&self, tenant: TenantId, owner: OwnerId, id: ContactId) -> Result<bool> {
        let partition = self.partitions.partition(tenant)?;
        if partition.read(|book| book.contact(owner, id).is_none())? {
            return Ok(false);
        }
        let now = self.partitions.clock().now();
        let report = partition.write(|book| {
            let report = book.remove_contact(owner, id);
            book.touch(now);
            Ok(report)
        })?;
        match report {
            Some(report) => {
                tracing::info!(
                    %tenant,
                    %owner,
                    contact = %id,
                    transactions = report.transactions,
                    reminders = report.reminders,
                    "contact deleted"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
