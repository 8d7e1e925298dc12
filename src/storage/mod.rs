//! Tenant-partitioned persistence.
//!
//! Call sites only ever see [`Partitions::partition`]; whether a partition is
//! one JSON file, a row range in a shared database, or a map entry in memory is
//! a property of the [`StorageBackend`] behind it.

pub mod json_backend;
pub mod memory;

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};

use crate::{
    core::clock::Clock,
    domain::{OwnerId, TenantBook, TenantId},
    errors::{LedgerError, Result},
};

pub use json_backend::JsonStorage;
pub use memory::MemoryStorage;

/// Persisted language choice of one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferenceRecord {
    pub owner: OwnerId,
    pub language: String,
}

/// Abstraction over persistence backends capable of storing tenant books.
pub trait StorageBackend: Send + Sync {
    /// Returns `None` when the tenant has never been written.
    fn load(&self, tenant: TenantId) -> Result<Option<TenantBook>>;
    fn save(&self, book: &TenantBook) -> Result<()>;
    fn tenants(&self) -> Result<Vec<TenantId>>;
    fn load_preferences(&self) -> Result<Vec<PreferenceRecord>>;
    fn save_preferences(&self, records: &[PreferenceRecord]) -> Result<()>;
}

/// Handle to one tenant's book. Cloning shares the same underlying state.
#[derive(Clone)]
pub struct Partition {
    tenant: TenantId,
    book: Arc<Mutex<TenantBook>>,
    backend: Arc<dyn StorageBackend>,
}

impl Partition {
    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    pub fn read<T>(&self, reader: impl FnOnce(&TenantBook) -> T) -> Result<T> {
        let guard = self.book.lock().map_err(|_| poisoned(self.tenant))?;
        Ok(reader(&guard))
    }

    /// Applies `mutator` to a copy of the book, persists the copy, and only then
    /// publishes it. A failing mutator or a failing save leaves the partition
    /// untouched, so multi-row changes such as contact cascades are atomic.
    pub fn write<T>(&self, mutator: impl FnOnce(&mut TenantBook) -> Result<T>) -> Result<T> {
        let mut guard = self.book.lock().map_err(|_| poisoned(self.tenant))?;
        let mut draft = guard.clone();
        let value = mutator(&mut draft)?;
        self.backend.save(&draft)?;
        *guard = draft;
        Ok(value)
    }
}

fn poisoned(tenant: TenantId) -> LedgerError {
    LedgerError::StoreUnavailable(format!("partition {} lock poisoned", tenant))
}

/// Registry that opens partitions lazily and keeps them for the process
/// lifetime.
pub struct Partitions {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    open: Mutex<HashMap<TenantId, Partition>>,
}

impl Partitions {
    pub fn new(backend: Arc<dyn StorageBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            open: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Opens `tenant`, loading it from the backend on first use. The load runs
    /// outside the registry lock so one slow partition never blocks others.
    pub fn partition(&self, tenant: TenantId) -> Result<Partition> {
        if let Some(partition) = self.registry()?.get(&tenant) {
            return Ok(partition.clone());
        }
        let book = match self.backend.load(tenant)? {
            Some(book) => book,
            None => {
                tracing::debug!(%tenant, "opening empty partition");
                TenantBook::new(tenant, self.clock.now())
            }
        };
        let loaded = Partition {
            tenant,
            book: Arc::new(Mutex::new(book)),
            backend: Arc::clone(&self.backend),
        };
        // a concurrent opener may have won; its copy is the live one
        Ok(self.registry()?.entry(tenant).or_insert(loaded).clone())
    }

    fn registry(&self) -> Result<MutexGuard<'_, HashMap<TenantId, Partition>>> {
        self.open
            .lock()
            .map_err(|_| LedgerError::StoreUnavailable("partition registry poisoned".into()))
    }

    /// Every tenant known to the backend or opened in this process, ascending.
    pub fn tenants(&self) -> Result<Vec<TenantId>> {
        let mut all: BTreeSet<TenantId> = self.backend.tenants()?.into_iter().collect();
        if let Ok(open) = self.open.lock() {
            all.extend(open.keys().copied());
        }
        Ok(all.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn partitions() -> (Arc<MemoryStorage>, Partitions) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
        ));
        let partitions = Partitions::new(storage.clone(), clock);
        (storage, partitions)
    }

    #[test]
    fn write_persists_and_publishes() {
        let (storage, partitions) = partitions();
        let partition = partitions.partition(TenantId(5)).unwrap();
        partition
            .write(|book| {
                book.add_contact(OwnerId(1), "Sara", None, book.updated_at);
                Ok(())
            })
            .unwrap();

        let stored = storage.load(TenantId(5)).unwrap().expect("persisted");
        assert_eq!(stored.contacts.len(), 1);
        assert_eq!(partition.read(|book| book.contacts.len()).unwrap(), 1);
        assert_eq!(partitions.tenants().unwrap(), vec![TenantId(5)]);
    }

    #[test]
    fn failed_save_leaves_partition_untouched() {
        let (storage, partitions) = partitions();
        let partition = partitions.partition(TenantId(5)).unwrap();
        storage.set_unavailable(true);

        let err = partition
            .write(|book| {
                book.add_contact(OwnerId(1), "Sara", None, book.updated_at);
                Ok(())
            })
            .expect_err("save must fail");
        assert!(matches!(err, LedgerError::StoreUnavailable(_)));
        assert_eq!(partition.read(|book| book.contacts.len()).unwrap(), 0);
    }

    #[test]
    fn failed_mutator_discards_draft() {
        let (_storage, partitions) = partitions();
        let partition = partitions.partition(TenantId(9)).unwrap();
        let result: Result<()> = partition.write(|book| {
            book.add_contact(OwnerId(1), "Ghost", None, book.updated_at);
            Err(LedgerError::InvalidInput("nope".into()))
        });
        assert!(result.is_err());
        assert_eq!(partition.read(|book| book.contacts.len()).unwrap(), 0);
    }

    #[test]
    fn reopening_returns_the_live_partition() {
        let (_storage, partitions) = partitions();
        let first = partitions.partition(TenantId(3)).unwrap();
        first
            .write(|book| {
                book.add_contact(OwnerId(1), "Sara", None, book.updated_at);
                Ok(())
            })
            .unwrap();

        let again = partitions.partition(TenantId(3)).unwrap();
        assert!(Arc::ptr_eq(&first.book, &again.book));
        assert_eq!(again.read(|book| book.contacts.len()).unwrap(), 1);
    }
}
