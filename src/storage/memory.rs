use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use crate::{
    domain::{TenantBook, TenantId},
    errors::{LedgerError, Result},
};

use super::{PreferenceRecord, StorageBackend};

/// Volatile backend for tests and throwaway sessions.
///
/// `set_unavailable(true)` makes every subsequent call fail with
/// `StoreUnavailable`, which is how outage handling gets exercised.
#[derive(Default)]
pub struct MemoryStorage {
    books: Mutex<BTreeMap<TenantId, TenantBook>>,
    preferences: Mutex<Vec<PreferenceRecord>>,
    unavailable: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(LedgerError::StoreUnavailable("memory store offline".into()))
        } else {
            Ok(())
        }
    }
}

fn poisoned() -> LedgerError {
    LedgerError::StoreUnavailable("memory store lock poisoned".into())
}

impl StorageBackend for MemoryStorage {
    fn load(&self, tenant: TenantId) -> Result<Option<TenantBook>> {
        self.check()?;
        let books = self.books.lock().map_err(|_| poisoned())?;
        Ok(books.get(&tenant).cloned())
    }

    fn save(&self, book: &TenantBook) -> Result<()> {
        self.check()?;
        let mut books = self.books.lock().map_err(|_| poisoned())?;
        books.insert(book.tenant, book.clone());
        Ok(())
    }

    fn tenants(&self) -> Result<Vec<TenantId>> {
        self.check()?;
        let books = self.books.lock().map_err(|_| poisoned())?;
        Ok(books.keys().copied().collect())
    }

    fn load_preferences(&self) -> Result<Vec<PreferenceRecord>> {
        self.check()?;
        Ok(self.preferences.lock().map_err(|_| poisoned())?.clone())
    }

    fn save_preferences(&self, records: &[PreferenceRecord]) -> Result<()> {
        self.check()?;
        *self.preferences.lock().map_err(|_| poisoned())? = records.to_vec();
        Ok(())
    }
}
