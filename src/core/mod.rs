//! Stores, contact matching and the reminder scheduler.

pub mod clock;
pub mod contact_store;
pub mod ledger_store;
pub mod matching;
pub mod preferences;
pub mod reminder_store;
pub mod scheduler;

use std::sync::Arc;

use crate::{
    config::Config,
    errors::Result,
    storage::{Partitions, StorageBackend},
};

pub use clock::{Clock, FixedClock, SystemClock};
pub use contact_store::ContactStore;
pub use ledger_store::LedgerStore;
pub use preferences::UserPreferences;
pub use reminder_store::{DueReminder, ReminderStore, ReminderView, Triage};
pub use scheduler::{ReminderScheduler, SchedulerHandle, SweepReport};

/// Every store, sharing one set of partitions.
#[derive(Clone)]
pub struct Stores {
    pub partitions: Arc<Partitions>,
    pub contacts: ContactStore,
    pub ledger: LedgerStore,
    pub reminders: ReminderStore,
    pub preferences: Arc<UserPreferences>,
}

impl Stores {
    pub fn open(
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Result<Self> {
        let preferences = Arc::new(UserPreferences::load(Arc::clone(&backend), config)?);
        let partitions = Arc::new(Partitions::new(backend, clock));
        Ok(Self {
            contacts: ContactStore::new(Arc::clone(&partitions)),
            ledger: LedgerStore::new(Arc::clone(&partitions), config.default_currency.clone()),
            reminders: ReminderStore::new(Arc::clone(&partitions)),
            preferences,
            partitions,
        })
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        self.partitions.clock()
    }
}
