//! One-shot reminders and the due/stale selection the scheduler sweeps with.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    domain::{ContactId, OwnerId, Reminder, ReminderId, ReminderWindow, TenantBook, TenantId},
    errors::{LedgerError, Result},
    storage::Partitions,
};

/// Active future reminder as shown to its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderView {
    pub id: ReminderId,
    pub contact_id: ContactId,
    pub contact_name: String,
    pub fire_at: DateTime<Utc>,
    pub note: String,
}

/// Reminder inside the due window, joined with its contact's name.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub reminder: Reminder,
    pub contact_name: String,
}

/// Result of classifying one partition's active reminders.
#[derive(Debug, Default)]
pub struct Triage {
    pub due: Vec<DueReminder>,
    pub stale: Vec<ReminderId>,
}

#[derive(Clone)]
pub struct ReminderStore {
    partitions: Arc<Partitions>,
}

impl ReminderStore {
    pub fn new(partitions: Arc<Partitions>) -> Self {
        Self { partitions }
    }

    /// Schedules a reminder. `fire_at` must lie strictly in the future.
    pub fn create(
        &self,
        tenant: TenantId,
        owner: OwnerId,
        contact: ContactId,
        fire_at: DateTime<Utc>,
        note: impl Into<String>,
    ) -> Result<ReminderId> {
        let now = self.partitions.clock().now();
        if fire_at <= now {
            return Err(LedgerError::PastDateTime(fire_at));
        }
        let note = note.into().trim().to_string();
        let id = self.partitions.partition(tenant)?.write(|book| {
            if book.contact(owner, contact).is_none() {
                return Err(LedgerError::ContactNotFound(format!("#{}", contact)));
            }
            Ok(book.add_reminder(owner, contact, fire_at, note, now))
        })?;
        tracing::info!(%tenant, %owner, reminder = %id, %fire_at, "reminder scheduled");
        Ok(id)
    }

    /// Active reminders of `owner` that have not fired yet, soonest first.
    pub fn active_future(&self, tenant: TenantId, owner: OwnerId) -> Result<Vec<ReminderView>> {
        let now = self.partitions.clock().now();
        self.partitions.partition(tenant)?.read(|book| {
            let mut views: Vec<ReminderView> = book
                .reminders
                .iter()
                .filter(|reminder| reminder.owner_id == owner && reminder.is_upcoming(now))
                .map(|reminder| ReminderView {
                    id: reminder.id,
                    contact_id: reminder.contact_id,
                    contact_name: contact_name(book, reminder),
                    fire_at: reminder.fire_at,
                    note: reminder.note.clone(),
                })
                .collect();
            views.sort_by(|a, b| a.fire_at.cmp(&b.fire_at).then(a.id.cmp(&b.id)));
            views
        })
    }

    /// Cancels a reminder on behalf of its owner. Returns `false` when it does
    /// not exist, belongs to someone else, or is already inactive.
    pub fn deactivate(&self, tenant: TenantId, owner: OwnerId, id: ReminderId) -> Result<bool> {
        let partition = self.partitions.partition(tenant)?;
        let active = partition.read(|book| book.reminder(owner, id).is_some_and(|r| r.active))?;
        if !active {
            return Ok(false);
        }
        let changed = partition.write(|book| Ok(switch_off(book, id)))?;
        if changed {
            tracing::info!(%tenant, %owner, reminder = %id, "reminder cancelled");
        }
        Ok(changed)
    }

    /// Splits the partition's active reminders into those inside the catch-up
    /// window ending at `now` and those already older than it.
    pub fn triage(&self, tenant: TenantId, now: DateTime<Utc>, window: Duration) -> Result<Triage> {
        self.partitions.partition(tenant)?.read(|book| {
            let mut triage = Triage::default();
            for reminder in book.reminders.iter().filter(|r| r.active) {
                match reminder.classify(now, window) {
                    ReminderWindow::Pending => {}
                    ReminderWindow::Due => triage.due.push(DueReminder {
                        reminder: reminder.clone(),
                        contact_name: contact_name(book, reminder),
                    }),
                    ReminderWindow::Stale => triage.stale.push(reminder.id),
                }
            }
            triage.due.sort_by_key(|due| (due.reminder.fire_at, due.reminder.id));
            triage
        })
    }

    /// Marks reminders inactive regardless of owner. Used by the scheduler;
    /// returns how many were still active.
    pub fn retire(&self, tenant: TenantId, ids: &[ReminderId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.partitions
            .partition(tenant)?
            .write(|book| Ok(ids.iter().filter(|id| switch_off(book, **id)).count()))
    }
}

fn switch_off(book: &mut TenantBook, id: ReminderId) -> bool {
    match book.reminder_mut(id) {
        Some(reminder) if reminder.active => {
            reminder.active = false;
            true
        }
        _ => false,
    }
}

fn contact_name(book: &TenantBook, reminder: &Reminder) -> String {
    book.contact(reminder.owner_id, reminder.contact_id)
        .map(|contact| contact.name.clone())
        .unwrap_or_else(|| format!("#{}", reminder.contact_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, FixedClock};
    use crate::storage::MemoryStorage;
    use chrono::TimeZone;

    const TENANT: TenantId = TenantId(3);
    const OWNER: OwnerId = OwnerId(30);

    fn setup() -> (ReminderStore, Arc<FixedClock>, ContactId) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
        ));
        let partitions = Arc::new(Partitions::new(Arc::new(MemoryStorage::new()), clock.clone()));
        let contact = partitions
            .partition(TENANT)
            .unwrap()
            .write(|book| Ok(book.add_contact(OWNER, "Nadia", None, clock.now())))
            .unwrap();
        (ReminderStore::new(partitions), clock, contact)
    }

    #[test]
    fn create_rejects_past_and_unknown_contacts() {
        let (store, clock, contact) = setup();
        let err = store
            .create(TENANT, OWNER, contact, clock.now(), "")
            .unwrap_err();
        assert!(matches!(err, LedgerError::PastDateTime(_)));

        let err = store
            .create(TENANT, OWNER, ContactId(404), clock.now() + Duration::hours(1), "")
            .unwrap_err();
        assert!(matches!(err, LedgerError::ContactNotFound(_)));
    }

    #[test]
    fn active_future_is_sorted_and_filtered() {
        let (store, clock, contact) = setup();
        let later = store
            .create(TENANT, OWNER, contact, clock.now() + Duration::days(2), "later")
            .unwrap();
        let sooner = store
            .create(TENANT, OWNER, contact, clock.now() + Duration::hours(2), "sooner")
            .unwrap();
        let cancelled = store
            .create(TENANT, OWNER, contact, clock.now() + Duration::hours(3), "")
            .unwrap();
        assert!(store.deactivate(TENANT, OWNER, cancelled).unwrap());

        let ids: Vec<_> = store
            .active_future(TENANT, OWNER)
            .unwrap()
            .into_iter()
            .map(|view| view.id)
            .collect();
        assert_eq!(ids, vec![sooner, later]);
        assert!(store.active_future(TENANT, OwnerId(31)).unwrap().is_empty());
    }

    #[test]
    fn deactivate_is_idempotent_and_owner_scoped() {
        let (store, clock, contact) = setup();
        let id = store
            .create(TENANT, OWNER, contact, clock.now() + Duration::hours(1), "")
            .unwrap();
        assert!(!store.deactivate(TENANT, OwnerId(31), id).unwrap());
        assert!(store.deactivate(TENANT, OWNER, id).unwrap());
        assert!(!store.deactivate(TENANT, OWNER, id).unwrap());
    }

    #[test]
    fn triage_splits_due_and_stale() {
        let (store, clock, contact) = setup();
        let window = Duration::minutes(5);
        let first = store
            .create(TENANT, OWNER, contact, clock.now() + Duration::minutes(1), "")
            .unwrap();
        let second = store
            .create(TENANT, OWNER, contact, clock.now() + Duration::minutes(2), "")
            .unwrap();
        clock.advance(Duration::minutes(7));
        // 6 and 5 minutes late: both at or past the window edge
        let triage = store.triage(TENANT, clock.now(), window).unwrap();
        assert!(triage.due.is_empty());
        assert_eq!(triage.stale, vec![first, second]);

        let fresh = store
            .create(TENANT, OWNER, contact, clock.now() + Duration::seconds(30), "")
            .unwrap();
        clock.advance(Duration::minutes(1));
        let triage = store.triage(TENANT, clock.now(), window).unwrap();
        assert_eq!(triage.due.len(), 1);
        assert_eq!(triage.due[0].reminder.id, fresh);
        assert_eq!(triage.due[0].contact_name, "Nadia");

        assert_eq!(store.retire(TENANT, &[first, second, fresh]).unwrap(), 3);
        assert_eq!(store.retire(TENANT, &[fresh]).unwrap(), 0);
    }
}
