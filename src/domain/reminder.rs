use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::common::{ContactId, Identifiable, Owned, OwnerId, ReminderId};

/// One-shot reminder about a contact's balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub id: ReminderId,
    pub owner_id: OwnerId,
    pub contact_id: ContactId,
    pub fire_at: DateTime<Utc>,
    #[serde(default)]
    pub note: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Where an active reminder sits relative to the scheduler's due window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderWindow {
    /// `fire_at` is still ahead of `now`.
    Pending,
    /// `now - window < fire_at <= now`: eligible to fire.
    Due,
    /// Older than the catch-up window; never fired late.
    Stale,
}

impl Reminder {
    pub fn classify(&self, now: DateTime<Utc>, window: Duration) -> ReminderWindow {
        if self.fire_at > now {
            ReminderWindow::Pending
        } else if self.fire_at > now - window {
            ReminderWindow::Due
        } else {
            ReminderWindow::Stale
        }
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.active && self.fire_at > now
    }
}

impl Identifiable for Reminder {
    type Id = ReminderId;

    fn id(&self) -> ReminderId {
        self.id
    }
}

impl Owned for Reminder {
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}
