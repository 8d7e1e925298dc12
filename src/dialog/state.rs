use chrono::{DateTime, NaiveDate, Utc};

use crate::domain::ContactId;
use crate::ports::FlowAction;

/// Where one (tenant, owner) conversation is inside a multi-turn flow. Each
/// variant carries only what its step has collected so far.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingContactName,
    AwaitingAmount {
        action: FlowAction,
        contact: ContactId,
    },
    AwaitingNote {
        action: FlowAction,
        contact: ContactId,
        amount: f64,
    },
    AwaitingReminderContact,
    AwaitingReminderDate {
        contact: ContactId,
    },
    AwaitingReminderTime {
        contact: ContactId,
        date: NaiveDate,
    },
    AwaitingReminderNote {
        contact: ContactId,
        fire_at: DateTime<Utc>,
    },
}

impl DialogState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DialogState::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DialogState::Idle => "idle",
            DialogState::AwaitingContactName => "awaiting_contact_name",
            DialogState::AwaitingAmount { .. } => "awaiting_amount",
            DialogState::AwaitingNote { .. } => "awaiting_note",
            DialogState::AwaitingReminderContact => "awaiting_reminder_contact",
            DialogState::AwaitingReminderDate { .. } => "awaiting_reminder_date",
            DialogState::AwaitingReminderTime { .. } => "awaiting_reminder_time",
            DialogState::AwaitingReminderNote { .. } => "awaiting_reminder_note",
        }
    }
}

/// Typed words that abandon a flow.
pub fn is_cancel_word(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "cancel" | "back")
}
