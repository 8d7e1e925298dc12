//! Localization seam. The core decides *what* to say through [`MessageKey`]
//! and named arguments; string tables live with the transport.

use crate::currency::format_amount;
use crate::ledger::{Balance, BalanceDirection};

/// Every user-facing message and button label the core produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Welcome,
    Help,
    MainMenu,
    Cancelled,
    GenericFailure,
    StaleButton,
    UnknownCommand,

    AskContactName,
    ContactNameTooShort,
    ContactAdded,
    ContactsHeader,
    ContactLine,
    NoContacts,
    ContactNotFound,
    OfferAddContact,

    ChooseLendContact,
    ChooseBorrowContact,
    ChooseSettleContact,
    ChooseHistoryContact,
    ChooseReminderContact,
    ChooseDeleteContact,
    ContactOption,

    AskLendAmount,
    AskBorrowAmount,
    AskSettleAmount,
    InvalidAmount,
    AskNote,
    AskNoteText,
    Lent,
    Borrowed,
    Settled,
    DefaultSettleNote,

    BalanceTheyOwe,
    BalanceYouOwe,
    BalanceSettled,
    BalanceShortTheyOwe,
    BalanceShortYouOwe,
    BalancesHeader,

    HistoryHeader,
    HistoryLent,
    HistoryBorrowed,
    HistoryEmpty,
    HistoryCurrentBalance,

    AskReminderDate,
    AskReminderTime,
    AskReminderNote,
    UnparsableDate,
    PastDate,
    UnparsableTime,
    PastTime,
    ReminderSaved,
    RemindersHeader,
    ReminderLine,
    NoReminders,
    ReminderCancelled,
    ReminderAlreadyInactive,
    ReminderNotification,

    ConfirmDelete,
    ContactDeleted,
    ChooseLanguage,
    LanguageSet,

    UsageAddContact,
    UsageLend,
    UsageBorrow,
    UsageClear,
    UsageBalance,
    UsageHistory,

    ButtonLend,
    ButtonBorrow,
    ButtonAddContact,
    ButtonBalances,
    ButtonHistory,
    ButtonClear,
    ButtonSetReminder,
    ButtonViewReminders,
    ButtonDeleteContact,
    ButtonLanguage,
    ButtonBack,
    ButtonCancel,
    ButtonSaveWithoutNote,
    ButtonAddNote,
    ButtonToday,
    ButtonTomorrow,
    ButtonThisWeekend,
    ButtonNextMonday,
    ButtonNextWeek,
    ButtonConfirmDelete,
    ButtonCancelReminder,
    ButtonAddMissingContact,
}

/// Named, pre-formatted arguments for one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageArgs {
    pairs: Vec<(&'static str, String)>,
}

impl MessageArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: impl ToString) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &'static str, value: impl ToString) {
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces `{name}` placeholders in `template` in a single pass, so
    /// braces inside substituted values stay literal. Unknown placeholders
    /// are kept as written.
    pub fn fill(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = tail
                .find('}')
                .and_then(|close| self.get(&tail[1..close]).map(|value| (close, value)));
            match value {
                Some((close, value)) => {
                    out.push_str(value);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

pub trait Translator: Send + Sync {
    fn translate(&self, language: &str, key: MessageKey, args: &MessageArgs) -> String;
}

/// "Sara owes you 600 DZD" style sentence for a balance.
pub fn balance_phrase(
    translator: &dyn Translator,
    language: &str,
    contact: &str,
    balance: &Balance,
) -> String {
    let key = match balance.direction() {
        BalanceDirection::TheyOwe => MessageKey::BalanceTheyOwe,
        BalanceDirection::YouOwe => MessageKey::BalanceYouOwe,
        BalanceDirection::Settled => MessageKey::BalanceSettled,
    };
    let args = MessageArgs::new()
        .with("contact", contact)
        .with("amount", format_amount(balance.magnitude(), &balance.currency));
    translator.translate(language, key, &args)
}
