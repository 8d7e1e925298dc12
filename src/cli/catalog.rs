//! English string table for the console transport.

use crate::ports::{MessageArgs, MessageKey, Translator};

/// Every [`MessageKey`] rendered in English. Other languages fall back to
/// the English text until tables for them are added.
#[derive(Debug, Default, Clone, Copy)]
pub struct Catalog;

impl Catalog {
    fn template(key: MessageKey) -> &'static str {
        use MessageKey::*;
        match key {
            Welcome => "Welcome to Markily! Keep track of who owes whom.\nPick an action below or type /help.",
            Help => concat!(
                "Commands:\n",
                "/start - main menu\n",
                "/addcontact <name> [phone]\n",
                "/lend <contact> <amount> [currency] [note]\n",
                "/borrow <contact> <amount> [currency] [note]\n",
                "/clear <contact> <amount> [currency] [note]\n",
                "/balance <contact>\n",
                "/history <contact>\n",
                "/contacts\n",
                "/remind - schedule a reminder\n",
                "/reminders - upcoming reminders\n",
                "/cancel - abandon the current step"
            ),
            MainMenu => "What would you like to do?",
            Cancelled => "Cancelled.",
            GenericFailure => "Something went wrong. Please try again in a moment.",
            StaleButton => "That button belongs to a finished conversation.",
            UnknownCommand => "Unknown command /{command}. Type /help for the list.",

            AskContactName => "Send the new contact's name.",
            ContactNameTooShort => "A name needs at least {min} characters. Try again.",
            ContactAdded => "Contact {name} added.",
            ContactsHeader => "Your contacts:",
            ContactLine => "- {name}{phone}",
            NoContacts => "You have no contacts yet.",
            ContactNotFound => "No contact matches \"{query}\".",
            OfferAddContact => "No contact matches \"{name}\". Add it?",

            ChooseLendContact => "Who did you lend to?",
            ChooseBorrowContact => "Who did you borrow from?",
            ChooseSettleContact => "Whose balance are you clearing?",
            ChooseHistoryContact => "Whose history?",
            ChooseReminderContact => "Remind you about whom? Pick a contact or type a name.",
            ChooseDeleteContact => "Which contact should be deleted?",
            ContactOption => "{name}{status}",

            AskLendAmount => "{balance}\nHow much did you lend to {contact}?",
            AskBorrowAmount => "{balance}\nHow much did you borrow from {contact}?",
            AskSettleAmount => "{balance}\nHow much was paid?",
            InvalidAmount => "Please send a positive number, for example 1500.",
            AskNote => "{amount} with {contact}. Add a note?",
            AskNoteText => "Send the note.",

            Lent => "Recorded: you lent {amount} to {contact}{note}.\n{balance}",
            Borrowed => "Recorded: you borrowed {amount} from {contact}{note}.\n{balance}",
            Settled => "Recorded a payment of {amount} with {contact}{note}.\n{balance}",
            DefaultSettleNote => "settlement",

            BalanceTheyOwe => "{contact} owes you {amount}",
            BalanceYouOwe => "You owe {contact} {amount}",
            BalanceSettled => "You and {contact} are settled",
            BalanceShortTheyOwe => " (owes {amount})",
            BalanceShortYouOwe => " (you owe {amount})",
            BalancesHeader => "Balances:",

            HistoryHeader => "History with {contact}:",
            HistoryLent => "{date} lent {amount}{note}",
            HistoryBorrowed => "{date} borrowed {amount}{note}",
            HistoryEmpty => "No transactions with {contact} yet.",
            HistoryCurrentBalance => "Now: {balance}",

            AskReminderDate => "When should I remind you about {contact}? Pick a day or type one (e.g. friday, 25/12).",
            AskReminderTime => "At what time on {date}? Pick a slot or type one (e.g. 14:30, 2pm).",
            AskReminderNote => "Reminder set for {when}. Send a note or save without one.",
            UnparsableDate => "I could not read that date. Try \"tomorrow\", \"friday\" or \"25/12\".",
            PastDate => "That date is in the past. Pick a later one.",
            UnparsableTime => "I could not read that time. Try \"14:30\" or \"2pm\".",
            PastTime => "That time has already passed. Pick a later one.",
            ReminderSaved => "Reminder saved: {contact} on {when}.",
            RemindersHeader => "Upcoming reminders:",
            ReminderLine => "- {when} {contact}{note}",
            NoReminders => "No upcoming reminders.",
            ReminderCancelled => "Reminder cancelled.",
            ReminderAlreadyInactive => "That reminder is no longer active.",
            ReminderNotification => "Reminder about {contact}: {balance}.\n{note}",

            ConfirmDelete => "Delete {contact} with all transactions and reminders?",
            ContactDeleted => "{contact} deleted.",
            ChooseLanguage => "Choose a language:",
            LanguageSet => "Language set to {language}.",

            UsageAddContact => "Usage: /addcontact <name> [phone]",
            UsageLend => "Usage: /lend <contact> <amount> [currency] [note]",
            UsageBorrow => "Usage: /borrow <contact> <amount> [currency] [note]",
            UsageClear => "Usage: /clear <contact> <amount> [currency] [note]",
            UsageBalance => "Usage: /balance <contact>",
            UsageHistory => "Usage: /history <contact>",

            ButtonLend => "Lend",
            ButtonBorrow => "Borrow",
            ButtonAddContact => "Add contact",
            ButtonBalances => "Balances",
            ButtonHistory => "History",
            ButtonClear => "Clear",
            ButtonSetReminder => "Set reminder",
            ButtonViewReminders => "Reminders",
            ButtonDeleteContact => "Delete contact",
            ButtonLanguage => "Language",
            ButtonBack => "Back to menu",
            ButtonCancel => "Cancel",
            ButtonSaveWithoutNote => "Save without note",
            ButtonAddNote => "Add note",
            ButtonToday => "Today",
            ButtonTomorrow => "Tomorrow",
            ButtonThisWeekend => "This weekend",
            ButtonNextMonday => "Next Monday",
            ButtonNextWeek => "Next week",
            ButtonConfirmDelete => "Yes, delete",
            ButtonCancelReminder => "Cancel {when} {contact}",
            ButtonAddMissingContact => "Add {name}",
        }
    }
}

impl Translator for Catalog {
    fn translate(&self, language: &str, key: MessageKey, args: &MessageArgs) -> String {
        if language != "en" {
            tracing::trace!(language, ?key, "no table, using English");
        }
        args.fill(Self::template(key)).trim_end().to_string()
    }
}
