//! Rendering helpers: one [`Turn`] collects the outbound effects of a single
//! inbound event in the owner's language.

use chrono::{DateTime, FixedOffset, Utc};

use crate::{
    currency::format_amount,
    domain::{Contact, ContactId, OwnerId, TenantId, Transaction, TransactionKind},
    ledger::{Balance, BalanceDirection},
    ports::{
        balance_phrase, Button, ButtonLayout, Callback, DateShortcut, MenuAction, MessageArgs,
        MessageKey, OutboundMessage, RecipientId, Translator,
    },
};

use super::dates::TIME_SLOTS;

/// One effect produced by a transition, delivered after the state lock is
/// released.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Message {
        recipient: RecipientId,
        message: OutboundMessage,
    },
    Document {
        recipient: RecipientId,
        file_name: String,
        bytes: Vec<u8>,
    },
}

pub(crate) struct Turn<'a> {
    pub tenant: TenantId,
    pub owner: OwnerId,
    pub language: String,
    translator: &'a dyn Translator,
    offset: FixedOffset,
    out: Vec<Outbound>,
}

impl<'a> Turn<'a> {
    pub fn new(
        tenant: TenantId,
        owner: OwnerId,
        language: String,
        translator: &'a dyn Translator,
        offset: FixedOffset,
    ) -> Self {
        Self {
            tenant,
            owner,
            language,
            translator,
            offset,
            out: Vec::new(),
        }
    }

    pub fn into_outbound(self) -> Vec<Outbound> {
        self.out
    }

    pub fn text(&self, key: MessageKey, args: &MessageArgs) -> String {
        self.translator.translate(&self.language, key, args)
    }

    pub fn label(&self, key: MessageKey) -> String {
        self.text(key, &MessageArgs::new())
    }

    fn recipient(&self) -> RecipientId {
        RecipientId::from(self.tenant)
    }

    pub fn send(&mut self, text: String, layout: ButtonLayout) {
        let message = OutboundMessage::text(text).with_layout(layout);
        self.out.push(Outbound::Message {
            recipient: self.recipient(),
            message,
        });
    }

    pub fn say(&mut self, key: MessageKey, args: MessageArgs, layout: ButtonLayout) {
        let text = self.text(key, &args);
        self.send(text, layout);
    }

    pub fn document(&mut self, file_name: String, bytes: Vec<u8>) {
        self.out.push(Outbound::Document {
            recipient: self.recipient(),
            file_name,
            bytes,
        });
    }

    pub fn local_time(&self, instant: DateTime<Utc>) -> String {
        super::dates::format_local(instant, self.offset)
    }

    pub fn balance_line(&self, contact: &str, balance: &Balance) -> String {
        balance_phrase(self.translator, &self.language, contact, balance)
    }

    // Layouts

    pub fn back_button(&self) -> Button {
        Button::new(self.label(MessageKey::ButtonBack), Callback::BackToMenu)
    }

    pub fn cancel_button(&self) -> Button {
        Button::new(self.label(MessageKey::ButtonCancel), Callback::BackToMenu)
    }

    pub fn back_layout(&self) -> ButtonLayout {
        ButtonLayout::new().single(self.back_button())
    }

    pub fn cancel_layout(&self) -> ButtonLayout {
        ButtonLayout::new().single(self.cancel_button())
    }

    pub fn main_menu(&self) -> ButtonLayout {
        let entry = |key: MessageKey, action: MenuAction| {
            Button::new(self.label(key), Callback::Menu { action })
        };
        ButtonLayout::new()
            .row(vec![
                entry(MessageKey::ButtonLend, MenuAction::Lend),
                entry(MessageKey::ButtonBorrow, MenuAction::Borrow),
            ])
            .row(vec![
                entry(MessageKey::ButtonAddContact, MenuAction::AddContact),
                entry(MessageKey::ButtonBalances, MenuAction::Balances),
            ])
            .row(vec![
                entry(MessageKey::ButtonHistory, MenuAction::History),
                entry(MessageKey::ButtonClear, MenuAction::Clear),
            ])
            .row(vec![
                entry(MessageKey::ButtonSetReminder, MenuAction::SetReminder),
                entry(MessageKey::ButtonViewReminders, MenuAction::ViewReminders),
            ])
            .row(vec![
                entry(MessageKey::ButtonDeleteContact, MenuAction::DeleteContact),
                entry(MessageKey::ButtonLanguage, MenuAction::Language),
            ])
    }

    pub fn show_menu(&mut self) {
        let layout = self.main_menu();
        self.say(MessageKey::MainMenu, MessageArgs::new(), layout);
    }

    pub fn add_contact_layout(&self) -> ButtonLayout {
        ButtonLayout::new()
            .single(Button::new(
                self.label(MessageKey::ButtonAddContact),
                Callback::Menu {
                    action: MenuAction::AddContact,
                },
            ))
            .single(self.back_button())
    }

    /// One button per contact, labelled with the name and who owes whom.
    pub fn contact_picker(
        &self,
        contacts: &[(Contact, Balance)],
        callback: impl Fn(ContactId) -> Callback,
    ) -> ButtonLayout {
        contacts
            .iter()
            .fold(ButtonLayout::new(), |layout, (contact, balance)| {
                let status = self.short_status(balance);
                let label = self.text(
                    MessageKey::ContactOption,
                    &MessageArgs::new()
                        .with("name", &contact.name)
                        .with("status", status),
                );
                layout.single(Button::new(label, callback(contact.id)))
            })
            .single(self.back_button())
    }

    fn short_status(&self, balance: &Balance) -> String {
        let amount = format_amount(balance.magnitude(), &balance.currency);
        let key = match balance.direction() {
            BalanceDirection::TheyOwe => MessageKey::BalanceShortTheyOwe,
            BalanceDirection::YouOwe => MessageKey::BalanceShortYouOwe,
            BalanceDirection::Settled => return String::new(),
        };
        self.text(key, &MessageArgs::new().with("amount", amount))
    }

    pub fn note_layout(&self) -> ButtonLayout {
        ButtonLayout::new()
            .row(vec![
                Button::new(
                    self.label(MessageKey::ButtonSaveWithoutNote),
                    Callback::SaveWithoutNote,
                ),
                Button::new(self.label(MessageKey::ButtonAddNote), Callback::AddNote),
            ])
            .single(self.cancel_button())
    }

    pub fn date_layout(&self) -> ButtonLayout {
        let button = |shortcut: DateShortcut| {
            let key = match shortcut {
                DateShortcut::Today => MessageKey::ButtonToday,
                DateShortcut::Tomorrow => MessageKey::ButtonTomorrow,
                DateShortcut::ThisWeekend => MessageKey::ButtonThisWeekend,
                DateShortcut::NextMonday => MessageKey::ButtonNextMonday,
                DateShortcut::NextWeek => MessageKey::ButtonNextWeek,
            };
            Button::new(self.label(key), Callback::Date { shortcut })
        };
        let [today, tomorrow, weekend, monday, next_week] = DateShortcut::ALL;
        ButtonLayout::new()
            .row(vec![button(today), button(tomorrow)])
            .row(vec![button(weekend), button(monday)])
            .single(button(next_week))
            .single(self.cancel_button())
    }

    /// Time slot buttons; when `earliest_hour` is set, earlier slots are left
    /// out.
    pub fn time_layout(&self, earliest_hour: Option<u32>) -> ButtonLayout {
        let slots: Vec<Button> = TIME_SLOTS
            .iter()
            .filter(|hour| earliest_hour.map_or(true, |earliest| **hour >= earliest))
            .map(|hour| Button::new(format!("{:02}:00", hour), Callback::TimeSlot { hour: *hour }))
            .collect();
        slots
            .chunks(3)
            .fold(ButtonLayout::new(), |layout, row| layout.row(row.to_vec()))
            .single(self.cancel_button())
    }

    // Composite views

    pub fn history_lines(&self, history: &[Transaction], limit: usize) -> Vec<String> {
        history
            .iter()
            .take(limit)
            .map(|txn| {
                let key = match txn.kind {
                    TransactionKind::Lend => MessageKey::HistoryLent,
                    TransactionKind::Borrow => MessageKey::HistoryBorrowed,
                };
                let note = txn
                    .note
                    .as_deref()
                    .map(|note| format!(" - {}", note))
                    .unwrap_or_default();
                let date = txn.created_at.with_timezone(&self.offset).format("%m/%d");
                self.text(
                    key,
                    &MessageArgs::new()
                        .with("amount", format_amount(txn.amount, &txn.currency))
                        .with("note", note)
                        .with("date", date),
                )
            })
            .collect()
    }
}

/// Joins a header with body lines.
pub(crate) fn block(header: String, lines: impl IntoIterator<Item = String>) -> String {
    let mut text = header;
    for line in lines {
        text.push('\n');
        text.push_str(&line);
    }
    text
}
