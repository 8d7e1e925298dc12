use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};

use crate::{
    config::Config,
    core::Stores,
    currency::{format_amount, parse_amount, parse_currency, CurrencyCode},
    domain::{Contact, ContactId, OwnerId, TenantId, TransactionKind},
    errors::{LedgerError, Result},
    ports::{
        send_with_timeout, Button, ButtonLayout, Callback, Command, DeliveryError, EventKind,
        FlowAction, InboundEvent, MenuAction, MessageArgs, MessageKey, Ports, QuickEntry, Usage,
    },
};

use super::{
    dates::{self, local_today},
    state::{is_cancel_word, DialogState},
    views::{block, Outbound, Turn},
};

type ConversationKey = (TenantId, OwnerId);

/// Drives multi-turn flows on top of the stores.
///
/// [`DialogEngine::step`] computes a transition synchronously and returns the
/// replies; [`DialogEngine::handle`] additionally delivers them. The state map
/// is never locked across an await. Clones share the same state map.
#[derive(Clone)]
pub struct DialogEngine {
    stores: Stores,
    ports: Ports,
    config: Arc<Config>,
    states: Arc<Mutex<HashMap<ConversationKey, DialogState>>>,
}

impl DialogEngine {
    pub fn new(stores: Stores, ports: Ports, config: Arc<Config>) -> Self {
        Self {
            stores,
            ports,
            config,
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn state(&self, tenant: TenantId, owner: OwnerId) -> DialogState {
        match self.states.lock() {
            Ok(states) => states.get(&(tenant, owner)).cloned().unwrap_or_default(),
            Err(poisoned) => poisoned
                .into_inner()
                .get(&(tenant, owner))
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn take_state(&self, key: ConversationKey) -> DialogState {
        match self.states.lock() {
            Ok(mut states) => states.remove(&key).unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().remove(&key).unwrap_or_default(),
        }
    }

    fn put_state(&self, key: ConversationKey, state: DialogState) {
        let mut states = match self.states.lock() {
            Ok(states) => states,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.is_idle() {
            states.remove(&key);
        } else {
            states.insert(key, state);
        }
    }

    /// Applies one inbound event and returns what should be sent back.
    pub fn step(&self, event: &InboundEvent) -> Vec<Outbound> {
        let key = (event.tenant, event.owner);
        let language = self.stores.preferences.language(event.owner);
        let mut turn = Turn::new(
            event.tenant,
            event.owner,
            language,
            self.ports.translator.as_ref(),
            self.offset(),
        );

        let current = self.take_state(key);
        let from = current.name();
        let next = match self.transition(&mut turn, current, &event.kind) {
            Ok(next) => next,
            Err(err) => self.recover(&mut turn, err),
        };
        if from != next.name() {
            tracing::debug!(
                tenant = %event.tenant,
                owner = %event.owner,
                from,
                to = next.name(),
                "dialog transition"
            );
        }
        self.put_state(key, next);
        turn.into_outbound()
    }

    /// [`DialogEngine::step`] plus delivery. The step runs on the blocking
    /// pool since store writes hit the disk. Delivery failures are logged and
    /// dropped; returns how many effects were delivered.
    pub async fn handle(&self, event: InboundEvent) -> usize {
        let (tenant, owner) = (event.tenant, event.owner);
        let engine = self.clone();
        let outbound = match tokio::task::spawn_blocking(move || engine.step(&event)).await {
            Ok(outbound) => outbound,
            Err(err) => {
                tracing::error!(%tenant, %owner, error = %err, "dialog step aborted");
                return 0;
            }
        };

        let mut delivered = 0;
        for effect in outbound {
            match self.deliver(effect).await {
                Ok(()) => delivered += 1,
                Err(err) => tracing::warn!(%tenant, %owner, error = %err, "reply not delivered"),
            }
        }
        delivered
    }

    async fn deliver(&self, outbound: Outbound) -> std::result::Result<(), DeliveryError> {
        let notifier = self.ports.notifier.as_ref();
        match outbound {
            Outbound::Message { recipient, message } => {
                send_with_timeout(
                    notifier,
                    recipient,
                    message,
                    self.config.scheduler.delivery_timeout(),
                )
                .await
            }
            Outbound::Document {
                recipient,
                file_name,
                bytes,
            } => notifier.send_document(recipient, &file_name, bytes).await,
        }
    }

    fn offset(&self) -> FixedOffset {
        self.config.utc_offset()
    }

    fn now(&self) -> DateTime<Utc> {
        self.stores.clock().now()
    }

    fn transition(
        &self,
        turn: &mut Turn<'_>,
        state: DialogState,
        kind: &EventKind,
    ) -> Result<DialogState> {
        match kind {
            EventKind::Command(command) => {
                if !state.is_idle() {
                    tracing::debug!(abandoned = state.name(), "command interrupts flow");
                }
                self.on_command(turn, command)
            }
            EventKind::Callback(Callback::BackToMenu) => {
                if !state.is_idle() {
                    turn.say(MessageKey::Cancelled, MessageArgs::new(), ButtonLayout::new());
                }
                turn.show_menu();
                Ok(DialogState::Idle)
            }
            EventKind::Text(text) if !state.is_idle() && is_cancel_word(text) => {
                turn.say(MessageKey::Cancelled, MessageArgs::new(), ButtonLayout::new());
                turn.show_menu();
                Ok(DialogState::Idle)
            }
            EventKind::Text(text) => self.on_text(turn, state, text),
            EventKind::Callback(callback) => self.on_callback(turn, state, callback),
        }
    }

    /// Maps errors that escaped a transition to a reply; the flow always ends.
    fn recover(&self, turn: &mut Turn<'_>, err: LedgerError) -> DialogState {
        if err.is_validation() {
            tracing::debug!(
                tenant = %turn.tenant,
                owner = %turn.owner,
                error = %err,
                "input rejected"
            );
        }
        let layout = turn.back_layout();
        let key = match &err {
            LedgerError::ContactNotFound(query) => {
                let args = MessageArgs::new().with("query", query);
                turn.say(MessageKey::ContactNotFound, args, layout);
                return DialogState::Idle;
            }
            LedgerError::InvalidAmount(_) => MessageKey::InvalidAmount,
            LedgerError::PastDateTime(_) => MessageKey::PastDate,
            LedgerError::UnparsableDateTime(_) => MessageKey::UnparsableDate,
            LedgerError::InvalidInput(_) => MessageKey::GenericFailure,
            LedgerError::StoreUnavailable(_) | LedgerError::Config(_) => {
                tracing::error!(
                    tenant = %turn.tenant,
                    owner = %turn.owner,
                    error = %err,
                    "operation failed"
                );
                MessageKey::GenericFailure
            }
        };
        turn.say(key, MessageArgs::new(), layout);
        DialogState::Idle
    }

    // Free text

    fn on_text(&self, turn: &mut Turn<'_>, state: DialogState, text: &str) -> Result<DialogState> {
        match state {
            DialogState::Idle => {
                turn.show_menu();
                Ok(DialogState::Idle)
            }
            DialogState::AwaitingContactName => {
                if self.add_contact(turn, text, None)? {
                    Ok(DialogState::Idle)
                } else {
                    Ok(DialogState::AwaitingContactName)
                }
            }
            DialogState::AwaitingAmount { action, contact } => {
                match parse_amount(text).filter(|amount| *amount > 0.0) {
                    Some(amount) => {
                        let contact =
                            self.stores.contacts.require(turn.tenant, turn.owner, contact)?;
                        self.ask_note(turn, action, &contact, amount)?;
                        Ok(DialogState::AwaitingNote {
                            action,
                            contact: contact.id,
                            amount,
                        })
                    }
                    None => {
                        let layout = turn.cancel_layout();
                        turn.say(MessageKey::InvalidAmount, MessageArgs::new(), layout);
                        Ok(DialogState::AwaitingAmount { action, contact })
                    }
                }
            }
            DialogState::AwaitingNote {
                action,
                contact,
                amount,
            } => self.commit(turn, action, contact, amount, Some(text.to_string())),
            DialogState::AwaitingReminderContact => {
                let contact = self.stores.contacts.resolve(turn.tenant, turn.owner, text)?;
                self.ask_date(turn, &contact);
                Ok(DialogState::AwaitingReminderDate {
                    contact: contact.id,
                })
            }
            DialogState::AwaitingReminderDate { contact } => {
                let today = local_today(self.now(), self.offset());
                let parsed = dates::parse_date(text, today, self.offset());
                self.accept_date(turn, contact, parsed)
            }
            DialogState::AwaitingReminderTime { contact, date } => {
                self.accept_time(turn, contact, date, dates::parse_time(text))
            }
            DialogState::AwaitingReminderNote { contact, fire_at } => {
                self.save_reminder(turn, contact, fire_at, text)
            }
        }
    }

    // Buttons

    fn on_callback(
        &self,
        turn: &mut Turn<'_>,
        state: DialogState,
        callback: &Callback,
    ) -> Result<DialogState> {
        match (state, callback) {
            (
                DialogState::AwaitingNote {
                    action,
                    contact,
                    amount,
                },
                Callback::SaveWithoutNote,
            ) => self.commit(turn, action, contact, amount, None),
            (state @ DialogState::AwaitingNote { .. }, Callback::AddNote) => {
                let layout = turn.cancel_layout();
                turn.say(MessageKey::AskNoteText, MessageArgs::new(), layout);
                Ok(state)
            }
            (DialogState::AwaitingReminderDate { contact }, Callback::Date { shortcut }) => {
                let today = local_today(self.now(), self.offset());
                let date = dates::resolve_shortcut(*shortcut, today);
                self.accept_date(turn, contact, Ok(date))
            }
            (DialogState::AwaitingReminderTime { contact, date }, Callback::TimeSlot { hour }) => {
                self.accept_time(turn, contact, date, dates::slot_time(*hour))
            }
            (DialogState::AwaitingReminderNote { contact, fire_at }, Callback::SaveWithoutNote) => {
                self.save_reminder(turn, contact, fire_at, "")
            }
            (state, callback) => {
                if !state.is_idle() {
                    tracing::debug!(abandoned = state.name(), "button interrupts flow");
                }
                self.on_action(turn, callback)
            }
        }
    }

    /// Buttons that do not depend on the current step.
    fn on_action(&self, turn: &mut Turn<'_>, callback: &Callback) -> Result<DialogState> {
        let (tenant, owner) = (turn.tenant, turn.owner);
        match callback {
            Callback::BackToMenu => {
                turn.show_menu();
                Ok(DialogState::Idle)
            }
            Callback::Menu { action } => self.on_menu(turn, *action),
            Callback::PickContact { action, contact } => {
                let contact = self.stores.contacts.require(tenant, owner, *contact)?;
                self.ask_amount(turn, *action, &contact)?;
                Ok(DialogState::AwaitingAmount {
                    action: *action,
                    contact: contact.id,
                })
            }
            Callback::ShowHistory { contact } => {
                let contact = self.stores.contacts.require(tenant, owner, *contact)?;
                self.show_history(turn, &contact)?;
                Ok(DialogState::Idle)
            }
            Callback::ReminderContact { contact } => {
                let contact = self.stores.contacts.require(tenant, owner, *contact)?;
                self.ask_date(turn, &contact);
                Ok(DialogState::AwaitingReminderDate {
                    contact: contact.id,
                })
            }
            Callback::DeleteContact { contact } => {
                let contact = self.stores.contacts.require(tenant, owner, *contact)?;
                let layout = ButtonLayout::new()
                    .single(Button::new(
                        turn.label(MessageKey::ButtonConfirmDelete),
                        Callback::ConfirmDelete {
                            contact: contact.id,
                        },
                    ))
                    .single(turn.cancel_button());
                turn.say(
                    MessageKey::ConfirmDelete,
                    MessageArgs::new().with("contact", &contact.name),
                    layout,
                );
                Ok(DialogState::Idle)
            }
            Callback::ConfirmDelete { contact } => {
                let contact = self.stores.contacts.require(tenant, owner, *contact)?;
                self.stores.contacts.delete(tenant, owner, contact.id)?;
                let layout = turn.main_menu();
                turn.say(
                    MessageKey::ContactDeleted,
                    MessageArgs::new().with("contact", &contact.name),
                    layout,
                );
                Ok(DialogState::Idle)
            }
            Callback::CancelReminder { reminder } => {
                let key = if self.stores.reminders.deactivate(tenant, owner, *reminder)? {
                    MessageKey::ReminderCancelled
                } else {
                    MessageKey::ReminderAlreadyInactive
                };
                let layout = turn.back_layout();
                turn.say(key, MessageArgs::new(), layout);
                Ok(DialogState::Idle)
            }
            Callback::SetLanguage { code } => {
                self.stores.preferences.set_language(owner, code)?;
                turn.language = code.clone();
                let layout = turn.main_menu();
                turn.say(
                    MessageKey::LanguageSet,
                    MessageArgs::new().with("language", language_name(code)),
                    layout,
                );
                Ok(DialogState::Idle)
            }
            Callback::AddMissingContact { name } => {
                self.add_contact(turn, name, None)?;
                Ok(DialogState::Idle)
            }
            Callback::SaveWithoutNote
            | Callback::AddNote
            | Callback::Date { .. }
            | Callback::TimeSlot { .. } => {
                let layout = turn.main_menu();
                turn.say(MessageKey::StaleButton, MessageArgs::new(), layout);
                Ok(DialogState::Idle)
            }
        }
    }

    fn on_menu(&self, turn: &mut Turn<'_>, action: MenuAction) -> Result<DialogState> {
        match action {
            MenuAction::Lend => self.pick_for_amount(turn, FlowAction::Lend),
            MenuAction::Borrow => self.pick_for_amount(turn, FlowAction::Borrow),
            MenuAction::Clear => self.pick_for_amount(turn, FlowAction::Settle),
            MenuAction::AddContact => {
                let layout = turn.cancel_layout();
                turn.say(MessageKey::AskContactName, MessageArgs::new(), layout);
                Ok(DialogState::AwaitingContactName)
            }
            MenuAction::Balances => {
                self.show_balances(turn)?;
                Ok(DialogState::Idle)
            }
            MenuAction::History => {
                self.pick_contact(turn, MessageKey::ChooseHistoryContact, |contact| {
                    Callback::ShowHistory { contact }
                })?;
                Ok(DialogState::Idle)
            }
            MenuAction::SetReminder => {
                let offered = self.pick_contact(turn, MessageKey::ChooseReminderContact, |contact| {
                    Callback::ReminderContact { contact }
                })?;
                Ok(if offered {
                    DialogState::AwaitingReminderContact
                } else {
                    DialogState::Idle
                })
            }
            MenuAction::ViewReminders => {
                self.show_reminders(turn)?;
                Ok(DialogState::Idle)
            }
            MenuAction::DeleteContact => {
                self.pick_contact(turn, MessageKey::ChooseDeleteContact, |contact| {
                    Callback::DeleteContact { contact }
                })?;
                Ok(DialogState::Idle)
            }
            MenuAction::Language => {
                let layout = self
                    .stores
                    .preferences
                    .languages()
                    .iter()
                    .fold(ButtonLayout::new(), |layout, code| {
                        layout.single(Button::new(
                            language_name(code),
                            Callback::SetLanguage { code: code.clone() },
                        ))
                    })
                    .single(turn.back_button());
                turn.say(MessageKey::ChooseLanguage, MessageArgs::new(), layout);
                Ok(DialogState::Idle)
            }
        }
    }

    // Slash commands

    fn on_command(&self, turn: &mut Turn<'_>, command: &Command) -> Result<DialogState> {
        let (tenant, owner) = (turn.tenant, turn.owner);
        match command {
            Command::Start => {
                let layout = turn.main_menu();
                turn.say(MessageKey::Welcome, MessageArgs::new(), layout);
            }
            Command::Help => {
                let layout = turn.back_layout();
                turn.say(MessageKey::Help, MessageArgs::new(), layout);
            }
            Command::Cancel => {
                turn.say(MessageKey::Cancelled, MessageArgs::new(), ButtonLayout::new());
                turn.show_menu();
            }
            Command::Contacts => self.show_contacts(turn)?,
            Command::Remind => return self.on_menu(turn, MenuAction::SetReminder),
            Command::Reminders => self.show_reminders(turn)?,
            Command::AddContact { name, phone } => {
                self.add_contact(turn, name, phone.as_deref())?;
            }
            Command::Record { action, entry } => self.quick_record(turn, *action, entry)?,
            Command::Balance { contact } => {
                let contact = self.stores.contacts.resolve(tenant, owner, contact)?;
                let balance = self.stores.ledger.balance(tenant, owner, contact.id)?;
                let text = turn.balance_line(&contact.name, &balance);
                let layout = turn.back_layout();
                turn.send(text, layout);
            }
            Command::History { contact } => {
                let contact = self.stores.contacts.resolve(tenant, owner, contact)?;
                self.show_history(turn, &contact)?;
            }
            Command::Usage(usage) => {
                let key = match usage {
                    Usage::AddContact => MessageKey::UsageAddContact,
                    Usage::Record(FlowAction::Lend) => MessageKey::UsageLend,
                    Usage::Record(FlowAction::Borrow) => MessageKey::UsageBorrow,
                    Usage::Record(FlowAction::Settle) => MessageKey::UsageClear,
                    Usage::Balance => MessageKey::UsageBalance,
                    Usage::History => MessageKey::UsageHistory,
                };
                turn.say(key, MessageArgs::new(), ButtonLayout::new());
            }
            Command::Unknown(name) => {
                turn.say(
                    MessageKey::UnknownCommand,
                    MessageArgs::new().with("command", name),
                    ButtonLayout::new(),
                );
            }
        }
        Ok(DialogState::Idle)
    }

    /// `/lend`, `/borrow` and `/clear` in one message.
    fn quick_record(
        &self,
        turn: &mut Turn<'_>,
        action: FlowAction,
        entry: &QuickEntry,
    ) -> Result<()> {
        let (tenant, owner) = (turn.tenant, turn.owner);
        let contact = match self.stores.contacts.resolve(tenant, owner, &entry.contact) {
            Ok(contact) => contact,
            Err(LedgerError::ContactNotFound(_)) if action != FlowAction::Settle => {
                let layout = ButtonLayout::new()
                    .single(Button::new(
                        turn.text(
                            MessageKey::ButtonAddMissingContact,
                            &MessageArgs::new().with("name", &entry.contact),
                        ),
                        Callback::AddMissingContact {
                            name: entry.contact.clone(),
                        },
                    ))
                    .single(turn.back_button());
                turn.say(
                    MessageKey::OfferAddContact,
                    MessageArgs::new().with("name", &entry.contact),
                    layout,
                );
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let (currency, note) = split_tail(&entry.rest, &self.config.accepted_currencies);
        let currency = match currency {
            Some(currency) => currency,
            None => self.flow_currency(turn, action, contact.id)?,
        };
        let note = match (action, note) {
            (FlowAction::Settle, None) => Some(turn.label(MessageKey::DefaultSettleNote)),
            (_, note) => note,
        };
        self.record(turn, action, &contact, entry.amount, currency, note)
    }

    // Flow steps

    fn pick_for_amount(&self, turn: &mut Turn<'_>, action: FlowAction) -> Result<DialogState> {
        let prompt = match action {
            FlowAction::Lend => MessageKey::ChooseLendContact,
            FlowAction::Borrow => MessageKey::ChooseBorrowContact,
            FlowAction::Settle => MessageKey::ChooseSettleContact,
        };
        self.pick_contact(turn, prompt, |contact| Callback::PickContact { action, contact })?;
        Ok(DialogState::Idle)
    }

    /// Offers the owner's contacts as buttons. Returns `false` (after saying
    /// so) when there are none.
    fn pick_contact(
        &self,
        turn: &mut Turn<'_>,
        prompt: MessageKey,
        callback: impl Fn(ContactId) -> Callback,
    ) -> Result<bool> {
        let contacts = self.stores.ledger.balances(turn.tenant, turn.owner)?;
        if contacts.is_empty() {
            let layout = turn.add_contact_layout();
            turn.say(MessageKey::NoContacts, MessageArgs::new(), layout);
            return Ok(false);
        }
        let layout = turn.contact_picker(&contacts, callback);
        turn.say(prompt, MessageArgs::new(), layout);
        Ok(true)
    }

    fn ask_amount(&self, turn: &mut Turn<'_>, action: FlowAction, contact: &Contact) -> Result<()> {
        let balance = self.stores.ledger.balance(turn.tenant, turn.owner, contact.id)?;
        let key = match action {
            FlowAction::Lend => MessageKey::AskLendAmount,
            FlowAction::Borrow => MessageKey::AskBorrowAmount,
            FlowAction::Settle => MessageKey::AskSettleAmount,
        };
        let args = MessageArgs::new()
            .with("contact", &contact.name)
            .with("balance", turn.balance_line(&contact.name, &balance));
        let layout = turn.cancel_layout();
        turn.say(key, args, layout);
        Ok(())
    }

    fn ask_note(
        &self,
        turn: &mut Turn<'_>,
        action: FlowAction,
        contact: &Contact,
        amount: f64,
    ) -> Result<()> {
        let currency = self.flow_currency(turn, action, contact.id)?;
        let args = MessageArgs::new()
            .with("contact", &contact.name)
            .with("amount", format_amount(amount, &currency));
        let layout = turn.note_layout();
        turn.say(MessageKey::AskNote, args, layout);
        Ok(())
    }

    /// Settling is recorded in the balance's own currency, new debts in the
    /// configured default.
    fn flow_currency(
        &self,
        turn: &Turn<'_>,
        action: FlowAction,
        contact: ContactId,
    ) -> Result<CurrencyCode> {
        match action {
            FlowAction::Settle => Ok(self
                .stores
                .ledger
                .balance(turn.tenant, turn.owner, contact)?
                .currency),
            FlowAction::Lend | FlowAction::Borrow => Ok(self.config.default_currency.clone()),
        }
    }

    /// Terminal step of the amount flow: exactly one store mutation.
    fn commit(
        &self,
        turn: &mut Turn<'_>,
        action: FlowAction,
        contact: ContactId,
        amount: f64,
        note: Option<String>,
    ) -> Result<DialogState> {
        let contact = self.stores.contacts.require(turn.tenant, turn.owner, contact)?;
        let currency = self.flow_currency(turn, action, contact.id)?;
        self.record(turn, action, &contact, amount, currency, note)?;
        Ok(DialogState::Idle)
    }

    fn record(
        &self,
        turn: &mut Turn<'_>,
        action: FlowAction,
        contact: &Contact,
        amount: f64,
        currency: CurrencyCode,
        note: Option<String>,
    ) -> Result<()> {
        let (tenant, owner) = (turn.tenant, turn.owner);
        let ledger = &self.stores.ledger;
        let balance = match action {
            FlowAction::Lend | FlowAction::Borrow => {
                let kind = if action == FlowAction::Lend {
                    TransactionKind::Lend
                } else {
                    TransactionKind::Borrow
                };
                let currency = currency.clone();
                ledger.append(tenant, owner, contact.id, amount, currency, kind, note.clone())?;
                ledger.balance(tenant, owner, contact.id)?
            }
            FlowAction::Settle => {
                ledger
                    .settle(tenant, owner, contact.id, amount, currency.clone(), note.clone())?
                    .1
            }
        };

        let key = match action {
            FlowAction::Lend => MessageKey::Lent,
            FlowAction::Borrow => MessageKey::Borrowed,
            FlowAction::Settle => MessageKey::Settled,
        };
        let note = note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty())
            .map(|note| format!(" ({})", note))
            .unwrap_or_default();
        let args = MessageArgs::new()
            .with("contact", &contact.name)
            .with("amount", format_amount(amount, &currency))
            .with("note", note)
            .with("balance", turn.balance_line(&contact.name, &balance));
        let layout = turn.back_layout();
        turn.say(key, args, layout);
        Ok(())
    }

    fn ask_date(&self, turn: &mut Turn<'_>, contact: &Contact) {
        let layout = turn.date_layout();
        turn.say(
            MessageKey::AskReminderDate,
            MessageArgs::new().with("contact", &contact.name),
            layout,
        );
    }

    fn ask_time(&self, turn: &mut Turn<'_>, date: NaiveDate) {
        let local_now = self.now().with_timezone(&self.offset());
        let earliest = (date == local_now.date_naive()).then(|| local_now.hour() + 1);
        let layout = turn.time_layout(earliest);
        turn.say(
            MessageKey::AskReminderTime,
            MessageArgs::new().with("date", date.format("%Y-%m-%d")),
            layout,
        );
    }

    fn accept_date(
        &self,
        turn: &mut Turn<'_>,
        contact: ContactId,
        parsed: Result<NaiveDate>,
    ) -> Result<DialogState> {
        let key = match parsed {
            Ok(date) => {
                self.ask_time(turn, date);
                return Ok(DialogState::AwaitingReminderTime { contact, date });
            }
            Err(LedgerError::UnparsableDateTime(_)) => MessageKey::UnparsableDate,
            Err(LedgerError::PastDateTime(_)) => MessageKey::PastDate,
            Err(err) => return Err(err),
        };
        let layout = turn.date_layout();
        turn.say(key, MessageArgs::new(), layout);
        Ok(DialogState::AwaitingReminderDate { contact })
    }

    fn accept_time(
        &self,
        turn: &mut Turn<'_>,
        contact: ContactId,
        date: NaiveDate,
        parsed: Result<NaiveTime>,
    ) -> Result<DialogState> {
        let fire_at = parsed
            .and_then(|time| dates::combine(date, time, self.offset()))
            .and_then(|instant| dates::ensure_future(instant, self.now()));
        let key = match fire_at {
            Ok(fire_at) => {
                let layout = ButtonLayout::new()
                    .single(Button::new(
                        turn.label(MessageKey::ButtonSaveWithoutNote),
                        Callback::SaveWithoutNote,
                    ))
                    .single(turn.cancel_button());
                turn.say(
                    MessageKey::AskReminderNote,
                    MessageArgs::new().with("when", turn.local_time(fire_at)),
                    layout,
                );
                return Ok(DialogState::AwaitingReminderNote { contact, fire_at });
            }
            Err(LedgerError::UnparsableDateTime(_)) => MessageKey::UnparsableTime,
            Err(LedgerError::PastDateTime(_)) => MessageKey::PastTime,
            Err(err) => return Err(err),
        };
        turn.say(key, MessageArgs::new(), ButtonLayout::new());
        self.ask_time(turn, date);
        Ok(DialogState::AwaitingReminderTime { contact, date })
    }

    /// Terminal step of the reminder flow.
    fn save_reminder(
        &self,
        turn: &mut Turn<'_>,
        contact: ContactId,
        fire_at: DateTime<Utc>,
        note: &str,
    ) -> Result<DialogState> {
        let contact = self.stores.contacts.require(turn.tenant, turn.owner, contact)?;
        match self
            .stores
            .reminders
            .create(turn.tenant, turn.owner, contact.id, fire_at, note)
        {
            Ok(_) => {
                let layout = turn.back_layout();
                turn.say(
                    MessageKey::ReminderSaved,
                    MessageArgs::new()
                        .with("contact", &contact.name)
                        .with("when", turn.local_time(fire_at)),
                    layout,
                );
                Ok(DialogState::Idle)
            }
            // the chosen time passed while the note was being typed
            Err(LedgerError::PastDateTime(_)) => {
                let date = fire_at.with_timezone(&self.offset()).date_naive();
                turn.say(MessageKey::PastTime, MessageArgs::new(), ButtonLayout::new());
                self.ask_time(turn, date);
                Ok(DialogState::AwaitingReminderTime {
                    contact: contact.id,
                    date,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Returns whether the contact was added; a too-short name is answered
    /// with a hint instead.
    fn add_contact(&self, turn: &mut Turn<'_>, name: &str, phone: Option<&str>) -> Result<bool> {
        let name = name.trim();
        let min = self.config.min_contact_name_len;
        if name.chars().count() < min {
            let layout = turn.cancel_layout();
            turn.say(
                MessageKey::ContactNameTooShort,
                MessageArgs::new().with("min", min),
                layout,
            );
            return Ok(false);
        }
        self.stores.contacts.create(turn.tenant, turn.owner, name, phone)?;
        let layout = turn.back_layout();
        turn.say(
            MessageKey::ContactAdded,
            MessageArgs::new().with("name", name),
            layout,
        );
        Ok(true)
    }

    // Read-only views

    fn show_contacts(&self, turn: &mut Turn<'_>) -> Result<()> {
        let contacts = self.stores.contacts.list(turn.tenant, turn.owner)?;
        if contacts.is_empty() {
            let layout = turn.add_contact_layout();
            turn.say(MessageKey::NoContacts, MessageArgs::new(), layout);
            return Ok(());
        }
        let lines: Vec<String> = contacts
            .iter()
            .map(|contact| {
                let phone = contact
                    .phone
                    .as_deref()
                    .map(|phone| format!(" ({})", phone))
                    .unwrap_or_default();
                turn.text(
                    MessageKey::ContactLine,
                    &MessageArgs::new()
                        .with("name", &contact.name)
                        .with("phone", phone),
                )
            })
            .collect();
        let text = block(turn.label(MessageKey::ContactsHeader), lines);
        let layout = turn.back_layout();
        turn.send(text, layout);
        Ok(())
    }

    fn show_balances(&self, turn: &mut Turn<'_>) -> Result<()> {
        let balances = self.stores.ledger.balances(turn.tenant, turn.owner)?;
        if balances.is_empty() {
            let layout = turn.add_contact_layout();
            turn.say(MessageKey::NoContacts, MessageArgs::new(), layout);
            return Ok(());
        }
        let lines: Vec<String> = balances
            .iter()
            .map(|(contact, balance)| turn.balance_line(&contact.name, balance))
            .collect();
        let text = block(turn.label(MessageKey::BalancesHeader), lines);
        let layout = turn.back_layout();
        turn.send(text, layout);
        Ok(())
    }

    fn show_history(&self, turn: &mut Turn<'_>, contact: &Contact) -> Result<()> {
        let (tenant, owner) = (turn.tenant, turn.owner);
        let history = self.stores.ledger.history(tenant, owner, contact.id)?;
        let layout = turn.back_layout();
        if history.is_empty() {
            turn.say(
                MessageKey::HistoryEmpty,
                MessageArgs::new().with("contact", &contact.name),
                layout,
            );
            return Ok(());
        }

        let balance = self.stores.ledger.balance(tenant, owner, contact.id)?;
        let header = turn.text(
            MessageKey::HistoryHeader,
            &MessageArgs::new().with("contact", &contact.name),
        );
        let mut lines = turn.history_lines(&history, self.config.history_limit);
        lines.push(String::new());
        lines.push(turn.text(
            MessageKey::HistoryCurrentBalance,
            &MessageArgs::new().with("balance", turn.balance_line(&contact.name, &balance)),
        ));
        turn.send(block(header, lines), layout);

        let reports = self.ports.reports.as_ref();
        if let Some(bytes) = reports.render_history(owner, contact, &history) {
            turn.document(reports.file_name(contact), bytes);
        }
        Ok(())
    }

    fn show_reminders(&self, turn: &mut Turn<'_>) -> Result<()> {
        let reminders = self.stores.reminders.active_future(turn.tenant, turn.owner)?;
        if reminders.is_empty() {
            let layout = turn.back_layout();
            turn.say(MessageKey::NoReminders, MessageArgs::new(), layout);
            return Ok(());
        }
        let mut layout = ButtonLayout::new();
        let mut lines = Vec::with_capacity(reminders.len());
        for reminder in &reminders {
            let when = turn.local_time(reminder.fire_at);
            let note = if reminder.note.is_empty() {
                String::new()
            } else {
                format!(" - {}", reminder.note)
            };
            lines.push(turn.text(
                MessageKey::ReminderLine,
                &MessageArgs::new()
                    .with("contact", &reminder.contact_name)
                    .with("when", &when)
                    .with("note", note),
            ));
            layout = layout.single(Button::new(
                turn.text(
                    MessageKey::ButtonCancelReminder,
                    &MessageArgs::new()
                        .with("contact", &reminder.contact_name)
                        .with("when", &when),
                ),
                Callback::CancelReminder {
                    reminder: reminder.id,
                },
            ));
        }
        let layout = layout.single(turn.back_button());
        let text = block(turn.label(MessageKey::RemindersHeader), lines);
        turn.send(text, layout);
        Ok(())
    }
}

/// Splits quick-entry tokens after the amount into an optional currency and
/// the note. Only the first token can be a currency.
fn split_tail(
    rest: &[String],
    accepted: &[CurrencyCode],
) -> (Option<CurrencyCode>, Option<String>) {
    let (currency, note_tokens) = match rest.split_first() {
        Some((first, tail)) => match parse_currency(first, accepted) {
            Some(currency) => (Some(currency), tail),
            None => (None, rest),
        },
        None => (None, rest),
    };
    let note = note_tokens.join(" ");
    (currency, (!note.trim().is_empty()).then(|| note.trim().to_string()))
}

fn language_name(code: &str) -> String {
    match code {
        "en" => "English".to_string(),
        "fr" => "Français".to_string(),
        "ar" => "العربية".to_string(),
        other => other.to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes() -> Vec<CurrencyCode> {
        ["DZD", "USD", "EUR"].into_iter().map(CurrencyCode::new).collect()
    }

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn tail_with_currency_alias_and_note() {
        let rest = tokens(&["da", "rent", "money"]);
        let (currency, note) = split_tail(&rest, &codes());
        assert_eq!(currency, Some(CurrencyCode::new("DZD")));
        assert_eq!(note.as_deref(), Some("rent money"));
    }

    #[test]
    fn tail_without_currency_is_all_note() {
        let rest = tokens(&["lunch"]);
        let (currency, note) = split_tail(&rest, &codes());
        assert_eq!(currency, None);
        assert_eq!(note.as_deref(), Some("lunch"));

        let (currency, note) = split_tail(&[], &codes());
        assert_eq!((currency, note), (None, None));
    }

    #[test]
    fn unknown_language_codes_are_upper_cased() {
        assert_eq!(language_name("fr"), "Français");
        assert_eq!(language_name("kab"), "KAB");
    }
}
