//! Inbound side of the chat platform: events, typed callbacks and slash
//! commands, decoded once at the transport boundary.

use serde::{Deserialize, Serialize};

use crate::currency::parse_amount;
use crate::domain::{ContactId, OwnerId, ReminderId, TenantId};

#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub tenant: TenantId,
    pub owner: OwnerId,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn new(tenant: TenantId, owner: OwnerId, kind: EventKind) -> Self {
        Self {
            tenant,
            owner,
            kind,
        }
    }

    pub fn text(tenant: TenantId, owner: OwnerId, text: impl Into<String>) -> Self {
        Self::new(tenant, owner, EventKind::Text(text.into()))
    }

    pub fn callback(tenant: TenantId, owner: OwnerId, callback: Callback) -> Self {
        Self::new(tenant, owner, EventKind::Callback(callback))
    }

    pub fn command(tenant: TenantId, owner: OwnerId, command: Command) -> Self {
        Self::new(tenant, owner, EventKind::Command(command))
    }

    /// Decodes a typed line: slash commands become [`EventKind::Command`],
    /// everything else is plain text.
    pub fn from_line(tenant: TenantId, owner: OwnerId, line: &str) -> Self {
        match Command::parse(line) {
            Some(command) => Self::command(tenant, owner, command),
            None => Self::text(tenant, owner, line.trim()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Command(Command),
    Callback(Callback),
    Text(String),
}

/// Entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuAction {
    Lend,
    Borrow,
    AddContact,
    Balances,
    History,
    Clear,
    SetReminder,
    ViewReminders,
    DeleteContact,
    Language,
}

/// What an amount collected by the dialog will be recorded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    Lend,
    Borrow,
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateShortcut {
    Today,
    Tomorrow,
    ThisWeekend,
    NextMonday,
    NextWeek,
}

impl DateShortcut {
    pub const ALL: [DateShortcut; 5] = [
        DateShortcut::Today,
        DateShortcut::Tomorrow,
        DateShortcut::ThisWeekend,
        DateShortcut::NextMonday,
        DateShortcut::NextWeek,
    ];
}

/// Button payloads. Serializable so transports with string callback data can
/// round-trip them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cb", rename_all = "snake_case")]
pub enum Callback {
    BackToMenu,
    Menu { action: MenuAction },
    PickContact { action: FlowAction, contact: ContactId },
    ShowHistory { contact: ContactId },
    ReminderContact { contact: ContactId },
    DeleteContact { contact: ContactId },
    ConfirmDelete { contact: ContactId },
    CancelReminder { reminder: ReminderId },
    SetLanguage { code: String },
    AddMissingContact { name: String },
    SaveWithoutNote,
    AddNote,
    Date { shortcut: DateShortcut },
    TimeSlot { hour: u32 },
}

/// Quick-entry arguments of `/lend`, `/borrow` and `/clear`. Tokens after the
/// amount are split into currency and note by the dialog engine, which knows
/// the accepted currencies.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickEntry {
    pub contact: String,
    pub amount: f64,
    pub rest: Vec<String>,
}

/// Commands whose arguments were missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    AddContact,
    Record(FlowAction),
    Balance,
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Help,
    Cancel,
    Contacts,
    Remind,
    Reminders,
    AddContact { name: String, phone: Option<String> },
    Record { action: FlowAction, entry: QuickEntry },
    Balance { contact: String },
    History { contact: String },
    Usage(Usage),
    Unknown(String),
}

impl Command {
    /// Parses a slash command. Returns `None` when `line` is not a command.
    ///
    /// Arguments are split shell-style, so multi-word contact names can be
    /// quoted: `/lend "Amine Khoudor" 500`.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        let body = line.strip_prefix('/')?;
        let mut args = split_args(body);
        if args.is_empty() {
            return Some(Command::Unknown(String::new()));
        }
        let head = args.remove(0);
        // "/lend@markily_bot" in group chats
        let name = head.split('@').next().unwrap_or_default().to_lowercase();

        let command = match name.as_str() {
            "start" | "menu" => Command::Start,
            "help" => Command::Help,
            "cancel" => Command::Cancel,
            "contacts" => Command::Contacts,
            "remind" => Command::Remind,
            "reminders" => Command::Reminders,
            "addcontact" => parse_add_contact(args),
            "lend" => parse_record(FlowAction::Lend, args),
            "borrow" => parse_record(FlowAction::Borrow, args),
            "clear" => parse_record(FlowAction::Settle, args),
            "balance" => match joined(&args) {
                Some(contact) => Command::Balance { contact },
                None => Command::Usage(Usage::Balance),
            },
            "history" => match joined(&args) {
                Some(contact) => Command::History { contact },
                None => Command::Usage(Usage::History),
            },
            _ => Command::Unknown(name),
        };
        Some(command)
    }
}

fn split_args(body: &str) -> Vec<String> {
    shell_words::split(body)
        .unwrap_or_else(|_| body.split_whitespace().map(str::to_string).collect())
}

fn joined(args: &[String]) -> Option<String> {
    let text = args.join(" ").trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn parse_add_contact(mut args: Vec<String>) -> Command {
    let phone = match args.last() {
        Some(last) if looks_like_phone(last) => args.pop(),
        _ => None,
    };
    match joined(&args) {
        Some(name) => Command::AddContact { name, phone },
        None => Command::Usage(Usage::AddContact),
    }
}

fn looks_like_phone(token: &str) -> bool {
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 6
        && (token.starts_with('+') || token.chars().all(|c| c.is_ascii_digit() || c == '-'))
}

fn parse_record(action: FlowAction, args: Vec<String>) -> Command {
    let mut iter = args.into_iter();
    let (Some(contact), Some(amount)) = (iter.next(), iter.next()) else {
        return Command::Usage(Usage::Record(action));
    };
    match parse_amount(&amount) {
        Some(amount) => Command::Record {
            action,
            entry: QuickEntry {
                contact,
                amount,
                rest: iter.collect(),
            },
        },
        None => Command::Usage(Usage::Record(action)),
    }
}
