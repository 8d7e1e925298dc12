use colored::Colorize;
use std::fmt;

/// Message categories printed by the console transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// Bot reply in the active conversation.
    Reply,
    /// Pushed to a user outside any conversation, e.g. a fired reminder.
    Notification,
    /// A numbered row of buttons.
    Buttons,
    Info,
    Error,
}

fn label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Notification => "[reminder]",
        MessageKind::Info => "[i]",
        MessageKind::Error => "[x]",
        MessageKind::Reply | MessageKind::Buttons => "",
    }
}

/// Text for `kind`, prefixed and coloured. Colour is dropped when
/// [`colored::control`] says so, e.g. when stdout is not a terminal.
pub fn style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    let prefix = label(kind);
    let formatted = if prefix.is_empty() {
        text
    } else {
        format!("{prefix} {text}")
    };

    match kind {
        MessageKind::Reply => formatted,
        MessageKind::Notification => formatted.bright_yellow().bold().to_string(),
        MessageKind::Buttons => formatted.bright_cyan().to_string(),
        MessageKind::Info => formatted.dimmed().to_string(),
        MessageKind::Error => formatted.bright_red().to_string(),
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    println!("{}", style(kind, message));
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn error(message: impl fmt::Display) {
    eprintln!("{}", style(MessageKind::Error, message));
}
