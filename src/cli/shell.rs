use std::io::{self, BufRead, IsTerminal};

use rustyline::{error::ReadlineError, history::DefaultHistory, Editor};
use tokio::runtime::Handle;

use crate::{
    dialog::DialogEngine,
    domain::{OwnerId, TenantId},
    ports::{Callback, InboundEvent},
};

use super::{console::ConsolePort, output, CliError};

const SCRIPT_ENV: &str = "MARKILY_CLI_SCRIPT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

impl CliMode {
    /// Script mode when forced through `MARKILY_CLI_SCRIPT` or when stdin is
    /// not a terminal.
    pub fn detect() -> Self {
        if std::env::var_os(SCRIPT_ENV).is_some() || !io::stdin().is_terminal() {
            CliMode::Script
        } else {
            CliMode::Interactive
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

/// Who is typing, and in which conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub tenant: TenantId,
    pub owner: OwnerId,
}

pub(crate) struct Shell<'a> {
    engine: &'a DialogEngine,
    console: &'a ConsolePort,
    runtime: Handle,
    session: Session,
}

impl<'a> Shell<'a> {
    pub fn new(
        engine: &'a DialogEngine,
        console: &'a ConsolePort,
        runtime: Handle,
        session: Session,
    ) -> Self {
        Self {
            engine,
            console,
            runtime,
            session,
        }
    }

    pub fn run(&mut self, mode: CliMode) -> Result<(), CliError> {
        match mode {
            CliMode::Interactive => self.run_interactive(),
            CliMode::Script => self.run_script(),
        }
    }

    fn run_interactive(&mut self) -> Result<(), CliError> {
        let mut editor = Editor::<(), DefaultHistory>::new()?;
        output::info("Type /start for the menu, #N to press a button, :quit to leave.");

        loop {
            let prompt = format!("{}@{}> ", self.session.owner, self.session.tenant);
            match editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(trimmed).ok();
                    if self.handle_line(trimmed) == LoopControl::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    output::info("Bye.");
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    fn run_script(&mut self) -> Result<(), CliError> {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            if self.handle_line(&line) == LoopControl::Exit {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn handle_line(&mut self, line: &str) -> LoopControl {
        let line = line.trim();
        if line.is_empty() {
            return LoopControl::Continue;
        }
        if let Some(meta) = line.strip_prefix(':') {
            return self.meta(meta);
        }

        let Session { tenant, owner } = self.session;
        let event = match self.pressed(line) {
            Some(Ok(callback)) => InboundEvent::callback(tenant, owner, callback),
            Some(Err(number)) => {
                output::error(format!("there is no button #{}", number));
                return LoopControl::Continue;
            }
            None => InboundEvent::from_line(tenant, owner, line),
        };
        self.runtime.block_on(self.engine.handle(event));
        LoopControl::Continue
    }

    /// `#N` selects a button of the latest layout.
    fn pressed(&self, line: &str) -> Option<Result<Callback, usize>> {
        let number = line.strip_prefix('#')?.trim().parse::<usize>().ok()?;
        Some(self.console.button(number).ok_or(number))
    }

    fn meta(&mut self, command: &str) -> LoopControl {
        let mut words = command.split_whitespace();
        match (words.next(), words.next().map(str::parse::<i64>)) {
            (Some("quit") | Some("q"), _) => return LoopControl::Exit,
            (Some("as"), Some(Ok(id))) => {
                self.session.owner = OwnerId(id);
                output::info(format!("now typing as user {}", id));
            }
            (Some("chat"), Some(Ok(id))) => {
                self.session.tenant = TenantId(id);
                output::info(format!("now in conversation {}", id));
            }
            _ => output::error(":quit, :as <user id> or :chat <conversation id>"),
        }
        LoopControl::Continue
    }
}
