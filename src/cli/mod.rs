//! Console transport: stands in for the chat platform so the core can be
//! driven from a terminal or a piped script.

pub mod catalog;
pub mod console;
pub mod output;
mod shell;

use std::{path::PathBuf, sync::Arc};

use thiserror::Error;

use crate::{
    config::ConfigManager,
    core::{Clock, ReminderScheduler, Stores, SystemClock},
    dialog::DialogEngine,
    domain::{OwnerId, TenantId},
    errors::LedgerError,
    ports::Ports,
    storage::{JsonStorage, StorageBackend},
    utils::paths::PathResolver,
};

pub use catalog::Catalog;
pub use console::ConsolePort;
pub use shell::{CliMode, Session};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct CliOptions {
    /// Overrides `MARKILY_HOME` / `~/.markily`.
    pub home: Option<PathBuf>,
    pub session: Session,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            home: None,
            session: Session {
                tenant: TenantId(1),
                owner: OwnerId(1),
            },
        }
    }
}

/// Wires the stores to the console, starts the reminder scheduler and reads
/// lines until the input ends.
pub fn run(options: CliOptions) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let base = PathResolver::resolve_base(options.home);
    let config = Arc::new(ConfigManager::with_base_dir(base.clone())?.load()?);
    let backend: Arc<dyn StorageBackend> = Arc::new(JsonStorage::new(Some(base.clone()))?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let stores = Stores::open(backend, clock, &config)?;
    tracing::info!(home = %base.display(), "store opened");

    let console = Arc::new(ConsolePort::new());
    let ports = Ports::new(console.clone(), Arc::new(Catalog));

    let scheduler = Arc::new(ReminderScheduler::new(
        stores.clone(),
        ports.clone(),
        config.scheduler.clone(),
    ));
    let handle = {
        let _guard = runtime.enter();
        scheduler.spawn()
    };

    let engine = DialogEngine::new(stores, ports, config);
    let result = shell::Shell::new(&engine, &console, runtime.handle().clone(), options.session)
        .run(CliMode::detect());

    runtime.block_on(handle.shutdown());
    result
}
