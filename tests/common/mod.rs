#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use markily_core::{
    cli::Catalog,
    config::Config,
    core::{FixedClock, ReminderScheduler, Stores},
    dialog::{DialogEngine, Outbound},
    domain::{OwnerId, TenantId},
    ports::{DeliveryError, InboundEvent, NotificationPort, OutboundMessage, Ports, RecipientId},
    storage::{JsonStorage, StorageBackend},
};
use tempfile::TempDir;

pub const TENANT: TenantId = TenantId(-100);
pub const OWNER: OwnerId = OwnerId(7);

/// Wednesday 2025-06-04 10:00 UTC.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 4, 10, 0, 0).unwrap()
}

/// Notification port that keeps everything it is asked to send.
#[derive(Default)]
pub struct RecordingPort {
    sent: Mutex<Vec<(RecipientId, OutboundMessage)>>,
    failing: AtomicBool,
}

impl RecordingPort {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(RecipientId, OutboundMessage)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, message)| message.text).collect()
    }
}

#[async_trait]
impl NotificationPort for RecordingPort {
    async fn send(
        &self,
        recipient: RecipientId,
        message: OutboundMessage,
    ) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Unreachable(recipient));
        }
        self.sent.lock().unwrap().push((recipient, message));
        Ok(())
    }
}

/// A JSON-backed store in a temporary home, a fixed clock and a recording
/// port, wired the way the console transport wires them.
pub struct Harness {
    pub home: TempDir,
    pub config: Arc<Config>,
    pub clock: Arc<FixedClock>,
    pub port: Arc<RecordingPort>,
    pub stores: Stores,
    pub ports: Ports,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let home = TempDir::new().expect("create temp home");
        Self::open(home, config)
    }

    /// Reopens a store over an existing home, as a restarted process would.
    pub fn open(home: TempDir, config: Config) -> Self {
        let backend: Arc<dyn StorageBackend> = Arc::new(
            JsonStorage::new(Some(home.path().to_path_buf())).expect("open json storage"),
        );
        let clock = Arc::new(FixedClock::new(start_time()));
        let stores = Stores::open(backend, clock.clone(), &config).expect("open stores");
        let port = Arc::new(RecordingPort::default());
        let ports = Ports::new(port.clone(), Arc::new(Catalog));
        Self {
            home,
            config: Arc::new(config),
            clock,
            port,
            stores,
            ports,
        }
    }

    pub fn engine(&self) -> DialogEngine {
        DialogEngine::new(self.stores.clone(), self.ports.clone(), self.config.clone())
    }

    pub fn scheduler(&self) -> ReminderScheduler {
        ReminderScheduler::new(
            self.stores.clone(),
            self.ports.clone(),
            self.config.scheduler.clone(),
        )
    }
}

/// Feeds one typed line and returns the reply texts.
pub fn say(engine: &DialogEngine, line: &str) -> Vec<String> {
    texts(engine.step(&InboundEvent::from_line(TENANT, OWNER, line)))
}

pub fn texts(outbound: Vec<Outbound>) -> Vec<String> {
    outbound
        .into_iter()
        .filter_map(|effect| match effect {
            Outbound::Message { message, .. } => Some(message.text),
            Outbound::Document { .. } => None,
        })
        .collect()
}

pub fn joined(replies: &[String]) -> String {
    replies.join("\n")
}
