//! Narrow interfaces to everything outside the core: the chat platform,
//! string tables and document rendering.

pub mod events;
pub mod i18n;
pub mod notify;
pub mod reports;

use std::sync::Arc;

pub use events::{
    Callback, Command, DateShortcut, EventKind, FlowAction, InboundEvent, MenuAction, QuickEntry,
    Usage,
};
pub use i18n::{balance_phrase, MessageArgs, MessageKey, Translator};
pub use notify::{
    send_with_timeout, Button, ButtonLayout, DeliveryError, NotificationPort, OutboundMessage,
    RecipientId,
};
pub use reports::{NoReports, ReportGenerator};

/// The adapters a running core talks to.
#[derive(Clone)]
pub struct Ports {
    pub notifier: Arc<dyn NotificationPort>,
    pub translator: Arc<dyn Translator>,
    pub reports: Arc<dyn ReportGenerator>,
}

impl Ports {
    pub fn new(notifier: Arc<dyn NotificationPort>, translator: Arc<dyn Translator>) -> Self {
        Self {
            notifier,
            translator,
            reports: Arc::new(NoReports),
        }
    }

    pub fn with_reports(mut self, reports: Arc<dyn ReportGenerator>) -> Self {
        self.reports = reports;
        self
    }
}
