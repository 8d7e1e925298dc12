//! Periodic cross-tenant sweep that fires due reminders at most once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::SchedulerSettings,
    currency::format_amount,
    domain::TenantId,
    errors::{LedgerError, Result},
    ports::{
        balance_phrase, send_with_timeout, DeliveryError, MessageArgs, MessageKey, OutboundMessage,
        Ports, RecipientId,
    },
};

use super::{DueReminder, Stores};

/// Outcome of one sweep over every partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub partitions: usize,
    /// Delivered notifications.
    pub fired: usize,
    /// Due reminders whose delivery failed or timed out. They are retired all
    /// the same.
    pub failed: usize,
    /// Reminders found past the catch-up window and retired silently.
    pub expired: usize,
    /// Partitions or reminders skipped because the store failed.
    pub errors: usize,
}

impl SweepReport {
    pub fn is_quiet(&self) -> bool {
        self.fired == 0 && self.failed == 0 && self.expired == 0 && self.errors == 0
    }
}

pub struct ReminderScheduler {
    stores: Stores,
    ports: Ports,
    settings: SchedulerSettings,
}

impl ReminderScheduler {
    pub fn new(stores: Stores, ports: Ports, settings: SchedulerSettings) -> Self {
        Self {
            stores,
            ports,
            settings,
        }
    }

    /// Scans every known partition once.
    pub async fn sweep(&self) -> SweepReport {
        let now = self.stores.clock().now();
        let mut report = SweepReport::default();
        let tenants = match self.off_runtime(|stores| stores.partitions.tenants()).await {
            Ok(tenants) => tenants,
            Err(err) => {
                tracing::error!(error = %err, "cannot enumerate partitions");
                report.errors += 1;
                return report;
            }
        };

        for tenant in tenants {
            report.partitions += 1;
            if let Err(err) = self.sweep_partition(tenant, now, &mut report).await {
                tracing::error!(%tenant, error = %err, "partition sweep failed");
                report.errors += 1;
            }
        }

        if !report.is_quiet() {
            tracing::info!(
                partitions = report.partitions,
                fired = report.fired,
                failed = report.failed,
                expired = report.expired,
                errors = report.errors,
                "reminder sweep finished"
            );
        }
        report
    }

    async fn sweep_partition(
        &self,
        tenant: TenantId,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) -> Result<()> {
        let window = self.settings.catch_up_window();
        let triage = self
            .off_runtime(move |stores| stores.reminders.triage(tenant, now, window))
            .await?;

        if !triage.stale.is_empty() {
            let stale = triage.stale;
            let expired = self
                .off_runtime(move |stores| stores.reminders.retire(tenant, &stale))
                .await?;
            tracing::warn!(%tenant, expired, "reminders missed their window and were dropped");
            report.expired += expired;
        }

        for due in triage.due {
            let id = due.reminder.id;
            // Retire before delivering: a crash or store failure after this
            // point can lose a notification but never repeat one.
            match self
                .off_runtime(move |stores| stores.reminders.retire(tenant, &[id]))
                .await
            {
                Ok(0) => continue,
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(
                        %tenant,
                        reminder = %id,
                        error = %err,
                        "cannot retire reminder"
                    );
                    report.errors += 1;
                    continue;
                }
            }
            match self.deliver(tenant, &due).await {
                Ok(()) => {
                    tracing::info!(%tenant, reminder = %id, "reminder delivered");
                    report.fired += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        %tenant,
                        reminder = %id,
                        error = %err,
                        "reminder delivery failed"
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Runs blocking store work on the blocking pool so partition file I/O
    /// never occupies a runtime worker.
    async fn off_runtime<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&Stores) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let stores = self.stores.clone();
        tokio::task::spawn_blocking(move || job(&stores))
            .await
            .map_err(|err| LedgerError::StoreUnavailable(format!("store task failed: {err}")))?
    }

    async fn deliver(
        &self,
        tenant: TenantId,
        due: &DueReminder,
    ) -> std::result::Result<(), DeliveryError> {
        let reminder = &due.reminder;
        let owner = reminder.owner_id;
        let language = self.stores.preferences.language(owner);
        let translator = self.ports.translator.as_ref();

        let balance = match self.stores.ledger.balance(tenant, owner, reminder.contact_id) {
            Ok(balance) => balance_phrase(translator, &language, &due.contact_name, &balance),
            Err(err) => {
                tracing::warn!(
                    %tenant,
                    reminder = %reminder.id,
                    error = %err,
                    "balance unavailable for reminder"
                );
                format_amount(0.0, self.stores.ledger.default_currency())
            }
        };
        let args = MessageArgs::new()
            .with("contact", &due.contact_name)
            .with("balance", balance)
            .with("note", &reminder.note);
        let text = translator.translate(&language, MessageKey::ReminderNotification, &args);

        send_with_timeout(
            self.ports.notifier.as_ref(),
            RecipientId::from(owner),
            OutboundMessage::text(text),
            self.settings.delivery_timeout(),
        )
        .await
    }

    /// Sweeps every interval until `shutdown` flips to `true` or its sender
    /// is dropped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let interval = self.settings.interval();
        tracing::info!(
            interval_secs = interval.as_secs(),
            window_secs = self.settings.catch_up_window().num_seconds(),
            "reminder scheduler started"
        );
        while !*shutdown.borrow() {
            let report = self.sweep().await;
            tracing::debug!(?report, "sweep");
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::info!("reminder scheduler stopped");
    }

    pub fn spawn(self: Arc<Self>) -> SchedulerHandle {
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(self.run(receiver));
        SchedulerHandle { shutdown, task }
    }
}

/// Owns the background sweep task.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn shutdown(self) {
        if self.shutdown.send(true).is_err() {
            tracing::debug!("scheduler already stopped");
        }
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "scheduler task ended abnormally");
        }
    }
}
