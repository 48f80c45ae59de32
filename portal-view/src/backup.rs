use tracing::{info, warn};

use crate::fetcher::ChartRegistry;
use crate::notify::{failure_detail, Notice};
use crate::page::Page;

/// The host's backup trigger.
pub trait BackupControl: Send {
    /// Backups are disabled on the portal.
    fn hide(&mut self);
    /// Backups are available, the control may trigger [`Page::backup`].
    fn enable(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Completed(String),
    Failed(String),
    /// The portal has backups disabled, nothing was sent.
    Disabled,
}

impl<R: ChartRegistry> Page<R> {
    /// Asks the portal whether backups are enabled and updates the control.
    ///
    /// When the status cannot be read the control is left as it is.
    pub async fn refresh_backup_control(&self) {
        if self.backup_control.lock().await.is_none() {
            return;
        }
        let status = match self.registry.backup_status().await {
            Ok(status) => status,
            Err(err) => {
                warn!(error = %err, "Unable to fetch backup status");
                return;
            }
        };
        *self.backup_enabled.lock().await = Some(status.enabled);
        let mut control = self.backup_control.lock().await;
        let Some(control) = control.as_mut() else {
            return;
        };
        if status.enabled {
            control.enable();
        } else {
            info!("Backups are disabled, hiding backup control");
            control.hide();
        }
    }

    pub async fn backup(&self) -> BackupOutcome {
        if *self.backup_enabled.lock().await == Some(false) {
            return BackupOutcome::Disabled;
        }
        match self.registry.backup().await {
            Ok(message) => {
                info!(%message, "Backup done");
                let message = format!("Backup completed: {}", message);
                self.notify(Notice::success(message.clone()));
                BackupOutcome::Completed(message)
            }
            Err(err) => {
                warn!(error = %err, "Backup failed");
                let message = format!(
                    "Backup failed: {}",
                    failure_detail(&err, "An error occurred")
                );
                self.notify(Notice::error(message.clone()));
                BackupOutcome::Failed(message)
            }
        }
    }
}
