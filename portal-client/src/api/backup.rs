use std::sync::Arc;

use serde::Deserialize;

use crate::client::PortalClient;
use crate::error::APIError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BackupStatus {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
struct BackupReport {
    message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    client: Arc<PortalClient>,
}

impl Backup {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }

    pub async fn status(&self) -> Result<BackupStatus, APIError> {
        let req = self.client.get(&["backup", "status"]).build()?;
        let resp = self.client.execute(req).await?;
        Ok(serde_json::from_str(&resp.text().await?)?)
    }

    /// Triggers a backup and returns the portal's confirmation message.
    pub async fn run(&self) -> Result<String, APIError> {
        let req = self.client.post(&["backup"]).build()?;
        let resp = self.client.execute(req).await?;
        let report: BackupReport = serde_json::from_str(&resp.text().await?)?;
        Ok(report.message)
    }
}
