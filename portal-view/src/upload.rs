use std::path::Path;

use tracing::{info, warn};

use crate::fetcher::ChartRegistry;
use crate::notify::{failure_detail, Notice};
use crate::page::Page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded(String),
    Failed(String),
}

impl<R: ChartRegistry> Page<R> {
    /// Sends a packaged chart to the portal and notifies the result.
    ///
    /// Cards are left alone: a new chart only shows up on the next page.
    pub async fn upload(&self, path: &Path) -> UploadOutcome {
        match self.registry.upload(path).await {
            Ok(report) => {
                info!(file = %path.display(), message = %report.message, "Chart uploaded");
                let message = format!("Chart uploaded: {}", report.message);
                self.notify(Notice::success(message.clone()));
                UploadOutcome::Uploaded(message)
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "Upload failed");
                let detail = match &err {
                    portal_client::error::APIError::InvalidPackage(_) => {
                        "Chart must be a .tgz file".to_string()
                    }
                    other => failure_detail(other, "Failed to upload chart"),
                };
                let message = format!("Upload failed: {}", detail);
                self.notify(Notice::error(message.clone()));
                UploadOutcome::Failed(message)
            }
        }
    }
}
