use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use portal_client::{
    api::{
        backup::{Backup, BackupStatus},
        chart::{Chart, UploadReport, VersionRecord},
    },
    client::PortalClient,
    error::APIError,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::cache::VersionCache;

/// The registry endpoints the page relies on.
#[async_trait]
pub trait ChartRegistry: Send + Sync {
    async fn versions(&self, chart: &str) -> Result<Vec<VersionRecord>, APIError>;
    async fn delete_version(&self, chart: &str, version: &str) -> Result<(), APIError>;
    async fn upload(&self, path: &Path) -> Result<UploadReport, APIError>;
    async fn backup_status(&self) -> Result<BackupStatus, APIError>;
    async fn backup(&self) -> Result<String, APIError>;
    fn details_url(&self, chart: &str, version: &str) -> Url;
    fn download_url(&self, chart: &str, version: &str) -> Url;
}

#[async_trait]
impl ChartRegistry for Arc<PortalClient> {
    async fn versions(&self, chart: &str) -> Result<Vec<VersionRecord>, APIError> {
        Chart::from_name(self.clone(), chart).versions().await
    }

    async fn delete_version(&self, chart: &str, version: &str) -> Result<(), APIError> {
        Chart::from_name(self.clone(), chart).delete(version).await
    }

    async fn upload(&self, path: &Path) -> Result<UploadReport, APIError> {
        Chart::upload(self, path).await
    }

    async fn backup_status(&self) -> Result<BackupStatus, APIError> {
        Backup::new(self.clone()).status().await
    }

    async fn backup(&self) -> Result<String, APIError> {
        Backup::new(self.clone()).run().await
    }

    fn details_url(&self, chart: &str, version: &str) -> Url {
        Chart::from_name(self.clone(), chart).details_url(version)
    }

    fn download_url(&self, chart: &str, version: &str) -> Url {
        Chart::from_name(self.clone(), chart).download_url(version)
    }
}

/// Fetches version lists and keeps the cache in sync with them.
pub struct VersionFetcher<'a, R: ?Sized> {
    registry: &'a R,
    cache: &'a Mutex<VersionCache>,
}

impl<'a, R: ChartRegistry + ?Sized> VersionFetcher<'a, R> {
    pub fn new(registry: &'a R, cache: &'a Mutex<VersionCache>) -> Self {
        Self { registry, cache }
    }

    /// Never fails: any error is logged and yields an empty list, which is
    /// stored like any other answer.
    pub async fn get_versions(&self, chart: &str) -> Vec<VersionRecord> {
        let versions = match self.registry.versions(chart).await {
            Ok(versions) => versions,
            Err(err) => {
                warn!(chart, error = %err, "Unable to fetch chart versions");
                Vec::new()
            }
        };
        debug!(chart, count = versions.len(), "Storing chart versions");
        self.cache.lock().await.store(chart, versions.clone());
        versions
    }
}
