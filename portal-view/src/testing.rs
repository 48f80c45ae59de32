use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use portal_client::api::backup::BackupStatus;
use portal_client::api::chart::{UploadReport, VersionRecord};
use portal_client::error::APIError;
use reqwest::StatusCode;
use tokio::net::TcpListener;
use url::Url;

use crate::backup::BackupControl;
use crate::delete::Confirm;
use crate::fetcher::ChartRegistry;
use crate::notify::{Notice, Notifier};

pub(crate) fn record(name: &str, version: &str) -> VersionRecord {
    VersionRecord {
        name: name.to_string(),
        version: version.to_string(),
        app_version: None,
        description: format!("{} {}", name, version),
    }
}

/// Serves `app` on an ephemeral local port, returning its base URL.
pub(crate) async fn serve(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}/", addr)).unwrap()
}

fn server_error(status: StatusCode, message: &str) -> APIError {
    APIError::ServerError {
        status,
        message: message.to_string(),
    }
}

/// In memory portal.
#[derive(Default)]
pub(crate) struct FakeRegistry {
    charts: Mutex<HashMap<String, Vec<VersionRecord>>>,
    fail_versions: bool,
    fail_refetch: bool,
    fail_delete: Option<String>,
    backup_enabled: Option<bool>,
    fail_backup: Option<String>,
    calls: AtomicUsize,
    deletes: AtomicUsize,
    backups: AtomicUsize,
}

impl FakeRegistry {
    pub(crate) fn with_chart(mut self, name: &str, versions: &[&str]) -> Self {
        self.charts.get_mut().unwrap().insert(
            name.to_string(),
            versions.iter().map(|v| record(name, v)).collect(),
        );
        self
    }

    pub(crate) fn failing_versions(mut self) -> Self {
        self.fail_versions = true;
        self
    }

    /// Version lists stop loading once a delete went through.
    pub(crate) fn failing_refetch(mut self) -> Self {
        self.fail_refetch = true;
        self
    }

    pub(crate) fn failing_delete(mut self, message: &str) -> Self {
        self.fail_delete = Some(message.to_string());
        self
    }

    pub(crate) fn with_backup(mut self, enabled: bool) -> Self {
        self.backup_enabled = Some(enabled);
        self
    }

    pub(crate) fn failing_backup(mut self, message: &str) -> Self {
        self.fail_backup = Some(message.to_string());
        self
    }

    /// Requests received so far, of any kind.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub(crate) fn backups(&self) -> usize {
        self.backups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChartRegistry for FakeRegistry {
    async fn versions(&self, chart: &str) -> Result<Vec<VersionRecord>, APIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_versions || (self.fail_refetch && self.deletes() > 0) {
            return Err(server_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"));
        }
        self.charts
            .lock()
            .unwrap()
            .get(chart)
            .cloned()
            .ok_or_else(|| server_error(StatusCode::NOT_FOUND, "Chart not found"))
    }

    async fn delete_version(&self, chart: &str, version: &str) -> Result<(), APIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.deletes.fetch_add(1, Ordering::SeqCst);
        // Lets concurrent callers run while the request is "on the wire".
        tokio::task::yield_now().await;
        if let Some(message) = &self.fail_delete {
            return Err(server_error(StatusCode::INTERNAL_SERVER_ERROR, message));
        }
        let mut charts = self.charts.lock().unwrap();
        let versions = charts
            .get_mut(chart)
            .filter(|versions| versions.iter().any(|v| v.version == version))
            .ok_or_else(|| server_error(StatusCode::NOT_FOUND, "Chart not found"))?;
        versions.retain(|v| v.version != version);
        if versions.is_empty() {
            charts.remove(chart);
        }
        Ok(())
    }

    async fn upload(&self, path: &Path) -> Result<UploadReport, APIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| n.ends_with(".tgz"))
            .ok_or_else(|| APIError::InvalidPackage(path.display().to_string()))?;
        Ok(UploadReport {
            message: "Chart uploaded successfully".to_string(),
            name: name.to_string(),
        })
    }

    async fn backup_status(&self) -> Result<BackupStatus, APIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        self.backup_enabled
            .map(|enabled| BackupStatus { enabled })
            .ok_or_else(|| server_error(StatusCode::NOT_FOUND, "Not found"))
    }

    async fn backup(&self) -> Result<String, APIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.backups.fetch_add(1, Ordering::SeqCst);
        match &self.fail_backup {
            Some(message) => Err(server_error(StatusCode::INTERNAL_SERVER_ERROR, message)),
            None => Ok("Backup completed successfully".to_string()),
        }
    }

    fn details_url(&self, chart: &str, version: &str) -> Url {
        Url::parse(&format!("http://portal.test/chart/{}/{}/details", chart, version)).unwrap()
    }

    fn download_url(&self, chart: &str, version: &str) -> Url {
        Url::parse(&format!("http://portal.test/chart/{}/{}", chart, version)).unwrap()
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
    dismissed: AtomicUsize,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub(crate) fn dismissed(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct ScriptedConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub(crate) fn always(answer: bool) -> Self {
        Self {
            answer,
            prompts: Default::default(),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

/// Backup control remembering whether it was last enabled or hidden.
#[derive(Default, Clone)]
pub(crate) struct SwitchControl {
    state: Arc<Mutex<Option<bool>>>,
}

impl SwitchControl {
    pub(crate) fn state(&self) -> Option<bool> {
        *self.state.lock().unwrap()
    }
}

impl BackupControl for SwitchControl {
    fn hide(&mut self) {
        *self.state.lock().unwrap() = Some(false);
    }

    fn enable(&mut self) {
        *self.state.lock().unwrap() = Some(true);
    }
}
