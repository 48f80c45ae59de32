use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use portal_client::api::chart::VersionRecord;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backup::BackupControl;
use crate::cache::VersionCache;
use crate::card::{CardRenderer, CardView, DeleteTarget};
use crate::delete::Confirm;
use crate::error::ViewError;
use crate::fetcher::{ChartRegistry, VersionFetcher};
use crate::notify::{Notice, Notifier};

/// One browsing session over the portal: its cards, its version cache and
/// the user facing surfaces.
pub struct Page<R> {
    pub(crate) registry: R,
    pub(crate) cache: Mutex<VersionCache>,
    pub(crate) cards: Mutex<BTreeMap<String, Box<dyn CardView>>>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) confirm: Arc<dyn Confirm>,
    pub(crate) backup_control: Mutex<Option<Box<dyn BackupControl>>>,
    pub(crate) backup_enabled: Mutex<Option<bool>>,
    pub(crate) in_flight: std::sync::Mutex<HashSet<DeleteTarget>>,
    upload_form: bool,
}

impl<R: ChartRegistry> Page<R> {
    pub fn new(registry: R, notifier: Arc<dyn Notifier>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            registry,
            cache: Mutex::new(VersionCache::new()),
            cards: Mutex::new(BTreeMap::new()),
            notifier,
            confirm,
            backup_control: Mutex::new(None),
            backup_enabled: Mutex::new(None),
            in_flight: Default::default(),
            upload_form: false,
        }
    }

    pub fn with_card(mut self, card: Box<dyn CardView>) -> Self {
        self.cards
            .get_mut()
            .insert(card.chart_name().to_string(), card);
        self
    }

    pub fn with_backup_control(mut self, control: Box<dyn BackupControl>) -> Self {
        *self.backup_control.get_mut() = Some(control);
        self
    }

    pub fn with_upload_form(mut self) -> Self {
        self.upload_form = true;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub(crate) fn fetcher(&self) -> VersionFetcher<'_, R> {
        VersionFetcher::new(&self.registry, &self.cache)
    }

    pub(crate) fn renderer(&self) -> CardRenderer<'_, R> {
        CardRenderer::new(&self.registry)
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notifier.notify(&notice);
    }

    /// Prepares the page once its host registered every control.
    ///
    /// Warms the version cache for all cards, sets up the backup control
    /// and paints each card for its selected release.
    pub async fn bootstrap(&self) {
        let charts: Vec<String> = self.cards.lock().await.keys().cloned().collect();
        let fetcher = self.fetcher();
        join_all(charts.iter().map(|chart| fetcher.get_versions(chart))).await;
        info!(charts = charts.len(), "Version cache warmed");

        self.refresh_backup_control().await;

        let renderer = self.renderer();
        let mut cards = self.cards.lock().await;
        let cache = self.cache.lock().await;
        for card in cards.values_mut() {
            if let Some(version) = card.selected_version() {
                renderer.render(card.as_mut(), &cache, &version);
            }
        }
    }

    /// The user picked `version` in the chart's selector.
    pub async fn select_version(&self, chart: &str, version: &str) -> Result<(), ViewError> {
        let mut cards = self.cards.lock().await;
        let card = cards
            .get_mut(chart)
            .ok_or_else(|| ViewError::UnknownCard(chart.to_string()))?;
        card.select(version);
        let cache = self.cache.lock().await;
        self.renderer().render(card.as_mut(), &cache, version);
        debug!(chart, version, "Switched card version");
        Ok(())
    }

    pub async fn charts(&self) -> Vec<String> {
        self.cards.lock().await.keys().cloned().collect()
    }

    pub async fn cached_versions(&self, chart: &str) -> Option<Vec<VersionRecord>> {
        self.cache.lock().await.versions(chart).map(<[_]>::to_vec)
    }

    /// Transient indicator shown while a chart file is being uploaded.
    pub fn upload_started(&self, file_name: &str) -> Option<String> {
        if !self.upload_form || file_name.is_empty() {
            return None;
        }
        Some(format!("Uploading {}...", file_name))
    }

    pub fn dismiss_notice(&self) {
        self.notifier.dismiss();
    }
}
