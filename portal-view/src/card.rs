use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use portal_client::api::chart::VersionRecord;
use url::Url;

use crate::cache::VersionCache;
use crate::error::ViewError;
use crate::fetcher::ChartRegistry;

/// The exact release a card's delete control acts on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeleteTarget {
    pub chart: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLinks {
    pub info: Url,
    pub download: Url,
    pub delete: DeleteTarget,
}

/// A chart card as displayed by the host.
///
/// The page never creates cards, it only updates or removes the ones the
/// host registered.
pub trait CardView: Send {
    fn chart_name(&self) -> &str;
    /// Current value of the card's version selector, if it has one.
    fn selected_version(&self) -> Option<String>;
    /// Reflects a selection made by the user.
    fn select(&mut self, version: &str);
    fn set_links(&mut self, links: CardLinks);
    fn set_details(&mut self, app_version: &str, description: &str);
    fn set_version_list(&mut self, versions: &[VersionRecord], selected: &str);
    fn remove(&mut self);
}

/// Plain card state, usable by any host that renders from data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartCard {
    name: String,
    versions: Vec<String>,
    selected: Option<String>,
    links: Option<CardLinks>,
    app_version: String,
    description: String,
    removed: bool,
}

impl ChartCard {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Card as first painted, showing the first release of `versions`.
    pub fn with_versions(name: &str, versions: &[VersionRecord]) -> Self {
        let mut card = Self::new(name);
        card.versions = versions.iter().map(|v| v.version.clone()).collect();
        if let Some(first) = versions.first() {
            card.selected = Some(first.version.clone());
            card.app_version = first.app_version_or_na().to_string();
            card.description = first.description.clone();
        }
        card
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn links(&self) -> Option<&CardLinks> {
        self.links.as_ref()
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

impl CardView for ChartCard {
    fn chart_name(&self) -> &str {
        &self.name
    }

    fn selected_version(&self) -> Option<String> {
        self.selected.clone()
    }

    fn select(&mut self, version: &str) {
        self.selected = Some(version.to_string());
    }

    fn set_links(&mut self, links: CardLinks) {
        self.links = Some(links);
    }

    fn set_details(&mut self, app_version: &str, description: &str) {
        self.app_version = app_version.to_string();
        self.description = description.to_string();
    }

    fn set_version_list(&mut self, versions: &[VersionRecord], selected: &str) {
        self.versions = versions.iter().map(|v| v.version.clone()).collect();
        self.selected = Some(selected.to_string());
    }

    fn remove(&mut self) {
        self.removed = true;
    }
}

/// A [`ChartCard`] the host keeps a handle on while the page updates it.
#[derive(Debug, Clone)]
pub struct SharedCard {
    name: String,
    inner: Arc<Mutex<ChartCard>>,
}

impl SharedCard {
    pub fn new(card: ChartCard) -> Self {
        Self {
            name: card.name.clone(),
            inner: Arc::new(Mutex::new(card)),
        }
    }

    pub fn get(&self) -> MutexGuard<'_, ChartCard> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CardView for SharedCard {
    fn chart_name(&self) -> &str {
        &self.name
    }

    fn selected_version(&self) -> Option<String> {
        self.get().selected_version()
    }

    fn select(&mut self, version: &str) {
        self.get().select(version)
    }

    fn set_links(&mut self, links: CardLinks) {
        self.get().set_links(links)
    }

    fn set_details(&mut self, app_version: &str, description: &str) {
        self.get().set_details(app_version, description)
    }

    fn set_version_list(&mut self, versions: &[VersionRecord], selected: &str) {
        self.get().set_version_list(versions, selected)
    }

    fn remove(&mut self) {
        self.get().remove()
    }
}

/// Keeps a card's links and details in line with its selected release.
pub struct CardRenderer<'a, R: ?Sized> {
    registry: &'a R,
}

impl<'a, R: ChartRegistry + ?Sized> CardRenderer<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// Points the card at `version`.
    ///
    /// Links are always rewritten. Details are only updated when the cache
    /// knows the release.
    pub fn render(&self, card: &mut dyn CardView, cache: &VersionCache, version: &str) {
        let chart = card.chart_name().to_string();
        card.set_links(CardLinks {
            info: self.registry.details_url(&chart, version),
            download: self.registry.download_url(&chart, version),
            delete: DeleteTarget {
                chart: chart.clone(),
                version: version.to_string(),
            },
        });
        if let Some(record) = cache.find(&chart, version) {
            card.set_details(record.app_version_or_na(), &record.description);
        }
    }

    /// Replaces the card's version list, selecting its first entry.
    pub fn update_list(
        &self,
        card: &mut dyn CardView,
        cache: &mut VersionCache,
        versions: Vec<VersionRecord>,
    ) -> Result<(), ViewError> {
        let chart = card.chart_name().to_string();
        let selected = versions
            .first()
            .map(|v| v.version.clone())
            .ok_or_else(|| ViewError::EmptyVersionList(chart.clone()))?;
        card.set_version_list(&versions, &selected);
        cache.store(&chart, versions);
        self.render(card, cache, &selected);
        Ok(())
    }
}
