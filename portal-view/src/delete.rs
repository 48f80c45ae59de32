use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::card::DeleteTarget;
use crate::fetcher::ChartRegistry;
use crate::notify::{failure_detail, Notice};
use crate::page::Page;

/// Asks the user to confirm a destructive action.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything, for non interactive use.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user said no, nothing was sent.
    Declined,
    /// The same release is already being deleted.
    AlreadyInFlight,
    /// The portal refused or could not be reached.
    Failed(String),
    /// Other releases remain, the card now lists them.
    VersionDeleted,
    /// That was the last release, the card is gone.
    ChartRemoved,
}

/// Marks a release as being deleted until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<DeleteTarget>>,
    target: DeleteTarget,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a Mutex<HashSet<DeleteTarget>>, target: DeleteTarget) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target.clone());
        inserted.then_some(Self { set, target })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.target);
    }
}

impl<R: ChartRegistry> Page<R> {
    /// Deletes one release of a chart and reconciles its card.
    ///
    /// Confirm, request, then react: on failure nothing on the page changes;
    /// on success the card is re-rendered from a fresh version list, or
    /// removed when no release is left.
    pub async fn delete(&self, chart: &str, version: &str) -> DeleteOutcome {
        let target = DeleteTarget {
            chart: chart.to_string(),
            version: version.to_string(),
        };
        let Some(_in_flight) = InFlight::acquire(&self.in_flight, target) else {
            debug!(chart, version, "Delete already pending, ignoring");
            return DeleteOutcome::AlreadyInFlight;
        };

        if !self.confirm.confirm(&format!(
            "Are you sure you want to delete version {} of chart {}?",
            version, chart
        )) {
            debug!(chart, version, "Delete declined");
            return DeleteOutcome::Declined;
        }

        if let Err(err) = self.registry.delete_version(chart, version).await {
            warn!(chart, version, error = %err, "Delete failed");
            let message = format!(
                "Delete failed: {}",
                failure_detail(&err, "Failed to delete chart")
            );
            self.notify(Notice::error(message.clone()));
            return DeleteOutcome::Failed(message);
        }
        info!(chart, version, "Chart version deleted");

        let versions = self.fetcher().get_versions(chart).await;
        let mut cards = self.cards.lock().await;
        if versions.is_empty() {
            if let Some(mut card) = cards.remove(chart) {
                card.remove();
            }
            self.notify(Notice::success(format!(
                "Chart {} has been fully removed",
                chart
            )));
            return DeleteOutcome::ChartRemoved;
        }

        if let Some(card) = cards.get_mut(chart) {
            let mut cache = self.cache.lock().await;
            if let Err(err) = self.renderer().update_list(card.as_mut(), &mut cache, versions) {
                warn!(chart, error = %err, "Unable to refresh card");
            }
        }
        self.notify(Notice::success(format!(
            "Version {} of chart {} deleted",
            version, chart
        )));
        DeleteOutcome::VersionDeleted
    }
}
