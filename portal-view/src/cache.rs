use std::collections::HashMap;

use portal_client::api::chart::VersionRecord;

/// Versions known for each chart, for the lifetime of a page.
///
/// Entries are only ever replaced as a whole, never merged.
#[derive(Debug, Default, Clone)]
pub struct VersionCache {
    entries: HashMap<String, Vec<VersionRecord>>,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, chart: &str, versions: Vec<VersionRecord>) {
        self.entries.insert(chart.to_string(), versions);
    }

    pub fn versions(&self, chart: &str) -> Option<&[VersionRecord]> {
        self.entries.get(chart).map(Vec::as_slice)
    }

    pub fn find(&self, chart: &str, version: &str) -> Option<&VersionRecord> {
        self.versions(chart)?.iter().find(|v| v.version == version)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
