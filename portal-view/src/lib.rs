//! View layer of the chart portal.
//!
//! A [`Page`] owns the chart cards registered by its host, the version cache
//! and the workflows acting on them. Hosts plug in through [`CardView`],
//! [`Notifier`], [`Confirm`] and [`BackupControl`]; the registry is reached
//! through [`ChartRegistry`].

pub mod backup;
pub mod cache;
pub mod card;
pub mod delete;
pub mod error;
pub mod fetcher;
pub mod notify;
pub mod page;
pub mod upload;

#[cfg(test)]
mod testing;

pub use backup::{BackupControl, BackupOutcome};
pub use cache::VersionCache;
pub use card::{CardLinks, CardRenderer, CardView, ChartCard, DeleteTarget, SharedCard};
pub use delete::{AssumeYes, Confirm, DeleteOutcome};
pub use error::ViewError;
pub use fetcher::{ChartRegistry, VersionFetcher};
pub use notify::{Notice, Notifier, Severity};
pub use page::Page;
pub use upload::UploadOutcome;
