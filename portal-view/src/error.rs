#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("no version left for chart {0}, remove its card instead")]
    EmptyVersionList(String),
    #[error("no card displayed for chart {0}")]
    UnknownCard(String),
}
