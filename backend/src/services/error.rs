use crate::db::repository::RepositoryError;

/// Failure of the analytics pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// Malformed or unsupported request parameter.
    #[error("{0}")]
    InvalidInput(String),

    /// A data fetch failed; the whole request is aborted.
    #[error("failed to fetch analytics: {0}")]
    Repository(#[from] RepositoryError),
}

impl AnalyticsError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}
