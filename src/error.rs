// src/error.rs
use thiserror::Error;

/// Failures surfaced by the analytics pipeline. Each one fails only the current request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("cannot aggregate an empty batch of texts")]
    EmptyBatch,

    #[error("sentiment estimation failed: {0}")]
    EstimationFailed(String),

    #[error("word cloud rendering failed: {0}")]
    RenderFailed(String),
}

impl AnalyticsError {
    /// Stable short name, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::EmptyBatch => "empty_batch",
            AnalyticsError::EstimationFailed(_) => "estimation_failed",
            AnalyticsError::RenderFailed(_) => "render_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
