// src/lib.rs
// Public library surface for the service binary, the CLI, and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod estimator;
pub mod metrics;
pub mod normalize;
pub mod sentiment;
pub mod stopwords;
pub mod wordcloud;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tracing::info;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{aggregate, BatchAnalysis, WordCount};
pub use crate::config::AppConfig;
pub use crate::error::{AnalyticsError, Result};
pub use crate::normalize::normalize;
pub use crate::sentiment::{SentimentLabel, SentimentResult, SentimentScorer};
pub use crate::stopwords::is_stopword;

/// Build the scorer from config (estimator backend, timeout, concurrency bound).
pub fn build_scorer(cfg: &AppConfig) -> anyhow::Result<SentimentScorer> {
    let estimator = estimator::build_estimator(&cfg.estimator)?;
    Ok(SentimentScorer::new(estimator)
        .with_timeout(Duration::from_millis(cfg.estimator.timeout_ms))
        .with_max_concurrency(cfg.estimator.max_concurrency))
}

/// Build shared request state from config.
pub fn build_state(cfg: &AppConfig) -> anyhow::Result<api::AppState> {
    let scorer = build_scorer(cfg)?;
    let wordcloud = wordcloud::WordCloudAdapter::new(
        Arc::new(wordcloud::BlockCloudRenderer::new()),
        cfg.wordcloud.options(),
    )
    .with_timeout(Duration::from_millis(cfg.wordcloud.timeout_ms));
    Ok(api::AppState { scorer, wordcloud })
}

/// Full router for a given config, including `/metrics`.
pub fn app_with_config(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg)?;
    let metrics = metrics::Metrics::init()?;
    info!(
        estimator = state.scorer.estimator_name(),
        cors_origins = cfg.server.cors_origins.len(),
        "text analytics router built"
    );
    Ok(api::router(state, &cfg.server.cors_origins).merge(metrics.router()))
}

/// Full router configured from file + env (see [`AppConfig::from_env`]).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::from_env()?;
    app_with_config(&cfg)
}
