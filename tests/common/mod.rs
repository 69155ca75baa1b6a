// tests/common/mod.rs
// Shared fixtures: a scripted estimator and router builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;

use text_analytics::api::{self, AppState};
use text_analytics::error::{AnalyticsError, Result};
use text_analytics::estimator::{Estimate, Estimator};
use text_analytics::wordcloud::{BlockCloudRenderer, WordCloudAdapter, WordCloudOptions};
use text_analytics::SentimentScorer;

/// Polarity by normalized text; unknown texts score `default`.
/// Texts containing "FAIL" make the estimator error out.
pub struct ScriptedEstimator {
    by_text: HashMap<String, f64>,
    default: f64,
}

impl ScriptedEstimator {
    pub fn new(pairs: &[(&str, f64)]) -> Self {
        Self {
            by_text: pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
            default: 0.0,
        }
    }

    pub fn constant(p: f64) -> Self {
        Self {
            by_text: HashMap::new(),
            default: p,
        }
    }
}

#[async_trait]
impl Estimator for ScriptedEstimator {
    async fn estimate(&self, text: &str) -> Result<Estimate> {
        if text.contains("FAIL") {
            return Err(AnalyticsError::EstimationFailed(
                "scripted estimator refused input".into(),
            ));
        }
        let p = self.by_text.get(text).copied().unwrap_or(self.default);
        Ok(Estimate::new(p, 0.5))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn scorer(est: ScriptedEstimator) -> SentimentScorer {
    SentimentScorer::new(Arc::new(est))
}

pub fn state(est: ScriptedEstimator) -> AppState {
    AppState {
        scorer: scorer(est),
        wordcloud: WordCloudAdapter::new(
            Arc::new(BlockCloudRenderer::new()),
            WordCloudOptions {
                width: 200,
                height: 100,
                ..WordCloudOptions::default()
            },
        ),
    }
}

/// Router without CORS origins (permissive) over a scripted estimator.
pub fn router(est: ScriptedEstimator) -> Router {
    api::router(state(est), &[])
}
