// src/sentiment.rs
//! Single-text sentiment scoring: label, confidence, and a normalized score triple
//! derived from the estimator's raw polarity.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::estimator::{DynEstimator, Estimate};
use crate::normalize::normalize;

pub const POSITIVE_THRESHOLD: f64 = 0.1;
pub const NEGATIVE_THRESHOLD: f64 = -0.1;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

/// VADER-shaped scores; `pos + neu + neg == 1` within float tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreTriple {
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    #[serde(rename = "text")]
    pub original_text: String,
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    pub confidence: f64,
    #[serde(rename = "scores")]
    pub score_triple: ScoreTriple,
    pub polarity: f64,
    pub subjectivity: f64,
}

/// `>= 0.1` positive, `<= -0.1` negative, anything in between neutral.
pub fn label_for(polarity: f64) -> SentimentLabel {
    if polarity >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if polarity <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

pub fn score_triple(polarity: f64) -> ScoreTriple {
    let mut pos = polarity.max(0.0);
    let mut neg = (-polarity).max(0.0);
    let mut neu = 1.0 - polarity.abs();

    let total = pos + neg + neu;
    if total > 0.0 {
        pos /= total;
        neg /= total;
        neu /= total;
    }

    ScoreTriple {
        compound: polarity,
        pos,
        neu,
        neg,
    }
}

/// Assemble a result from the raw text and an already-validated estimate.
pub fn build_result(original_text: &str, est: Estimate) -> SentimentResult {
    SentimentResult {
        original_text: original_text.to_string(),
        label: label_for(est.polarity),
        confidence: est.polarity.abs(),
        score_triple: score_triple(est.polarity),
        polarity: est.polarity,
        subjectivity: est.subjectivity,
    }
}

// Reject NaN/inf; clamp finite values into range.
fn validate(est: Estimate) -> Result<Estimate> {
    if !est.polarity.is_finite() || !est.subjectivity.is_finite() {
        return Err(AnalyticsError::EstimationFailed(format!(
            "estimator returned non-finite values (polarity={}, subjectivity={})",
            est.polarity, est.subjectivity
        )));
    }
    Ok(Estimate::new(
        est.polarity.clamp(-1.0, 1.0),
        est.subjectivity.clamp(0.0, 1.0),
    ))
}

/// Scorer over an injected estimator. Cheap to clone.
#[derive(Clone)]
pub struct SentimentScorer {
    estimator: DynEstimator,
    timeout: Duration,
    limit: Arc<Semaphore>,
}

impl SentimentScorer {
    pub fn new(estimator: DynEstimator) -> Self {
        Self {
            estimator,
            timeout: DEFAULT_TIMEOUT,
            limit: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Max batch estimator calls in flight across clones of this scorer (at least 1).
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.limit = Arc::new(Semaphore::new(n.max(1)));
        self
    }

    pub fn estimator_name(&self) -> &'static str {
        self.estimator.name()
    }

    pub async fn score(&self, text: &str) -> Result<SentimentResult> {
        let normalized = normalize(text);
        let est = match tokio::time::timeout(self.timeout, self.estimator.estimate(&normalized)).await
        {
            Ok(r) => r?,
            Err(_) => {
                return Err(AnalyticsError::EstimationFailed(format!(
                    "estimator timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };
        let est = validate(est)?;
        let result = build_result(text, est);
        debug!(
            label = result.label.as_str(),
            polarity = result.polarity,
            "scored text"
        );
        Ok(result)
    }

    /// Score every text concurrently; results come back in input order.
    /// The first failure aborts the rest of the batch.
    pub async fn score_all(&self, texts: &[String]) -> Result<Vec<SentimentResult>> {
        let mut set = JoinSet::new();
        for (idx, text) in texts.iter().enumerate() {
            let scorer = self.clone();
            let text = text.clone();
            set.spawn(async move {
                let _permit = scorer.limit.clone().acquire_owned().await;
                (idx, scorer.score(&text).await)
            });
        }

        let mut slots: Vec<Option<SentimentResult>> = vec![None; texts.len()];
        while let Some(joined) = set.join_next().await {
            let (idx, res) = joined.map_err(|e| {
                AnalyticsError::EstimationFailed(format!("scoring task failed: {e}"))
            })?;
            slots[idx] = Some(res?);
        }

        slots
            .into_iter()
            .map(|s| {
                s.ok_or_else(|| AnalyticsError::EstimationFailed("missing scoring result".into()))
            })
            .collect()
    }
}
