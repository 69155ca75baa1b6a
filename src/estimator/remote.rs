// src/estimator/remote.rs
//! Remote estimator: POST `{"text": ...}` → `{"polarity": f, "subjectivity": f}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Estimate, Estimator};
use crate::error::{AnalyticsError, Result};

pub struct RemoteEstimator {
    http: reqwest::Client,
    url: String,
}

impl RemoteEstimator {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("text-analytics/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4).min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("building estimator http client: {e}"))?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Serialize)]
struct Req<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct Resp {
    polarity: f64,
    subjectivity: f64,
}

#[async_trait]
impl Estimator for RemoteEstimator {
    async fn estimate(&self, text: &str) -> Result<Estimate> {
        let resp = self
            .http
            .post(&self.url)
            .json(&Req { text })
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "estimator request failed");
                AnalyticsError::EstimationFailed(format!("request to estimator failed: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AnalyticsError::EstimationFailed(format!(
                "estimator returned HTTP {status}"
            )));
        }

        let body: Resp = resp.json().await.map_err(|e| {
            AnalyticsError::EstimationFailed(format!("invalid estimator response: {e}"))
        })?;
        Ok(Estimate::new(body.polarity, body.subjectivity))
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_estimation_failure() {
        // Port 9 (discard) on localhost is closed in test environments.
        let est = RemoteEstimator::new("http://127.0.0.1:9/estimate", Duration::from_millis(500))
            .unwrap();
        assert_eq!(est.url(), "http://127.0.0.1:9/estimate");
        match est.estimate("hello").await {
            Err(AnalyticsError::EstimationFailed(msg)) => assert!(msg.contains("estimator")),
            other => panic!("expected EstimationFailed, got {other:?}"),
        }
    }
}
