// src/estimator/mod.rs
//! Polarity/subjectivity estimator boundary.
//!
//! The scorer only sees `dyn Estimator`; the concrete backend is picked from config:
//! a built-in lexicon (default) or a remote HTTP endpoint, optionally behind a cache.

pub mod cache;
pub mod lexicon;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::{EstimatorConfig, EstimatorKind};
use crate::error::Result;

pub use cache::CachingEstimator;
pub use lexicon::LexiconEstimator;
pub use remote::RemoteEstimator;

/// Raw estimator output: polarity in [-1,1], subjectivity in [0,1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub polarity: f64,
    pub subjectivity: f64,
}

impl Estimate {
    pub fn new(polarity: f64, subjectivity: f64) -> Self {
        Self {
            polarity,
            subjectivity,
        }
    }
}

/// Deterministic text → (polarity, subjectivity) function.
#[async_trait]
pub trait Estimator: Send + Sync {
    async fn estimate(&self, text: &str) -> Result<Estimate>;
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynEstimator = Arc<dyn Estimator>;

/// Factory: build the configured backend, wrapped with a cache when `cache_capacity > 0`.
pub fn build_estimator(cfg: &EstimatorConfig) -> anyhow::Result<DynEstimator> {
    let est: DynEstimator = match cfg.kind {
        EstimatorKind::Lexicon => wrap_cache(LexiconEstimator::new(), cfg.cache_capacity),
        EstimatorKind::Remote => {
            let url = cfg
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("estimator kind 'remote' requires a url"))?;
            let remote = RemoteEstimator::new(url, Duration::from_millis(cfg.timeout_ms))?;
            wrap_cache(remote, cfg.cache_capacity)
        }
    };
    info!(
        estimator = est.name(),
        cache_capacity = cfg.cache_capacity,
        "estimator ready"
    );
    Ok(est)
}

fn wrap_cache<E: Estimator + 'static>(inner: E, capacity: usize) -> DynEstimator {
    if capacity == 0 {
        Arc::new(inner)
    } else {
        Arc::new(CachingEstimator::new(inner, capacity))
    }
}
