// src/config/mod.rs
//! Service configuration loaded from TOML with env overrides.
//!
//! Resolution order for the file:
//! 1) $ANALYTICS_CONFIG_PATH (must exist)
//! 2) config/analytics.toml (optional)
//! 3) built-in defaults
//!
//! Env overrides are applied last: ANALYTICS_ESTIMATOR, ANALYTICS_ESTIMATOR_URL,
//! ANALYTICS_ESTIMATOR_TIMEOUT_MS, ANALYTICS_CORS_ORIGINS (comma-separated).

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::wordcloud::WordCloudOptions;

pub const DEFAULT_CONFIG_PATH: &str = "config/analytics.toml";
pub const ENV_CONFIG_PATH: &str = "ANALYTICS_CONFIG_PATH";
pub const ENV_ESTIMATOR: &str = "ANALYTICS_ESTIMATOR";
pub const ENV_ESTIMATOR_URL: &str = "ANALYTICS_ESTIMATOR_URL";
pub const ENV_ESTIMATOR_TIMEOUT_MS: &str = "ANALYTICS_ESTIMATOR_TIMEOUT_MS";
pub const ENV_CORS_ORIGINS: &str = "ANALYTICS_CORS_ORIGINS";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub estimator: EstimatorConfig,
    pub wordcloud: WordCloudConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allowed CORS origins. Empty means permissive.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    Lexicon,
    Remote,
}

impl std::str::FromStr for EstimatorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lexicon" => Ok(EstimatorKind::Lexicon),
            "remote" => Ok(EstimatorKind::Remote),
            other => Err(anyhow!("unsupported estimator kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub kind: EstimatorKind,
    /// Endpoint for `kind = "remote"`.
    pub url: Option<String>,
    pub timeout_ms: u64,
    /// 0 disables the cache.
    pub cache_capacity: usize,
    pub max_concurrency: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            kind: EstimatorKind::Lexicon,
            url: None,
            timeout_ms: 5_000,
            cache_capacity: 1_024,
            max_concurrency: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WordCloudConfig {
    pub width: u32,
    pub height: u32,
    pub background_color: String,
    pub max_words: usize,
    pub colormap: String,
    pub timeout_ms: u64,
}

impl Default for WordCloudConfig {
    fn default() -> Self {
        let o = WordCloudOptions::default();
        Self {
            width: o.width,
            height: o.height,
            background_color: o.background_color,
            max_words: o.max_words,
            colormap: o.colormap,
            timeout_ms: 10_000,
        }
    }
}

impl WordCloudConfig {
    pub fn options(&self) -> WordCloudOptions {
        WordCloudOptions {
            width: self.width,
            height: self.height,
            background_color: self.background_color.clone(),
            max_words: self.max_words,
            colormap: self.colormap.clone(),
        }
    }
}

impl AppConfig {
    /// Parse from a TOML string (no env overrides).
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s)?;
        cfg.fix_zero_timeouts();
        Ok(cfg)
    }

    /// A zero timeout would fail every call; fall back to the default instead.
    fn fix_zero_timeouts(&mut self) {
        if self.estimator.timeout_ms == 0 {
            let fallback = EstimatorConfig::default().timeout_ms;
            warn!(fallback, "estimator.timeout_ms = 0, using default");
            self.estimator.timeout_ms = fallback;
        }
        if self.wordcloud.timeout_ms == 0 {
            let fallback = WordCloudConfig::default().timeout_ms;
            warn!(fallback, "wordcloud.timeout_ms = 0, using default");
            self.wordcloud.timeout_ms = fallback;
        }
    }

    /// Load from an explicit path (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading analytics config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing analytics config at {}", path.display()))
    }

    /// Resolve the config file, then apply env overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(kind) = std::env::var(ENV_ESTIMATOR) {
            self.estimator.kind = kind.parse()?;
        }
        if let Ok(url) = std::env::var(ENV_ESTIMATOR_URL) {
            let url = url.trim();
            if !url.is_empty() {
                self.estimator.url = Some(url.to_string());
            }
        }
        if let Some(ms) = parse_ms_env(std::env::var(ENV_ESTIMATOR_TIMEOUT_MS).ok()) {
            self.estimator.timeout_ms = ms;
        }
        if let Ok(raw) = std::env::var(ENV_CORS_ORIGINS) {
            self.server.cors_origins = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }
}

// positive integer milliseconds; anything else is ignored
fn parse_ms_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [estimator]
            kind = "remote"
            url = "http://127.0.0.1:8002/estimate"

            [wordcloud]
            colormap = "plasma"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.estimator.kind, EstimatorKind::Remote);
        assert_eq!(cfg.estimator.timeout_ms, 5_000);
        assert_eq!(cfg.wordcloud.width, 800);
        assert_eq!(cfg.wordcloud.colormap, "plasma");
        assert_eq!(cfg.server.cors_origins.len(), 2);
    }

    #[test]
    fn rejects_unknown_estimator_kind() {
        assert!(AppConfig::from_toml_str("[estimator]\nkind = \"magic\"").is_err());
        assert!("magic".parse::<EstimatorKind>().is_err());
        assert_eq!(
            " Lexicon ".parse::<EstimatorKind>().unwrap(),
            EstimatorKind::Lexicon
        );
    }

    #[test]
    fn zero_timeouts_fall_back_to_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [estimator]
            timeout_ms = 0

            [wordcloud]
            timeout_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.estimator.timeout_ms, 5_000);
        assert_eq!(cfg.wordcloud.timeout_ms, 10_000);

        let cfg = AppConfig::from_toml_str("[wordcloud]\ntimeout_ms = 250").unwrap();
        assert_eq!(cfg.wordcloud.timeout_ms, 250);
    }

    #[test]
    fn timeout_env_parsing() {
        assert_eq!(parse_ms_env(Some("250".into())), Some(250));
        assert_eq!(parse_ms_env(Some("0".into())), None);
        assert_eq!(parse_ms_env(Some("abc".into())), None);
        assert_eq!(parse_ms_env(None), None);
    }
}
