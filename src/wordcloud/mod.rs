// src/wordcloud/mod.rs
//! Word-cloud adapter: normalizes text and hands it to a pluggable renderer.

pub mod colors;
pub mod render;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AnalyticsError, Result};
use crate::normalize::normalize;
use crate::stopwords::stopwords;

pub use render::BlockCloudRenderer;

pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCloudOptions {
    pub width: u32,
    pub height: u32,
    pub background_color: String,
    pub max_words: usize,
    pub colormap: String,
}

impl Default for WordCloudOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background_color: "white".to_string(),
            max_words: 100,
            colormap: "viridis".to_string(),
        }
    }
}

/// Request-side options: every field optional, missing ones come from the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordCloudOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background_color: Option<String>,
    pub max_words: Option<usize>,
    pub colormap: Option<String>,
}

impl WordCloudOverrides {
    pub fn resolve(self, defaults: &WordCloudOptions) -> WordCloudOptions {
        WordCloudOptions {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            background_color: self
                .background_color
                .unwrap_or_else(|| defaults.background_color.clone()),
            max_words: self.max_words.unwrap_or(defaults.max_words),
            colormap: self.colormap.unwrap_or_else(|| defaults.colormap.clone()),
        }
    }
}

/// Renders text into PNG bytes.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        text: &str,
        options: &WordCloudOptions,
        stopwords: &HashSet<&'static str>,
    ) -> Result<Vec<u8>>;
}

pub type DynRenderer = Arc<dyn Renderer>;

#[derive(Clone)]
pub struct WordCloudAdapter {
    renderer: DynRenderer,
    defaults: WordCloudOptions,
    timeout: Duration,
}

impl WordCloudAdapter {
    pub fn new(renderer: DynRenderer, defaults: WordCloudOptions) -> Self {
        Self {
            renderer,
            defaults,
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn defaults(&self) -> &WordCloudOptions {
        &self.defaults
    }

    /// Synchronous render of one text (normalized first).
    pub fn render_png(&self, text: &str, options: &WordCloudOptions) -> Result<Vec<u8>> {
        let cleaned = normalize(text);
        self.renderer.render(&cleaned, options, stopwords())
    }

    /// Render off the async runtime, bounded by the adapter timeout; returns base64 PNG.
    pub async fn render_base64(&self, text: String, options: WordCloudOptions) -> Result<String> {
        let this = self.clone();
        let job = tokio::task::spawn_blocking(move || this.render_png(&text, &options));

        let png = match tokio::time::timeout(self.timeout, job).await {
            Ok(Ok(r)) => r?,
            Ok(Err(join)) => {
                warn!(error = %join, "render task failed");
                return Err(AnalyticsError::RenderFailed(format!("render task failed: {join}")));
            }
            Err(_) => {
                return Err(AnalyticsError::RenderFailed(format!(
                    "rendering timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        };
        debug!(bytes = png.len(), "word cloud rendered");
        Ok(base64::engine::general_purpose::STANDARD.encode(png))
    }

    /// Join raw texts with single spaces and render them as one cloud.
    pub async fn render_many_base64(
        &self,
        texts: &[String],
        options: WordCloudOptions,
    ) -> Result<String> {
        self.render_base64(texts.join(" "), options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Renderer for Echo {
        fn render(
            &self,
            text: &str,
            options: &WordCloudOptions,
            stopwords: &HashSet<&'static str>,
        ) -> Result<Vec<u8>> {
            assert!(stopwords.contains("the"));
            Ok(format!("{}|{}", options.colormap, text).into_bytes())
        }
    }

    struct Failing;

    impl Renderer for Failing {
        fn render(&self, _: &str, _: &WordCloudOptions, _: &HashSet<&'static str>) -> Result<Vec<u8>> {
            Err(AnalyticsError::RenderFailed("no canvas".into()))
        }
    }

    #[test]
    fn overrides_fill_from_defaults() {
        let o = WordCloudOverrides {
            width: Some(300),
            colormap: Some("magma".into()),
            ..Default::default()
        }
        .resolve(&WordCloudOptions::default());
        assert_eq!(o.width, 300);
        assert_eq!(o.height, 400);
        assert_eq!(o.colormap, "magma");
        assert_eq!(o.background_color, "white");
    }

    #[test]
    fn render_png_normalizes_first() {
        let a = WordCloudAdapter::new(Arc::new(Echo), WordCloudOptions::default());
        let out = a
            .render_png("hi  @bob http://x.io there", a.defaults())
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "viridis|hi there");
    }

    #[tokio::test]
    async fn base64_of_joined_texts() {
        let a = WordCloudAdapter::new(Arc::new(Echo), WordCloudOptions::default());
        let b64 = a
            .render_many_base64(&["one".into(), "two".into()], WordCloudOptions::default())
            .await
            .unwrap();
        let raw = base64::engine::general_purpose::STANDARD.decode(b64).unwrap();
        assert_eq!(raw, b"viridis|one two");
    }

    #[tokio::test]
    async fn renderer_failure_propagates() {
        let a = WordCloudAdapter::new(Arc::new(Failing), WordCloudOptions::default());
        let err = a
            .render_base64("x".into(), WordCloudOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, AnalyticsError::RenderFailed("no canvas".into()));
    }
}
