// src/api.rs
//! HTTP surface: sentiment, word-cloud and complete-analysis endpoints.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{debug, warn};

use crate::aggregate::{aggregate, WordCount};
use crate::error::AnalyticsError;
use crate::metrics::{ERRORS_TOTAL, REQUESTS_TOTAL, REQUEST_DURATION_MS, TEXTS_SCORED_TOTAL};
use crate::sentiment::{SentimentLabel, SentimentResult, SentimentScorer};
use crate::wordcloud::{WordCloudAdapter, WordCloudOverrides};

#[derive(Clone)]
pub struct AppState {
    pub scorer: SentimentScorer,
    pub wordcloud: WordCloudAdapter,
}

/// Build the API router. An empty `cors_origins` list, or one containing `*`, means
/// permissive CORS.
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "OK" }))
        .route("/analyze/sentiment", post(analyze_sentiment))
        .route("/analyze/sentiment/bulk", post(analyze_sentiment_bulk))
        .route("/analyze/complete", post(analyze_complete))
        .route("/generate/wordcloud", post(generate_wordcloud))
        .route("/generate/wordcloud/bulk", post(generate_wordcloud_bulk))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    // AllowOrigin::list panics on a wildcard entry
    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return CorsLayer::very_permissive();
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Short anonymized id for logs; raw text is never logged.
pub(crate) fn anon_id(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/* ----------------------------
Errors
---------------------------- */

#[derive(Debug)]
pub struct ApiError(pub AnalyticsError);

impl From<AnalyticsError> for ApiError {
    fn from(e: AnalyticsError) -> Self {
        ApiError(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AnalyticsError::EmptyBatch => StatusCode::BAD_REQUEST,
            AnalyticsError::EstimationFailed(_) => StatusCode::BAD_GATEWAY,
            AnalyticsError::RenderFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        counter!(ERRORS_TOTAL, "kind" => self.0.kind()).increment(1);
        warn!(kind = self.0.kind(), error = %self.0, "request failed");
        (
            status,
            Json(ErrorBody {
                detail: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn observe(endpoint: &'static str, started: Instant) {
    counter!(REQUESTS_TOTAL, "endpoint" => endpoint).increment(1);
    histogram!(REQUEST_DURATION_MS, "endpoint" => endpoint)
        .record(started.elapsed().as_secs_f64() * 1_000.0);
}

/* ----------------------------
Request / response shapes
---------------------------- */

// A client-sent `language` field is ignored like any other unknown key.
#[derive(Deserialize)]
struct TextInput {
    text: String,
}

#[derive(Deserialize)]
struct TextsInput {
    texts: Vec<String>,
}

#[derive(Deserialize)]
struct WordCloudInput {
    text: String,
    #[serde(default)]
    config: Option<WordCloudOverrides>,
}

#[derive(Deserialize)]
struct BulkWordCloudInput {
    texts: Vec<String>,
    #[serde(default)]
    config: Option<WordCloudOverrides>,
}

#[derive(Serialize)]
struct RootResp {
    message: &'static str,
    status: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct WordCloudResp {
    word_cloud_base64: String,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_texts: Option<usize>,
    timestamp: String,
}

#[derive(Serialize)]
struct CompleteResp {
    sentiment_distribution: BTreeMap<SentimentLabel, usize>,
    average_sentiment: f64,
    total_texts: usize,
    most_common_words: Vec<WordCount>,
    word_cloud_base64: String,
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

/* ----------------------------
Handlers
---------------------------- */

async fn root() -> Json<RootResp> {
    Json(RootResp {
        message: "Text Analytics API",
        status: "healthy",
        timestamp: now_iso(),
    })
}

async fn analyze_sentiment(
    State(state): State<AppState>,
    Json(body): Json<TextInput>,
) -> Result<Json<SentimentResult>, ApiError> {
    let started = Instant::now();
    debug!(id = %anon_id(&body.text), "analyze sentiment");
    let res = state.scorer.score(&body.text).await;
    observe("analyze_sentiment", started);
    let res = res?;
    counter!(TEXTS_SCORED_TOTAL).increment(1);
    Ok(Json(res))
}

async fn analyze_sentiment_bulk(
    State(state): State<AppState>,
    Json(body): Json<TextsInput>,
) -> Result<Json<Vec<SentimentResult>>, ApiError> {
    let started = Instant::now();
    let res = state.scorer.score_all(&body.texts).await;
    observe("analyze_sentiment_bulk", started);
    let res = res?;
    counter!(TEXTS_SCORED_TOTAL).increment(res.len() as u64);
    Ok(Json(res))
}

async fn generate_wordcloud(
    State(state): State<AppState>,
    Json(body): Json<WordCloudInput>,
) -> Result<Json<WordCloudResp>, ApiError> {
    let started = Instant::now();
    let opts = body
        .config
        .unwrap_or_default()
        .resolve(state.wordcloud.defaults());
    let res = state.wordcloud.render_base64(body.text, opts).await;
    observe("generate_wordcloud", started);
    Ok(Json(WordCloudResp {
        word_cloud_base64: res?,
        format: "png",
        total_texts: None,
        timestamp: now_iso(),
    }))
}

async fn generate_wordcloud_bulk(
    State(state): State<AppState>,
    Json(body): Json<BulkWordCloudInput>,
) -> Result<Json<WordCloudResp>, ApiError> {
    let started = Instant::now();
    let opts = body
        .config
        .unwrap_or_default()
        .resolve(state.wordcloud.defaults());
    let res = state.wordcloud.render_many_base64(&body.texts, opts).await;
    observe("generate_wordcloud_bulk", started);
    Ok(Json(WordCloudResp {
        word_cloud_base64: res?,
        format: "png",
        total_texts: Some(body.texts.len()),
        timestamp: now_iso(),
    }))
}

async fn analyze_complete(
    State(state): State<AppState>,
    Json(body): Json<TextsInput>,
) -> Result<Json<CompleteResp>, ApiError> {
    let started = Instant::now();
    let out = complete(&state, &body.texts).await;
    observe("analyze_complete", started);
    Ok(Json(out?))
}

async fn complete(state: &AppState, texts: &[String]) -> Result<CompleteResp, AnalyticsError> {
    let analysis = aggregate(&state.scorer, texts).await?;
    counter!(TEXTS_SCORED_TOTAL).increment(analysis.total_texts as u64);

    let opts = state.wordcloud.defaults().clone();
    let cloud = state.wordcloud.render_many_base64(texts, opts).await?;

    Ok(CompleteResp {
        sentiment_distribution: analysis.distribution,
        average_sentiment: analysis.average_compound,
        total_texts: analysis.total_texts,
        most_common_words: analysis.top_words,
        word_cloud_base64: cloud,
    })
}
