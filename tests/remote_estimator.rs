// tests/remote_estimator.rs
//
// RemoteEstimator against an in-process HTTP stub bound to an ephemeral port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use text_analytics::estimator::{CachingEstimator, Estimator, RemoteEstimator};
use text_analytics::{AnalyticsError, SentimentLabel, SentimentScorer};

async fn spawn_stub() -> SocketAddr {
    async fn estimate(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let text = body["text"].as_str().unwrap_or_default();
        match text {
            "" => (StatusCode::OK, json!({ "polarity": 0.0, "subjectivity": 0.0 }).into()),
            t if t.contains("down") => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "detail": "down" }).into(),
            ),
            t if t.contains("garbage") => (StatusCode::OK, json!({ "nope": 1 }).into()),
            t if t.contains("slow") => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                (StatusCode::OK, json!({ "polarity": 0.0, "subjectivity": 0.0 }).into())
            }
            _ => (StatusCode::OK, json!({ "polarity": 0.6, "subjectivity": 0.9 }).into()),
        }
    }

    let app = Router::new().route("/estimate", post(estimate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn remote(addr: SocketAddr, timeout: Duration) -> RemoteEstimator {
    RemoteEstimator::new(&format!("http://{addr}/estimate"), timeout).unwrap()
}

#[tokio::test]
async fn scores_through_the_remote_endpoint() {
    let addr = spawn_stub().await;
    let scorer = SentimentScorer::new(Arc::new(remote(addr, Duration::from_secs(2))));
    let r = scorer.score("nice place @agent").await.unwrap();
    assert_eq!(r.label, SentimentLabel::Positive);
    assert_eq!(r.polarity, 0.6);
    assert_eq!(r.subjectivity, 0.9);
}

#[tokio::test]
async fn http_error_status_is_estimation_failure() {
    let addr = spawn_stub().await;
    let est = remote(addr, Duration::from_secs(2));
    match est.estimate("service down").await {
        Err(AnalyticsError::EstimationFailed(msg)) => assert!(msg.contains("503"), "{msg}"),
        other => panic!("expected EstimationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_estimation_failure() {
    let addr = spawn_stub().await;
    let est = remote(addr, Duration::from_secs(2));
    assert!(matches!(
        est.estimate("garbage please").await,
        Err(AnalyticsError::EstimationFailed(_))
    ));
}

#[tokio::test]
async fn scorer_timeout_bounds_slow_endpoint() {
    let addr = spawn_stub().await;
    let scorer = SentimentScorer::new(Arc::new(remote(addr, Duration::from_secs(5))))
        .with_timeout(Duration::from_millis(100));
    let err = scorer.score("slow one").await.unwrap_err();
    assert!(matches!(err, AnalyticsError::EstimationFailed(m) if m.contains("timed out")));
}

#[tokio::test]
async fn cache_wrapper_keeps_backend_name() {
    let addr = spawn_stub().await;
    let cached = CachingEstimator::new(remote(addr, Duration::from_secs(2)), 4);
    assert_eq!(cached.name(), "remote");
    let a = cached.estimate("nice").await.unwrap();
    let b = cached.estimate("nice").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(cached.len(), 1);
}
