//! ==============================================================================
//! server.rs - http surface
//! ==============================================================================
//!
//! purpose:
//!     GET /?sensor=<digits>&limit=<n>
//!     validates the query, asks the feed source for readings once, and
//!     answers with a json array. every failure is a json `{"error": ...}`.
//!
//! status codes:
//!     - 400: missing/invalid sensor, non-numeric limit, limit above max
//!     - 500: upstream or decode failure
//!
//! state:
//!     `AppState` is built once from config and shared read-only behind an
//!     Arc. requests never write to it.
//!
//! ==============================================================================

use crate::config::QueryConfig;
use crate::domain::Reading;
use crate::error::{Error, ValidationError};
use crate::upstream::FeedSource;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ==============================================================================
// shared state
// ==============================================================================

pub struct AppState {
    source: Arc<dyn FeedSource>,
    sensor_pattern: Regex,
    default_limit: i64,
    max_limit: i64,
}

impl AppState {
    pub fn new(query: &QueryConfig, source: Arc<dyn FeedSource>) -> anyhow::Result<Self> {
        let sensor_pattern = Regex::new(&query.sensor_pattern).map_err(|e| {
            anyhow::anyhow!("Invalid sensor pattern '{}': {}", query.sensor_pattern, e)
        })?;

        Ok(Self {
            source,
            sensor_pattern,
            default_limit: query.default_limit,
            max_limit: query.max_limit,
        })
    }

    /// check the query and return the sensor id and effective limit
    pub fn validate(&self, params: &ReadingsQuery) -> Result<(String, i64), ValidationError> {
        let sensor_id = match params.sensor.as_deref() {
            None | Some("") => return Err(ValidationError::MissingSensor),
            Some(s) if !self.sensor_pattern.is_match(s) => {
                return Err(ValidationError::InvalidSensor)
            }
            Some(s) => s.to_string(),
        };

        let limit = match params.limit.as_deref() {
            None | Some("") => self.default_limit,
            Some(raw) => raw.parse::<i64>().map_err(|source| ValidationError::InvalidLimit {
                value: raw.to_string(),
                source,
            })?,
        };

        if limit > self.max_limit {
            return Err(ValidationError::LimitTooHigh { max: self.max_limit });
        }

        Ok((sensor_id, limit))
    }
}

// ==============================================================================
// errors
// ==============================================================================

/// json error body with the status it is sent with
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(_) | Error::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

// ==============================================================================
// routes
// ==============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ReadingsQuery {
    pub sensor: Option<String>,
    pub limit: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(readings_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /?sensor=&limit=
async fn readings_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ReadingsQuery>, QueryRejection>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let Query(params) = query?;
    let (sensor_id, limit) = state.validate(&params)?;

    let readings = state.source.fetch(&sensor_id, limit).await.map_err(|e| {
        warn!(sensor = %sensor_id, limit, "[PROXY] fetch failed: {}", e);
        e
    })?;

    info!(sensor = %sensor_id, limit, count = readings.len(), "[PROXY] served readings");
    Ok(Json(readings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamError;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// serves up to `available` readings and records how it was called
    struct StubFeed {
        available: usize,
        fail: bool,
        calls: AtomicUsize,
        last_limit: AtomicI64,
    }

    impl StubFeed {
        fn with(available: usize) -> Arc<Self> {
            Arc::new(Self {
                available,
                fail: false,
                calls: AtomicUsize::new(0),
                last_limit: AtomicI64::new(-1),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                available: 0,
                fail: true,
                calls: AtomicUsize::new(0),
                last_limit: AtomicI64::new(-1),
            })
        }
    }

    #[async_trait]
    impl FeedSource for StubFeed {
        async fn fetch(&self, sensor_id: &str, limit: i64) -> crate::error::Result<Vec<Reading>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_limit.store(limit, Ordering::SeqCst);
            if self.fail {
                let bad = serde_json::from_str::<Vec<u8>>("<html>").unwrap_err();
                return Err(UpstreamError::Payload(bad).into());
            }

            let count = self.available.min(limit.max(0) as usize);
            let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
            Ok((0..count).map(|_| Reading::at(sensor_id, date)).collect())
        }
    }

    async fn call(feed: Arc<StubFeed>, uri: &str) -> (StatusCode, String, serde_json::Value) {
        let state = AppState::new(&QueryConfig::default(), feed).unwrap();
        let response = router(Arc::new(state))
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn returns_the_upstream_readings() {
        let feed = StubFeed::with(5);
        let (status, content_type, body) = call(feed.clone(), "/?sensor=242&limit=5").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        let readings = body.as_array().unwrap();
        assert_eq!(readings.len(), 5);
        assert!(readings.iter().all(|r| r["sensor_id"] == "242"));
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
        assert_eq!(feed.last_limit.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn length_follows_upstream_not_limit() {
        let (status, _, body) = call(StubFeed::with(3), "/?sensor=242&limit=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn limit_defaults_to_50() {
        let feed = StubFeed::with(80);
        let (status, _, body) = call(feed.clone(), "/?sensor=242").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 50);
        assert_eq!(feed.last_limit.load(Ordering::SeqCst), 50);

        call(feed.clone(), "/?sensor=242&limit=").await;
        assert_eq!(feed.last_limit.load(Ordering::SeqCst), 50);
    }

    #[tokio::test]
    async fn zero_limit_is_passed_through() {
        let feed = StubFeed::with(5);
        let (status, _, body) = call(feed.clone(), "/?sensor=242&limit=0").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
        assert_eq!(feed.last_limit.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn limit_above_max_is_rejected() {
        let feed = StubFeed::with(5);
        let (status, content_type, body) = call(feed.clone(), "/?sensor=242&limit=101").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/json");
        assert_eq!(body, serde_json::json!({"error": "maximum allowed number of items is 100"}));
        assert_eq!(feed.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_sensor_is_rejected() {
        for uri in ["/?limit=5", "/?sensor=&limit=5", "/"] {
            let (status, _, body) = call(StubFeed::with(5), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], "missing sensor ID");
        }
    }

    #[tokio::test]
    async fn non_numeric_sensor_is_rejected() {
        for uri in ["/?sensor=three", "/?sensor=12a&limit=5", "/?sensor=-4"] {
            let (status, _, body) = call(StubFeed::with(5), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], "sensor ID must be numeric");
        }
    }

    #[tokio::test]
    async fn non_numeric_limit_is_rejected() {
        let (status, _, body) = call(StubFeed::with(5), "/?sensor=242&limit=yes").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("yes is not a number ("));
    }

    #[tokio::test]
    async fn upstream_failure_is_a_500() {
        let feed = StubFeed::failing();
        let (status, content_type, body) = call(feed.clone(), "/?sensor=242&limit=5").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type, "application/json");
        assert!(body["error"].as_str().unwrap().starts_with("error unmarshaling data"));
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_sensor_pattern_fails_construction() {
        let query = QueryConfig {
            sensor_pattern: "([0-9".to_string(),
            ..QueryConfig::default()
        };
        assert!(AppState::new(&query, StubFeed::with(0)).is_err());
    }

    #[test]
    fn validation_checks_sensor_before_limit() {
        let state = AppState::new(&QueryConfig::default(), StubFeed::with(0)).unwrap();
        let params = ReadingsQuery {
            sensor: Some("abc".into()),
            limit: Some("500".into()),
        };
        assert!(matches!(state.validate(&params), Err(ValidationError::InvalidSensor)));

        let params = ReadingsQuery {
            sensor: Some("242".into()),
            limit: Some("-3".into()),
        };
        assert_eq!(state.validate(&params).unwrap(), ("242".to_string(), -3));
    }
}
