//! ==============================================================================
//! upstream.rs - remote sensor feed access
//! ==============================================================================
//!
//! purpose:
//!     provides a single interface for "give me readings for sensor X".
//!     the server only sees the `FeedSource` trait; `HttpFeed` is the real
//!     implementation and tests plug in their own.
//!
//! relationships:
//!     - used by: server.rs (one fetch per request)
//!     - uses: feed.rs (json body), html/ (legacy html body)
//!     - uses: reqwest (outbound http, bounded by the configured timeout)
//!
//! cancellation:
//!     the fetch is a plain future. when axum drops the handler because the
//!     client went away, the in-flight request is dropped with it.
//!
//! ==============================================================================

use crate::config::{FeedFormat, UpstreamConfig};
use crate::domain::Reading;
use crate::error::{Result, UpstreamError};
use crate::{feed, html};

use async_trait::async_trait;
use tracing::debug;

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// fetch and decode the most recent `limit` readings of `sensor_id`
    async fn fetch(&self, sensor_id: &str, limit: i64) -> Result<Vec<Reading>>;
}

/// fetches readings over http and decodes them per the configured format
#[derive(Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HttpFeed {
    pub fn new(config: UpstreamConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, UpstreamError> {
        let request_error = |source| UpstreamError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    async fn fetch(&self, sensor_id: &str, limit: i64) -> Result<Vec<Reading>> {
        let url = self.config.url_for(sensor_id, limit);
        debug!(%url, format = ?self.config.format, "[UPSTREAM] fetching");

        let response = self.get(&url).await?;
        let body = response.bytes().await.map_err(|source| UpstreamError::Request {
            url: url.clone(),
            source,
        })?;

        let readings = match self.config.format {
            FeedFormat::Json => {
                let records: Vec<feed::FeedRecord> =
                    serde_json::from_slice(&body).map_err(UpstreamError::from)?;
                feed::decode_records(&records)?
            }
            FeedFormat::Html => html::decode_html(&String::from_utf8_lossy(&body)),
        };

        debug!(%url, count = readings.len(), "[UPSTREAM] decoded readings");
        Ok(readings)
    }
}
