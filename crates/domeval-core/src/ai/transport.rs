//! Transport seam between the stream engine and the wire
//!
//! The engine only needs two things from the outside world: a pull-based
//! stream of decoded byte chunks, and a one-shot request/response round trip.
//! Both live behind [`Transport`] so tests can script the wire without a
//! network.

use std::pin::Pin;

use anyhow::Result;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Chunk stream handed to the read loop. Ends with `None` on exhaustion.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Failures surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("API request failed: {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Issue the request and return the response body as a chunk stream.
    async fn open_stream(&self, body: &Value) -> Result<ByteStream>;

    /// Issue the request and return the parsed JSON response.
    async fn complete(&self, body: &Value) -> Result<Value>;
}

/// Production transport over reqwest with bearer auth.
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        debug!("POST {}", self.api_url);
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body }.into());
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn open_stream(&self, body: &Value) -> Result<ByteStream> {
        let response = self.send(body).await?;
        Ok(Box::pin(response.bytes_stream().map_err(anyhow::Error::from)))
    }

    async fn complete(&self, body: &Value) -> Result<Value> {
        let response = self.send(body).await?;
        Ok(response.json().await?)
    }
}
