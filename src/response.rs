//! HTTP response wrapper
//!
//! Wraps the transport response with a lazily-read, cached body. The
//! transport stream is consumed on the first read and never touched again;
//! every later read serves the cache.

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Version};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::Error;

/// A received HTTP response
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: Url,
    raw: Option<reqwest::Response>,
    body: Option<Bytes>,
    received_at: SystemTime,
    elapsed: Duration,
}

impl Response {
    pub(crate) fn new(raw: reqwest::Response, elapsed: Duration) -> Self {
        Self {
            status: raw.status(),
            version: raw.version(),
            headers: raw.headers().clone(),
            url: raw.url().clone(),
            raw: Some(raw),
            body: None,
            received_at: SystemTime::now(),
            elapsed,
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status())
    }

    /// HTTP version the response arrived over
    pub fn version(&self) -> Version {
        self.version
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL the response came from (after redirects)
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Wall-clock time the response headers arrived
    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }

    /// Time from dispatch to response headers
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Read the body, caching it on first call.
    ///
    /// The first call drains and closes the transport stream; subsequent
    /// calls return the cached bytes without touching the transport. An
    /// empty body caches as empty and stays idempotent.
    pub async fn read_body(&mut self) -> Result<Bytes, Error> {
        if let Some(cached) = &self.body {
            return Ok(cached.clone());
        }

        let raw = self.raw.take().ok_or(Error::NoResponse)?;
        let bytes = raw.bytes().await.map_err(|e| Error::Read(e.to_string()))?;
        self.body = Some(bytes.clone());
        Ok(bytes)
    }

    /// Read the body as UTF-8 text
    pub async fn text(&mut self) -> Result<String, Error> {
        let body = self.read_body().await?;
        String::from_utf8(body.to_vec()).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Read the body and JSON-decode it into `T`
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, Error> {
        let body = self.read_body().await?;
        serde_json::from_slice(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}

// Response construction needs a live transport response, so behavior tests
// live in tests/integration.rs against mockito.
