//! HTTP client wrapper
//!
//! A [`Client`] holds transport configuration, fixed at build time, and
//! drives a request through encode, finalize and dispatch. The underlying
//! reqwest client never follows redirects itself; [`Client::send`] owns the
//! redirect chase so the original method and body are re-sent to every hop.

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE, LOCATION, USER_AGENT};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::address;
use crate::error::Error;
use crate::request::{Cookie, Method, Request};
use crate::response::Response;

/// Client name reported in the default `User-Agent`
pub const CLIENT_NAME: &str = "tinyreq";
/// Client version reported in the default `User-Agent`
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_USER_AGENT: &str = concat!("tinyreq/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: usize = 10;

/// HTTP client with immutable configuration
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    timeout: Duration,
    cookies: Vec<Cookie>,
    cancel: Option<CancellationToken>,
    debug: bool,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a client with default settings: 15 second timeout, strict TLS
    /// verification, no cancellation, debug off.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, as
    /// `reqwest::Client::new` does. Use [`Client::builder`] to handle the
    /// failure instead.
    pub fn new() -> Self {
        ClientBuilder::default()
            .build()
            .expect("default client configuration should build")
    }

    /// Create a client builder
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Start a request with an explicit method
    pub fn request(&self, method: Method, address: impl Into<String>) -> Request {
        Request::new(method, address)
    }

    /// Start a GET request
    pub fn get(&self, address: impl Into<String>) -> Request {
        Request::new(Method::Get, address)
    }

    /// Start a POST request
    pub fn post(&self, address: impl Into<String>) -> Request {
        Request::new(Method::Post, address)
    }

    /// Start a PUT request
    pub fn put(&self, address: impl Into<String>) -> Request {
        Request::new(Method::Put, address)
    }

    /// Start a PATCH request
    pub fn patch(&self, address: impl Into<String>) -> Request {
        Request::new(Method::Patch, address)
    }

    /// Start a DELETE request
    pub fn delete(&self, address: impl Into<String>) -> Request {
        Request::new(Method::Delete, address)
    }

    /// Send a request and wrap the transport's answer.
    ///
    /// The request's body is resolved into an immutable byte buffer exactly
    /// once; re-sending the same request reuses that buffer. Enabling debug
    /// mode eagerly reads the response body for the dump, which changes when
    /// the body is materialized but never its content.
    pub async fn send(&self, request: &mut Request) -> Result<Response, Error> {
        if let Some(err) = request.deferred_error.take() {
            tracing::error!("request construction failed: {err}");
            return Err(err);
        }

        request
            .resolve_body()
            .await
            .inspect_err(|err| tracing::error!("body encoding failed: {err}"))?;

        let wire = self
            .finalize(request)
            .inspect_err(|err| tracing::error!("request finalization failed: {err}"))?;

        if wire.content_length() > 0 && !wire.can_replay() {
            tracing::error!("non-empty body finalized without a replay buffer");
            return Err(Error::MissingReplay);
        }

        if self.debug {
            self.log_request(&wire)?;
        }

        let started = request.sent_at.unwrap_or_else(Instant::now);
        let raw = self
            .dispatch_guarded(&wire)
            .await
            .inspect_err(|err| tracing::error!("dispatch failed: {err}"))?;

        let mut response = Response::new(raw, started.elapsed());

        if self.debug {
            self.log_response(&mut response).await?;
        }

        Ok(response)
    }

    /// Build the wire request: resolved URL, merged headers, cookie line,
    /// attached body bytes.
    fn finalize(&self, request: &mut Request) -> Result<WireRequest, Error> {
        request.sent_at = Some(Instant::now());

        let url = address::resolve(&request.address, request.use_ssl, &request.query_params)?;

        let mut headers = HeaderMap::new();
        for (key, value) in &request.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("{key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeader(format!("{key}: {e}")))?;
            headers.insert(name, value);
        }

        if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        }

        // client cookies first, then request cookies; servers with
        // first-seen semantics rely on this order
        let cookie_line = self
            .cookies
            .iter()
            .chain(request.cookies.iter())
            .map(Cookie::pair)
            .collect::<Vec<_>>()
            .join("; ");
        if !cookie_line.is_empty() {
            let merged = match headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
                Some(existing) if !existing.is_empty() => format!("{existing}; {cookie_line}"),
                _ => cookie_line,
            };
            let value = HeaderValue::from_str(&merged)
                .map_err(|e| Error::InvalidHeader(format!("Cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        Ok(WireRequest {
            method: request.method.into(),
            url,
            headers,
            // zero resolved bytes need no wire payload and no replay buffer
            body: request.resolved.clone().filter(|b| !b.is_empty()),
        })
    }

    /// Dispatch under the whole-round-trip deadline and the optional
    /// cancellation token.
    async fn dispatch_guarded(&self, wire: &WireRequest) -> Result<reqwest::Response, Error> {
        let deadline = tokio::time::timeout(self.timeout, self.dispatch(wire));

        match &self.cancel {
            Some(cancel) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    outcome = deadline => outcome.map_err(|_| Error::Timeout)?,
                }
            }
            None => deadline.await.map_err(|_| Error::Timeout)?,
        }
    }

    /// One transport attempt per redirect hop, each with a fresh view over
    /// the resolved body bytes.
    async fn dispatch(&self, wire: &WireRequest) -> Result<reqwest::Response, Error> {
        let mut url = wire.url.clone();

        for _ in 0..=MAX_REDIRECTS {
            let mut builder = self
                .http
                .request(wire.method.clone(), url.clone())
                .headers(wire.headers.clone());
            if let Some(body) = &wire.body {
                builder = builder.body(body.clone());
            }

            let response = builder.send().await.map_err(Error::from)?;

            match redirect_target(&response, &url) {
                Some(next) => {
                    tracing::debug!("following {} redirect to {}", response.status(), next);
                    url = next;
                }
                None => return Ok(response),
            }
        }

        Err(Error::TooManyRedirects(MAX_REDIRECTS))
    }

    fn log_request(&self, wire: &WireRequest) -> Result<(), Error> {
        let headers = headers_to_json(&wire.headers)?;
        let body = wire
            .body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();

        tracing::info!(
            "\n~~~ HTTP REQUEST ~~~\n{} {}\nHOST   : {}\nHEADERS: {}\nBODY   : {}",
            wire.method,
            wire.url,
            wire.url.host_str().unwrap_or(""),
            headers,
            body,
        );
        Ok(())
    }

    async fn log_response(&self, response: &mut Response) -> Result<(), Error> {
        let headers = headers_to_json(response.headers())?;
        let body = response.read_body().await?;

        tracing::info!(
            "\n~~~ HTTP RESPONSE ~~~\nSTATUS       : {}\nPROTO        : {:?}\nRECEIVED AT  : {:?}\nTIME DURATION: {:?}\nRESPONSE BODY: {}\nHEADERS: {}",
            response.status(),
            response.version(),
            response.received_at(),
            response.elapsed(),
            String::from_utf8_lossy(&body),
            headers,
        );
        Ok(())
    }
}

/// Builder for [`Client`] configuration
#[derive(Debug)]
pub struct ClientBuilder {
    timeout: Duration,
    accept_invalid_certs: bool,
    debug: bool,
    cancel: Option<CancellationToken>,
    cookies: Vec<Cookie>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
            debug: false,
            cancel: None,
            cookies: Vec::new(),
        }
    }
}

impl ClientBuilder {
    /// Deadline for a whole round trip, redirect hops included
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Accept invalid TLS certificates. Verification is strict unless this
    /// is explicitly set.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Dump every request and response through `tracing::info!`
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Bind a cancellation token; firing it aborts in-flight sends
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Attach a cookie sent with every request, before request-level cookies
    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Attach several client-level cookies in order
    pub fn cookies<I>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = Cookie>,
    {
        self.cookies.extend(cookies);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<Client, Error> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(|e| Error::Build(e.to_string()))?;

        Ok(Client {
            http,
            timeout: self.timeout,
            cookies: self.cookies,
            cancel: self.cancel,
            debug: self.debug,
        })
    }
}

/// A transport-ready request: resolved URL, merged headers, immutable body
/// bytes. Cloning the buffer hands the transport a fresh view per attempt.
#[derive(Debug, Clone)]
struct WireRequest {
    method: reqwest::Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl WireRequest {
    fn content_length(&self) -> usize {
        self.body.as_ref().map_or(0, |b| b.len())
    }

    fn can_replay(&self) -> bool {
        self.body.is_some()
    }
}

/// The hop target for a redirect response, resolved against the current
/// URL. `None` for non-redirect statuses and for redirects without a usable
/// `Location` header, which are final.
fn redirect_target(response: &reqwest::Response, current: &Url) -> Option<Url> {
    if !matches!(response.status().as_u16(), 301 | 302 | 303 | 307 | 308) {
        return None;
    }
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

fn headers_to_json(headers: &HeaderMap) -> Result<String, Error> {
    let mut map = serde_json::Map::new();
    for (name, value) in headers {
        map.insert(
            name.to_string(),
            serde_json::Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
        );
    }
    serde_json::to_string(&map).map_err(|e| Error::Encode(e.to_string()))
}
