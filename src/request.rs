//! HTTP request builder
//!
//! A [`Request`] is a mutable value object assembled through chained setters
//! and consumed by [`crate::Client::send`]. Setter failures (an unencodable
//! JSON body) are deferred and surface once, at send time.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;

use crate::body::{self, Body, CONTENT_TYPE, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::error::Error;

/// Supported HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl Method {
    /// Wire name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// A cookie attached to a request or a client.
///
/// Only the `name=value` pair reaches the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
}

impl Cookie {
    /// Create a cookie from a name/value pair
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Cookie name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cookie value
    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// A buildable HTTP request
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) address: String,
    pub(crate) use_ssl: bool,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) query_params: HashMap<String, String>,
    pub(crate) form_data: Vec<(String, String)>,
    pub(crate) cookies: Vec<Cookie>,
    pub(crate) body: Option<Body>,
    pub(crate) resolved: Option<Bytes>,
    pub(crate) sent_at: Option<Instant>,
    pub(crate) deferred_error: Option<Error>,
}

impl Request {
    /// Create a request for `method` against `address`.
    ///
    /// A scheme present in the address selects the SSL flag; a scheme-less
    /// address defaults to plain http. [`Request::use_ssl`] overrides either
    /// way.
    pub fn new(method: Method, address: impl Into<String>) -> Self {
        let mut request = Self {
            method,
            address: String::new(),
            use_ssl: false,
            headers: HashMap::new(),
            query_params: HashMap::new(),
            form_data: Vec::new(),
            cookies: Vec::new(),
            body: None,
            resolved: None,
            sent_at: None,
            deferred_error: None,
        };
        request.set_address(address.into());
        request
    }

    /// Replace the request method
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replace the target address, re-inferring the SSL flag from its scheme
    pub fn url(mut self, address: impl Into<String>) -> Self {
        self.set_address(address.into());
        self
    }

    /// Force the wire scheme: `https` when true, `http` when false
    pub fn use_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    /// Set a header; the last write for a name wins, independent of case
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(key.into(), value.into());
        self
    }

    /// Set every header in the map
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        for (key, value) in headers {
            self.set_header(key, value);
        }
        self
    }

    /// Set the `Content-Type` header
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.set_header(CONTENT_TYPE.to_string(), content_type.into());
        self
    }

    /// Set the `Authorization` header with an explicit scheme
    pub fn auth(self, scheme: impl AsRef<str>, token: impl AsRef<str>) -> Self {
        let value = format!("{} {}", scheme.as_ref(), token.as_ref());
        self.header("Authorization", value)
    }

    /// Set bearer-token authorization
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        self.auth("Bearer", token)
    }

    /// Add a single query parameter
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Add every query parameter in the map
    pub fn query_params(mut self, params: HashMap<String, String>) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Append a form field; fields keep their insertion order on the wire
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data.push((key.into(), value.into()));
        self
    }

    /// Append several form fields in order
    pub fn form_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in fields {
            self.form_data.push((key.into(), value.into()));
        }
        self
    }

    /// Attach a cookie to this request
    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    /// Set the body from any of the four supported shapes
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a string body
    pub fn text(self, text: impl Into<String>) -> Self {
        self.body(Body::Text(text.into()))
    }

    /// Set a raw byte body
    pub fn bytes(self, bytes: impl Into<Bytes>) -> Self {
        self.body(Body::Bytes(bytes.into()))
    }

    /// Set a streaming body, drained once at send time
    pub fn reader<R>(self, reader: R) -> Self
    where
        R: tokio::io::AsyncRead + Send + Unpin + 'static,
    {
        self.body(Body::reader(reader))
    }

    /// Set a structured JSON body.
    ///
    /// Also sets `Content-Type: application/json; charset=utf-8` unless a
    /// content type was already chosen. A value that cannot be converted
    /// fails the eventual send with [`Error::Encode`].
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match Body::json(value) {
            Ok(body) => {
                self.body = Some(body);
                if self.content_type_value().is_none() {
                    self.set_header(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string());
                }
            }
            Err(err) => self.deferred_error = Some(err),
        }
        self
    }

    /// Direct access to the query parameter map
    pub fn query_params_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.query_params
    }

    /// Direct access to the header map
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    /// The declared content type, if any (name matched case-insensitively)
    pub fn content_type_value(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(CONTENT_TYPE))
            .map(|(_, value)| value.as_str())
    }

    /// The resolved body bytes, once the body codec has run
    pub fn resolved_body(&self) -> Option<&Bytes> {
        self.resolved.as_ref()
    }

    /// When this request was last finalized for dispatch
    pub fn sent_at(&self) -> Option<Instant> {
        self.sent_at
    }

    fn set_address(&mut self, address: String) {
        let lower = address.to_ascii_lowercase();
        if lower.starts_with("https://") {
            self.use_ssl = true;
        } else if lower.starts_with("http://") {
            self.use_ssl = false;
        }
        self.address = address;
    }

    fn set_header(&mut self, key: String, value: String) {
        self.headers.retain(|name, _| !name.eq_ignore_ascii_case(&key));
        self.headers.insert(key, value);
    }

    /// Run the body codec once, caching the resolved bytes.
    ///
    /// A stream body drains here and cannot be drained again; the cache makes
    /// the request replayable and re-sendable afterwards.
    pub(crate) async fn resolve_body(&mut self) -> Result<(), Error> {
        if self.resolved.is_some() {
            return Ok(());
        }

        if self.body.is_none()
            && !self.form_data.is_empty()
            && self.content_type_value().is_none()
        {
            self.set_header(CONTENT_TYPE.to_string(), FORM_CONTENT_TYPE.to_string());
        }

        let pending = self.body.take();
        let content_type = self.content_type_value().map(str::to_string);
        let bytes = body::encode(pending, &self.form_data, content_type.as_deref()).await?;
        self.resolved = Some(bytes);
        Ok(())
    }
}
