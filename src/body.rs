//! Request body representation and wire encoding
//!
//! The body a caller hands over is one of four shapes, fixed at construction
//! time. Encoding resolves the shape against the declared content type with a
//! first-match-wins precedence; a structured value under a content type that
//! is not JSON degrades to an empty body rather than an error.

use std::fmt;

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Error;

/// Canonical `Content-Type` header name
pub const CONTENT_TYPE: &str = "Content-Type";
/// JSON content type set by [`crate::Request::json`]
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
/// Form content type set by [`crate::Request::form_field`]
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// Plain text content type
pub const PLAIN_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

static JSON_CHECK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(application|text)/(json|.*\+json|json-.*)(;|$)").expect("valid json matcher")
});

/// Returns true when `content_type` names a JSON media type.
///
/// Matches `application/json`, `text/json`, `*+json` suffixes and `json-*`
/// families, case-insensitively, with or without parameters.
pub fn is_json_type(content_type: &str) -> bool {
    JSON_CHECK.is_match(content_type)
}

/// A request body, fixed to one of four shapes at construction time.
pub enum Body {
    /// A readable byte stream, drained exactly once at encode time
    Reader(Box<dyn AsyncRead + Send + Unpin>),
    /// Raw bytes, used as-is
    Bytes(Bytes),
    /// A string, sent as its UTF-8 encoding
    Text(String),
    /// A structured value, JSON-marshalled when the content type agrees
    Json(serde_json::Value),
}

impl Body {
    /// Build a structured body from any serializable value.
    ///
    /// Conversion happens here so an unencodable value fails at construction
    /// rather than at send time.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, Error> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| Error::Encode(e.to_string()))
    }

    /// Wrap a readable stream. The stream is drained once, at encode time.
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Body::Reader(Box::new(reader))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Reader(_) => f.write_str("Body::Reader(..)"),
            Body::Bytes(b) => write!(f, "Body::Bytes({} bytes)", b.len()),
            Body::Text(s) => write!(f, "Body::Text({} bytes)", s.len()),
            Body::Json(v) => write!(f, "Body::Json({})", v),
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Bytes(value)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

/// Resolve a body (or, absent one, pending form data) into wire bytes.
///
/// Precedence, first match wins:
/// 1. a stream is drained fully
/// 2. raw bytes pass through
/// 3. a string becomes its UTF-8 encoding
/// 4. a structured object or array under a JSON content type is marshalled
/// 5. form fields are urlencoded when no body was set
/// 6. anything else resolves to an empty body
///
/// Step 6 means a structured value under a non-JSON content type silently
/// resolves empty. That is the contract, not an oversight.
pub(crate) async fn encode(
    body: Option<Body>,
    form: &[(String, String)],
    content_type: Option<&str>,
) -> Result<Bytes, Error> {
    match body {
        Some(Body::Reader(mut reader)) => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await?;
            Ok(Bytes::from(buf))
        }
        Some(Body::Bytes(bytes)) => Ok(bytes),
        Some(Body::Text(text)) => Ok(Bytes::from(text)),
        Some(Body::Json(value)) => {
            let marshal = content_type.is_some_and(is_json_type)
                && (value.is_object() || value.is_array());
            if marshal {
                serde_json::to_vec(&value)
                    .map(Bytes::from)
                    .map_err(|e| Error::Encode(e.to_string()))
            } else {
                Ok(Bytes::new())
            }
        }
        None if !form.is_empty() => serde_urlencoded::to_string(form)
            .map(Bytes::from)
            .map_err(|e| Error::Encode(e.to_string())),
        None => Ok(Bytes::new()),
    }
}
