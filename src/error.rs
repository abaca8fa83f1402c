//! HTTP error types

use thiserror::Error;

/// Errors that can occur while building, sending or reading a request
#[derive(Debug, Error)]
pub enum Error {
    /// Body serialization failed before dispatch
    #[error("body encoding failed: {0}")]
    Encode(String),
    /// The request address did not parse as a URL
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A header name or value was not representable on the wire
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// A non-empty body was finalized without a replayable byte buffer
    #[error("non-empty request body has no replayable byte buffer")]
    MissingReplay,
    /// Failure reported by the underlying transport
    #[error("transport error: {0}")]
    Transport(String),
    /// The round trip exceeded the client timeout
    #[error("request timed out")]
    Timeout,
    /// The bound cancellation token fired before a response arrived
    #[error("request cancelled")]
    Cancelled,
    /// The redirect chain exceeded the hop limit
    #[error("stopped after {0} redirects")]
    TooManyRedirects(usize),
    /// No transport response is available to read
    #[error("no transport response to read")]
    NoResponse,
    /// Reading the response body stream failed
    #[error("failed to read response body: {0}")]
    Read(String),
    /// Structured decode of the response body failed
    #[error("failed to decode response body: {0}")]
    Decode(String),
    /// Reading a request body stream failed
    #[error("failed to read request body stream: {0}")]
    Io(#[from] std::io::Error),
    /// Client construction failed
    #[error("client build error: {0}")]
    Build(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_builder() {
            Error::Build(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}
