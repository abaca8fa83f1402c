//! Thin fluent HTTP request builder over reqwest
//!
//! This crate assembles a request (method, URL, headers, query parameters,
//! form data, body, cookies) through chained setters, dispatches it with
//! timeout, cancellation and TLS posture taken from the client, and wraps
//! the answer in a [`Response`] whose body is read lazily and cached.
//! Connection management, TLS and protocol framing are reqwest's job; the
//! one piece of wire behavior owned here is the redirect chase, which
//! re-sends the original method and body to every hop.
//!
//! # Example
//!
//! ```no_run
//! use serde::Deserialize;
//! use tinyreq::{Client, Error};
//!
//! #[derive(Deserialize)]
//! struct ApiResponse {
//!     success: bool,
//!     data: String,
//! }
//!
//! async fn example() -> Result<ApiResponse, Error> {
//!     let client = Client::new();
//!     let mut request = client
//!         .post("https://api.example.com/submit")
//!         .json(&serde_json::json!({"success": true, "data": "done!"}))
//!         .header("Test-Header", "this is a test");
//!
//!     let mut response = client.send(&mut request).await?;
//!     response.json().await
//! }
//! ```

mod address;
mod body;
mod client;
mod error;
mod request;
mod response;

pub use body::{
    is_json_type, Body, CONTENT_TYPE, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE,
    PLAIN_TEXT_CONTENT_TYPE,
};
pub use client::{Client, ClientBuilder, CLIENT_NAME, CLIENT_VERSION};
pub use error::Error;
pub use request::{Cookie, Method, Request};
pub use response::Response;
pub use tokio_util::sync::CancellationToken;
