//! The transport seam.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use http::{HeaderMap, Method};

use super::config::Credentials;
use super::signal::AbortSignal;
use crate::error::Result;
use crate::multipart::FormData;

/// The body handed to a transport.
#[derive(Default)]
pub enum FetchBody {
    /// No body.
    #[default]
    Empty,
    /// A serialized JSON payload.
    Text(String),
    /// A multipart form.
    Form(Box<dyn FormData>),
}

impl FetchBody {
    /// The text payload, if this is a text body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this is a multipart body.
    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }
}

impl fmt::Debug for FetchBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Form(_) => f.write_str("Form"),
        }
    }
}

/// Options for a single transport call.
#[derive(Debug)]
pub struct FetchOptions {
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Credentials mode.
    pub credentials: Option<Credentials>,
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Request body.
    pub body: FetchBody,
    /// Cancellation signal the transport should honour.
    pub signal: Option<AbortSignal>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::POST,
            headers: HeaderMap::new(),
            credentials: None,
            timeout: None,
            body: FetchBody::Empty,
            signal: None,
        }
    }
}

/// Status line and headers of a transport response.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseInfo {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Final URL, when the transport knows it.
    pub url: Option<String>,
}

/// A complete transport response.
#[derive(Clone, Debug)]
pub struct FetchResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Final URL, when the transport knows it.
    pub url: Option<String>,
    /// The response body.
    pub body: Bytes,
}

impl FetchResponse {
    /// Create a response with no headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url: None,
            body: body.into(),
        }
    }

    /// Create a `200` response with a JSON body.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// The status line and headers, without the body.
    pub fn info(&self) -> ResponseInfo {
        ResponseInfo {
            status: self.status,
            headers: self.headers.clone(),
            url: self.url.clone(),
        }
    }
}

/// A fetch-like transport.
///
/// Any `Fn(String, FetchOptions) -> impl Future<Output = Result<FetchResponse>>`
/// closure is a transport. Transports that honour [`FetchOptions::signal`]
/// must fail with [`UploadLinkError::Aborted`](crate::UploadLinkError::Aborted)
/// once it fires.
pub trait Fetch: Send + Sync {
    /// Send a request to `uri`.
    fn fetch(&self, uri: String, options: FetchOptions) -> BoxFuture<'static, Result<FetchResponse>>;

    /// A multipart form this transport can send natively, if it has one.
    fn form_data(&self) -> Option<Box<dyn FormData>> {
        None
    }

    /// Whether the transport accepts a cancellation signal.
    fn supports_abort(&self) -> bool {
        true
    }
}

impl<F, Fut> Fetch for F
where
    F: Fn(String, FetchOptions) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchResponse>> + Send + 'static,
{
    fn fetch(&self, uri: String, options: FetchOptions) -> BoxFuture<'static, Result<FetchResponse>> {
        self(uri, options).boxed()
    }
}
