//! HTTP plumbing for the upload link.
//!
//! This module holds the collaborators the link delegates to: option and
//! endpoint selection, payload serialization, response validation, the
//! [`Fetch`] transport seam with its default [`ReqwestFetch`]
//! implementation, and the abort signal handed to transports.

mod client;
mod config;
mod fetch;
mod parse;
mod signal;

pub use ::http::{HeaderMap, HeaderValue, Method};

pub use client::{ReqwestFetch, ReqwestFetchConfig};
pub use config::{
    Credentials, DEFAULT_URI, FetchOptionsConfig, HttpConfig, HttpQueryOptions, UriSource,
    fallback_http_config, select_http_options_and_body, select_uri,
};
pub use fetch::{Fetch, FetchBody, FetchOptions, FetchResponse, ResponseInfo};
pub use parse::{parse_and_check_http_response, serialize_fetch_parameter};
pub use signal::{AbortController, AbortSignal};
