//! Layered HTTP configuration and request body selection.
//!
//! Options are merged from several layers, later layers winning field by
//! field: the library fallback, the link configuration, and the
//! per-operation context. Headers merge by name.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use serde::{Deserialize, Serialize};

use super::fetch::FetchOptions;
use crate::graphql::{ContextData, OperationRequest};
use crate::upload::UploadValue;

/// Default endpoint used when none is configured.
pub const DEFAULT_URI: &str = "/graphql";

/// How cookies and credentials are sent with a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    /// Never send credentials. [`ReqwestFetch`](super::ReqwestFetch) sends
    /// these requests without its cookie store.
    Omit,
    /// Send credentials to the same origin only.
    SameOrigin,
    /// Always send credentials.
    Include,
}

impl Credentials {
    /// The fetch-style name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Omit => "omit",
            Self::SameOrigin => "same-origin",
            Self::Include => "include",
        }
    }
}

/// Controls which operation fields go into the request body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpQueryOptions {
    /// Send the query document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_query: Option<bool>,
    /// Send protocol extensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_extensions: Option<bool>,
}

/// Transport options that can be set per layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchOptionsConfig {
    /// HTTP method.
    pub method: Option<Method>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

/// One layer of HTTP configuration.
#[derive(Clone, Debug, Default)]
pub struct HttpConfig {
    /// Body composition.
    pub http: Option<HttpQueryOptions>,
    /// Transport options.
    pub options: Option<FetchOptionsConfig>,
    /// Credentials mode.
    pub credentials: Option<Credentials>,
    /// Headers.
    pub headers: Option<HeaderMap>,
}

impl HttpConfig {
    /// The override layer carried by an operation's context.
    pub fn from_context(context: &ContextData) -> Self {
        Self {
            http: context.http,
            options: context.fetch_options.clone(),
            credentials: context.credentials,
            headers: context.headers.clone(),
        }
    }
}

/// The library defaults every request starts from.
pub fn fallback_http_config() -> HttpConfig {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    HttpConfig {
        http: Some(HttpQueryOptions {
            include_query: Some(true),
            include_extensions: Some(false),
        }),
        options: Some(FetchOptionsConfig {
            method: Some(Method::POST),
            timeout: None,
        }),
        credentials: None,
        headers: Some(headers),
    }
}

/// Merge `fallback` and `configs` into transport options and build the
/// request body for `request`.
///
/// The body is an object with `operationName` (when set), `variables`,
/// `extensions` (when enabled and present) and `query` (when enabled), in
/// that order. Uploads inside it are left in place.
pub fn select_http_options_and_body(
    request: OperationRequest,
    fallback: &HttpConfig,
    configs: &[&HttpConfig],
) -> (FetchOptions, UploadValue) {
    let mut include_query = false;
    let mut include_extensions = false;
    let mut options = FetchOptions::default();

    for config in std::iter::once(fallback).chain(configs.iter().copied()) {
        if let Some(http) = config.http {
            include_query = http.include_query.unwrap_or(include_query);
            include_extensions = http.include_extensions.unwrap_or(include_extensions);
        }
        if let Some(ref layer) = config.options {
            if let Some(ref method) = layer.method {
                options.method = method.clone();
            }
            if layer.timeout.is_some() {
                options.timeout = layer.timeout;
            }
        }
        if config.credentials.is_some() {
            options.credentials = config.credentials;
        }
        if let Some(ref headers) = config.headers {
            merge_headers(&mut options.headers, headers);
        }
    }

    let mut body = UploadValue::object();
    if let Some(name) = request.operation_name {
        body.insert("operationName", name);
    }
    body.insert("variables", request.variables);
    if include_extensions && let Some(extensions) = request.extensions {
        body.insert("extensions", extensions);
    }
    if include_query {
        body.insert("query", request.query);
    }

    (options, body)
}

fn merge_headers(target: &mut HeaderMap, layer: &HeaderMap) {
    for name in layer.keys() {
        target.remove(name);
        for value in layer.get_all(name) {
            target.append(name.clone(), value.clone());
        }
    }
}

/// Where the link sends requests.
#[derive(Clone)]
pub enum UriSource {
    /// A fixed endpoint.
    Static(String),
    /// An endpoint computed from the operation.
    Dynamic(Arc<dyn Fn(&OperationRequest) -> String + Send + Sync>),
}

impl Default for UriSource {
    fn default() -> Self {
        Self::Static(DEFAULT_URI.to_string())
    }
}

impl fmt::Debug for UriSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(uri) => f.debug_tuple("Static").field(uri).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

/// Pick the endpoint: the context override first, then the link's source.
pub fn select_uri(context: &ContextData, request: &OperationRequest, fallback: &UriSource) -> String {
    if let Some(ref uri) = context.uri {
        return uri.clone();
    }
    match fallback {
        UriSource::Static(uri) => uri.clone(),
        UriSource::Dynamic(select) => select(request),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::Operation;
    use serde_json::json;

    fn request(operation: Operation) -> OperationRequest {
        operation.into_parts().0
    }

    #[test]
    fn test_fallback_body_and_headers() {
        let op = Operation::new("{ me { id } }")
            .operation_name("Me")
            .extensions(UploadValue::from(json!({"persisted": true})));
        let (options, body) = select_http_options_and_body(request(op), &fallback_http_config(), &[]);

        assert_eq!(options.method, Method::POST);
        assert_eq!(options.headers[ACCEPT], "*/*");
        assert_eq!(options.headers[CONTENT_TYPE], "application/json");
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"operationName":"Me","variables":{},"query":"{ me { id } }"}"#
        );
    }

    #[test]
    fn test_later_layers_win() {
        let mut link_headers = HeaderMap::new();
        link_headers.insert("x-app", HeaderValue::from_static("link"));
        link_headers.insert("x-link-only", HeaderValue::from_static("1"));
        let link = HttpConfig {
            http: Some(HttpQueryOptions {
                include_query: None,
                include_extensions: Some(true),
            }),
            credentials: Some(Credentials::Include),
            headers: Some(link_headers),
            ..Default::default()
        };

        let mut context_headers = HeaderMap::new();
        context_headers.insert("x-app", HeaderValue::from_static("context"));
        let context = HttpConfig {
            options: Some(FetchOptionsConfig {
                method: Some(Method::PUT),
                timeout: Some(Duration::from_secs(3)),
            }),
            credentials: Some(Credentials::SameOrigin),
            headers: Some(context_headers),
            ..Default::default()
        };

        let op = Operation::new("{ a }").extensions(UploadValue::from(json!({"v": 1})));
        let (options, body) =
            select_http_options_and_body(request(op), &fallback_http_config(), &[&link, &context]);

        assert_eq!(options.method, Method::PUT);
        assert_eq!(options.timeout, Some(Duration::from_secs(3)));
        assert_eq!(options.credentials, Some(Credentials::SameOrigin));
        assert_eq!(options.headers["x-app"], "context");
        assert_eq!(options.headers["x-link-only"], "1");
        assert_eq!(
            body.to_json().unwrap(),
            json!({"variables": {}, "extensions": {"v": 1}, "query": "{ a }"})
        );
    }

    #[test]
    fn test_select_uri() {
        let op = Operation::new("{ a }").operation_name("A");
        let (req, ctx) = op.into_parts();

        let dynamic = UriSource::Dynamic(Arc::new(|req: &OperationRequest| {
            format!("https://api.example.com/{}", req.operation_name.as_deref().unwrap_or(""))
        }));
        assert_eq!(select_uri(&ctx.get(), &req, &dynamic), "https://api.example.com/A");
        assert_eq!(select_uri(&ctx.get(), &req, &UriSource::default()), "/graphql");

        ctx.set(|data| data.uri = Some("https://override.example.com".into()));
        assert_eq!(select_uri(&ctx.get(), &req, &dynamic), "https://override.example.com");
    }
}
