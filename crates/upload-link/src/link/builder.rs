//! Link construction.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue, Method};

use super::settings::LinkSettings;
use super::{UploadLink, UploadLinkInner};
use crate::error::Result;
use crate::graphql::OperationRequest;
use crate::http::{
    Credentials, Fetch, FetchOptionsConfig, HttpConfig, HttpQueryOptions, ReqwestFetch, UriSource,
};
use crate::multipart::{FormData, FormDataConstructor};

/// Builder for creating an [`UploadLink`].
pub struct UploadLinkBuilder {
    uri: UriSource,
    fetch: Option<Arc<dyn Fetch>>,
    method: Option<String>,
    timeout: Option<Duration>,
    credentials: Option<Credentials>,
    headers: Vec<(String, String)>,
    include_extensions: Option<bool>,
    server_form_data: Option<FormDataConstructor>,
}

impl Default for UploadLinkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadLinkBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            uri: UriSource::default(),
            fetch: None,
            method: None,
            timeout: None,
            credentials: None,
            headers: Vec::new(),
            include_extensions: None,
            server_form_data: None,
        }
    }

    /// Set the GraphQL endpoint. Defaults to `/graphql`.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = UriSource::Static(uri.into());
        self
    }

    /// Compute the endpoint from each operation.
    pub fn uri_fn<F>(mut self, select: F) -> Self
    where
        F: Fn(&OperationRequest) -> String + Send + Sync + 'static,
    {
        self.uri = UriSource::Dynamic(Arc::new(select));
        self
    }

    /// Use a custom transport instead of [`ReqwestFetch`].
    pub fn fetch(mut self, fetch: impl Fetch + 'static) -> Self {
        self.fetch = Some(Arc::new(fetch));
        self
    }

    /// Set the transport options.
    pub fn fetch_options(mut self, options: FetchOptionsConfig) -> Self {
        self.method = options.method.map(|method| method.to_string());
        self.timeout = options.timeout;
        self
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the credentials mode.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Add a header to all requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add multiple headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Send protocol extensions with each operation.
    pub fn include_extensions(mut self, include: bool) -> Self {
        self.include_extensions = Some(include);
        self
    }

    /// Create multipart forms with `constructor` when the transport has no
    /// form type of its own.
    pub fn server_form_data<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn FormData> + Send + Sync + 'static,
    {
        self.server_form_data = Some(Arc::new(constructor));
        self
    }

    /// Apply loaded settings. Fields unset in `settings` are left as they are.
    pub fn settings(mut self, settings: LinkSettings) -> Self {
        if let Some(timeout) = settings.timeout() {
            self.timeout = Some(timeout);
        }
        if let Some(uri) = settings.uri {
            self.uri = UriSource::Static(uri);
        }
        if settings.method.is_some() {
            self.method = settings.method;
        }
        if settings.credentials.is_some() {
            self.credentials = settings.credentials;
        }
        if settings.include_extensions.is_some() {
            self.include_extensions = settings.include_extensions;
        }
        self.headers.extend(settings.headers);
        self
    }

    /// Build the link.
    ///
    /// Fails if a header or the method is invalid, or if the default
    /// transport cannot be created.
    pub fn build(self) -> Result<UploadLink> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            let value = HeaderValue::from_str(value)?;
            headers.insert(name, value);
        }

        let method = self
            .method
            .as_deref()
            .map(|method| Method::from_bytes(method.as_bytes()))
            .transpose()?;

        let fetch: Arc<dyn Fetch> = match self.fetch {
            Some(fetch) => fetch,
            None => Arc::new(ReqwestFetch::new()?),
        };

        let link_config = HttpConfig {
            http: self.include_extensions.map(|include| HttpQueryOptions {
                include_query: None,
                include_extensions: Some(include),
            }),
            options: (method.is_some() || self.timeout.is_some()).then(|| FetchOptionsConfig {
                method,
                timeout: self.timeout,
            }),
            credentials: self.credentials,
            headers: (!headers.is_empty()).then_some(headers),
        };

        Ok(UploadLink {
            inner: Arc::new(UploadLinkInner {
                uri: self.uri,
                fetch,
                link_config,
                server_form_data: self.server_form_data,
            }),
        })
    }
}
