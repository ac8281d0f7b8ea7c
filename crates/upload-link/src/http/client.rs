//! reqwest-backed transport.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use super::config::Credentials;
use super::fetch::{Fetch, FetchBody, FetchOptions, FetchResponse};
use super::signal::AbortSignal;
use crate::error::{Result, UploadLinkError};
use crate::multipart::{FormData, MultipartForm};

/// Configuration for the default transport.
#[derive(Clone, Debug)]
pub struct ReqwestFetchConfig {
    /// Request timeout applied when the request sets none.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whether to keep cookies between requests.
    pub cookies_enabled: bool,
    /// User agent.
    pub user_agent: Option<String>,
}

impl Default for ReqwestFetchConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            cookies_enabled: true,
            user_agent: Some(format!("upload-link/{} (Rust)", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// The default transport, sending requests with `reqwest`.
///
/// It sends [`MultipartForm`] bodies natively and stops a request as soon
/// as its abort signal fires. Requests with [`Credentials::Omit`] go through
/// a second client that has no cookie store.
#[derive(Clone)]
pub struct ReqwestFetch {
    client: reqwest::Client,
    cookieless: reqwest::Client,
    config: Arc<ReqwestFetchConfig>,
}

impl ReqwestFetch {
    /// Create a transport with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ReqwestFetchConfig::default())
    }

    /// Create a transport with custom configuration.
    pub fn with_config(config: ReqwestFetchConfig) -> Result<Self> {
        let client = build_client(&config, config.cookies_enabled)?;
        let cookieless = if config.cookies_enabled {
            build_client(&config, false)?
        } else {
            client.clone()
        };

        Ok(Self {
            client,
            cookieless,
            config: Arc::new(config),
        })
    }

    /// Wrap an existing reqwest client.
    ///
    /// The client is used for every credentials mode, so its own cookie
    /// settings decide what is sent.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            cookieless: client.clone(),
            client,
            config: Arc::new(ReqwestFetchConfig::default()),
        }
    }

    /// The transport configuration.
    pub fn config(&self) -> &ReqwestFetchConfig {
        &self.config
    }

    fn client_for(&self, credentials: Option<Credentials>) -> &reqwest::Client {
        match credentials {
            Some(Credentials::Omit) => &self.cookieless,
            _ => &self.client,
        }
    }
}

fn build_client(config: &ReqwestFetchConfig, cookies: bool) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if cookies {
        builder = builder.cookie_store(true);
    }
    if let Some(ref ua) = config.user_agent {
        builder = builder.user_agent(ua);
    }
    Ok(builder.build()?)
}

impl std::fmt::Debug for ReqwestFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestFetch")
            .field("config", &self.config)
            .finish()
    }
}

impl Fetch for ReqwestFetch {
    fn fetch(&self, uri: String, options: FetchOptions) -> BoxFuture<'static, Result<FetchResponse>> {
        let client = self.client_for(options.credentials).clone();
        async move {
            let signal = options.signal.clone();
            let send = send(client, uri, options);
            match signal {
                Some(signal) => abortable(signal, send).await,
                None => send.await,
            }
        }
        .boxed()
    }

    fn form_data(&self) -> Option<Box<dyn FormData>> {
        Some(Box::new(MultipartForm::new()))
    }
}

async fn abortable(
    signal: AbortSignal,
    request: impl Future<Output = Result<FetchResponse>>,
) -> Result<FetchResponse> {
    tokio::select! {
        result = request => result,
        _ = signal.aborted() => Err(UploadLinkError::Aborted),
    }
}

async fn send(client: reqwest::Client, uri: String, options: FetchOptions) -> Result<FetchResponse> {
    let url = url::Url::parse(&uri)?;

    let mut req_builder = client
        .request(options.method, url)
        .headers(options.headers);

    if let Some(timeout) = options.timeout {
        req_builder = req_builder.timeout(timeout);
    }

    if let Some(credentials) = options.credentials {
        tracing::trace!(target: "upload_link::http", credentials = credentials.as_str(), "sending request");
    }

    req_builder = match options.body {
        FetchBody::Empty => req_builder,
        FetchBody::Text(text) => req_builder.body(text),
        FetchBody::Form(form) => {
            let form = form.into_any().downcast::<MultipartForm>().map_err(|_| {
                UploadLinkError::UnsupportedBody(
                    "ReqwestFetch only sends MultipartForm bodies".into(),
                )
            })?;
            req_builder.multipart(form.into_reqwest())
        }
    };

    let response = req_builder.send().await?;
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let url = Some(response.url().to_string());
    let body = response.bytes().await?;

    Ok(FetchResponse {
        status,
        headers,
        url,
        body,
    })
}
