//! The upload link.
//!
//! [`UploadLink`] turns an [`Operation`] into an HTTP request. Operations
//! whose variables contain no uploads are sent as plain JSON; otherwise the
//! request becomes a GraphQL multipart request.
//!
//! Sending happens in two steps. [`UploadLink::execute`] does everything
//! that cannot wait: it picks the endpoint, merges options, extracts the
//! uploads, serializes the payload and builds the form, so configuration
//! and serialization errors are returned right away. The returned
//! [`Execution`] does nothing until [`Execution::subscribe`] spawns it.
//!
//! # Example
//!
//! ```ignore
//! use upload_link::{Operation, Upload, UploadLink};
//!
//! let link = UploadLink::builder()
//!     .uri("https://api.example.com/graphql")
//!     .header("authorization", "Bearer token")
//!     .build()?;
//!
//! let operation = Operation::new("mutation ($file: Upload!) { upload(file: $file) { id } }")
//!     .variable("file", Upload::from_path("avatar.png"));
//!
//! let mut results = link.execute(operation)?.subscribe();
//! while let Some(result) = results.next().await {
//!     println!("{:?}", result?.data);
//! }
//! ```

mod builder;
mod execution;
mod settings;

use std::fmt;
use std::sync::Arc;

pub use builder::UploadLinkBuilder;
pub use execution::{CancelHandle, Execution, ExecutionState, UploadSubscription};
pub use settings::LinkSettings;

use crate::error::Result;
use crate::graphql::Operation;
use crate::http::{
    Fetch, HttpConfig, UriSource, fallback_http_config, select_http_options_and_body, select_uri,
    serialize_fetch_parameter,
};
use crate::multipart::{FormData, FormDataConstructor, encode_body};
use crate::upload::extract_files;

struct UploadLinkInner {
    uri: UriSource,
    fetch: Arc<dyn Fetch>,
    link_config: HttpConfig,
    server_form_data: Option<FormDataConstructor>,
}

/// A GraphQL transport that sends file uploads as multipart requests.
///
/// The link is cheap to clone; clones share configuration and transport.
#[derive(Clone)]
pub struct UploadLink {
    inner: Arc<UploadLinkInner>,
}

impl UploadLink {
    /// Create a link with the default transport for `uri`.
    pub fn new(uri: impl Into<String>) -> Result<Self> {
        Self::builder().uri(uri).build()
    }

    /// Create a builder.
    pub fn builder() -> UploadLinkBuilder {
        UploadLinkBuilder::new()
    }

    /// Prepare `operation` for sending.
    ///
    /// Fails with [`Serialization`](crate::UploadLinkError::Serialization)
    /// if the payload cannot be encoded, or with
    /// [`Configuration`](crate::UploadLinkError::Configuration) if the
    /// operation carries uploads and no multipart form is available. No
    /// I/O happens here.
    pub fn execute(&self, operation: Operation) -> Result<Execution> {
        let (request, context) = operation.into_parts();
        let data = context.get();

        let uri = select_uri(&data, &request, &self.inner.uri);
        let operation_name = request.operation_name.clone();
        let context_config = HttpConfig::from_context(&data);

        let (mut options, mut body) = select_http_options_and_body(
            request,
            &fallback_http_config(),
            &[&self.inner.link_config, &context_config],
        );

        let files = extract_files(&mut body);
        let payload = serialize_fetch_parameter(&body, "Payload")?;
        let body = encode_body(payload, files, &mut options.headers, || self.form_data())?;

        tracing::debug!(
            target: "upload_link::link",
            uri = %uri,
            operation = operation_name.as_deref().unwrap_or_default(),
            multipart = body.is_multipart(),
            "prepared request"
        );

        Ok(Execution {
            uri,
            options,
            body,
            fetch: self.inner.fetch.clone(),
            context,
            operation_name,
        })
    }

    fn form_data(&self) -> Option<Box<dyn FormData>> {
        self.inner
            .fetch
            .form_data()
            .or_else(|| self.inner.server_form_data.as_ref().map(|constructor| constructor()))
    }
}

impl fmt::Debug for UploadLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadLink")
            .field("uri", &self.inner.uri)
            .field("link_config", &self.inner.link_config)
            .finish_non_exhaustive()
    }
}
