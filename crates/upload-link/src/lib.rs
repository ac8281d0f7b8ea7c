//! GraphQL file uploads over HTTP.
//!
//! This crate provides a GraphQL transport that understands files:
//!
//! - **Upload values**: streams, blobs, and deferred file descriptors that
//!   can be placed anywhere in an operation's variables
//! - **Multipart encoding**: operations carrying files are sent as GraphQL
//!   multipart requests, all others as plain JSON
//! - **Cancellation**: every request can be cancelled, and the abort is
//!   passed on to the transport
//!
//! # Sending an upload
//!
//! ```ignore
//! use upload_link::{Blob, Operation, UploadLink};
//!
//! let link = UploadLink::new("https://api.example.com/graphql")?;
//!
//! let operation = Operation::new("mutation ($file: Upload!) { upload(file: $file) { id } }")
//!     .operation_name("Upload")
//!     .variable("file", Blob::new("notes.txt", "hello").content_type("text/plain"));
//!
//! let mut results = link.execute(operation)?.subscribe();
//! while let Some(result) = results.next().await {
//!     let response = result?;
//!     println!("{:?}", response.data);
//! }
//! ```
//!
//! The request body is a multipart form with three fields:
//!
//! - `operations` - `{"operationName":"Upload","variables":{"file":null},"query":"..."}`
//! - `map` - `{"0":["variables.file"]}`
//! - `0` - the file contents
//!
//! ## Upload kinds
//!
//! ```ignore
//! // A stream, appended to the form as-is
//! Upload::stream(byte_stream);
//!
//! // A file on disk, resolved and read into memory before sending
//! Upload::from_path("report.pdf");
//!
//! // A descriptor produced by some other async work
//! Upload::deferred(async { Ok::<_, std::io::Error>(FileDescriptor::from_bytes("a.txt", None, "a")) });
//! ```
//!
//! ## Configuration
//!
//! ```ignore
//! let link = UploadLink::builder()
//!     .uri("https://api.example.com/graphql")
//!     .timeout(Duration::from_secs(60))
//!     .credentials(Credentials::Include)
//!     .header("authorization", "Bearer token")
//!     .settings(LinkSettings::from_file("link.toml")?)
//!     .build()?;
//! ```
//!
//! # Custom transports
//!
//! Any closure taking the endpoint and [`FetchOptions`] and returning a
//! future of [`FetchResponse`] is a transport:
//!
//! ```ignore
//! let link = UploadLink::builder()
//!     .fetch(|uri: String, options: FetchOptions| async move {
//!         Ok(FetchResponse::json(&serde_json::json!({"data": {"ok": true}})))
//!     })
//!     .server_form_data(|| Box::new(MultipartForm::new()))
//!     .build()?;
//! ```

mod error;
pub mod graphql;
pub mod http;
pub mod link;
pub mod multipart;
pub mod upload;

pub use error::{BoxError, Result, UploadLinkError};

// Re-export commonly used types at the crate root
pub use graphql::{Context, ContextData, GraphQLError, GraphQLResponse, Operation, PathSegment};
pub use self::http::{
    AbortController, AbortSignal, Credentials, Fetch, FetchBody, FetchOptions,
    FetchOptionsConfig, FetchResponse, ReqwestFetch, ResponseInfo,
};
pub use link::{
    CancelHandle, Execution, ExecutionState, LinkSettings, UploadLink, UploadLinkBuilder,
    UploadSubscription,
};
pub use multipart::{FormData, MultipartForm, PartMeta};
pub use upload::{Blob, ByteStream, FileDescriptor, Upload, UploadKind, UploadValue, extract_files};
