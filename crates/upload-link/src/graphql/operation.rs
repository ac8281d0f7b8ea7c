//! GraphQL operations and their per-request context.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, UploadLinkError};
use crate::http::{Credentials, FetchOptionsConfig, HeaderMap, HttpQueryOptions, ResponseInfo};
use crate::upload::UploadValue;

/// Per-operation configuration and results.
///
/// The `uri`, `http`, `fetch_options`, `credentials` and `headers` slots
/// override the link configuration for a single request. `response` is
/// filled in by the link once the transport answers.
#[derive(Clone, Debug, Default)]
pub struct ContextData {
    /// Endpoint override.
    pub uri: Option<String>,
    /// Body composition override.
    pub http: Option<HttpQueryOptions>,
    /// Transport option override.
    pub fetch_options: Option<FetchOptionsConfig>,
    /// Credentials mode override.
    pub credentials: Option<Credentials>,
    /// Extra headers, merged over the link's headers.
    pub headers: Option<HeaderMap>,
    /// The raw response of the last request made with this operation.
    pub response: Option<ResponseInfo>,
    /// Arbitrary user entries.
    pub values: HashMap<String, Value>,
}

/// A shared handle to an operation's context.
///
/// Clones refer to the same data, so a caller can keep a handle and read
/// the response after the link has run the operation.
#[derive(Clone, Debug, Default)]
pub struct Context {
    inner: Arc<RwLock<ContextData>>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current context.
    pub fn get(&self) -> ContextData {
        self.inner.read().clone()
    }

    /// Modify the context in place.
    pub fn set(&self, update: impl FnOnce(&mut ContextData)) {
        update(&mut self.inner.write());
    }

    /// The response recorded for the last request, if any.
    pub fn response(&self) -> Option<ResponseInfo> {
        self.inner.read().response.clone()
    }

    /// Read a user entry.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.inner.read().values.get(key).cloned()
    }

    /// Store a user entry.
    pub fn insert_value(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.write().values.insert(key.into(), value.into());
    }
}

/// The request half of an operation, consumed when building the body.
#[derive(Debug)]
pub struct OperationRequest {
    /// The GraphQL document.
    pub query: String,
    /// Operation to run when the document has several.
    pub operation_name: Option<String>,
    /// Variables, possibly containing uploads.
    pub variables: UploadValue,
    /// Protocol extensions.
    pub extensions: Option<UploadValue>,
}

/// A GraphQL operation flowing through the link.
///
/// # Example
///
/// ```ignore
/// let operation = Operation::new(r#"
///     mutation Upload($files: [Upload!]!) {
///         uploadMany(files: $files) { id }
///     }
/// "#)
/// .operation_name("Upload")
/// .variable("files", vec![Upload::from_path("a.txt"), Upload::from_path("b.txt")]);
/// ```
#[derive(Debug)]
pub struct Operation {
    request: OperationRequest,
    context: Context,
}

impl Operation {
    /// Create an operation for `query` with no variables.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            request: OperationRequest {
                query: query.into(),
                operation_name: None,
                variables: UploadValue::object(),
                extensions: None,
            },
            context: Context::new(),
        }
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.request.operation_name = Some(name.into());
        self
    }

    /// Set a single variable.
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<UploadValue>) -> Self {
        self.request.variables.insert(name, value);
        self
    }

    /// Replace all variables.
    pub fn variables(mut self, variables: impl Into<UploadValue>) -> Self {
        self.request.variables = variables.into();
        self
    }

    /// Replace all variables with a serializable value.
    ///
    /// Fails when `variables` cannot be represented as JSON.
    pub fn try_variables(mut self, variables: impl Serialize) -> Result<Self> {
        let value = serde_json::to_value(variables)
            .map_err(|e| UploadLinkError::serialization("Variables", e.to_string()))?;
        self.request.variables = value.into();
        Ok(self)
    }

    /// Set protocol extensions.
    pub fn extensions(mut self, extensions: impl Into<UploadValue>) -> Self {
        self.request.extensions = Some(extensions.into());
        self
    }

    /// Adjust the context before the operation is executed.
    pub fn with_context(self, update: impl FnOnce(&mut ContextData)) -> Self {
        self.context.set(update);
        self
    }

    /// The GraphQL document.
    pub fn query(&self) -> &str {
        &self.request.query
    }

    /// The operation name, if set.
    pub fn name(&self) -> Option<&str> {
        self.request.operation_name.as_deref()
    }

    /// The variables.
    pub fn variables_ref(&self) -> &UploadValue {
        &self.request.variables
    }

    /// The shared context handle.
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) fn into_parts(self) -> (OperationRequest, Context) {
        (self.request, self.context)
    }
}
