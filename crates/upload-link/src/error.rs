//! Error types for the upload link.

use crate::graphql::GraphQLResponse;

/// A boxed error used for failures raised by user-supplied file sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while preparing, uploading, or parsing a GraphQL request.
#[derive(Debug, thiserror::Error)]
pub enum UploadLinkError {
    /// A multipart body was needed but no form implementation is available.
    #[error("no FormData implementation available: {0}")]
    Configuration(String),

    /// A request parameter could not be serialized to JSON.
    #[error("{label} is not serializable: {message}")]
    Serialization {
        /// Which parameter failed ("Payload", "Variables map", ...).
        label: String,
        /// The serializer's message.
        message: String,
    },

    /// An upload could not be resolved or its stream failed while draining.
    #[error("Error while draining stream: {source}")]
    Drain {
        /// Index of the file in the multipart map.
        index: usize,
        #[source]
        source: BoxError,
    },

    /// The request was aborted through its cancellation signal.
    #[error("The operation was aborted")]
    Aborted,

    /// The server answered with a failure status or an incomplete GraphQL result.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Description of the failure.
        message: String,
        /// The GraphQL result carried by the response, if it had one.
        result: Option<GraphQLResponse>,
    },

    /// The response body was not valid JSON.
    #[error("JSON parse error (status {status}): {message}")]
    ServerParse {
        /// HTTP status code.
        status: u16,
        /// The raw response body.
        body: String,
        /// The parser's message.
        message: String,
    },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header name or value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid HTTP method.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("HTTP request error: {0}")]
    Request(String),

    /// The transport cannot send the given body.
    #[error("Unsupported request body: {0}")]
    UnsupportedBody(String),

    /// Link settings could not be loaded.
    #[error("Invalid link settings: {0}")]
    Settings(String),
}

impl UploadLinkError {
    /// Create a drain error for the file at `index`.
    pub fn drain(index: usize, source: impl Into<BoxError>) -> Self {
        Self::Drain {
            index,
            source: source.into(),
        }
    }

    /// Create a serialization error for the named parameter.
    pub fn serialization(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            label: label.into(),
            message: message.into(),
        }
    }

    /// Whether this error is the cancellation signal rather than a real failure.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// The GraphQL result attached to this error, if any.
    pub fn result(&self) -> Option<&GraphQLResponse> {
        match self {
            Self::Server { result, .. } => result.as_ref(),
            _ => None,
        }
    }

    /// The attached result when it is a partial success (both `errors` and `data`).
    pub fn partial_result(&self) -> Option<&GraphQLResponse> {
        self.result().filter(|result| result.is_partial())
    }
}

impl From<reqwest::Error> for UploadLinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UploadLinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON", err.to_string())
    }
}

impl From<url::ParseError> for UploadLinkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for UploadLinkError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for UploadLinkError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::method::InvalidMethod> for UploadLinkError {
    fn from(err: http::method::InvalidMethod) -> Self {
        Self::InvalidMethod(err.to_string())
    }
}

impl From<toml::de::Error> for UploadLinkError {
    fn from(err: toml::de::Error) -> Self {
        Self::Settings(err.to_string())
    }
}

/// A specialized Result type for upload link operations.
pub type Result<T> = std::result::Result<T, UploadLinkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> GraphQLResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_partial_result_requires_data_and_errors() {
        let err = UploadLinkError::Server {
            status: 500,
            message: "Response not successful: Received status code 500".into(),
            result: Some(response(json!({
                "data": {"user": null},
                "errors": [{"message": "boom"}]
            }))),
        };
        assert!(err.partial_result().is_some());

        let err = UploadLinkError::Server {
            status: 500,
            message: "failed".into(),
            result: Some(response(json!({"errors": [{"message": "boom"}]}))),
        };
        assert!(err.result().is_some());
        assert!(err.partial_result().is_none());
    }

    #[test]
    fn test_drain_display_wraps_cause() {
        let cause = std::io::Error::other("disk on fire");
        let err = UploadLinkError::drain(2, cause);
        assert_eq!(err.to_string(), "Error while draining stream: disk on fire");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_is_abort() {
        assert!(UploadLinkError::Aborted.is_abort());
        assert!(!UploadLinkError::Timeout.is_abort());
    }
}
