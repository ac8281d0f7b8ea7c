//! GraphQL response types.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt;

use super::path::{PathSegment, object_path};
use crate::error::UploadLinkError;

/// A GraphQL error returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// Locations in the document where the error occurred.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GraphQLLocation>,

    /// Path to the field that caused the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Additional error metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref path) = self.path {
            write!(f, " (at {})", object_path(path))?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLError {}

/// A location in a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLLocation {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

/// A GraphQL execution result as emitted by the link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQLResponse {
    /// The data returned by the operation.
    #[serde(default)]
    pub data: Option<Value>,

    /// Errors that occurred during execution.
    ///
    /// `Some` whenever the server sent an `errors` entry, even an empty one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<GraphQLError>>,

    /// Additional response metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLResponse {
    /// Check if the response contains errors.
    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }

    /// The reported errors, empty when there are none.
    pub fn errors(&self) -> &[GraphQLError] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Check if the response carries both data and an `errors` entry.
    ///
    /// An empty `errors` list still counts. Partial results are emitted
    /// ahead of the error that accompanies them.
    pub fn is_partial(&self) -> bool {
        self.errors.is_some() && matches!(self.data, Some(ref data) if !data.is_null())
    }

    /// Get all errors as a combined message.
    pub fn error_message(&self) -> Option<String> {
        if self.errors().is_empty() {
            None
        } else {
            Some(
                self.errors()
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
    }

    /// Parse the data as a specific type.
    ///
    /// Returns an error if the response has errors or if parsing fails.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, UploadLinkError> {
        if let Some(errors) = self.error_message() {
            return Err(UploadLinkError::Request(format!("GraphQL error: {errors}")));
        }

        match &self.data {
            Some(data) => serde_json::from_value(data.clone()).map_err(|e| {
                UploadLinkError::serialization("Response data", e.to_string())
            }),
            None => Err(UploadLinkError::Request("No data in GraphQL response".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_error_path() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": {"upload": null},
            "errors": [{
                "message": "File too large",
                "locations": [{"line": 1, "column": 12}],
                "path": ["upload", 0, "size"]
            }]
        }))
        .unwrap();

        assert!(response.is_partial());
        let error = &response.errors()[0];
        assert_eq!(
            error.path,
            Some(vec![
                PathSegment::Field("upload".into()),
                PathSegment::Index(0),
                PathSegment::Field("size".into()),
            ])
        );
        assert_eq!(error.to_string(), "File too large (at upload.0.size)");
    }

    #[test]
    fn test_null_data_is_not_partial() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "denied"}]
        }))
        .unwrap();

        assert!(response.has_errors());
        assert!(!response.is_partial());
        assert!(response.data::<Value>().is_err());
    }

    #[test]
    fn test_empty_errors_entry_is_partial() {
        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": {"upload": {"id": "1"}},
            "errors": []
        }))
        .unwrap();

        assert!(!response.has_errors());
        assert!(response.is_partial());
        assert_eq!(response.error_message(), None);

        let without: GraphQLResponse =
            serde_json::from_value(json!({"data": {"upload": {"id": "1"}}})).unwrap();
        assert!(!without.is_partial());
        assert_eq!(without.errors, None);
    }

    #[test]
    fn test_typed_data() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Uploaded {
            id: String,
            filename: String,
        }

        let response: GraphQLResponse = serde_json::from_value(json!({
            "data": {"id": "1", "filename": "a.txt"}
        }))
        .unwrap();

        let uploaded: Uploaded = response.data().unwrap();
        assert_eq!(uploaded.filename, "a.txt");
    }
}
