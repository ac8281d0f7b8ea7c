//! Request serialization and response validation.

use serde::Serialize;
use serde_json::Value;

use super::fetch::FetchResponse;
use crate::error::{Result, UploadLinkError};
use crate::graphql::GraphQLResponse;

/// Serialize a request parameter to JSON.
///
/// `label` names the parameter in the error ("Payload", "Variables map").
pub fn serialize_fetch_parameter<T: Serialize + ?Sized>(value: &T, label: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| UploadLinkError::serialization(label, e.to_string()))
}

/// Parse a transport response into a GraphQL result.
///
/// A body that is not JSON is a [`UploadLinkError::ServerParse`]. A status
/// of 300 or more, or a body with neither `data` nor `errors`, is a
/// [`UploadLinkError::Server`] that carries the parsed result when there is
/// one, so partial data can still be delivered.
pub fn parse_and_check_http_response(
    operation_name: Option<&str>,
    response: &FetchResponse,
) -> Result<GraphQLResponse> {
    let status = response.status;
    let value: Value = serde_json::from_slice(&response.body).map_err(|e| {
        UploadLinkError::ServerParse {
            status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
            message: e.to_string(),
        }
    })?;

    if status >= 300 {
        return Err(UploadLinkError::Server {
            status,
            message: format!("Response not successful: Received status code {status}"),
            result: serde_json::from_value(value).ok(),
        });
    }

    let has_result = value
        .as_object()
        .is_some_and(|object| object.contains_key("data") || object.contains_key("errors"));
    if !has_result {
        return Err(UploadLinkError::Server {
            status,
            message: format!(
                "Server response was missing for query '{}'.",
                operation_name.unwrap_or_default()
            ),
            result: serde_json::from_value(value).ok(),
        });
    }

    serde_json::from_value(value).map_err(|e| UploadLinkError::ServerParse {
        status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
        message: e.to_string(),
    })
}
