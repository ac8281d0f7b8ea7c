//! Plain-data link configuration.

use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Result, UploadLinkError};
use crate::http::Credentials;

/// Link configuration that can be loaded from a file.
///
/// Every field is optional; unset fields leave the builder untouched.
///
/// ```toml
/// uri = "https://api.example.com/graphql"
/// method = "POST"
/// timeout_ms = 30000
/// credentials = "same-origin"
/// include_extensions = true
///
/// [headers]
/// authorization = "Bearer token"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkSettings {
    /// GraphQL endpoint.
    pub uri: Option<String>,
    /// HTTP method.
    pub method: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Credentials mode.
    pub credentials: Option<Credentials>,
    /// Headers sent with every request.
    pub headers: IndexMap<String, String>,
    /// Whether protocol extensions are sent.
    pub include_extensions: Option<bool>,
}

impl LinkSettings {
    /// Parse settings from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| UploadLinkError::Settings(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// The timeout as a duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
