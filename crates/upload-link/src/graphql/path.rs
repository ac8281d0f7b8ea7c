//! Paths into GraphQL values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A segment in a value path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// An array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

/// Render a path as a dot-separated object path (`variables.files.0`).
///
/// This is the form the multipart request `map` field uses.
pub fn object_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in path.iter().enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_path() {
        let path = vec![
            PathSegment::from("variables"),
            PathSegment::from("files"),
            PathSegment::from(3),
        ];
        assert_eq!(object_path(&path), "variables.files.3");
        assert_eq!(object_path(&[]), "");
    }
}
