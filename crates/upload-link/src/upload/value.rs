//! A JSON-like value tree that may contain uploads.

use indexmap::IndexMap;
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};

use super::extract::{NodeMut, Tree};
use super::file::Upload;
use crate::graphql::PathSegment;

/// A GraphQL variable value that may hold files.
///
/// Mirrors `serde_json::Value` with an extra [`Upload`] leaf. Object keys
/// keep insertion order so extraction order is stable.
#[derive(Debug, Default)]
pub enum UploadValue {
    /// JSON `null`.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(Number),
    /// A string.
    String(String),
    /// An ordered sequence.
    List(Vec<UploadValue>),
    /// A key/value mapping.
    Object(IndexMap<String, UploadValue>),
    /// A file-like value.
    Upload(Upload),
}

impl UploadValue {
    /// An empty object.
    pub fn object() -> Self {
        Self::Object(IndexMap::new())
    }

    /// Whether this value is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value is a file-like leaf.
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload(_))
    }

    /// Look up an object field.
    pub fn get(&self, key: &str) -> Option<&UploadValue> {
        match self {
            Self::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Insert a field, turning `self` into an object if it is `null`.
    ///
    /// Does nothing when `self` is some other non-object value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<UploadValue>) {
        if self.is_null() {
            *self = Self::object();
        }
        if let Self::Object(map) = self {
            map.insert(key.into(), value.into());
        }
    }

    /// Follow `path` and return the value it points at.
    pub fn pointer_mut(&mut self, path: &[PathSegment]) -> Option<&mut UploadValue> {
        path.iter().try_fold(self, |node, segment| match (node, segment) {
            (Self::Object(map), PathSegment::Field(key)) => map.get_mut(key),
            (Self::List(items), PathSegment::Index(idx)) => items.get_mut(*idx),
            _ => None,
        })
    }

    /// Convert to a plain JSON value, or `None` if an upload is still present.
    pub fn to_json(&self) -> Option<Value> {
        Some(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .map(UploadValue::to_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Self::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
            Self::Upload(_) => return None,
        })
    }
}

impl Serialize for UploadValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Upload(_) => Err(S::Error::custom(
                "file uploads must be extracted before serialization",
            )),
        }
    }
}

impl Tree for UploadValue {
    type File = Upload;

    fn node_mut(&mut self) -> NodeMut<'_, Self> {
        match self {
            Self::List(items) => NodeMut::Sequence(items.iter_mut().collect()),
            Self::Object(map) => {
                NodeMut::Mapping(map.iter_mut().map(|(k, v)| (k.as_str(), v)).collect())
            }
            _ => NodeMut::Scalar,
        }
    }

    fn take_file(&mut self) -> Option<Upload> {
        if !self.is_upload() {
            return None;
        }
        match std::mem::take(self) {
            Self::Upload(upload) => Some(upload),
            _ => None,
        }
    }
}

impl From<Value> for UploadValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<Upload> for UploadValue {
    fn from(upload: Upload) -> Self {
        Self::Upload(upload)
    }
}

impl From<super::file::Blob> for UploadValue {
    fn from(blob: super::file::Blob) -> Self {
        Self::Upload(Upload::Blob(blob))
    }
}

impl From<&str> for UploadValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for UploadValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for UploadValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for UploadValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for UploadValue {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for UploadValue {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<f64> for UploadValue {
    /// Non-finite floats become `null`, as in `serde_json`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Self::Null, Self::Number)
    }
}

impl<T: Into<UploadValue>> From<Option<T>> for UploadValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<UploadValue>> From<Vec<T>> for UploadValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<UploadValue>> FromIterator<(K, V)> for UploadValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Object(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::file::Blob;
    use serde_json::json;

    #[test]
    fn test_serialize_keeps_insertion_order() {
        let value: UploadValue = vec![
            ("zeta", UploadValue::from(1)),
            ("alpha", UploadValue::from("a")),
            ("list", UploadValue::from(vec![true, false])),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"zeta":1,"alpha":"a","list":[true,false]}"#
        );
    }

    #[test]
    fn test_serialize_rejects_uploads() {
        let mut value = UploadValue::object();
        value.insert("file", Blob::new("a.txt", "a"));
        assert!(serde_json::to_string(&value).is_err());
        assert!(value.to_json().is_none());
    }

    #[test]
    fn test_from_json_round_trip() {
        let json = json!({"a": [1, {"b": null}], "c": "d"});
        let value = UploadValue::from(json.clone());
        assert_eq!(value.to_json(), Some(json));
    }

    #[test]
    fn test_pointer_mut() {
        let mut value = UploadValue::from(json!({"a": [1, {"b": "x"}]}));
        let path = vec![
            PathSegment::from("a"),
            PathSegment::from(1),
            PathSegment::from("b"),
        ];
        *value.pointer_mut(&path).unwrap() = UploadValue::Null;
        assert_eq!(value.to_json(), Some(json!({"a": [1, {"b": null}]})));
        assert!(value.pointer_mut(&[PathSegment::from(0)]).is_none());
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(UploadValue::from(f64::NAN).is_null());
    }
}
