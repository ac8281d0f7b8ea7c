//! Multipart form sinks.

use std::any::Any;
use std::fmt;

use bytes::Bytes;
use reqwest::multipart::Part;

use crate::upload::{Blob, ByteStream};

/// Metadata attached to a file part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartMeta {
    /// Filename sent in the part's disposition.
    pub filename: Option<String>,
    /// MIME type of the part.
    pub content_type: Option<String>,
    /// Exact byte length, when known up front.
    pub known_length: Option<u64>,
}

/// An append-only multipart form.
///
/// Implementations decide how fields become a request body. A transport
/// receives the finished form as `Box<dyn FormData>` and recovers its
/// concrete type through [`into_any`](Self::into_any).
pub trait FormData: Send {
    /// Append a text field.
    fn append_text(&mut self, name: &str, value: String);

    /// Append a streaming field.
    fn append_stream(&mut self, name: &str, stream: ByteStream);

    /// Append a blob, using its name as the filename.
    fn append_blob(&mut self, name: &str, blob: Blob);

    /// Append a buffered file field.
    fn append_buffer(&mut self, name: &str, buffer: Bytes, meta: PartMeta);

    /// Convert into `Any` for downcasting by the transport.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// Creates empty forms for links whose transport has no native form type.
pub type FormDataConstructor = std::sync::Arc<dyn Fn() -> Box<dyn FormData> + Send + Sync>;

/// The value of one form field.
pub enum PartValue {
    /// A text value.
    Text(String),
    /// A streamed value of unknown length.
    Stream(ByteStream),
    /// A buffered value.
    Bytes(Bytes),
}

impl fmt::Debug for PartValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
        }
    }
}

/// One field of a [`MultipartForm`].
#[derive(Debug)]
pub struct FormPart {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: PartValue,
    /// File metadata.
    pub meta: PartMeta,
}

impl FormPart {
    /// The text value, if this is a text field.
    pub fn text(&self) -> Option<&str> {
        match self.value {
            PartValue::Text(ref text) => Some(text),
            _ => None,
        }
    }

    /// The buffered bytes, if this is a buffered field.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self.value {
            PartValue::Bytes(ref bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Multipart form data as an ordered list of fields.
///
/// This is the form type the default transport sends.
#[derive(Debug, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Create a new empty multipart form.
    pub fn new() -> Self {
        Self::default()
    }

    /// The fields in the order they were appended.
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Consume the form and return its fields.
    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }

    /// Find a field by name.
    pub fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// Convert to a reqwest form.
    pub(crate) fn into_reqwest(self) -> reqwest::multipart::Form {
        self.parts
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, part| {
                let FormPart { name, value, meta } = part;
                let part = match value {
                    PartValue::Text(text) => return form.text(name, text),
                    PartValue::Stream(stream) => {
                        let part = Part::stream(reqwest::Body::wrap_stream(stream));
                        match meta.filename {
                            Some(filename) => part.file_name(filename),
                            None => part,
                        }
                    }
                    PartValue::Bytes(bytes) => bytes_part(bytes, &meta),
                };
                form.part(name, part)
            })
    }
}

fn bytes_part(bytes: Bytes, meta: &PartMeta) -> Part {
    let length = meta.known_length.unwrap_or(bytes.len() as u64);
    let build = || {
        let part = Part::stream_with_length(bytes.clone(), length);
        match meta.filename {
            Some(ref filename) => part.file_name(filename.clone()),
            None => part,
        }
    };
    // mime_str consumes the part, so rebuild it when the type is rejected
    match meta.content_type {
        Some(ref mime) => build().mime_str(mime).unwrap_or_else(|e| {
            tracing::warn!(target: "upload_link::multipart", "Invalid MIME type '{}': {}", mime, e);
            build()
        }),
        None => build(),
    }
}

impl FormData for MultipartForm {
    fn append_text(&mut self, name: &str, value: String) {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::Text(value),
            meta: PartMeta::default(),
        });
    }

    fn append_stream(&mut self, name: &str, stream: ByteStream) {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::Stream(stream),
            meta: PartMeta::default(),
        });
    }

    fn append_blob(&mut self, name: &str, blob: Blob) {
        let (filename, content_type, bytes) = blob.into_parts();
        let meta = PartMeta {
            filename: Some(filename),
            content_type,
            known_length: Some(bytes.len() as u64),
        };
        self.append_buffer(name, bytes, meta);
    }

    fn append_buffer(&mut self, name: &str, buffer: Bytes, meta: PartMeta) {
        self.parts.push(FormPart {
            name: name.to_string(),
            value: PartValue::Bytes(buffer),
            meta,
        });
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
