//! Request body encoding.

use std::fmt;

use http::HeaderMap;
use http::header::CONTENT_TYPE;
use indexmap::IndexMap;

use super::form::FormData;
use crate::error::{Result, UploadLinkError};
use crate::graphql::object_path;
use crate::http::serialize_fetch_parameter;
use crate::upload::{ExtractedFile, Upload};

/// The encoded request body.
#[derive(Debug)]
pub enum EncodedBody {
    /// The JSON payload, sent as is.
    Json(String),
    /// A multipart form still waiting for its file parts.
    Multipart(PendingMultipart),
}

impl EncodedBody {
    /// Whether the body is multipart.
    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// A form holding `operations` and `map`, plus the uploads that become its
/// numbered file parts.
pub struct PendingMultipart {
    pub(crate) form: Box<dyn FormData>,
    pub(crate) uploads: Vec<Upload>,
}

impl PendingMultipart {
    /// Number of file parts.
    pub fn len(&self) -> usize {
        self.uploads.len()
    }

    /// Whether there are no file parts.
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty()
    }

    /// The uploads in map index order.
    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }
}

impl fmt::Debug for PendingMultipart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingMultipart")
            .field("uploads", &self.uploads)
            .finish_non_exhaustive()
    }
}

/// Encode `payload` and the extracted `files` as a request body.
///
/// Without files the payload is returned untouched. Otherwise the
/// `content-type` header is removed so the transport can set the multipart
/// boundary, a form is requested from `form_data`, and the `operations` and
/// `map` fields are appended. File `i` is mapped to the object path it was
/// extracted from, under the key `"i"`.
pub fn encode_body<F>(
    payload: String,
    files: Vec<ExtractedFile<Upload>>,
    headers: &mut HeaderMap,
    form_data: F,
) -> Result<EncodedBody>
where
    F: FnOnce() -> Option<Box<dyn FormData>>,
{
    if files.is_empty() {
        return Ok(EncodedBody::Json(payload));
    }

    headers.remove(CONTENT_TYPE);

    let mut form = form_data().ok_or_else(|| {
        UploadLinkError::Configuration(
            "the transport has no multipart form and no server_form_data was configured".into(),
        )
    })?;

    let map: IndexMap<String, Vec<String>> = files
        .iter()
        .enumerate()
        .map(|(index, file)| (index.to_string(), vec![object_path(&file.path)]))
        .collect();
    let map = serialize_fetch_parameter(&map, "Map")?;

    form.append_text("operations", payload);
    form.append_text("map", map);

    tracing::debug!(target: "upload_link::multipart", files = files.len(), "encoded multipart body");

    Ok(EncodedBody::Multipart(PendingMultipart {
        form,
        uploads: files.into_iter().map(|file| file.file).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::MultipartForm;
    use crate::upload::{Blob, UploadValue, extract_files};
    use http::HeaderValue;
    use serde_json::json;

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-trace", HeaderValue::from_static("1"));
        headers
    }

    fn native_form() -> Option<Box<dyn FormData>> {
        Some(Box::new(MultipartForm::new()))
    }

    #[test]
    fn test_no_files_keeps_payload_and_headers() {
        let mut headers = headers();
        let body = encode_body("{\"query\":\"{ a }\"}".into(), Vec::new(), &mut headers, || {
            panic!("form requested without files")
        })
        .unwrap();

        match body {
            EncodedBody::Json(payload) => assert_eq!(payload, "{\"query\":\"{ a }\"}"),
            other => panic!("unexpected body: {other:?}"),
        }
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_files_produce_operations_and_map() {
        let mut variables = UploadValue::object();
        variables.insert("file", Blob::new("a.txt", "a"));
        variables.insert("docs", vec![UploadValue::from(Blob::new("b.txt", "b"))]);
        let mut body = UploadValue::object();
        body.insert("variables", variables);

        let files = extract_files(&mut body);
        let payload = serde_json::to_string(&body).unwrap();
        let mut headers = headers();
        let encoded = encode_body(payload.clone(), files, &mut headers, native_form).unwrap();

        assert!(headers.get(CONTENT_TYPE).is_none());
        assert_eq!(headers["x-trace"], "1");

        let EncodedBody::Multipart(pending) = encoded else {
            panic!("expected multipart body");
        };
        assert_eq!(pending.len(), 2);

        let form = pending.form.into_any().downcast::<MultipartForm>().unwrap();
        let names: Vec<_> = form.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["operations", "map"]);
        assert_eq!(form.part("operations").unwrap().text(), Some(payload.as_str()));

        let map: serde_json::Value =
            serde_json::from_str(form.part("map").unwrap().text().unwrap()).unwrap();
        assert_eq!(
            map,
            json!({"0": ["variables.file"], "1": ["variables.docs.0"]})
        );
    }

    #[test]
    fn test_missing_form_is_configuration_error() {
        let mut body = UploadValue::object();
        body.insert("variables", UploadValue::from_iter([("file", Blob::new("a", "a"))]));
        let files = extract_files(&mut body);

        let err = encode_body("{}".into(), files, &mut headers(), || None).unwrap_err();
        assert!(matches!(err, UploadLinkError::Configuration(_)));
        assert!(err.to_string().starts_with("no FormData implementation available"));
    }
}
