//! Multipart request encoding.
//!
//! Operations that carry files are sent as a GraphQL multipart request: an
//! `operations` field with the JSON payload (files replaced by `null`), a
//! `map` field telling the server where each file belongs, and one numbered
//! field per file.
//!
//! [`encode_body`] builds the form synchronously; [`materialize`] resolves
//! deferred uploads and appends the file parts before the request is sent.

mod encode;
mod form;
mod materialize;

pub use encode::{EncodedBody, PendingMultipart, encode_body};
pub use form::{FormData, FormDataConstructor, FormPart, MultipartForm, PartMeta, PartValue};
pub use materialize::materialize;
