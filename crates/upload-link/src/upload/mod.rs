//! File uploads embedded in GraphQL variables.
//!
//! Any variable may hold an [`Upload`]: an open byte stream, a descriptor
//! that resolves later (for example a file on disk), or a named in-memory
//! [`Blob`]. Before a request is sent the uploads are pulled out of the
//! request body by [`extract_files`] and replaced with `null`.
//!
//! # Example
//!
//! ```ignore
//! use upload_link::{Blob, Operation, Upload};
//!
//! let operation = Operation::new("mutation ($file: Upload!) { upload(file: $file) }")
//!     .variable("file", Upload::from_path("./report.pdf"));
//!
//! let avatar = Operation::new("mutation ($image: Upload!) { setAvatar(image: $image) }")
//!     .variable("image", Blob::new("me.png", png_bytes).content_type("image/png"));
//! ```

mod extract;
mod file;
mod value;

pub use extract::{ExtractedFile, NodeMut, Tree, extract_files};
pub use file::{Blob, ByteStream, DeferredUpload, FileDescriptor, Upload, UploadKind};
pub use value::UploadValue;
