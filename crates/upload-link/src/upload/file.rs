//! File-like values that can be embedded in GraphQL variables.

use std::fmt;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, Stream};
use futures_util::{FutureExt, StreamExt, TryStreamExt};
use tokio::io::AsyncReadExt;

use crate::error::BoxError;

/// Read size used when streaming files from disk.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A stream of byte chunks feeding a multipart part.
pub type ByteStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// An in-memory file with a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

impl Blob {
    /// Create a blob named `name` holding `bytes`.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Set the MIME type sent with the blob.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// The blob's name, used as the part filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The blob's MIME type, if set.
    pub fn mime_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The blob's contents.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub(crate) fn into_parts(self) -> (String, Option<String>, Bytes) {
        (self.name, self.content_type, self.bytes)
    }
}

/// A resolved upload: file metadata plus a way to open its contents.
///
/// Each call to [`create_read_stream`](Self::create_read_stream) opens a
/// fresh stream over the whole file.
#[derive(Clone)]
pub struct FileDescriptor {
    filename: String,
    mimetype: Option<String>,
    opener: Arc<dyn Fn() -> ByteStream + Send + Sync>,
}

impl FileDescriptor {
    /// Create a descriptor whose contents come from `open`.
    pub fn new<F>(filename: impl Into<String>, mimetype: Option<String>, open: F) -> Self
    where
        F: Fn() -> ByteStream + Send + Sync + 'static,
    {
        Self {
            filename: filename.into(),
            mimetype,
            opener: Arc::new(open),
        }
    }

    /// Create a descriptor over an in-memory buffer.
    pub fn from_bytes(
        filename: impl Into<String>,
        mimetype: Option<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let bytes = bytes.into();
        Self::new(filename, mimetype, move || {
            stream::once(futures_util::future::ready(Ok::<_, BoxError>(bytes.clone()))).boxed()
        })
    }

    /// The original filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The MIME type reported for the file.
    pub fn mimetype(&self) -> Option<&str> {
        self.mimetype.as_deref()
    }

    /// Open a new stream over the file contents.
    pub fn create_read_stream(&self) -> ByteStream {
        (self.opener)()
    }
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("filename", &self.filename)
            .field("mimetype", &self.mimetype)
            .finish_non_exhaustive()
    }
}

/// An upload whose descriptor is produced asynchronously.
pub struct DeferredUpload {
    future: BoxFuture<'static, Result<FileDescriptor, BoxError>>,
}

impl DeferredUpload {
    /// Wait for the descriptor.
    pub async fn resolve(self) -> Result<FileDescriptor, BoxError> {
        self.future.await
    }
}

impl fmt::Debug for DeferredUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeferredUpload")
    }
}

/// Which kind of file-like value an [`Upload`] holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadKind {
    /// An already-open byte stream.
    Stream,
    /// A descriptor that resolves later and is drained into memory.
    Deferred,
    /// An in-memory named blob.
    Blob,
}

/// A file-like value destined for a multipart upload.
///
/// The variant is fixed when the upload is created, so the encoder never
/// has to inspect what it was handed.
pub enum Upload {
    /// A byte stream appended to the form as-is.
    Stream(ByteStream),
    /// A pending file descriptor.
    Deferred(DeferredUpload),
    /// A named in-memory blob.
    Blob(Blob),
}

impl Upload {
    /// Upload the chunks produced by `stream`.
    pub fn stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::Stream(stream.map_err(Into::into).boxed())
    }

    /// Upload the file described by `descriptor` once it resolves.
    pub fn deferred<F, E>(descriptor: F) -> Self
    where
        F: Future<Output = Result<FileDescriptor, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::Deferred(DeferredUpload {
            future: descriptor.map(|result| result.map_err(Into::into)).boxed(),
        })
    }

    /// Upload an already-resolved descriptor.
    pub fn descriptor(descriptor: FileDescriptor) -> Self {
        Self::deferred(futures_util::future::ready(Ok::<_, BoxError>(descriptor)))
    }

    /// Upload a named in-memory blob.
    pub fn blob(blob: Blob) -> Self {
        Self::Blob(blob)
    }

    /// Upload a file from disk.
    ///
    /// The file is checked when the upload resolves and read in chunks when
    /// it is drained; the filename is taken from the last path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::deferred(async move {
            let metadata = tokio::fs::metadata(&path).await?;
            if !metadata.is_file() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is not a regular file", path.display()),
                ));
            }
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(FileDescriptor::new(filename, None, move || {
                read_file(path.clone())
            }))
        })
    }

    /// The kind of value held.
    pub fn kind(&self) -> UploadKind {
        match self {
            Self::Stream(_) => UploadKind::Stream,
            Self::Deferred(_) => UploadKind::Deferred,
            Self::Blob(_) => UploadKind::Blob,
        }
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(_) => f.write_str("Upload::Stream"),
            Self::Deferred(_) => f.write_str("Upload::Deferred"),
            Self::Blob(blob) => f.debug_tuple("Upload::Blob").field(blob).finish(),
        }
    }
}

impl From<Blob> for Upload {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

fn read_file(path: PathBuf) -> ByteStream {
    stream::try_unfold((path, None), |(path, file)| async move {
        let mut file = match file {
            Some(file) => file,
            None => tokio::fs::File::open(&path).await?,
        };
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        let read = file.read(&mut buf).await?;
        if read == 0 {
            return Ok::<_, io::Error>(None);
        }
        buf.truncate(read);
        Ok(Some((Bytes::from(buf), (path, Some(file)))))
    })
    .map_err(BoxError::from)
    .boxed()
}
