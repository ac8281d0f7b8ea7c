//! Turning pending uploads into form parts.

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use futures_util::future::try_join_all;

use super::encode::PendingMultipart;
use super::form::{FormData, PartMeta};
use crate::error::{Result, UploadLinkError};
use crate::upload::{Blob, ByteStream, DeferredUpload, Upload};

enum ReadyPart {
    Stream(ByteStream),
    Blob(Blob),
    Buffer(Bytes, PartMeta),
}

/// Resolve every upload of `pending` and append the file parts.
///
/// Deferred uploads are resolved and drained concurrently, each into a
/// single buffer with its filename, MIME type and exact length. Parts are
/// appended in map index order once all of them are ready. The first
/// failure is returned as [`UploadLinkError::Drain`] and no part is
/// appended.
pub async fn materialize(pending: PendingMultipart) -> Result<Box<dyn FormData>> {
    let PendingMultipart { mut form, uploads } = pending;

    let parts = try_join_all(
        uploads
            .into_iter()
            .enumerate()
            .map(|(index, upload)| prepare(index, upload)),
    )
    .await?;

    for (index, part) in parts.into_iter().enumerate() {
        let name = index.to_string();
        match part {
            ReadyPart::Stream(stream) => form.append_stream(&name, stream),
            ReadyPart::Blob(blob) => form.append_blob(&name, blob),
            ReadyPart::Buffer(bytes, meta) => form.append_buffer(&name, bytes, meta),
        }
    }

    Ok(form)
}

async fn prepare(index: usize, upload: Upload) -> Result<ReadyPart> {
    match upload {
        Upload::Stream(stream) => Ok(ReadyPart::Stream(stream)),
        Upload::Blob(blob) => Ok(ReadyPart::Blob(blob)),
        Upload::Deferred(deferred) => drain(index, deferred).await,
    }
}

async fn drain(index: usize, deferred: DeferredUpload) -> Result<ReadyPart> {
    let descriptor = deferred
        .resolve()
        .await
        .map_err(|e| UploadLinkError::drain(index, e))?;

    let mut stream = descriptor.create_read_stream();
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| UploadLinkError::drain(index, e))?;
        tracing::trace!(target: "upload_link::multipart", index, len = chunk.len(), "drained chunk");
        buffer.extend_from_slice(&chunk);
    }

    let meta = PartMeta {
        filename: Some(descriptor.filename().to_string()),
        content_type: descriptor.mimetype().map(str::to_string),
        known_length: Some(buffer.len() as u64),
    };
    tracing::debug!(
        target: "upload_link::multipart",
        index,
        filename = descriptor.filename(),
        len = buffer.len(),
        "materialized upload"
    );
    Ok(ReadyPart::Buffer(buffer.freeze(), meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multipart::{MultipartForm, PartValue};
    use crate::error::BoxError;
    use crate::upload::FileDescriptor;
    use futures_util::stream;
    use std::io;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn pending(uploads: Vec<Upload>) -> PendingMultipart {
        let mut form = MultipartForm::new();
        form.append_text("operations", "{}".into());
        form.append_text("map", "{}".into());
        PendingMultipart {
            form: Box::new(form),
            uploads,
        }
    }

    fn chunked(filename: &str, chunks: &'static [&'static str]) -> FileDescriptor {
        FileDescriptor::new(filename, Some("text/plain".into()), move || {
            stream::iter(chunks.iter().map(|c| Ok(Bytes::from_static(c.as_bytes())))).boxed()
        })
    }

    #[tokio::test]
    async fn test_parts_follow_index_order() {
        let slow = Upload::deferred(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, io::Error>(chunked("slow.txt", &["sl", "ow"]))
        });
        let fast = Upload::descriptor(chunked("fast.txt", &["fa", "st"]));
        let blob = Upload::blob(Blob::new("blob.bin", vec![1u8, 2]));

        let form = materialize(pending(vec![slow, fast, blob])).await.unwrap();
        let form = form.into_any().downcast::<MultipartForm>().unwrap();

        let names: Vec<_> = form.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["operations", "map", "0", "1", "2"]);

        let first = form.part("0").unwrap();
        assert_eq!(first.bytes().unwrap().as_ref(), b"slow");
        assert_eq!(first.meta.filename.as_deref(), Some("slow.txt"));
        assert_eq!(first.meta.content_type.as_deref(), Some("text/plain"));
        assert_eq!(first.meta.known_length, Some(4));
        assert_eq!(form.part("1").unwrap().bytes().unwrap().as_ref(), b"fast");
        assert_eq!(form.part("2").unwrap().meta.filename.as_deref(), Some("blob.bin"));
    }

    #[tokio::test]
    async fn test_deferred_uploads_resolve_concurrently() {
        // Each upload waits for the other, so a one-by-one drain never finishes.
        let barrier = Arc::new(Barrier::new(2));
        let uploads = ["a.txt", "b.txt"]
            .into_iter()
            .map(|name| {
                let barrier = barrier.clone();
                Upload::deferred(async move {
                    barrier.wait().await;
                    Ok::<_, io::Error>(chunked(name, &["ok"]))
                })
            })
            .collect();

        let form = tokio::time::timeout(Duration::from_secs(2), materialize(pending(uploads)))
            .await
            .expect("uploads should be drained concurrently")
            .unwrap();
        let form = form.into_any().downcast::<MultipartForm>().unwrap();
        assert_eq!(form.part("0").unwrap().meta.filename.as_deref(), Some("a.txt"));
        assert_eq!(form.part("1").unwrap().meta.filename.as_deref(), Some("b.txt"));
    }

    #[tokio::test]
    async fn test_streams_are_appended_undrained() {
        let upload = Upload::stream(stream::iter(vec![Ok::<_, io::Error>(Bytes::from("x"))]));
        let form = materialize(pending(vec![upload])).await.unwrap();
        let form = form.into_any().downcast::<MultipartForm>().unwrap();
        assert!(matches!(form.part("0").unwrap().value, PartValue::Stream(_)));
    }

    #[tokio::test]
    async fn test_stream_error_reports_index() {
        let broken = FileDescriptor::new("broken.txt", None, || {
            stream::iter(vec![
                Ok(Bytes::from("partial")),
                Err(BoxError::from(io::Error::other("disk on fire"))),
            ])
            .boxed()
        });
        let uploads = vec![
            Upload::blob(Blob::new("ok.txt", "ok")),
            Upload::descriptor(broken),
        ];

        let Err(err) = materialize(pending(uploads)).await else {
            panic!("expected a drain error");
        };
        match err {
            UploadLinkError::Drain { index, ref source } => {
                assert_eq!(index, 1);
                assert_eq!(source.to_string(), "disk on fire");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolution_error_is_drain_error() {
        let upload = Upload::deferred(async {
            Err::<FileDescriptor, _>(io::Error::new(io::ErrorKind::NotFound, "gone"))
        });
        let Err(err) = materialize(pending(vec![upload])).await else {
            panic!("expected a drain error");
        };
        assert_eq!(err.to_string(), "Error while draining stream: gone");
    }
}
