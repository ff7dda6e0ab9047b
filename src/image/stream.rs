//! Streaming blob content
//!
//! Layer blobs can be gigabytes, so content is handed around as a stream of
//! chunks rather than a buffer.

use crate::logging::Redaction;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::io;

/// Upper bound on what a size hint may pre-allocate; the hint comes from the
/// remote side
const MAX_PREALLOCATION: u64 = 1 << 20;

/// What the producer knows about a stream's length up front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeHint {
    Unknown,
    Known(u64),
}

/// A readable blob body plus the metadata that travels with it
pub struct BlobStream {
    chunks: BoxStream<'static, io::Result<Bytes>>,
    size_hint: SizeHint,
    redaction: Option<Redaction>,
}

impl BlobStream {
    pub fn new(chunks: BoxStream<'static, io::Result<Bytes>>, size_hint: SizeHint) -> Self {
        Self {
            chunks,
            size_hint,
            redaction: None,
        }
    }

    /// A stream over bytes already in memory
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size_hint = SizeHint::Known(data.len() as u64);
        Self::new(stream::once(async move { Ok(data) }).boxed(), size_hint)
    }

    /// Mark the content as never to be rendered into logs
    pub fn redacted(mut self, redaction: Redaction) -> Self {
        self.redaction = Some(redaction);
        self
    }

    pub fn redaction(&self) -> Option<&Redaction> {
        self.redaction.as_ref()
    }

    pub fn size_hint(&self) -> SizeHint {
        self.size_hint
    }

    pub async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        self.chunks.next().await
    }

    /// Give up the metadata and keep only the chunks, e.g. for an HTTP body
    pub fn into_chunks(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.chunks
    }

    /// Drain the stream into memory; only for small blobs such as configs
    pub async fn read_to_end(mut self) -> io::Result<Vec<u8>> {
        let mut data = match self.size_hint {
            SizeHint::Known(size) => Vec::with_capacity(size.min(MAX_PREALLOCATION) as usize),
            SizeHint::Unknown => Vec::new(),
        };
        while let Some(chunk) = self.next_chunk().await {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }
}

impl fmt::Debug for BlobStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStream")
            .field("size_hint", &self.size_hint)
            .field("redaction", &self.redaction)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chunked_stream_reads_in_order() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ])
        .boxed();
        let blob = BlobStream::new(chunks, SizeHint::Unknown).redacted(Redaction::binary_blob());
        assert_eq!(blob.size_hint(), SizeHint::Unknown);
        assert_eq!(blob.redaction(), Some(&Redaction::binary_blob()));
        assert_eq!(blob.read_to_end().await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_stream_error_surfaces() {
        let chunks = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::other("connection reset")),
        ])
        .boxed();
        let err = BlobStream::new(chunks, SizeHint::Known(100))
            .read_to_end()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }

    #[tokio::test]
    async fn test_oversized_hint_is_not_trusted() {
        let blob = BlobStream::new(
            stream::iter(vec![Ok(Bytes::from_static(b"tiny"))]).boxed(),
            SizeHint::Known(u64::MAX),
        );
        assert_eq!(blob.read_to_end().await.unwrap(), b"tiny");
    }
}
