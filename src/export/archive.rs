//! Uncompressed tar output for export bundles
//!
//! Entries go through `tar::Builder`, which handles block padding, the end
//! marker and GNU long-name records (a sha512 layer name does not fit a
//! plain header). The builder is synchronous, so each append runs on the
//! blocking pool and streamed layer content is bridged into it with
//! `SyncIoBridge`; a whole blob is never buffered.

use crate::error::{Result, TransferError};
use crate::image::BlobStream;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};
use tokio_util::io::{StreamReader, SyncIoBridge};

type TarFile = Builder<BufWriter<std::fs::File>>;

fn entry_header(size: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_size(size);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_entry_type(EntryType::Regular);
    header
}

/// Fails the read when content runs past or stops short of the declared size
struct ExactLength<R> {
    inner: R,
    declared: u64,
    read: u64,
}

impl<R: Read> Read for ExactLength<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        if self.read > self.declared {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("content is longer than the declared {} bytes", self.declared),
            ));
        }
        if n == 0 && self.read < self.declared {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("content ended after {} of {} bytes", self.read, self.declared),
            ));
        }
        Ok(n)
    }
}

pub struct BundleWriter {
    builder: Option<TarFile>,
    path: PathBuf,
}

impl BundleWriter {
    /// Create (or truncate) the archive at `path`
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| TransferError::archive(&path, None, e))?
            .into_std()
            .await;

        let mut builder = Builder::new(BufWriter::new(file));
        builder.mode(tar::HeaderMode::Deterministic);
        Ok(Self {
            builder: Some(builder),
            path,
        })
    }

    /// Run `op` against the builder on the blocking pool
    async fn blocking<F>(&mut self, entry: Option<&str>, op: F) -> Result<()>
    where
        F: FnOnce(&mut TarFile) -> io::Result<()> + Send + 'static,
    {
        let mut builder = self.builder.take().ok_or_else(|| {
            TransferError::archive(&self.path, entry, io::Error::other("archive is already closed"))
        })?;

        let (builder, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut builder);
            (builder, result)
        })
        .await
        .map_err(|e| TransferError::archive(&self.path, entry, io::Error::other(e)))?;

        self.builder = Some(builder);
        result.map_err(|e| TransferError::archive(&self.path, entry, e))
    }

    /// Append an entry whose content arrives as a stream.
    ///
    /// The header is written with `size` up front, so the stream must yield
    /// exactly that many bytes; anything else fails the entry.
    pub async fn append_stream(
        &mut self,
        name: &str,
        size: u64,
        content: BlobStream,
    ) -> Result<()> {
        let reader = ExactLength {
            inner: SyncIoBridge::new(StreamReader::new(content.into_chunks())),
            declared: size,
            read: 0,
        };
        let entry = name.to_string();
        self.blocking(Some(name), move |builder| {
            builder.append_data(&mut entry_header(size), &entry, reader)
        })
        .await
    }

    pub async fn append_bytes(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let entry = name.to_string();
        let data = data.to_vec();
        self.blocking(Some(name), move |builder| {
            builder.append_data(&mut entry_header(data.len() as u64), &entry, data.as_slice())
        })
        .await
    }

    /// Write the end-of-archive marker and flush
    pub async fn finish(mut self) -> Result<()> {
        self.blocking(None, |builder| {
            builder.finish()?;
            builder.get_mut().flush()
        })
        .await
    }

    /// Flush and close after a failed entry.
    ///
    /// The file keeps whatever entries completed; it has no index entry and
    /// is not a usable bundle.
    pub async fn abandon(mut self) -> Result<()> {
        self.blocking(None, |builder| builder.get_mut().flush()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::SizeHint;
    use bytes::Bytes;
    use futures::stream::{self, StreamExt};

    fn chunked(parts: &[&'static [u8]]) -> BlobStream {
        let chunks: Vec<io::Result<Bytes>> =
            parts.iter().map(|part| Ok(Bytes::from_static(part))).collect();
        BlobStream::new(stream::iter(chunks).boxed(), SizeHint::Unknown)
    }

    fn read_back(path: &Path) -> Vec<(String, Vec<u8>)> {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = tar::Archive::new(file);
        archive
            .entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                assert_eq!(entry.header().mode().unwrap(), 0o644);
                let name = entry.path().unwrap().to_string_lossy().to_string();
                let mut body = Vec::new();
                entry.read_to_end(&mut body).unwrap();
                (name, body)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_entries_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.tar");

        let mut bundle = BundleWriter::create(&path).await.unwrap();
        bundle
            .append_stream("abc.tar.gz", 11, chunked(&[b"hello ", b"world"]))
            .await
            .unwrap();
        bundle.append_bytes("manifest.json", b"{}").await.unwrap();
        bundle.finish().await.unwrap();

        assert_eq!(
            read_back(&path),
            vec![
                ("abc.tar.gz".to_string(), b"hello world".to_vec()),
                ("manifest.json".to_string(), b"{}".to_vec()),
            ]
        );
        assert_eq!(std::fs::metadata(&path).unwrap().len() % 512, 0);
    }

    #[tokio::test]
    async fn test_names_longer_than_a_header_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.tar");
        let name = format!("{}.tar.gz", "ab".repeat(64));
        assert!(name.len() > 100);

        let mut bundle = BundleWriter::create(&path).await.unwrap();
        bundle.append_stream(&name, 3, chunked(&[b"gz!"])).await.unwrap();
        bundle.finish().await.unwrap();

        assert_eq!(read_back(&path), vec![(name, b"gz!".to_vec())]);
    }

    #[tokio::test]
    async fn test_short_stream_fails_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut bundle = BundleWriter::create(dir.path().join("b.tar")).await.unwrap();
        let err = bundle
            .append_stream("abc.tar.gz", 100, chunked(&[b"short"]))
            .await
            .unwrap_err();
        match err {
            TransferError::ArchiveWrite { entry, source, .. } => {
                assert_eq!(entry.as_deref(), Some("abc.tar.gz"));
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_long_stream_fails_the_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut bundle = BundleWriter::create(dir.path().join("b.tar")).await.unwrap();
        let err = bundle
            .append_stream("abc.tar.gz", 3, chunked(&[b"too", b"long"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("longer than the declared 3 bytes"));
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("b.tar");
        let err = BundleWriter::create(&path).await.err().unwrap();
        assert!(matches!(err, TransferError::ArchiveWrite { path: ref p, .. } if *p == path));
    }
}
