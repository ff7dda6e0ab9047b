//! Blob fetch capability
//!
//! The fetcher is the only way layer content leaves a registry. Retry,
//! authentication and timeout policy belong to the implementation; callers
//! get back whatever error it produced.

use crate::error::Result;
use crate::image::{BlobStream, Hash, SizeHint};
use crate::logging::Redaction;
use crate::name::Repository;
use async_trait::async_trait;
use std::sync::Arc;

/// Parameters for a blob GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRequest {
    pub digest: Hash,
    pub size_hint: SizeHint,
    pub redaction: Option<Redaction>,
}

impl BlobRequest {
    pub fn new(digest: Hash) -> Self {
        Self {
            digest,
            size_hint: SizeHint::Unknown,
            redaction: None,
        }
    }

    pub fn with_size_hint(mut self, size_hint: SizeHint) -> Self {
        self.size_hint = size_hint;
        self
    }

    /// Keep the response body out of every log line
    pub fn redacted(mut self, redaction: Redaction) -> Self {
        self.redaction = Some(redaction);
        self
    }

    /// One-line summary for verbose logs
    pub fn describe(&self, location: &str) -> String {
        let size = match self.size_hint {
            SizeHint::Known(size) => format!("{} bytes", size),
            SizeHint::Unknown => "size unknown".to_string(),
        };
        match &self.redaction {
            Some(redaction) => format!(
                "GET {} ({}, body <omitted: {}>)",
                location,
                size,
                redaction.reason()
            ),
            None => format!("GET {} ({})", location, size),
        }
    }
}

/// Reads blobs from one repository
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn repository(&self) -> &Repository;

    /// Stream the blob's bytes; the returned stream carries the request's redaction
    async fn fetch_blob(&self, request: &BlobRequest) -> Result<BlobStream>;

    /// Content length from a metadata-only request
    async fn head_blob(&self, digest: &Hash) -> Result<u64>;

    /// `Ok(false)` only when the registry confirms the blob is absent
    async fn blob_exists(&self, digest: &Hash) -> Result<bool>;
}

/// Produces fetchers bound to a repository
pub trait Transport: Send + Sync {
    fn fetcher(&self, repository: &Repository) -> Result<Arc<dyn Fetcher>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> Hash {
        Hash::parse("sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
            .unwrap()
    }

    #[test]
    fn test_redacted_request_description() {
        let request = BlobRequest::new(digest()).redacted(Redaction::binary_blob());
        assert_eq!(
            request.describe("https://ghcr.io/v2/org/app/blobs/sha256:e3b0"),
            "GET https://ghcr.io/v2/org/app/blobs/sha256:e3b0 (size unknown, body <omitted: omitting binary blobs from logs>)"
        );
    }

    #[test]
    fn test_plain_request_description() {
        let request = BlobRequest::new(digest()).with_size_hint(SizeHint::Known(12));
        assert_eq!(request.describe("u"), "GET u (12 bytes)");
    }
}
