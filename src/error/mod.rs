//! Error types for layer transfer and bundle export
//!
//! Every operation is fail-fast: the first error aborts the enclosing
//! operation and carries the digest, reference or path it was working on.

pub mod handlers;

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferError>;

/// Why a registry name, tag or digest reference was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceErrorKind {
    Empty,
    InvalidRegistry,
    InvalidRepository,
    InvalidTag,
    MissingDigest,
    InvalidDigest,
}

impl fmt::Display for ReferenceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReferenceErrorKind::Empty => "empty reference",
            ReferenceErrorKind::InvalidRegistry => "invalid registry",
            ReferenceErrorKind::InvalidRepository => "invalid repository name",
            ReferenceErrorKind::InvalidTag => "invalid tag",
            ReferenceErrorKind::MissingDigest => "missing @digest",
            ReferenceErrorKind::InvalidDigest => "invalid digest",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum TransferError {
    /// Malformed repository, tag or digest reference string
    #[error("parsing reference {input:?}: {kind}")]
    ReferenceParse {
        input: String,
        kind: ReferenceErrorKind,
    },

    /// Malformed `algorithm:hex` digest string
    #[error("parsing digest {input:?}: {reason}")]
    HashParse { input: String, reason: String },

    /// Transport or HTTP failure from the fetch or write capability
    #[error("registry error while {operation} {target}: {message}")]
    Registry {
        operation: String,
        target: String,
        message: String,
    },

    /// Creating the destination archive or writing one of its entries failed
    #[error("writing archive {}{}: {source}", path.display(), entry_suffix(entry))]
    ArchiveWrite {
        path: PathBuf,
        entry: Option<String>,
        #[source]
        source: std::io::Error,
    },

    /// Raw manifest, raw config or config digest could not be obtained
    #[error("manifest error: {0}")]
    Manifest(String),

    /// A step of a multi-layer operation failed for the named layer
    #[error("layer {reference}: {source}")]
    Layer {
        reference: String,
        #[source]
        source: Box<TransferError>,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

fn entry_suffix(entry: &Option<String>) -> String {
    match entry {
        Some(name) => format!(" (entry {})", name),
        None => String::new(),
    }
}

impl TransferError {
    pub fn registry(
        operation: impl Into<String>,
        target: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        TransferError::Registry {
            operation: operation.into(),
            target: target.to_string(),
            message: message.into(),
        }
    }

    pub fn reference(input: impl Into<String>, kind: ReferenceErrorKind) -> Self {
        TransferError::ReferenceParse {
            input: input.into(),
            kind,
        }
    }

    pub fn archive(path: impl Into<PathBuf>, entry: Option<&str>, source: std::io::Error) -> Self {
        TransferError::ArchiveWrite {
            path: path.into(),
            entry: entry.map(str::to_string),
            source,
        }
    }

    /// Attach the layer reference an operation failed on
    pub fn for_layer(self, reference: impl fmt::Display) -> Self {
        TransferError::Layer {
            reference: reference.to_string(),
            source: Box::new(self),
        }
    }

    /// Follow `Layer` wrappers down to the underlying failure
    pub fn root(&self) -> &TransferError {
        match self {
            TransferError::Layer { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for TransferError {
    fn from(err: serde_json::Error) -> Self {
        TransferError::Manifest(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_context_names_reference() {
        let err = TransferError::registry("fetching blob", "sha256:abc", "HTTP 500")
            .for_layer("registry.example.com/app@sha256:abc");
        let text = err.to_string();
        assert!(text.starts_with("layer registry.example.com/app@sha256:abc"));
        assert!(text.contains("fetching blob sha256:abc"));
        assert!(matches!(err.root(), TransferError::Registry { .. }));
    }

    #[test]
    fn test_archive_error_mentions_entry() {
        let err = TransferError::archive(
            "/tmp/out.tar",
            Some("manifest.json"),
            std::io::Error::other("disk full"),
        );
        assert_eq!(
            err.to_string(),
            "writing archive /tmp/out.tar (entry manifest.json): disk full"
        );
    }

    #[test]
    fn test_reference_error_display() {
        let err = TransferError::reference("Bad/Name", ReferenceErrorKind::InvalidRepository);
        assert_eq!(
            err.to_string(),
            "parsing reference \"Bad/Name\": invalid repository name"
        );
    }
}
