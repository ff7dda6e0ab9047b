use super::{DEFAULT_TAG, NameOptions, Repository};
use crate::error::{ReferenceErrorKind, Result, TransferError};
use crate::image::Hash;
use std::fmt;

/// `repository:tag`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    repository: Repository,
    tag: String,
}

impl Tag {
    pub fn parse(input: &str, options: &NameOptions) -> Result<Self> {
        let input = input.trim();
        let (name, tag) = split_tag(input);
        let tag = tag.unwrap_or(DEFAULT_TAG);

        if !is_valid_tag(tag) {
            return Err(TransferError::reference(input, ReferenceErrorKind::InvalidTag));
        }

        let repository = Repository::parse(name, options).map_err(|e| rename_input(e, input))?;
        Ok(Self {
            repository,
            tag: tag.to_string(),
        })
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// `repository@algorithm:hex`; also used to point at a single blob
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    repository: Repository,
    hash: Hash,
}

impl Digest {
    pub fn parse(input: &str, options: &NameOptions) -> Result<Self> {
        let input = input.trim();
        let (name, digest) = input
            .rsplit_once('@')
            .ok_or_else(|| TransferError::reference(input, ReferenceErrorKind::MissingDigest))?;

        let hash = Hash::parse(digest)
            .map_err(|_| TransferError::reference(input, ReferenceErrorKind::InvalidDigest))?;

        // a tag alongside the digest is allowed and ignored
        let (name, _) = split_tag(name);
        let repository = Repository::parse(name, options).map_err(|e| rename_input(e, input))?;
        Ok(Self { repository, hash })
    }

    pub fn new(repository: Repository, hash: Hash) -> Self {
        Self { repository, hash }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn hash(&self) -> &Hash {
        &self.hash
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repository, self.hash)
    }
}

/// Either a tag or a digest reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Reference {
    Tag(Tag),
    Digest(Digest),
}

impl Reference {
    pub fn parse(input: &str, options: &NameOptions) -> Result<Self> {
        if input.contains('@') {
            Digest::parse(input, options).map(Reference::Digest)
        } else {
            Tag::parse(input, options).map(Reference::Tag)
        }
    }

    pub fn repository(&self) -> &Repository {
        match self {
            Reference::Tag(tag) => tag.repository(),
            Reference::Digest(digest) => digest.repository(),
        }
    }

    /// The tag or digest string, as used in `/v2/<name>/manifests/<identifier>`
    pub fn identifier(&self) -> String {
        match self {
            Reference::Tag(tag) => tag.tag().to_string(),
            Reference::Digest(digest) => digest.hash().to_string(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Tag(tag) => tag.fmt(f),
            Reference::Digest(digest) => digest.fmt(f),
        }
    }
}

impl From<Tag> for Reference {
    fn from(tag: Tag) -> Self {
        Reference::Tag(tag)
    }
}

impl From<Digest> for Reference {
    fn from(digest: Digest) -> Self {
        Reference::Digest(digest)
    }
}

// The tag separator is the last ':' after the last '/', so registry ports
// are never mistaken for tags.
fn split_tag(input: &str) -> (&str, Option<&str>) {
    let last_segment_start = input.rfind('/').map(|pos| pos + 1).unwrap_or(0);
    match input[last_segment_start..].rfind(':') {
        Some(pos) => {
            let colon = last_segment_start + pos;
            (&input[..colon], Some(&input[colon + 1..]))
        }
        None => (input, None),
    }
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    first_ok
        && tag.len() <= 128
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn rename_input(err: TransferError, input: &str) -> TransferError {
    match err {
        TransferError::ReferenceParse { kind, .. } => TransferError::reference(input, kind),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn opts() -> NameOptions {
        NameOptions::default()
    }

    #[test]
    fn test_tag_defaults_to_latest() {
        let tag = Tag::parse("nginx", &opts()).unwrap();
        assert_eq!(tag.tag(), "latest");
        assert_eq!(tag.to_string(), "index.docker.io/library/nginx:latest");
    }

    #[test]
    fn test_tag_with_registry_port() {
        let tag = Tag::parse("localhost:5000/app:v1.2", &opts()).unwrap();
        assert_eq!(tag.repository().registry().host(), "localhost:5000");
        assert_eq!(tag.repository().name(), "app");
        assert_eq!(tag.tag(), "v1.2");

        let untagged = Tag::parse("localhost:5000/app", &opts()).unwrap();
        assert_eq!(untagged.tag(), "latest");
    }

    #[test]
    fn test_digest_reference() {
        let input = format!("ghcr.io/org/app@sha256:{HEX}");
        let digest = Digest::parse(&input, &opts()).unwrap();
        assert_eq!(digest.repository().to_string(), "ghcr.io/org/app");
        assert_eq!(digest.hash().hex, HEX);
        assert_eq!(digest.to_string(), input);
    }

    #[test]
    fn test_digest_errors_carry_input() {
        let err = Digest::parse("ghcr.io/org/app", &opts()).unwrap_err();
        assert!(matches!(
            err,
            TransferError::ReferenceParse { ref input, kind: ReferenceErrorKind::MissingDigest }
                if input == "ghcr.io/org/app"
        ));

        let err = Digest::parse("ghcr.io/org/app@sha256:nothex", &opts()).unwrap_err();
        assert!(matches!(
            err,
            TransferError::ReferenceParse { kind: ReferenceErrorKind::InvalidDigest, .. }
        ));
    }

    #[test]
    fn test_reference_dispatch() {
        let tag = Reference::parse("ghcr.io/org/app:1.0", &opts()).unwrap();
        assert!(matches!(tag, Reference::Tag(_)));
        assert_eq!(tag.identifier(), "1.0");

        let digest = Reference::parse(&format!("ghcr.io/org/app@sha256:{HEX}"), &opts()).unwrap();
        assert!(matches!(digest, Reference::Digest(_)));
        assert_eq!(digest.identifier(), format!("sha256:{HEX}"));
        assert_eq!(tag.repository(), digest.repository());
    }

    #[test]
    fn test_invalid_tag() {
        let err = Tag::parse("ghcr.io/org/app:.bad", &opts()).unwrap_err();
        assert!(matches!(
            err,
            TransferError::ReferenceParse { kind: ReferenceErrorKind::InvalidTag, .. }
        ));
    }
}
