//! Media type tags for manifests, configs and layers

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaType(Cow<'static, str>);

impl MediaType {
    pub const DOCKER_LAYER: MediaType =
        MediaType(Cow::Borrowed("application/vnd.docker.image.rootfs.diff.tar.gzip"));
    pub const DOCKER_CONFIG_JSON: MediaType =
        MediaType(Cow::Borrowed("application/vnd.docker.container.image.v1+json"));
    pub const DOCKER_MANIFEST_SCHEMA2: MediaType =
        MediaType(Cow::Borrowed("application/vnd.docker.distribution.manifest.v2+json"));
    pub const OCI_MANIFEST: MediaType =
        MediaType(Cow::Borrowed("application/vnd.oci.image.manifest.v1+json"));

    pub fn new(value: impl Into<String>) -> Self {
        MediaType(Cow::Owned(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Media types a registry GET for an image manifest should accept
    pub fn manifest_accept_header() -> String {
        [Self::DOCKER_MANIFEST_SCHEMA2, Self::OCI_MANIFEST]
            .iter()
            .map(MediaType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaType {
    fn from(value: &str) -> Self {
        MediaType::new(value)
    }
}
