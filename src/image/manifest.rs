//! Image manifest and config documents
//!
//! Only the fields needed to locate blobs are modeled; raw bytes are what
//! get exported and pushed, never a re-serialization of these structs.

use crate::error::{Result, TransferError};
use crate::image::descriptor::Descriptor;
use crate::image::hash::Hash;
use crate::image::media_type::MediaType;
use serde::Deserialize;

/// Schema 2 / OCI image manifest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: u32,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

impl Manifest {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(raw)
            .map_err(|e| TransferError::Manifest(format!("parsing image manifest: {}", e)))?;
        if manifest.schema_version != 2 {
            return Err(TransferError::Manifest(format!(
                "unsupported manifest schemaVersion {}",
                manifest.schema_version
            )));
        }
        Ok(manifest)
    }

    /// Declared media type, falling back to Docker schema 2
    pub fn media_type(&self) -> MediaType {
        self.media_type
            .clone()
            .unwrap_or(MediaType::DOCKER_MANIFEST_SCHEMA2)
    }
}

/// The parts of an image config this crate reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub rootfs: RootFs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RootFs {
    #[serde(default)]
    pub diff_ids: Vec<Hash>,
}

impl ConfigFile {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| TransferError::Manifest(format!("parsing image config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "size": 1469,
            "digest": "sha256:1111111111111111111111111111111111111111111111111111111111111111"
        },
        "layers": [
            {
                "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                "size": 2811478,
                "digest": "sha256:2222222222222222222222222222222222222222222222222222222222222222"
            }
        ]
    }"#;

    #[test]
    fn test_parse_schema2_manifest() {
        let manifest = Manifest::parse(MANIFEST.as_bytes()).unwrap();
        assert_eq!(manifest.media_type(), MediaType::DOCKER_MANIFEST_SCHEMA2);
        assert_eq!(manifest.config.size, 1469);
        assert_eq!(manifest.layers.len(), 1);
        assert_eq!(manifest.layers[0].media_type, MediaType::DOCKER_LAYER);
    }

    #[test]
    fn test_rejects_schema1() {
        let raw = br#"{"schemaVersion":1,"config":{"mediaType":"x","size":1,"digest":"sha256:1111111111111111111111111111111111111111111111111111111111111111"}}"#;
        let err = Manifest::parse(raw).unwrap_err();
        assert!(err.to_string().contains("schemaVersion 1"));
    }

    #[test]
    fn test_config_diff_ids() {
        let raw = br#"{"architecture":"amd64","rootfs":{"type":"layers","diff_ids":["sha256:3333333333333333333333333333333333333333333333333333333333333333"]}}"#;
        let config = ConfigFile::parse(raw).unwrap();
        assert_eq!(config.rootfs.diff_ids.len(), 1);
    }
}
