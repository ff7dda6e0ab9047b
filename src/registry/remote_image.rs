//! Images backed by a manifest held in a registry

use crate::error::{Result, TransferError};
use crate::image::{
    ConfigFile, Descriptor, Hash, Image, Layer, Manifest, MediaType, SizeHint,
};
use crate::registry::fetcher::{BlobRequest, Fetcher};
use crate::registry::remote_layer::RemoteLayer;
use async_trait::async_trait;
use std::sync::Arc;

/// An image whose manifest has been fetched and whose layers are read on
/// demand from the same repository.
pub struct RemoteImage {
    fetcher: Arc<dyn Fetcher>,
    raw_manifest: Vec<u8>,
    manifest: Manifest,
    raw_config: Vec<u8>,
    config: ConfigFile,
}

impl RemoteImage {
    /// Parse `raw_manifest` and fetch the config blob it points at
    pub async fn new(fetcher: Arc<dyn Fetcher>, raw_manifest: Vec<u8>) -> Result<Self> {
        let manifest = Manifest::parse(&raw_manifest)?;

        let request = BlobRequest::new(manifest.config.digest.clone())
            .with_size_hint(SizeHint::Known(manifest.config.size));
        let raw_config = fetcher
            .fetch_blob(&request)
            .await?
            .read_to_end()
            .await
            .map_err(|e| {
                TransferError::Manifest(format!(
                    "reading config blob {}: {}",
                    manifest.config.digest, e
                ))
            })?;
        let config = ConfigFile::parse(&raw_config)?;

        Ok(Self {
            fetcher,
            raw_manifest,
            manifest,
            raw_config,
            config,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn remote_layer(&self, descriptor: &Descriptor) -> Layer {
        Layer::plain(RemoteLayer::with_descriptor(
            self.fetcher.clone(),
            descriptor.clone(),
        ))
    }
}

#[async_trait]
impl Image for RemoteImage {
    async fn layers(&self) -> Result<Vec<Layer>> {
        Ok(self
            .manifest
            .layers
            .iter()
            .map(|descriptor| self.remote_layer(descriptor))
            .collect())
    }

    async fn layer_by_digest(&self, digest: &Hash) -> Result<Layer> {
        if *digest == self.manifest.config.digest {
            return self.config_layer().await;
        }
        self.manifest
            .layers
            .iter()
            .find(|descriptor| descriptor.digest == *digest)
            .map(|descriptor| self.remote_layer(descriptor))
            .ok_or_else(|| {
                TransferError::Manifest(format!(
                    "layer {} not found in manifest of {}",
                    digest,
                    self.fetcher.repository()
                ))
            })
    }

    async fn layer_by_diff_id(&self, diff_id: &Hash) -> Result<Layer> {
        let index = self
            .config
            .rootfs
            .diff_ids
            .iter()
            .position(|candidate| candidate == diff_id)
            .ok_or_else(|| {
                TransferError::Manifest(format!("diff id {} not found in image config", diff_id))
            })?;
        let descriptor = self.manifest.layers.get(index).ok_or_else(|| {
            TransferError::Manifest(format!(
                "config lists {} diff ids but manifest has {} layers",
                self.config.rootfs.diff_ids.len(),
                self.manifest.layers.len()
            ))
        })?;
        Ok(self.remote_layer(descriptor))
    }

    async fn raw_manifest(&self) -> Result<Vec<u8>> {
        Ok(self.raw_manifest.clone())
    }

    async fn raw_config_file(&self) -> Result<Vec<u8>> {
        Ok(self.raw_config.clone())
    }

    async fn config_name(&self) -> Result<Hash> {
        Ok(self.manifest.config.digest.clone())
    }

    async fn media_type(&self) -> Result<MediaType> {
        Ok(self.manifest.media_type())
    }

    // the config blob lives in the registry too, so it can be mounted
    async fn config_layer(&self) -> Result<Layer> {
        Ok(self.remote_layer(&self.manifest.config))
    }
}
