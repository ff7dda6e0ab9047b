//! The image abstraction consumed by push and export

use crate::error::Result;
use crate::image::descriptor::Descriptor;
use crate::image::hash::Hash;
use crate::image::layer::{Layer, StaticLayer};
use crate::image::manifest::Manifest;
use crate::image::media_type::MediaType;
use async_trait::async_trait;

/// A container image: a manifest, a config blob and ordered layers
#[async_trait]
pub trait Image: Send + Sync {
    /// Layers in manifest order, which is filesystem application order
    async fn layers(&self) -> Result<Vec<Layer>>;

    async fn layer_by_digest(&self, digest: &Hash) -> Result<Layer>;

    /// Look a layer up by the digest of its uncompressed content
    async fn layer_by_diff_id(&self, diff_id: &Hash) -> Result<Layer>;

    async fn raw_manifest(&self) -> Result<Vec<u8>>;

    async fn raw_config_file(&self) -> Result<Vec<u8>>;

    /// Digest of the config blob
    async fn config_name(&self) -> Result<Hash>;

    async fn media_type(&self) -> Result<MediaType> {
        let raw = self.raw_manifest().await?;
        Ok(Manifest::parse(&raw)?.media_type())
    }

    /// The config blob as a layer, so it can be mounted or uploaded like one
    async fn config_layer(&self) -> Result<Layer> {
        let raw = self.raw_config_file().await?;
        let digest = self.config_name().await?;
        let manifest = Manifest::parse(&self.raw_manifest().await?)?;
        Ok(Layer::plain(StaticLayer::new(
            raw,
            digest,
            manifest.config.media_type,
        )))
    }

    /// Descriptor an index listed this image under, when the image came from one
    async fn descriptor(&self) -> Result<Option<Descriptor>> {
        Ok(None)
    }
}
