//! Images whose layers carry mount provenance

use crate::error::Result;
use crate::image::descriptor::Descriptor;
use crate::image::hash::Hash;
use crate::image::layer::Layer;
use crate::image::media_type::MediaType;
use crate::image::traits::Image;
use crate::name::Reference;
use async_trait::async_trait;
use std::sync::Arc;

/// Wraps every layer the inner image yields with the image's own reference,
/// unless the layer already carries an origin.
///
/// Shared base layers keep pointing at the repository they came from; only
/// layers unique to this image are pointed at `reference`.
#[derive(Clone)]
pub struct MountableImage {
    image: Arc<dyn Image>,
    reference: Reference,
}

impl MountableImage {
    pub fn new(image: Arc<dyn Image>, reference: Reference) -> Self {
        Self { image, reference }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }
}

#[async_trait]
impl Image for MountableImage {
    async fn layers(&self) -> Result<Vec<Layer>> {
        let layers = self.image.layers().await?;
        Ok(layers
            .into_iter()
            .map(|layer| layer.wrap(&self.reference))
            .collect())
    }

    async fn layer_by_digest(&self, digest: &Hash) -> Result<Layer> {
        let layer = self.image.layer_by_digest(digest).await?;
        Ok(layer.wrap(&self.reference))
    }

    async fn layer_by_diff_id(&self, diff_id: &Hash) -> Result<Layer> {
        let layer = self.image.layer_by_diff_id(diff_id).await?;
        Ok(layer.wrap(&self.reference))
    }

    async fn raw_manifest(&self) -> Result<Vec<u8>> {
        self.image.raw_manifest().await
    }

    async fn raw_config_file(&self) -> Result<Vec<u8>> {
        self.image.raw_config_file().await
    }

    async fn config_name(&self) -> Result<Hash> {
        self.image.config_name().await
    }

    async fn media_type(&self) -> Result<MediaType> {
        self.image.media_type().await
    }

    async fn config_layer(&self) -> Result<Layer> {
        let layer = self.image.config_layer().await?;
        Ok(layer.wrap(&self.reference))
    }

    async fn descriptor(&self) -> Result<Option<Descriptor>> {
        self.image.descriptor().await
    }
}
