//! Manifest-ready blob summaries

use crate::error::Result;
use crate::image::hash::Hash;
use crate::image::layer::CompressedLayer;
use crate::image::media_type::MediaType;
use serde::{Deserialize, Serialize};

/// The `(mediaType, size, digest)` triple recorded for a blob in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: MediaType,
    pub size: u64,
    pub digest: Hash,
}

/// Descriptor for a layer: the one its manifest recorded, if the layer
/// carries it, otherwise one built from the layer's own accessors.
pub async fn describe(layer: &dyn CompressedLayer) -> Result<Descriptor> {
    if let Some(descriptor) = layer.native_descriptor() {
        return Ok(descriptor);
    }
    Ok(Descriptor {
        media_type: layer.media_type().await?,
        size: layer.size().await?,
        digest: layer.digest().await?,
    })
}
