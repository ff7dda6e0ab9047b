//! Layers read lazily from a registry

use crate::error::Result;
use crate::image::{
    BlobStream, CompressedLayer, Descriptor, Hash, Layer, MediaType, MountableLayer, SizeHint,
};
use crate::logging::Redaction;
use crate::name::{Digest, Reference};
use crate::registry::fetcher::{BlobRequest, Fetcher, Transport};
use async_trait::async_trait;
use std::sync::Arc;

/// A blob in a registry, addressed by digest.
///
/// Nothing is fetched at construction. `size` and `exists` are separate
/// round trips with no caching between them.
pub struct RemoteLayer {
    fetcher: Arc<dyn Fetcher>,
    digest: Hash,
    descriptor: Option<Descriptor>,
}

impl RemoteLayer {
    pub fn new(fetcher: Arc<dyn Fetcher>, digest: Hash) -> Self {
        Self {
            fetcher,
            digest,
            descriptor: None,
        }
    }

    /// A layer listed in a manifest, which keeps the manifest's descriptor
    pub fn with_descriptor(fetcher: Arc<dyn Fetcher>, descriptor: Descriptor) -> Self {
        Self {
            fetcher,
            digest: descriptor.digest.clone(),
            descriptor: Some(descriptor),
        }
    }
}

#[async_trait]
impl CompressedLayer for RemoteLayer {
    async fn digest(&self) -> Result<Hash> {
        Ok(self.digest.clone())
    }

    async fn size(&self) -> Result<u64> {
        self.fetcher.head_blob(&self.digest).await
    }

    async fn media_type(&self) -> Result<MediaType> {
        Ok(MediaType::DOCKER_LAYER)
    }

    async fn compressed(&self) -> Result<BlobStream> {
        let request = BlobRequest::new(self.digest.clone())
            .with_size_hint(SizeHint::Unknown)
            .redacted(Redaction::binary_blob());
        self.fetcher.fetch_blob(&request).await
    }

    async fn exists(&self) -> Result<bool> {
        self.fetcher.blob_exists(&self.digest).await
    }

    fn native_descriptor(&self) -> Option<Descriptor> {
        self.descriptor.clone()
    }
}

/// The blob at `reference` as a layer that can be mounted from that repository
pub fn layer(reference: &Digest, transport: &dyn Transport) -> Result<Layer> {
    let fetcher = transport.fetcher(reference.repository())?;
    let inner: Arc<dyn CompressedLayer> =
        Arc::new(RemoteLayer::new(fetcher, reference.hash().clone()));
    Ok(Layer::Mountable(MountableLayer::new(
        inner,
        Reference::Digest(reference.clone()),
    )))
}

/// The blob at `reference` with no mount origin attached, plus its digest
pub fn single_layer(reference: &Digest, transport: &dyn Transport) -> Result<(Layer, Hash)> {
    let fetcher = transport.fetcher(reference.repository())?;
    let digest = reference.hash().clone();
    let layer = Layer::plain(RemoteLayer::new(fetcher, digest.clone()));
    Ok((layer, digest))
}
