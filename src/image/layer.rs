//! Layers and mount provenance
//!
//! A [`Layer`] is either a bare blob ([`Layer::Plain`]) or a blob that also
//! remembers the repository it was first known to live in
//! ([`Layer::Mountable`]). Registry writers use that origin to attempt a
//! server-side cross-repository mount before uploading any bytes.

use crate::error::Result;
use crate::image::descriptor::{Descriptor, describe};
use crate::image::hash::Hash;
use crate::image::media_type::MediaType;
use crate::image::stream::BlobStream;
use crate::name::Reference;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Content operations every layer blob provides
#[async_trait]
pub trait CompressedLayer: Send + Sync {
    /// Digest the layer was constructed with; never re-derived from content
    async fn digest(&self) -> Result<Hash>;

    /// Size of the compressed blob in bytes
    async fn size(&self) -> Result<u64>;

    async fn media_type(&self) -> Result<MediaType>;

    /// The compressed bytes as a stream, fetched when called
    async fn compressed(&self) -> Result<BlobStream>;

    /// `Ok(false)` means confirmed absent; an error means the answer is unknown.
    /// Layers with no remote location are always present.
    async fn exists(&self) -> Result<bool> {
        Ok(true)
    }

    /// Descriptor recorded by the manifest this layer came from, if any
    fn native_descriptor(&self) -> Option<Descriptor> {
        None
    }
}

/// A layer paired with the repository a mount should be attempted from
#[derive(Clone)]
pub struct MountableLayer {
    layer: Arc<dyn CompressedLayer>,
    reference: Reference,
}

impl MountableLayer {
    pub fn new(layer: Arc<dyn CompressedLayer>, reference: Reference) -> Self {
        Self { layer, reference }
    }

    /// Where the blob is known to exist
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn inner(&self) -> &Arc<dyn CompressedLayer> {
        &self.layer
    }
}

impl fmt::Debug for MountableLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountableLayer")
            .field("reference", &self.reference.to_string())
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub enum Layer {
    Plain(Arc<dyn CompressedLayer>),
    Mountable(MountableLayer),
}

impl Layer {
    pub fn plain(layer: impl CompressedLayer + 'static) -> Self {
        Layer::Plain(Arc::new(layer))
    }

    /// Attach `origin` as the mount source unless the layer already has one.
    ///
    /// An existing origin always wins: it is the first repository the blob
    /// was known to live in, which is where a mount can actually succeed.
    pub fn wrap(self, origin: &Reference) -> Layer {
        match self {
            Layer::Mountable(existing) => Layer::Mountable(existing),
            Layer::Plain(layer) => Layer::Mountable(MountableLayer::new(layer, origin.clone())),
        }
    }

    /// Mount source, for mountable layers
    pub fn origin(&self) -> Option<&Reference> {
        match self {
            Layer::Plain(_) => None,
            Layer::Mountable(mountable) => Some(mountable.reference()),
        }
    }

    /// True when both values share the same underlying blob object and origin
    pub fn same_layer(&self, other: &Layer) -> bool {
        match (self, other) {
            (Layer::Plain(a), Layer::Plain(b)) => Arc::ptr_eq(a, b),
            (Layer::Mountable(a), Layer::Mountable(b)) => {
                Arc::ptr_eq(a.inner(), b.inner()) && a.reference() == b.reference()
            }
            _ => false,
        }
    }

    fn content(&self) -> &dyn CompressedLayer {
        match self {
            Layer::Plain(layer) => &**layer,
            Layer::Mountable(mountable) => &**mountable.inner(),
        }
    }

    pub async fn digest(&self) -> Result<Hash> {
        self.content().digest().await
    }

    pub async fn size(&self) -> Result<u64> {
        self.content().size().await
    }

    pub async fn media_type(&self) -> Result<MediaType> {
        self.content().media_type().await
    }

    pub async fn compressed(&self) -> Result<BlobStream> {
        self.content().compressed().await
    }

    pub async fn exists(&self) -> Result<bool> {
        self.content().exists().await
    }

    pub async fn descriptor(&self) -> Result<Descriptor> {
        describe(self.content()).await
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Plain(_) => f.write_str("Layer::Plain"),
            Layer::Mountable(mountable) => {
                f.debug_tuple("Layer::Mountable").field(mountable).finish()
            }
        }
    }
}

/// A blob already held in memory, such as an image config
pub struct StaticLayer {
    data: bytes::Bytes,
    digest: Hash,
    media_type: MediaType,
}

impl StaticLayer {
    pub fn new(data: impl Into<bytes::Bytes>, digest: Hash, media_type: MediaType) -> Self {
        Self {
            data: data.into(),
            digest,
            media_type,
        }
    }
}

#[async_trait]
impl CompressedLayer for StaticLayer {
    async fn digest(&self) -> Result<Hash> {
        Ok(self.digest.clone())
    }

    async fn size(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    async fn media_type(&self) -> Result<MediaType> {
        Ok(self.media_type.clone())
    }

    async fn compressed(&self) -> Result<BlobStream> {
        Ok(BlobStream::from_bytes(self.data.clone()))
    }
}
