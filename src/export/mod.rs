//! Incremental export bundles
//!
//! An export writes a chosen subset of an image's layers into one tar
//! archive alongside the image's full manifest and config. The
//! `digests.json` entry is the index of which layers actually ship in the
//! bundle; the manifest may name layers that are absent, on the assumption
//! they already exist wherever the bundle is going.
//!
//! Layout, in order:
//!
//! ```text
//! <layer-hex>.tar.gz    one per requested layer, in request order
//! manifest.json         raw image manifest
//! <config-hex>.json     raw image config
//! digests.json          [{"mediaType", "size", "digest"}, ...]
//! ```

pub mod archive;

pub use archive::BundleWriter;

use crate::error::Result;
use crate::image::{Descriptor, Image};
use crate::logging::Logger;
use crate::name::Digest;
use crate::registry::{self, Transport};
use std::path::Path;
use std::sync::Arc;

pub const MANIFEST_ENTRY: &str = "manifest.json";
pub const INDEX_ENTRY: &str = "digests.json";

/// Name of the archive entry holding a layer's compressed content
pub fn layer_entry_name(descriptor: &Descriptor) -> String {
    format!("{}.tar.gz", descriptor.digest.hex)
}

pub struct Exporter {
    transport: Arc<dyn Transport>,
    logger: Logger,
}

impl Exporter {
    pub fn new(transport: Arc<dyn Transport>, logger: Logger) -> Self {
        Self { transport, logger }
    }

    /// Write the bundle for `layer_refs` of `image` to `destination`.
    ///
    /// Returns the descriptors written to the index. On error the file at
    /// `destination` is closed but is not a usable bundle.
    pub async fn export_subset(
        &self,
        layer_refs: &[Digest],
        destination: &Path,
        image: &dyn Image,
    ) -> Result<Vec<Descriptor>> {
        self.logger.section("Exporting bundle");
        self.logger.info(&format!(
            "{} layers to {}",
            layer_refs.len(),
            destination.display()
        ));

        let mut bundle = BundleWriter::create(destination).await?;
        match self.write_entries(&mut bundle, layer_refs, image).await {
            Ok(descriptors) => {
                bundle.finish().await?;
                self.logger.success(&format!(
                    "Bundle written to {} in {}",
                    destination.display(),
                    self.logger.format_duration(self.logger.elapsed())
                ));
                Ok(descriptors)
            }
            Err(err) => {
                if let Err(close_err) = bundle.abandon().await {
                    self.logger
                        .warning(&format!("closing incomplete bundle: {}", close_err));
                }
                Err(err)
            }
        }
    }

    async fn write_entries(
        &self,
        bundle: &mut BundleWriter,
        layer_refs: &[Digest],
        image: &dyn Image,
    ) -> Result<Vec<Descriptor>> {
        let mut descriptors = Vec::with_capacity(layer_refs.len());
        for (index, reference) in layer_refs.iter().enumerate() {
            self.logger.step(&format!(
                "Layer {}/{}: {}",
                index + 1,
                layer_refs.len(),
                reference
            ));
            let descriptor = self
                .export_layer(bundle, reference)
                .await
                .map_err(|e| e.for_layer(reference))?;
            descriptors.push(descriptor);
        }

        let raw_manifest = image.raw_manifest().await?;
        bundle.append_bytes(MANIFEST_ENTRY, &raw_manifest).await?;

        let config_name = image.config_name().await?;
        let raw_config = image.raw_config_file().await?;
        bundle
            .append_bytes(&format!("{}.json", config_name.hex), &raw_config)
            .await?;

        let index = serde_json::to_vec(&descriptors)?;
        bundle.append_bytes(INDEX_ENTRY, &index).await?;

        Ok(descriptors)
    }

    async fn export_layer(
        &self,
        bundle: &mut BundleWriter,
        reference: &Digest,
    ) -> Result<Descriptor> {
        let layer = registry::layer(reference, self.transport.as_ref())?;

        let descriptor = Descriptor {
            digest: layer.digest().await?,
            media_type: layer.media_type().await?,
            size: layer.size().await?,
        };
        self.logger.detail(&format!(
            "{} ({}, {})",
            descriptor.digest,
            descriptor.media_type,
            self.logger.format_size(descriptor.size)
        ));

        let content = layer.compressed().await?;
        bundle
            .append_stream(&layer_entry_name(&descriptor), descriptor.size, content)
            .await?;
        Ok(descriptor)
    }
}
