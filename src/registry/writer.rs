//! Registry write capability and the push entry points built on it

use crate::error::Result;
use crate::image::{Image, Layer};
use crate::name::{NameOptions, Reference, Repository};
use async_trait::async_trait;

/// Writes images and layers to a registry.
///
/// Implementations consult [`Layer::origin`] so a mountable layer can be
/// mounted from its source repository before any bytes are uploaded.
#[async_trait]
pub trait Writer: Send + Sync {
    async fn write(&self, reference: &Reference, image: &dyn Image) -> Result<()>;

    async fn write_layer(&self, repository: &Repository, layer: &Layer) -> Result<()>;
}

/// Repository a mount of `layer` into `destination` should come from.
///
/// Mounts only work within one registry, and mounting a repository onto
/// itself is meaningless, so both cases yield `None`.
pub fn mount_source<'a>(layer: &'a Layer, destination: &Repository) -> Option<&'a Repository> {
    let origin = layer.origin()?.repository();
    if origin.registry().host() != destination.registry().host() {
        return None;
    }
    if origin.name() == destination.name() {
        return None;
    }
    Some(origin)
}

/// Push `image` to the reference named by `destination`
pub async fn push(
    image: &dyn Image,
    destination: &str,
    options: &NameOptions,
    writer: &dyn Writer,
) -> Result<()> {
    let reference = Reference::parse(destination, options)?;
    writer.write(&reference, image).await
}

/// Push a single layer into the repository named by `repository`
pub async fn upload(
    layer: &Layer,
    repository: &str,
    options: &NameOptions,
    writer: &dyn Writer,
) -> Result<()> {
    let repository = Repository::parse(repository, options)?;
    writer.write_layer(&repository, layer).await
}
