//! Registry module for Docker Registry HTTP API v2 interactions
//!
//! The fetch capability ([`Fetcher`]/[`Transport`]) and the write capability
//! ([`Writer`]) are traits so the image model and the export packager never
//! see HTTP. [`RegistryClient`] implements both over reqwest.

pub mod client;
pub mod fetcher;
pub mod remote_image;
pub mod remote_layer;
pub mod writer;

pub use client::{RegistryClient, RegistryClientBuilder, RepositoryFetcher};
pub use fetcher::{BlobRequest, Fetcher, Transport};
pub use remote_image::RemoteImage;
pub use remote_layer::{RemoteLayer, layer, single_layer};
pub use writer::{Writer, mount_source, push, upload};
