//! Image and layer model
//!
//! This module provides the digest-addressed [`Layer`] abstraction, the
//! [`Image`] trait, and [`MountableImage`], which tags every layer with the
//! repository it can be mounted from.
//!
//! # Mount provenance
//!
//! When an image is copied between repositories, most of its layers are
//! shared base layers that already exist at the destination registry under
//! some other repository. A layer wrapped with an origin reference lets the
//! registry writer ask for a cross-repository mount (no bytes transferred)
//! before falling back to a full upload. Wrapping happens once: a layer that
//! already has an origin keeps it.

pub mod descriptor;
pub mod hash;
pub mod layer;
pub mod manifest;
pub mod media_type;
pub mod mountable;
pub mod stream;
pub mod traits;

pub use descriptor::Descriptor;
pub use hash::Hash;
pub use layer::{CompressedLayer, Layer, MountableLayer, StaticLayer};
pub use manifest::{ConfigFile, Manifest};
pub use media_type::MediaType;
pub use mountable::MountableImage;
pub use stream::{BlobStream, SizeHint};
pub use traits::Image;
