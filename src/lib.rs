//! Layer Mount Library
//!
//! Mount-aware container image transfer: layers carry the repository they
//! can be mounted from, so copying an image between repositories of one
//! registry moves shared layers server-side instead of re-uploading them.
//! The `export` module writes a chosen subset of an image's layers plus its
//! manifest and config into a single tar bundle.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod image;
pub mod logging;
pub mod name;
pub mod registry;

pub use config::TransferConfig;
pub use error::{Result, TransferError};
pub use export::Exporter;
pub use image::{Image, Layer, MountableImage, MountableLayer};
pub use logging::Logger;
