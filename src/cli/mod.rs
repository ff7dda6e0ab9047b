//! Command line interface module
//!
//! Argument parsing and the runner that drives export, copy and upload.

pub mod args;
pub mod runner;

pub use args::{Args, Command};
pub use runner::Runner;
