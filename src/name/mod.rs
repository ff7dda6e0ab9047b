//! Registry, repository, tag and digest references
//!
//! References are provenance only: they say where a blob can be found and are
//! never used as content identity.
//!
//! - `nginx` → `index.docker.io/library/nginx:latest`
//! - `myuser/app:1.0` → `index.docker.io/myuser/app:1.0`
//! - `registry.example.com:5000/team/app@sha256:...`

mod reference;

pub use reference::{Digest, Reference, Tag};

use crate::error::{ReferenceErrorKind, Result, TransferError};
use std::fmt;

/// Docker Hub's canonical registry host
pub const DOCKER_HUB: &str = "index.docker.io";

/// Tag used when a reference names none
pub const DEFAULT_TAG: &str = "latest";

/// Parsing defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameOptions {
    pub default_registry: String,
    pub insecure: bool,
}

impl Default for NameOptions {
    fn default() -> Self {
        Self {
            default_registry: DOCKER_HUB.to_string(),
            insecure: false,
        }
    }
}

/// A registry host, optionally with port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Registry {
    host: String,
    insecure: bool,
}

impl Registry {
    pub fn parse(host: &str, options: &NameOptions) -> Result<Self> {
        if host.is_empty() {
            return Err(TransferError::reference(host, ReferenceErrorKind::Empty));
        }
        let valid = host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'));
        if !valid || host.starts_with(['.', '-', ':']) || host.ends_with(['.', '-', ':']) {
            return Err(TransferError::reference(
                host,
                ReferenceErrorKind::InvalidRegistry,
            ));
        }

        let host = match host {
            "docker.io" | "registry-1.docker.io" => DOCKER_HUB,
            other => other,
        };

        Ok(Self {
            host: host.to_string(),
            insecure: options.insecure,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_docker_hub(&self) -> bool {
        self.host == DOCKER_HUB
    }

    /// `http` for insecure and loopback registries, `https` otherwise
    pub fn scheme(&self) -> &'static str {
        let bare = self.host.split(':').next().unwrap_or_default();
        if self.insecure
            || bare == "localhost"
            || bare == "127.0.0.1"
            || self.host.starts_with("[::1]")
        {
            "http"
        } else {
            "https"
        }
    }

    /// Base URL for the distribution API, without the `/v2/` suffix
    pub fn base_url(&self) -> String {
        let host = if self.is_docker_hub() {
            "registry-1.docker.io"
        } else {
            &self.host
        };
        format!("{}://{}", self.scheme(), host)
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)
    }
}

/// A repository within a registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Repository {
    registry: Registry,
    name: String,
}

impl Repository {
    pub fn parse(input: &str, options: &NameOptions) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TransferError::reference(input, ReferenceErrorKind::Empty));
        }

        let (registry_host, path) = match input.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first, rest)
            }
            _ => (options.default_registry.as_str(), input),
        };

        let registry = Registry::parse(registry_host, options)
            .map_err(|_| TransferError::reference(input, ReferenceErrorKind::InvalidRegistry))?;

        if path.is_empty() || !path.split('/').all(is_valid_path_component) {
            return Err(TransferError::reference(
                input,
                ReferenceErrorKind::InvalidRepository,
            ));
        }

        let name = if registry.is_docker_hub() && !path.contains('/') {
            format!("library/{}", path)
        } else {
            path.to_string()
        };

        Ok(Self { registry, name })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Repository path without the registry, e.g. `library/nginx`
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.registry, self.name)
    }
}

// lowercase alphanumerics joined by single separators
fn is_valid_path_component(component: &str) -> bool {
    let starts_and_ends_alnum = component
        .chars()
        .next()
        .zip(component.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());
    starts_and_ends_alnum
        && component
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'))
        && !component.contains("..")
}
