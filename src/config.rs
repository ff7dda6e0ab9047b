//! Configuration for registry access and output
//!
//! Values come from `LAYER_MOUNT_*` environment variables and are then
//! overridden by command-line flags.

use crate::error::{Result, TransferError};
use crate::name::{DOCKER_HUB, NameOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_DEFAULT_REGISTRY: &str = "LAYER_MOUNT_DEFAULT_REGISTRY";
pub const ENV_INSECURE: &str = "LAYER_MOUNT_INSECURE";
pub const ENV_SKIP_TLS: &str = "LAYER_MOUNT_SKIP_TLS";
pub const ENV_TIMEOUT: &str = "LAYER_MOUNT_TIMEOUT";
pub const ENV_TOKEN: &str = "LAYER_MOUNT_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 300;
const MAX_TIMEOUT_SECS: u64 = 86400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    pub default_registry: String,
    /// Talk plain http to every registry
    pub insecure: bool,
    pub skip_tls: bool,
    pub timeout_secs: u64,
    /// Pre-issued bearer token sent with every request
    pub token: Option<String>,
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            default_registry: DOCKER_HUB.to_string(),
            insecure: false,
            skip_tls: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            token: None,
            verbose: false,
            quiet: false,
        }
    }
}

impl TransferConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(registry) = lookup(ENV_DEFAULT_REGISTRY) {
            config.default_registry = registry;
        }
        if let Some(value) = lookup(ENV_INSECURE) {
            config.insecure = parse_flag(ENV_INSECURE, &value)?;
        }
        if let Some(value) = lookup(ENV_SKIP_TLS) {
            config.skip_tls = parse_flag(ENV_SKIP_TLS, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT) {
            config.timeout_secs = value.trim().parse().map_err(|_| {
                TransferError::Config(format!(
                    "{} must be a number of seconds, got {:?}",
                    ENV_TIMEOUT, value
                ))
            })?;
        }
        config.token = lookup(ENV_TOKEN).filter(|token| !token.is_empty());

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_registry.trim().is_empty() {
            return Err(TransferError::Config(
                "default registry cannot be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(TransferError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(TransferError::Config(
                "timeout cannot exceed 24 hours (86400 seconds)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn name_options(&self) -> NameOptions {
        NameOptions {
            default_registry: self.default_registry.clone(),
            insecure: self.insecure,
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(TransferError::Config(format!(
            "{} must be true or false, got {:?}",
            key, other
        ))),
    }
}
