//! Command-line argument parsing

use crate::config::TransferConfig;
use crate::error::{Result, TransferError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "layer-mount")]
#[command(about = "Copy images between registries with cross-repository layer mounts, or export layer subsets as bundles")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet mode
    #[arg(long = "quiet", short = 'q', global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(
        long = "insecure",
        global = true,
        help = "Use plain http for every registry"
    )]
    pub insecure: bool,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        global = true,
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        short = 't',
        global = true,
        help = "Timeout for network operations in seconds"
    )]
    pub timeout: Option<u64>,

    #[arg(
        long = "token",
        global = true,
        help = "Bearer token sent to every registry"
    )]
    pub token: Option<String>,

    #[arg(
        long = "default-registry",
        global = true,
        help = "Registry used for references without one"
    )]
    pub default_registry: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Write a subset of an image's layers plus its manifest and config to a tar bundle
    Export {
        /// Image whose manifest and config go into the bundle
        #[arg(long = "image", short = 'i')]
        image: String,

        /// Layer to include: a bare digest (read from the image's repository) or repo@digest
        #[arg(long = "layer", short = 'l', required = true)]
        layers: Vec<String>,

        /// Destination archive path
        #[arg(long = "output", short = 'o')]
        output: PathBuf,
    },

    /// Copy an image, mounting layers from their source repository where possible
    Copy {
        source: String,
        destination: String,
    },

    /// Copy one blob (repo@digest) into another repository
    Upload {
        source: String,
        destination: String,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<()> {
        if self.verbose && self.quiet {
            return Err(TransferError::Config(
                "--verbose and --quiet cannot be used together".to_string(),
            ));
        }
        if let Command::Export { output, .. } = &self.command {
            if output.as_os_str().is_empty() {
                return Err(TransferError::Config("--output cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Command-line flags take precedence over environment settings
    pub fn apply_to(&self, config: &mut TransferConfig) {
        if let Some(registry) = &self.default_registry {
            config.default_registry = registry.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.token.is_some() {
            config.token = self.token.clone();
        }
        config.insecure |= self.insecure;
        config.skip_tls |= self.skip_tls;
        config.verbose |= self.verbose;
        config.quiet |= self.quiet;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_subcommand() {
        let args = Args::try_parse_from([
            "layer-mount",
            "export",
            "--image",
            "ghcr.io/team/app:v1",
            "--layer",
            "sha256:aaaa",
            "-l",
            "ghcr.io/lib/base@sha256:bbbb",
            "--output",
            "delta.tar",
            "--verbose",
        ])
        .unwrap();

        assert!(args.verbose);
        assert_eq!(
            args.command,
            Command::Export {
                image: "ghcr.io/team/app:v1".to_string(),
                layers: vec![
                    "sha256:aaaa".to_string(),
                    "ghcr.io/lib/base@sha256:bbbb".to_string()
                ],
                output: PathBuf::from("delta.tar"),
            }
        );
    }

    #[test]
    fn test_export_requires_a_layer() {
        let result = Args::try_parse_from([
            "layer-mount",
            "export",
            "--image",
            "app:v1",
            "--output",
            "delta.tar",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "layer-mount",
            "--timeout",
            "30",
            "--insecure",
            "--default-registry",
            "localhost:5000",
            "copy",
            "a:1",
            "b:1",
        ])
        .unwrap();

        let mut config = TransferConfig {
            token: Some("from-env".to_string()),
            ..TransferConfig::default()
        };
        args.apply_to(&mut config);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.insecure);
        assert_eq!(config.default_registry, "localhost:5000");
        assert_eq!(config.token.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let args =
            Args::try_parse_from(["layer-mount", "-v", "-q", "copy", "a:1", "b:1"]).unwrap();
        assert!(args.validate().is_err());
    }
}
