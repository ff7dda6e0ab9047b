//! Runs one parsed command against the registry client

use crate::cli::args::{Args, Command};
use crate::config::TransferConfig;
use crate::error::Result;
use crate::export::Exporter;
use crate::image::{Hash, MountableImage};
use crate::logging::Logger;
use crate::name::{Digest, NameOptions, Reference};
use crate::registry::{self, RegistryClient};
use std::path::Path;
use std::sync::Arc;

pub struct Runner {
    args: Args,
    config: TransferConfig,
    logger: Logger,
}

impl Runner {
    /// Environment settings, then command-line overrides
    pub fn new(args: Args) -> Result<Self> {
        let config = TransferConfig::from_env()?;
        Self::with_config(args, config)
    }

    pub fn with_config(args: Args, mut config: TransferConfig) -> Result<Self> {
        args.validate()?;
        args.apply_to(&mut config);
        config.validate()?;

        let logger = if config.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(config.verbose)
        };
        Ok(Self {
            args,
            config,
            logger,
        })
    }

    fn options(&self) -> NameOptions {
        self.config.name_options()
    }

    pub async fn run(&self) -> Result<()> {
        self.logger.section("Layer Mount");
        self.logger.detail(&format!(
            "default registry {}, timeout {}s",
            self.config.default_registry, self.config.timeout_secs
        ));

        let client = RegistryClient::from_config(&self.config, self.logger.clone())?;

        match &self.args.command {
            Command::Export {
                image,
                layers,
                output,
            } => self.export(client, image, layers, output).await,
            Command::Copy {
                source,
                destination,
            } => self.copy(&client, source, destination).await,
            Command::Upload {
                source,
                destination,
            } => self.upload(&client, source, destination).await,
        }?;

        self.logger.success(&format!(
            "Operation completed successfully in {}",
            self.logger.format_duration(self.logger.elapsed())
        ));
        Ok(())
    }

    /// Turn `--layer` values into blob references; bare digests live in the
    /// image's own repository
    pub fn resolve_layers(&self, image: &Reference, layers: &[String]) -> Result<Vec<Digest>> {
        layers
            .iter()
            .map(|layer| {
                if layer.contains('@') {
                    Digest::parse(layer, &self.options())
                } else {
                    let hash = Hash::parse(layer)?;
                    Ok(Digest::new(image.repository().clone(), hash))
                }
            })
            .collect()
    }

    async fn export(
        &self,
        client: RegistryClient,
        image: &str,
        layers: &[String],
        output: &Path,
    ) -> Result<()> {
        let reference = Reference::parse(image, &self.options())?;
        let layer_refs = self.resolve_layers(&reference, layers)?;

        self.logger.subsection("Reading image");
        let source = client.image(&reference).await?;
        self.logger.info(&format!(
            "{} has {} layers, exporting {}",
            reference,
            source.manifest().layers.len(),
            layer_refs.len()
        ));

        let exporter = Exporter::new(Arc::new(client), self.logger.clone());
        let descriptors = exporter
            .export_subset(&layer_refs, output, &source)
            .await?;

        let total: u64 = descriptors.iter().map(|d| d.size).sum();
        self.logger.summary_kv(
            "Bundle",
            &[
                ("Path", output.display().to_string()),
                ("Layers", descriptors.len().to_string()),
                ("Layer bytes", self.logger.format_size(total)),
            ],
        );
        Ok(())
    }

    async fn copy(&self, client: &RegistryClient, source: &str, destination: &str) -> Result<()> {
        let reference = Reference::parse(source, &self.options())?;

        self.logger.subsection("Reading image");
        let image = client.image(&reference).await?;
        let mountable = MountableImage::new(Arc::new(image), reference.clone());

        self.logger
            .subsection(&format!("Copying {} to {}", reference, destination));
        registry::push(&mountable, destination, &self.options(), client).await
    }

    async fn upload(&self, client: &RegistryClient, source: &str, destination: &str) -> Result<()> {
        let reference = Digest::parse(source, &self.options())?;
        let layer = registry::layer(&reference, client)?;

        self.logger
            .subsection(&format!("Copying {} to {}", reference, destination));
        registry::upload(&layer, destination, &self.options(), client).await
    }
}
