// Registry HTTP client: blob reads for the fetch capability, and the
// mount-or-upload exchange plus manifest PUT for the write capability.

use crate::config::TransferConfig;
use crate::error::handlers::{NetworkErrorHandler, StatusErrorHandler};
use crate::error::{Result, TransferError};
use crate::image::{BlobStream, Hash, Image, Layer, MediaType, SizeHint};
use crate::logging::Logger;
use crate::name::{Reference, Repository};
use crate::registry::fetcher::{BlobRequest, Fetcher, Transport};
use crate::registry::remote_image::RemoteImage;
use crate::registry::writer::{Writer, mount_source};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub struct RegistryClientBuilder {
    token: Option<String>,
    skip_tls: bool,
    timeout: Duration,
    logger: Logger,
}

impl RegistryClientBuilder {
    pub fn new(logger: Logger) -> Self {
        Self {
            token: None,
            skip_tls: false,
            timeout: Duration::from_secs(300),
            logger,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<RegistryClient> {
        let client = Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.skip_tls)
            .build()
            .map_err(|e| TransferError::Config(format!("building HTTP client: {}", e)))?;

        Ok(RegistryClient {
            client,
            token: self.token,
            logger: self.logger,
        })
    }
}

/// Outcome of a cross-repository mount request
enum MountOutcome {
    Mounted,
    /// The registry declined and opened an upload session instead
    UploadSession(Url),
}

#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    token: Option<String>,
    logger: Logger,
}

impl RegistryClient {
    pub fn builder(logger: Logger) -> RegistryClientBuilder {
        RegistryClientBuilder::new(logger)
    }

    pub fn from_config(config: &TransferConfig, logger: Logger) -> Result<Self> {
        Self::builder(logger)
            .with_token(config.token.clone())
            .with_skip_tls(config.skip_tls)
            .with_timeout(config.timeout())
            .build()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `<scheme>://<host>/v2/<name>/<path>`
    pub fn endpoint(repository: &Repository, path: &str) -> Result<Url> {
        let raw = format!(
            "{}/v2/{}/{}",
            repository.registry().base_url(),
            repository.name(),
            path
        );
        Url::parse(&raw)
            .map_err(|e| TransferError::registry("building URL for", repository, e.to_string()))
    }

    async fn failure(
        response: Response,
        operation: &str,
        target: impl fmt::Display,
    ) -> TransferError {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "failed to read error response".to_string());
        StatusErrorHandler::handle_status(status, &text, operation, target)
    }

    fn location(base: &Url, response: &Response, target: &Repository) -> Result<Url> {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                TransferError::registry(
                    "starting upload to",
                    target,
                    "response has no Location header",
                )
            })?;
        base.join(location)
            .map_err(|e| TransferError::registry("starting upload to", target, e.to_string()))
    }

    /// Raw manifest bytes for `reference`
    pub async fn fetch_manifest(&self, reference: &Reference) -> Result<Vec<u8>> {
        let operation = "fetching manifest";
        let url = Self::endpoint(
            reference.repository(),
            &format!("manifests/{}", reference.identifier()),
        )?;
        self.logger.detail(&format!("GET {}", url));

        let request = self
            .client
            .get(url)
            .header(ACCEPT, MediaType::manifest_accept_header());
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation, reference))?;
        if !response.status().is_success() {
            return Err(Self::failure(response, operation, reference).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation, reference))?;
        self.logger.body("manifest", &body, None);
        Ok(body.to_vec())
    }

    /// The image at `reference`, with its config fetched and layers left lazy
    pub async fn image(&self, reference: &Reference) -> Result<RemoteImage> {
        let raw_manifest = self.fetch_manifest(reference).await?;
        let fetcher = self.fetcher(reference.repository())?;
        RemoteImage::new(fetcher, raw_manifest).await
    }

    async fn mount_blob(
        &self,
        destination: &Repository,
        source: &Repository,
        digest: &Hash,
    ) -> Result<MountOutcome> {
        let operation = "mounting blob";
        let base = Self::endpoint(destination, "blobs/uploads/")?;
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("mount", &digest.to_string())
            .append_pair("from", source.name());

        let response = self
            .authorize(self.client.post(url).header(CONTENT_LENGTH, 0))
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation, digest))?;

        match response.status() {
            StatusCode::CREATED => Ok(MountOutcome::Mounted),
            StatusCode::ACCEPTED => Ok(MountOutcome::UploadSession(Self::location(
                &base,
                &response,
                destination,
            )?)),
            _ => Err(Self::failure(response, operation, digest).await),
        }
    }

    async fn start_upload(&self, destination: &Repository) -> Result<Url> {
        let operation = "starting upload to";
        let base = Self::endpoint(destination, "blobs/uploads/")?;
        let response = self
            .authorize(self.client.post(base.clone()).header(CONTENT_LENGTH, 0))
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation, destination))?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(Self::failure(response, operation, destination).await);
        }
        Self::location(&base, &response, destination)
    }

    /// Monolithic upload, streaming the layer straight into the PUT body
    async fn upload_blob(&self, location: Url, layer: &Layer, digest: &Hash) -> Result<()> {
        let operation = "uploading blob";
        let size = layer.size().await?;
        let chunks = layer.compressed().await?.into_chunks();

        let mut url = location;
        url.query_pairs_mut().append_pair("digest", &digest.to_string());

        self.logger.info(&format!(
            "Uploading {} ({})",
            digest.short(),
            self.logger.format_size(size)
        ));

        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, size)
            .body(Body::wrap_stream(chunks));
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation, digest))?;

        if !response.status().is_success() {
            return Err(Self::failure(response, operation, digest).await);
        }
        Ok(())
    }

    async fn put_manifest(
        &self,
        reference: &Reference,
        raw: Vec<u8>,
        media_type: MediaType,
    ) -> Result<()> {
        let operation = "putting manifest";
        let url = Self::endpoint(
            reference.repository(),
            &format!("manifests/{}", reference.identifier()),
        )?;
        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, media_type.as_str())
            .body(raw);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation, reference))?;

        if !response.status().is_success() {
            return Err(Self::failure(response, operation, reference).await);
        }
        self.logger.success(&format!("Manifest pushed to {}", reference));
        Ok(())
    }
}

impl Transport for RegistryClient {
    fn fetcher(&self, repository: &Repository) -> Result<Arc<dyn Fetcher>> {
        Ok(Arc::new(RepositoryFetcher {
            client: self.clone(),
            repository: repository.clone(),
        }))
    }
}

#[async_trait]
impl Writer for RegistryClient {
    async fn write(&self, reference: &Reference, image: &dyn Image) -> Result<()> {
        let repository = reference.repository();
        let layers = image.layers().await?;
        self.logger.info(&format!(
            "Pushing {} layers to {}",
            layers.len(),
            reference
        ));

        for (index, layer) in layers.iter().enumerate() {
            let digest = layer.digest().await?;
            self.logger
                .step(&format!("Layer {}/{}: {}", index + 1, layers.len(), digest.short()));
            self.write_layer(repository, layer)
                .await
                .map_err(|e| e.for_layer(&digest))?;
        }

        let config = image.config_layer().await?;
        let config_digest = config.digest().await?;
        self.write_layer(repository, &config)
            .await
            .map_err(|e| e.for_layer(&config_digest))?;

        let raw = image.raw_manifest().await?;
        let media_type = image.media_type().await?;
        self.put_manifest(reference, raw, media_type).await
    }

    async fn write_layer(&self, repository: &Repository, layer: &Layer) -> Result<()> {
        let digest = layer.digest().await?;

        if self.fetcher(repository)?.blob_exists(&digest).await? {
            self.logger
                .detail(&format!("{} already exists in {}", digest.short(), repository));
            return Ok(());
        }

        let location = match mount_source(layer, repository) {
            Some(source) => match self.mount_blob(repository, source, &digest).await? {
                MountOutcome::Mounted => {
                    self.logger
                        .success(&format!("Mounted {} from {}", digest.short(), source));
                    return Ok(());
                }
                MountOutcome::UploadSession(location) => {
                    self.logger.verbose(&format!(
                        "Mount of {} from {} declined, uploading",
                        digest.short(),
                        source
                    ));
                    location
                }
            },
            None => self.start_upload(repository).await?,
        };

        self.upload_blob(location, layer, &digest).await
    }
}

/// Blob reads scoped to one repository
pub struct RepositoryFetcher {
    client: RegistryClient,
    repository: Repository,
}

impl RepositoryFetcher {
    fn blob_url(&self, digest: &Hash) -> Result<Url> {
        RegistryClient::endpoint(&self.repository, &format!("blobs/{}", digest))
    }

    async fn head(&self, digest: &Hash, operation: &str) -> Result<Response> {
        let url = self.blob_url(digest)?;
        self.client.logger.detail(&format!("HEAD {}", url));
        self.client
            .authorize(self.client.client.head(url))
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation, digest))
    }
}

#[async_trait]
impl Fetcher for RepositoryFetcher {
    fn repository(&self) -> &Repository {
        &self.repository
    }

    async fn fetch_blob(&self, request: &BlobRequest) -> Result<BlobStream> {
        let operation = "fetching blob";
        let digest = &request.digest;
        let url = self.blob_url(digest)?;
        self.client.logger.detail(&request.describe(url.as_str()));

        let response = self
            .client
            .authorize(self.client.client.get(url))
            .send()
            .await
            .map_err(|e| NetworkErrorHandler::handle_network_error(&e, operation, digest))?;

        if !response.status().is_success() {
            return Err(RegistryClient::failure(response, operation, digest).await);
        }

        let size_hint = match response.content_length() {
            Some(length) => SizeHint::Known(length),
            None => request.size_hint,
        };
        let chunks = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        let stream = BlobStream::new(chunks, size_hint);
        Ok(match &request.redaction {
            Some(redaction) => stream.redacted(redaction.clone()),
            None => stream,
        })
    }

    async fn head_blob(&self, digest: &Hash) -> Result<u64> {
        let operation = "reading size of blob";
        let response = self.head(digest, operation).await?;
        if !response.status().is_success() {
            return Err(RegistryClient::failure(response, operation, digest).await);
        }

        // HEAD responses have no body, so read the header rather than the body length
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| {
                TransferError::registry(operation, digest, "response has no Content-Length")
            })
    }

    async fn blob_exists(&self, digest: &Hash) -> Result<bool> {
        let operation = "checking existence of blob";
        let response = self.head(digest, operation).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(RegistryClient::failure(response, operation, digest).await),
        }
    }
}
