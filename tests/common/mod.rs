//! Shared fixtures: gzip layer blobs, an in-memory registry and an image
#![allow(dead_code)]

use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use layer_mount::error::{Result, TransferError};
use layer_mount::image::{BlobStream, Descriptor, Hash, Image, Layer, MediaType};
use layer_mount::name::{Digest, NameOptions, Reference, Repository};
use layer_mount::registry::{BlobRequest, Fetcher, Transport};
use serde_json::json;
use sha2::{Digest as _, Sha256, Sha512};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex};

pub const SOURCE_REPO: &str = "registry.example.com/team/app";
pub const BASE_REPO: &str = "registry.example.com/library/base";

pub fn options() -> NameOptions {
    NameOptions::default()
}

pub fn sha256(data: &[u8]) -> Hash {
    Hash::parse(&format!("sha256:{}", hex::encode(Sha256::digest(data)))).unwrap()
}

pub fn sha512(data: &[u8]) -> Hash {
    Hash::parse(&format!("sha512:{}", hex::encode(Sha512::digest(data)))).unwrap()
}

/// A gzip-compressed layer blob and its digest
pub struct Blob {
    pub data: Vec<u8>,
    pub digest: Hash,
    /// Digest of the uncompressed content
    pub diff_id: Hash,
}

pub fn gzip_blob(content: &[u8]) -> Blob {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content).unwrap();
    let data = encoder.finish().unwrap();
    Blob {
        digest: sha256(&data),
        diff_id: sha256(content),
        data,
    }
}

/// Like [`gzip_blob`], with the compressed blob addressed by sha512
pub fn gzip_blob_sha512(content: &[u8]) -> Blob {
    let blob = gzip_blob(content);
    Blob {
        digest: sha512(&blob.data),
        ..blob
    }
}

pub fn blob_ref(repository: &str, digest: &Hash) -> Digest {
    Digest::parse(&format!("{}@{}", repository, digest), &options()).unwrap()
}

pub fn reference(input: &str) -> Reference {
    Reference::parse(input, &options()).unwrap()
}

pub fn repository(input: &str) -> Repository {
    Repository::parse(input, &options()).unwrap()
}

#[derive(Default)]
struct Blobs {
    data: HashMap<Hash, Vec<u8>>,
    failing: HashSet<Hash>,
    requests: Vec<(String, BlobRequest)>,
}

/// In-memory registry shared by every repository; blobs are keyed by digest
#[derive(Clone, Default)]
pub struct FakeRegistry {
    blobs: Arc<Mutex<Blobs>>,
}

impl FakeRegistry {
    pub fn insert(&self, blob: &Blob) {
        self.blobs
            .lock()
            .unwrap()
            .data
            .insert(blob.digest.clone(), blob.data.clone());
    }

    /// Make GETs of `digest` fail as a transport error; HEADs still succeed
    pub fn fail_fetch(&self, digest: &Hash) {
        self.blobs.lock().unwrap().failing.insert(digest.clone());
    }

    /// `(repository, request)` for every blob GET, in order
    pub fn requests(&self) -> Vec<(String, BlobRequest)> {
        self.blobs.lock().unwrap().requests.clone()
    }
}

impl Transport for FakeRegistry {
    fn fetcher(&self, repository: &Repository) -> Result<Arc<dyn Fetcher>> {
        Ok(Arc::new(FakeFetcher {
            repository: repository.clone(),
            blobs: self.blobs.clone(),
        }))
    }
}

struct FakeFetcher {
    repository: Repository,
    blobs: Arc<Mutex<Blobs>>,
}

impl FakeFetcher {
    fn lookup(&self, digest: &Hash, operation: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .data
            .get(digest)
            .cloned()
            .ok_or_else(|| TransferError::registry(operation, digest, "not found: blob unknown"))
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    fn repository(&self) -> &Repository {
        &self.repository
    }

    async fn fetch_blob(&self, request: &BlobRequest) -> Result<BlobStream> {
        {
            let mut blobs = self.blobs.lock().unwrap();
            blobs
                .requests
                .push((self.repository.to_string(), request.clone()));
            if blobs.failing.contains(&request.digest) {
                return Err(TransferError::registry(
                    "fetching blob",
                    &request.digest,
                    "connection error: connection reset by peer",
                ));
            }
        }
        let data = self.lookup(&request.digest, "fetching blob")?;
        let stream = BlobStream::from_bytes(data);
        Ok(match &request.redaction {
            Some(redaction) => stream.redacted(redaction.clone()),
            None => stream,
        })
    }

    async fn head_blob(&self, digest: &Hash) -> Result<u64> {
        Ok(self.lookup(digest, "reading size of blob")?.len() as u64)
    }

    async fn blob_exists(&self, digest: &Hash) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().data.contains_key(digest))
    }
}

/// An image held entirely in memory
pub struct FakeImage {
    pub layers: Vec<Layer>,
    pub diff_ids: Vec<Hash>,
    pub raw_manifest: Vec<u8>,
    pub raw_config: Vec<u8>,
    pub config_digest: Hash,
    pub descriptor: Option<Descriptor>,
}

impl FakeImage {
    /// Manifest and config are built from the layers' descriptors
    pub async fn new(layers: Vec<Layer>, diff_ids: Vec<Hash>) -> Self {
        let raw_config = serde_json::to_vec(&json!({
            "architecture": "amd64",
            "os": "linux",
            "rootfs": {
                "type": "layers",
                "diff_ids": diff_ids.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
            },
        }))
        .unwrap();
        let config_digest = sha256(&raw_config);

        let mut descriptors = Vec::new();
        for layer in &layers {
            descriptors.push(layer.descriptor().await.unwrap());
        }
        let raw_manifest = serde_json::to_vec(&json!({
            "schemaVersion": 2,
            "mediaType": MediaType::DOCKER_MANIFEST_SCHEMA2.as_str(),
            "config": {
                "mediaType": MediaType::DOCKER_CONFIG_JSON.as_str(),
                "size": raw_config.len(),
                "digest": config_digest.to_string(),
            },
            "layers": descriptors,
        }))
        .unwrap();

        Self {
            layers,
            diff_ids,
            raw_manifest,
            raw_config,
            config_digest,
            descriptor: None,
        }
    }
}

#[async_trait]
impl Image for FakeImage {
    async fn layers(&self) -> Result<Vec<Layer>> {
        Ok(self.layers.clone())
    }

    async fn layer_by_digest(&self, digest: &Hash) -> Result<Layer> {
        for layer in &self.layers {
            if layer.digest().await? == *digest {
                return Ok(layer.clone());
            }
        }
        Err(TransferError::Manifest(format!("layer {} not found", digest)))
    }

    async fn layer_by_diff_id(&self, diff_id: &Hash) -> Result<Layer> {
        self.diff_ids
            .iter()
            .position(|candidate| candidate == diff_id)
            .and_then(|index| self.layers.get(index).cloned())
            .ok_or_else(|| TransferError::Manifest(format!("diff id {} not found", diff_id)))
    }

    async fn raw_manifest(&self) -> Result<Vec<u8>> {
        Ok(self.raw_manifest.clone())
    }

    async fn raw_config_file(&self) -> Result<Vec<u8>> {
        Ok(self.raw_config.clone())
    }

    async fn config_name(&self) -> Result<Hash> {
        Ok(self.config_digest.clone())
    }

    async fn descriptor(&self) -> Result<Option<Descriptor>> {
        Ok(self.descriptor.clone())
    }
}
