//! Object storage (S3, GCS, Azure, local filesystem, in-memory)
//!
//! A [`Storage`] is a store plus a key prefix. Callers work with paths
//! relative to that prefix; the prefix is applied on every request.

mod url;

pub use url::StorageUrl;

use crate::config::AwsConfig;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::sync::Arc;

/// A storage root
#[derive(Clone)]
pub struct Storage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Key prefix applied to every path
    prefix: Option<ObjectPath>,
    /// Parsed root URL
    url: StorageUrl,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Storage<{}>", self.url.root())
    }
}

impl Storage {
    /// Open a storage root from a URL or local path
    ///
    /// Supported formats:
    /// - `s3://bucket/path/`, `s3a://bucket/path/` - AWS S3
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `memory://path/` - in-process store (tests)
    /// - `/local/path/`, `./path/` or `file:///path/` - local filesystem
    pub fn parse(url: &str, aws: &AwsConfig) -> Result<Self> {
        let parsed = StorageUrl::parse(url)?;
        let store: Arc<dyn ObjectStore> = match &parsed {
            StorageUrl::S3 { bucket, .. } => Arc::new(build_s3(bucket, aws)?),
            StorageUrl::Gcs { bucket, .. } => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?,
            ),
            StorageUrl::Azure { container, .. } => Arc::new(
                MicrosoftAzureBuilder::from_env()
                    .with_container_name(container)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?,
            ),
            StorageUrl::Local { path } => {
                std::fs::create_dir_all(path).map_err(|e| {
                    Error::config(format!("Failed to create directory {path}: {e}"))
                })?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(path)
                        .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?,
                )
            }
            StorageUrl::Memory { .. } => Arc::new(InMemory::new()),
        };

        Self::from_store(store, parsed)
    }

    /// Wrap an existing store
    pub fn from_store(store: Arc<dyn ObjectStore>, url: StorageUrl) -> Result<Self> {
        let prefix = if url.key().is_empty() {
            None
        } else {
            Some(ObjectPath::parse(url.key())?)
        };
        Ok(Self { store, prefix, url })
    }

    /// Fresh in-memory storage rooted at `memory://`
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            prefix: None,
            url: StorageUrl::Memory { key: String::new() },
        }
    }

    /// A storage sharing this store, rooted at `relative` below the current root
    pub fn child(&self, relative: &str) -> Result<Self> {
        let relative = relative.trim_matches('/');
        let key = match self.url.key() {
            "" => relative.to_string(),
            key => format!("{key}/{relative}"),
        };
        let url = match &self.url {
            StorageUrl::S3 { scheme, bucket, .. } => StorageUrl::S3 {
                scheme: scheme.clone(),
                bucket: bucket.clone(),
                key,
            },
            StorageUrl::Gcs { bucket, .. } => StorageUrl::Gcs {
                bucket: bucket.clone(),
                key,
            },
            StorageUrl::Azure { container, .. } => StorageUrl::Azure {
                container: container.clone(),
                key,
            },
            StorageUrl::Memory { .. } => StorageUrl::Memory { key },
            StorageUrl::Local { path } => {
                // Local stores already carry their directory, so keep the
                // key prefix separately from the filesystem root.
                let prefix = Some(self.qualify(&ObjectPath::parse(relative)?));
                return Ok(Self {
                    store: Arc::clone(&self.store),
                    prefix,
                    url: StorageUrl::Local {
                        path: format!("{}/{relative}", path.trim_end_matches('/')),
                    },
                });
            }
        };
        Self::from_store(Arc::clone(&self.store), url)
    }

    /// Get the scheme (s3, s3a, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Check if this is a cloud destination
    pub fn is_cloud(&self) -> bool {
        !matches!(self.url, StorageUrl::Local { .. } | StorageUrl::Memory { .. })
    }

    /// Canonical root URL
    pub fn root_url(&self) -> String {
        self.url.root()
    }

    /// Full URL of a relative path, for logging
    pub fn url_for(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        let root = self.root_url();
        if relative.is_empty() {
            root
        } else if root.ends_with("://") {
            format!("{root}{relative}")
        } else {
            format!("{root}/{relative}")
        }
    }

    /// Apply the key prefix to a relative path
    pub fn qualify(&self, path: &ObjectPath) -> ObjectPath {
        match &self.prefix {
            Some(prefix) => prefix.parts().chain(path.parts()).collect(),
            None => path.clone(),
        }
    }

    /// List every object below `relative` (recursive)
    ///
    /// Returned paths are relative to this storage's root, sorted.
    pub async fn list(&self, relative: &str) -> Result<Vec<ObjectPath>> {
        let relative = ObjectPath::parse(relative.trim_matches('/'))?;
        let full_prefix = self.qualify(&relative);
        let skip = self.prefix.as_ref().map_or(0, |p| p.parts().count());

        let prefix_arg = if full_prefix.as_ref().is_empty() {
            None
        } else {
            Some(&full_prefix)
        };
        let metas: Vec<ObjectMeta> = self.store.list(prefix_arg).try_collect().await?;

        let mut paths: Vec<ObjectPath> = metas
            .into_iter()
            .map(|meta| meta.location.parts().skip(skip).collect())
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Read a whole object
    pub async fn get(&self, relative: &ObjectPath) -> Result<Bytes> {
        let location = self.qualify(relative);
        let bytes = self.store.get(&location).await?.bytes().await?;
        Ok(bytes)
    }

    /// Write a whole object, returning its full URL
    pub async fn put(&self, relative: &ObjectPath, data: Bytes) -> Result<String> {
        let location = self.qualify(relative);
        self.store.put(&location, data.into()).await?;
        Ok(self.url_for(relative.as_ref()))
    }

    /// Whether any object exists below `relative`
    pub async fn exists_prefix(&self, relative: &str) -> Result<bool> {
        Ok(!self.list(relative).await?.is_empty())
    }

    /// Delete every object below `relative`, returning how many were removed
    pub async fn delete_prefix(&self, relative: &str) -> Result<usize> {
        let paths = self.list(relative).await?;
        for path in &paths {
            self.store.delete(&self.qualify(path)).await?;
        }
        Ok(paths.len())
    }
}

/// Build an S3 client with explicitly injected credentials
fn build_s3(bucket: &str, aws: &AwsConfig) -> Result<object_store::aws::AmazonS3> {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

    if let Some(key_id) = &aws.access_key_id {
        builder = builder.with_access_key_id(key_id);
    }
    if let Some(secret) = &aws.secret_access_key {
        builder = builder.with_secret_access_key(secret);
    }
    if let Some(region) = &aws.region {
        builder = builder.with_region(region);
    }
    if let Some(endpoint) = &aws.endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(endpoint.starts_with("http://"));
    }

    builder
        .build()
        .map_err(|e| Error::config(format!("Failed to create S3 client for {bucket}: {e}")))
}
