//! Storage URL parsing

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static S3_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[sS]3[aA]?://(?P<bucket>[a-z0-9\-\.]+)(?:/(?P<key>.*))?$").unwrap()
});

static GCS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[gG][sS]://(?P<bucket>[a-z0-9\-_\.]+)(?:/(?P<key>.*))?$").unwrap()
});

static AZURE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^az://(?P<container>[a-z0-9\-]+)(?:/(?P<key>.*))?$").unwrap()
});

static MEMORY_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^memory://(?P<key>.*)$").unwrap());

/// Where a storage root lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageUrl {
    /// AWS S3 (`s3://` and `s3a://`)
    S3 {
        scheme: String,
        bucket: String,
        key: String,
    },
    /// Google Cloud Storage
    Gcs { bucket: String, key: String },
    /// Azure Blob Storage
    Azure { container: String, key: String },
    /// Local filesystem directory
    Local { path: String },
    /// In-process store
    Memory { key: String },
}

impl StorageUrl {
    /// Parse a root URL or local path
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidUrl {
                url: url.to_string(),
            });
        }

        if let Some(caps) = S3_URL.captures(url) {
            let scheme = url[..url.find("://").unwrap_or(2)].to_lowercase();
            return Ok(Self::S3 {
                scheme,
                bucket: caps["bucket"].to_string(),
                key: clean_key(caps.name("key").map_or("", |m| m.as_str())),
            });
        }
        if let Some(caps) = GCS_URL.captures(url) {
            return Ok(Self::Gcs {
                bucket: caps["bucket"].to_string(),
                key: clean_key(caps.name("key").map_or("", |m| m.as_str())),
            });
        }
        if let Some(caps) = AZURE_URL.captures(url) {
            return Ok(Self::Azure {
                container: caps["container"].to_string(),
                key: clean_key(caps.name("key").map_or("", |m| m.as_str())),
            });
        }
        if let Some(caps) = MEMORY_URL.captures(url) {
            return Ok(Self::Memory {
                key: clean_key(&caps["key"]),
            });
        }
        if url.contains("://") && !url.starts_with("file://") {
            return Err(Error::InvalidUrl {
                url: url.to_string(),
            });
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(Self::Local {
            path: path.to_string(),
        })
    }

    /// URL scheme (s3, s3a, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        match self {
            Self::S3 { scheme, .. } => scheme,
            Self::Gcs { .. } => "gs",
            Self::Azure { .. } => "az",
            Self::Local { .. } => "file",
            Self::Memory { .. } => "memory",
        }
    }

    /// Key prefix inside the bucket, empty for local paths
    pub fn key(&self) -> &str {
        match self {
            Self::S3 { key, .. }
            | Self::Gcs { key, .. }
            | Self::Azure { key, .. }
            | Self::Memory { key } => key,
            Self::Local { .. } => "",
        }
    }

    /// Canonical root, without trailing slash
    pub fn root(&self) -> String {
        let base = match self {
            Self::S3 { scheme, bucket, .. } => format!("{scheme}://{bucket}"),
            Self::Gcs { bucket, .. } => format!("gs://{bucket}"),
            Self::Azure { container, .. } => format!("az://{container}"),
            Self::Local { path } => return path.trim_end_matches('/').to_string(),
            Self::Memory { .. } => "memory://".to_string(),
        };
        let key = self.key();
        if key.is_empty() {
            base
        } else if base.ends_with("://") {
            format!("{base}{key}")
        } else {
            format!("{base}/{key}")
        }
    }
}

fn clean_key(key: &str) -> String {
    key.trim_matches('/').to_string()
}
