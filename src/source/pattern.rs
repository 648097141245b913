//! Path glob expansion over object storage

use crate::error::{Error, Result};
use crate::storage::Storage;
use glob::{MatchOptions, Pattern};
use object_store::path::Path as ObjectPath;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled glob relative to a storage root
#[derive(Debug, Clone)]
pub struct PathGlob {
    raw: String,
    pattern: Pattern,
}

impl PathGlob {
    /// Compile a glob such as `song_data/*/*/*/*.json`
    pub fn new(raw: &str) -> Result<Self> {
        let raw = raw.trim_start_matches('/').to_string();
        let pattern = Pattern::new(&raw).map_err(|e| Error::Glob {
            pattern: raw.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { raw, pattern })
    }

    /// The pattern text
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Directory prefix before the first wildcard segment
    ///
    /// `song_data/*/*/*/*.json` lists from `song_data`.
    pub fn literal_prefix(&self) -> String {
        self.raw
            .split('/')
            .take_while(|segment| !segment.contains(['*', '?', '[']))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether a relative path matches; `*` never crosses `/`
    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches_with(path, MATCH_OPTIONS)
    }

    /// List and match against a storage root, sorted
    pub async fn expand(&self, storage: &Storage) -> Result<Vec<ObjectPath>> {
        let prefix = self.literal_prefix();
        // A glob with no wildcard names a single file, which is not a prefix
        let list_from = if prefix == self.raw {
            prefix.rsplit_once('/').map_or("", |(dir, _)| dir).to_string()
        } else {
            prefix
        };

        let matched: Vec<ObjectPath> = storage
            .list(&list_from)
            .await?
            .into_iter()
            .filter(|path| self.matches(path.as_ref()))
            .collect();

        tracing::debug!(
            "Glob {} matched {} objects under {}",
            self.raw,
            matched.len(),
            storage.url_for(&list_from)
        );
        Ok(matched)
    }
}
