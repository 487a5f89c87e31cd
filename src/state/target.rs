use crate::url::parse_root;
use crate::HarvestError;
use std::path::{Path, PathBuf};
use url::Url;

/// What one crawl is asked to do; immutable for the crawl's duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    root: Url,
    max_depth: u32,
    max_retries: u32,
    snapshot_path: PathBuf,
}

impl CrawlTarget {
    /// Creates a target, validating the root URL and the depth/retry bounds
    ///
    /// # Errors
    ///
    /// * `HarvestError::UrlError` - the root is not an absolute HTTP(S) URL
    /// * `HarvestError::InvalidRequest` - depth or retries is zero
    pub fn new(
        root: &str,
        max_depth: u32,
        max_retries: u32,
        snapshot_path: impl Into<PathBuf>,
    ) -> Result<Self, HarvestError> {
        let root = parse_root(root)?;

        if max_depth < 1 {
            return Err(HarvestError::InvalidRequest(
                "depth must be at least 1".to_string(),
            ));
        }

        if max_retries < 1 {
            return Err(HarvestError::InvalidRequest(
                "retries must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            root,
            max_depth,
            max_retries,
            snapshot_path: snapshot_path.into(),
        })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}
