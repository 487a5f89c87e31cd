use crate::state::EmailSet;
use crate::HarvestError;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the running email set of a crawl to its snapshot file
///
/// Every write replaces the whole file: one lower-cased address per line.
/// The new content goes to a sibling temp file that is synced and then
/// renamed over the snapshot, so a reader sees either the previous or the
/// new set, never a truncated file.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the snapshot with `emails`, durable on return
    ///
    /// # Errors
    ///
    /// `HarvestError::Snapshot` if the file cannot be written or synced
    pub fn write(&self, emails: &EmailSet) -> Result<(), HarvestError> {
        let mut content = String::new();
        for email in emails.iter() {
            content.push_str(email);
            content.push('\n');
        }

        self.replace_with(&content).map_err(|source| HarvestError::Snapshot {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Empties the snapshot at the start of an attempt
    pub fn clear(&self) -> Result<(), HarvestError> {
        self.write(&EmailSet::new())
    }

    fn replace_with(&self, content: &str) -> std::io::Result<()> {
        let staging = self.staging_path();

        let mut file = File::create(&staging)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&staging, &self.path)?;

        // persist the rename itself
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".partial");
        self.path.with_file_name(name)
    }
}

/// Reads the addresses recorded in a snapshot file
///
/// A missing or unreadable file yields an empty list. Lines are trimmed and
/// lower-cased; the result is sorted and deduplicated.
pub fn read_snapshot(path: &Path) -> Vec<String> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .map(|line| line.trim().to_lowercase())
        .filter(|line| !line.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
