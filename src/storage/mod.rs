//! Storage module for crawl and lead data
//!
//! This module handles everything that outlives a single function call:
//! - the per-crawl snapshot file that survives a killed worker
//! - the SQLite lead store recording batch results for later outreach

mod schema;
mod snapshot;
mod sqlite;
mod traits;

pub use snapshot::{read_snapshot, SnapshotWriter};
pub use sqlite::SqliteStorage;
pub use traits::{LeadStore, StorageError, StorageResult};

use crate::leads::Lead;
use crate::HarvestError;

use std::path::Path;

/// Opens or creates a lead store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// Represents a lead batch run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub query: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
}

/// A lead as read back from the store
#[derive(Debug, Clone)]
pub struct StoredLead {
    pub id: i64,
    pub run_id: i64,
    pub lead: Lead,
    pub created_at: String,
}

/// Status of a lead batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
