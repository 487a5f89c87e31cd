//! Lead store trait and error types

use crate::leads::Lead;
use crate::storage::{RunRecord, StoredLead};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence for lead batches
///
/// A run groups every lead produced by one places query. Leads are saved as
/// they are produced, so an interrupted batch keeps what it already finished.
pub trait LeadStore {
    /// Creates a new run for `query` and returns its ID
    fn create_run(&mut self, query: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Marks a run as failed with a finish timestamp
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    /// Saves one lead under `run_id` and returns the row ID
    fn save_lead(&mut self, run_id: i64, lead: &Lead) -> StorageResult<i64>;

    /// Gets every lead of a run in insertion order
    fn leads_for_run(&self, run_id: i64) -> StorageResult<Vec<StoredLead>>;

    /// Counts leads of a run that ended up with at least one email
    fn count_leads_with_emails(&self, run_id: i64) -> StorageResult<u64>;
}
